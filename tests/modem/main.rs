//! Explorer tests against a scripted modem

mod explorer;
mod provisioning;
