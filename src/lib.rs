//! # nbiot-explorer - NB-IoT network explorer
//!
//! A `no_std` engine that drives a Quectel BG96 class NB-IoT modem over its
//! AT-command serial interface and keeps a record of the radio network it is
//! attached to, ready to be shown on a small display.
//!
//! ## Features
//!
//! ### Modem session
//! - **Command engine**: one pending AT command at a time, with timeouts,
//!   `ERROR`/`+CME ERROR` detection and optional wait prefixes
//! - **Unsolicited lines**: a prefix registry that reacts to `RDY` and
//!   other lines the modem prints on its own
//! - **Provisioning**: configures band, scan mode, APN and GNSS, then
//!   requests registration with the configured operator
//! - **Polling**: periodically refreshes registration, cell, signal,
//!   operator, provider and GNSS position
//!
//! ### Display model
//! - Seven screens with labelled rows bound to the network record
//! - A [`Renderer`](display::Renderer) trait for any display driver
//!
//! ## Usage
//!
//! Add this to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! nbiot-explorer = "0.1.0"
//! ```
//!
//! Wrap the UART in a [`network::Connection`], implement
//! [`display::Renderer`] for the display and call
//! [`modem::Explorer::poll`] from the main loop; see the [`modem`] module for
//! a complete example.
//!
//! This library is designed to work on:
//! - Embedded microcontrollers (ARM Cortex-M, RISC-V, etc.)
//! - Linux hosts with a USB serial adapter
//! - Any platform supporting Rust's `core` library
//!
//! ## Cargo features
//!
//! - `std`: Enable standard library support (default: disabled)
//! - `defmt`: Log through defmt and implement `defmt::Format` for all error types

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(missing_docs)]
#![warn(missing_debug_implementations)]

// Must come first so the logging macros are visible in every module.
mod fmt;

/// Byte transport traits for the modem's serial link.
pub mod network;

/// AT-command session: engine, sequencers, state record and the explorer context.
pub mod modem;

/// GNSS position report parsing.
pub mod gps;

/// Screens, rows and the renderer boundary.
pub mod display;
