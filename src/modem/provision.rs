//! One-shot modem configuration.
//!
//! After a startup delay the provisioner walks a fixed list of commands that
//! put the modem into NB-IoT only operation on the configured band and APN,
//! switches GNSS on if it is off and asks for manual registration with the
//! configured operator. Each step either succeeds and moves on or aborts the
//! whole sequence. The only exception is the final registration request,
//! which commonly times out while the modem is still searching; that failure
//! is logged and provisioning still counts as done.

use super::command::{Answer, Command, Quoted};
use super::config::ConnectionOptions;
use super::error::Error;
use super::response;
use super::{Action, tables};

/// Timeout of the manual registration request.
pub const REGISTRATION_TIMEOUT_MS: u32 = 5_000;

/// Builds `AT+COPS=1,2,"<operator>",9`: manual selection, numeric format, NB-IoT.
pub fn registration_command(operator: &str) -> Result<Command, Error> {
    Ok(Command::format(format_args!("AT+COPS=1,2,{},9", Quoted(operator)))?
        .timeout(REGISTRATION_TIMEOUT_MS))
}

/// Provisioning steps in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionStep {
    /// Let the modem settle after boot
    StartupDelay,
    /// `AT&F0`
    FactoryReset,
    /// `ATE0`
    EchoOff,
    /// `AT+CPIN?`, fails without a usable SIM
    SimReady,
    /// `AT+QCFG="band",...`
    RadioBand,
    /// `AT+QCFG="nwscanmode",3,1`: LTE only
    ScanMode,
    /// `AT+QCFG="nwscanseq",030102,1`: NB-IoT first
    ScanSequence,
    /// `AT+QCFG="iotopmode",1,1`: NB-IoT only
    IotOpMode,
    /// `AT+QCFG="servicedomain",1,1`: packet switched only
    ServiceDomain,
    /// `AT+CGDCONT=1,"IP",<apn>`
    AccessPoint,
    /// `AT+CFUN=1`
    FullFunctionality,
    /// `AT+QGPS?`
    GnssQuery,
    /// `AT+QGPS=1`, only when GNSS was off
    GnssEnable,
    /// `AT+CEREG=2`: report location info with registration status
    RegistrationReports,
    /// `AT+COPS=1,2,<operator>,9`
    Register,
}

impl ProvisionStep {
    /// All steps in order.
    pub const ALL: [ProvisionStep; 15] = [
        ProvisionStep::StartupDelay,
        ProvisionStep::FactoryReset,
        ProvisionStep::EchoOff,
        ProvisionStep::SimReady,
        ProvisionStep::RadioBand,
        ProvisionStep::ScanMode,
        ProvisionStep::ScanSequence,
        ProvisionStep::IotOpMode,
        ProvisionStep::ServiceDomain,
        ProvisionStep::AccessPoint,
        ProvisionStep::FullFunctionality,
        ProvisionStep::GnssQuery,
        ProvisionStep::GnssEnable,
        ProvisionStep::RegistrationReports,
        ProvisionStep::Register,
    ];

    /// Short name for log output.
    pub fn name(self) -> &'static str {
        match self {
            ProvisionStep::StartupDelay => "startup delay",
            ProvisionStep::FactoryReset => "factory reset",
            ProvisionStep::EchoOff => "echo off",
            ProvisionStep::SimReady => "sim",
            ProvisionStep::RadioBand => "band",
            ProvisionStep::ScanMode => "scan mode",
            ProvisionStep::ScanSequence => "scan sequence",
            ProvisionStep::IotOpMode => "iot mode",
            ProvisionStep::ServiceDomain => "service domain",
            ProvisionStep::AccessPoint => "apn",
            ProvisionStep::FullFunctionality => "cfun",
            ProvisionStep::GnssQuery => "gnss query",
            ProvisionStep::GnssEnable => "gnss enable",
            ProvisionStep::RegistrationReports => "cereg",
            ProvisionStep::Register => "register",
        }
    }
}

/// Provisioning sequencer.
#[derive(Debug)]
pub struct Provisioner {
    options: ConnectionOptions,
    startup_delay_ms: u32,
    index: Option<usize>,
    gnss_off: bool,
}

impl Provisioner {
    /// Creates an idle provisioner for `options`.
    pub fn new(options: ConnectionOptions, startup_delay_ms: u32) -> Self {
        Self {
            options,
            startup_delay_ms,
            index: None,
            gnss_off: false,
        }
    }

    /// The step waiting for its outcome, `None` when idle.
    pub fn step(&self) -> Option<ProvisionStep> {
        self.index.and_then(|i| ProvisionStep::ALL.get(i).copied())
    }

    /// Whether a sequence is running.
    pub fn is_running(&self) -> bool {
        self.index.is_some()
    }

    /// Starts over from the startup delay.
    pub fn start(&mut self) -> Action {
        info!("provisioning started");
        self.index = Some(0);
        self.gnss_off = false;
        Action::Wait(self.startup_delay_ms)
    }

    /// Stops without reporting.
    pub fn abandon(&mut self) {
        self.index = None;
    }

    /// Feeds the outcome of the current step and returns the next action.
    pub fn advance(&mut self, outcome: Result<Answer, Error>) -> Action {
        let Some(step) = self.step() else {
            return Action::Done(Ok(()));
        };

        let answer = match outcome {
            Ok(answer) => answer,
            Err(e) if step == ProvisionStep::Register => {
                warn!("registration request failed: {}", e);
                return self.finish(Ok(()));
            }
            Err(e) => {
                error!("provisioning failed at {=str}: {}", step.name(), e);
                return self.finish(Err(e));
            }
        };

        if step == ProvisionStep::GnssQuery {
            self.gnss_off = match response::parse_gnss_power(&answer) {
                Ok(on) => !on,
                Err(e) => {
                    warn!("unexpected gnss state: {}", e);
                    false
                }
            };
        }

        self.next()
    }

    fn next(&mut self) -> Action {
        let mut index = self.index.map_or(0, |i| i + 1);
        loop {
            let Some(&step) = ProvisionStep::ALL.get(index) else {
                return self.finish(Ok(()));
            };
            if step == ProvisionStep::GnssEnable && !self.gnss_off {
                index += 1;
                continue;
            }
            self.index = Some(index);
            return match self.action(step) {
                Ok(action) => action,
                Err(e) => {
                    error!("provisioning failed at {=str}: {}", step.name(), e);
                    self.finish(Err(e))
                }
            };
        }
    }

    fn action(&self, step: ProvisionStep) -> Result<Action, Error> {
        let command = match step {
            ProvisionStep::StartupDelay => return Ok(Action::Wait(self.startup_delay_ms)),
            ProvisionStep::FactoryReset => Command::new("AT&F0")?,
            ProvisionStep::EchoOff => Command::new("ATE0")?,
            ProvisionStep::SimReady => Command::new("AT+CPIN?")?,
            ProvisionStep::RadioBand => {
                let mask = tables::band_mask(&self.options.band)
                    .ok_or_else(|| Error::UnknownBand(self.options.band.clone()))?;
                Command::format(format_args!("AT+QCFG=\"band\",0,0,{},1", mask))?
            }
            ProvisionStep::ScanMode => Command::new("AT+QCFG=\"nwscanmode\",3,1")?,
            ProvisionStep::ScanSequence => Command::new("AT+QCFG=\"nwscanseq\",030102,1")?,
            ProvisionStep::IotOpMode => Command::new("AT+QCFG=\"iotopmode\",1,1")?,
            ProvisionStep::ServiceDomain => Command::new("AT+QCFG=\"servicedomain\",1,1")?,
            ProvisionStep::AccessPoint => Command::format(format_args!(
                "AT+CGDCONT=1,\"IP\",{}",
                Quoted(&self.options.apn)
            ))?,
            ProvisionStep::FullFunctionality => Command::new("AT+CFUN=1")?,
            ProvisionStep::GnssQuery => Command::new("AT+QGPS?")?,
            ProvisionStep::GnssEnable => Command::new("AT+QGPS=1")?,
            ProvisionStep::RegistrationReports => Command::new("AT+CEREG=2")?,
            ProvisionStep::Register => registration_command(&self.options.operator)?,
        };
        Ok(Action::Send(command))
    }

    fn finish(&mut self, result: Result<(), Error>) -> Action {
        if result.is_ok() {
            info!("provisioning done");
        }
        self.index = None;
        Action::Done(result)
    }
}
