//! Periodic telemetry refresh.
//!
//! One polling cycle queries registration, address, signal, serving network
//! and provider, then the GNSS position, writing each parsed answer into the
//! [`NetworkState`]. The first failing network query ends the network part of
//! the cycle; the GNSS query always runs.

use super::command::{Answer, Command};
use super::config::{ConnectionOptions, MAX_OPERATOR_LEN};
use super::error::Error;
use super::provision::registration_command;
use super::response;
use super::state::NetworkState;
use super::Action;
use heapless::String;

/// `+CME ERROR` code the modem reports while GNSS has no fix.
pub const GNSS_NOT_FIXED: u16 = 516;

/// Polling steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollStep {
    /// `AT+CEREG?`
    Registration,
    /// `AT+COPS=1,2,<operator>,9`, only while not registered or searching
    Reregister,
    /// `AT+CGPADDR=1`
    IpAddress,
    /// `AT+CSQ`
    SignalQuality,
    /// `AT+QNWINFO`
    NetworkInfo,
    /// `AT+QSPN`
    ServiceProvider,
    /// `AT+QGPSLOC=2`
    GnssLocation,
}

impl PollStep {
    /// Short name for log output.
    pub fn name(self) -> &'static str {
        match self {
            PollStep::Registration => "registration",
            PollStep::Reregister => "register",
            PollStep::IpAddress => "ip address",
            PollStep::SignalQuality => "signal quality",
            PollStep::NetworkInfo => "network info",
            PollStep::ServiceProvider => "service provider",
            PollStep::GnssLocation => "gnss",
        }
    }
}

/// Polling sequencer.
#[derive(Debug)]
pub struct Poller {
    operator: String<MAX_OPERATOR_LEN>,
    step: Option<PollStep>,
}

impl Poller {
    /// Creates an idle poller that re-registers with the operator in `options`.
    pub fn new(options: &ConnectionOptions) -> Self {
        Self {
            operator: options.operator.clone(),
            step: None,
        }
    }

    /// The step waiting for its outcome, `None` when idle.
    pub fn step(&self) -> Option<PollStep> {
        self.step
    }

    /// Whether a cycle is running.
    pub fn is_running(&self) -> bool {
        self.step.is_some()
    }

    /// Starts a cycle.
    pub fn start(&mut self) -> Action {
        self.goto(PollStep::Registration)
    }

    /// Stops without reporting.
    pub fn abandon(&mut self) {
        self.step = None;
    }

    /// Feeds the outcome of the current step into `state` and returns the next action.
    pub fn advance(&mut self, outcome: Result<Answer, Error>, state: &mut NetworkState) -> Action {
        let Some(step) = self.step else {
            return Action::Done(Ok(()));
        };

        if step == PollStep::GnssLocation {
            apply_gnss(outcome, state);
            self.step = None;
            return Action::Done(Ok(()));
        }

        match apply(step, outcome, state) {
            Ok(next) => self.goto(next),
            Err(e) => {
                warn!("network issue at {=str}: {}", step.name(), e);
                self.goto(PollStep::GnssLocation)
            }
        }
    }

    fn goto(&mut self, step: PollStep) -> Action {
        self.step = Some(step);
        match self.command(step) {
            Ok(command) => Action::Send(command),
            Err(e) => {
                self.step = None;
                Action::Done(Err(e))
            }
        }
    }

    fn command(&self, step: PollStep) -> Result<Command, Error> {
        match step {
            PollStep::Registration => Command::new("AT+CEREG?"),
            PollStep::Reregister => registration_command(&self.operator),
            PollStep::IpAddress => Command::new("AT+CGPADDR=1"),
            PollStep::SignalQuality => Command::new("AT+CSQ"),
            PollStep::NetworkInfo => Command::new("AT+QNWINFO"),
            PollStep::ServiceProvider => Command::new("AT+QSPN"),
            PollStep::GnssLocation => Command::new("AT+QGPSLOC=2"),
        }
    }
}

fn apply(
    step: PollStep,
    outcome: Result<Answer, Error>,
    state: &mut NetworkState,
) -> Result<PollStep, Error> {
    let answer = outcome?;
    match step {
        PollStep::Registration => {
            let registration = response::parse_registration(&answer)?;
            state.apply_registration_status(registration.status)?;
            if registration.needs_registration() {
                return Ok(PollStep::Reregister);
            }
            state.apply_cell(&registration)?;
            Ok(PollStep::IpAddress)
        }
        PollStep::Reregister => Ok(PollStep::IpAddress),
        PollStep::IpAddress => {
            state.apply_pdp_address(response::parse_pdp_address(&answer)?)?;
            Ok(PollStep::SignalQuality)
        }
        PollStep::SignalQuality => {
            state.apply_signal_quality(response::parse_signal_quality(&answer)?);
            Ok(PollStep::NetworkInfo)
        }
        PollStep::NetworkInfo => {
            state.apply_network_info(&response::parse_network_info(&answer)?)?;
            Ok(PollStep::ServiceProvider)
        }
        PollStep::ServiceProvider => {
            state.apply_service_provider(&response::parse_service_provider(&answer)?)?;
            Ok(PollStep::GnssLocation)
        }
        PollStep::GnssLocation => Ok(PollStep::GnssLocation),
    }
}

fn apply_gnss(outcome: Result<Answer, Error>, state: &mut NetworkState) {
    let answer = match outcome {
        Ok(answer) => answer,
        Err(Error::Command(e)) if e.cme_code() == Some(GNSS_NOT_FIXED) => {
            debug!("gnss not fixed yet");
            state.reset_gnss();
            return;
        }
        Err(e) => {
            warn!("gnss issue: {}", e);
            return;
        }
    };

    let applied = response::parse_gnss_location(&answer).and_then(|fix| match fix {
        Some(fix) => state.apply_gnss_fix(&fix),
        None => {
            state.reset_gnss();
            Ok(())
        }
    });
    if let Err(e) = applied {
        warn!("gnss issue: {}", e);
    }
}
