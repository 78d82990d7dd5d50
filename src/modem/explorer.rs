//! The explorer context: transport, engine, sequencers, timers and display.

use super::command::{Answer, CommandEngine, LineOutcome};
use super::config::Settings;
use super::error::Error;
use super::line::LineReader;
use super::poll::Poller;
use super::provision::Provisioner;
use super::state::NetworkState;
use super::urc::{Events, ModemEvent, UrcDispatcher, UrcHandler};
use super::{Action, Millis};
use crate::display::{Renderer, Screen, ScreenCursor};
use crate::network::{self, Connection};

/// Bytes read from the transport per call.
pub const READ_CHUNK: usize = 64;

/// Which sequencer owns the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Job {
    /// Nothing running
    Idle,
    /// Provisioning after a modem reset
    Provisioning,
    /// A polling cycle
    Polling,
}

/// Drives one modem and one display.
///
/// Call [`Explorer::poll`] often with a monotonic millisecond clock. Each call
/// reads what the modem sent, resolves the pending command, fires due timers
/// and lets the running sequencer issue its next command. Provisioning starts
/// when the modem prints `RDY`; call [`Explorer::reset`] to start it for a
/// modem that is already up.
#[derive(Debug)]
pub struct Explorer<C: Connection, R: Renderer> {
    port: C,
    renderer: R,
    settings: Settings,
    reader: LineReader,
    engine: CommandEngine,
    urcs: UrcDispatcher,
    events: Events,
    provisioner: Provisioner,
    poller: Poller,
    job: Job,
    provisioning: Option<Result<(), Error>>,
    delay_until: Option<Millis>,
    next_poll: Option<Millis>,
    state: NetworkState,
    screens: ScreenCursor,
}

impl<C: Connection, R: Renderer> Explorer<C, R> {
    /// Creates an idle explorer.
    pub fn new(port: C, renderer: R, settings: Settings) -> Self {
        Self {
            provisioner: Provisioner::new(settings.connection.clone(), settings.startup_delay_ms),
            poller: Poller::new(&settings.connection),
            port,
            renderer,
            settings,
            reader: LineReader::new(),
            engine: CommandEngine::new(),
            urcs: UrcDispatcher::with_defaults(),
            events: Events::new(),
            job: Job::Idle,
            provisioning: None,
            delay_until: None,
            next_poll: None,
            state: NetworkState::default(),
            screens: ScreenCursor::new(),
        }
    }

    /// Registers an additional unsolicited line handler. `RDY` is always registered.
    pub fn register_urc(&mut self, prefix: &'static str, handler: UrcHandler) -> Result<(), Error> {
        self.urcs.register(prefix, handler)
    }

    /// The latest telemetry.
    pub fn state(&self) -> &NetworkState {
        &self.state
    }

    /// The settings in use.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The running sequencer.
    pub fn job(&self) -> Job {
        self.job
    }

    /// Outcome of the last finished provisioning, `None` while running or before the first.
    pub fn provisioning_result(&self) -> Option<&Result<(), Error>> {
        self.provisioning.as_ref()
    }

    /// When the next polling cycle is due, if scheduled.
    pub fn next_poll_at(&self) -> Option<Millis> {
        self.next_poll
    }

    /// The screen on display.
    pub fn current_screen(&self) -> &'static Screen {
        self.screens.current()
    }

    /// The transport.
    pub fn port(&self) -> &C {
        &self.port
    }

    /// The transport, mutably.
    pub fn port_mut(&mut self) -> &mut C {
        &mut self.port
    }

    /// The renderer.
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// The renderer, mutably.
    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    /// Pumps the explorer once.
    ///
    /// Returns [`Error::Transport`] when the transport fails; a pending command
    /// is failed first if the stream ended. Timers still run on a failed read.
    pub fn poll(&mut self, now: Millis) -> Result<(), Error> {
        let pumped = self.pump(now);

        if let Some(outcome) = self.engine.on_tick(now) {
            if let Err(e) = &outcome {
                debug!("command failed: {}", e);
            }
            self.complete(outcome.map_err(Error::from), now);
        }

        if self.delay_until.is_some_and(|at| now >= at) {
            self.delay_until = None;
            self.complete(Ok(Answer::new()), now);
        }

        if self.next_poll.is_some_and(|at| now >= at) {
            self.next_poll = Some(now + u64::from(self.settings.update_interval_ms));
            if self.job == Job::Idle {
                self.start_polling(now);
            } else {
                debug!("poll tick skipped, previous cycle still running");
            }
        }

        pumped
    }

    /// Starts a polling cycle right away.
    ///
    /// Returns [`Error::Busy`] if provisioning or another cycle is running.
    pub fn poll_once(&mut self, now: Millis) -> Result<(), Error> {
        if self.job != Job::Idle {
            return Err(Error::Busy);
        }
        self.start_polling(now);
        Ok(())
    }

    /// Cancels everything and provisions the modem again.
    pub fn reset(&mut self, now: Millis) {
        info!("modem reset");
        self.stop();
        self.provisioning = None;
        self.job = Job::Provisioning;
        let action = self.provisioner.start();
        self.perform(action, now);
    }

    /// Shows the next screen, wrapping to the first.
    pub fn next_screen(&mut self) {
        self.screens.forward();
        self.render();
    }

    /// Shows the previous screen, wrapping to the last.
    pub fn previous_screen(&mut self) {
        self.screens.back();
        self.render();
    }

    /// Draws the current screen.
    pub fn render(&mut self) {
        self.renderer.render(self.screens.current(), &self.state);
    }

    fn stop(&mut self) {
        self.next_poll = None;
        self.delay_until = None;
        if let Some(command) = self.engine.abandon() {
            debug!("abandoned {=str}", command.text());
        }
        self.provisioner.abandon();
        self.poller.abandon();
        self.job = Job::Idle;
    }

    fn pump(&mut self, now: Millis) -> Result<(), Error> {
        let mut buf = [0u8; READ_CHUNK];
        loop {
            let n = match self.port.read(&mut buf) {
                Ok(0) => return Ok(()),
                Ok(n) => n,
                Err(e) => {
                    let e: network::error::Error = e.into();
                    if e == network::error::Error::ConnectionClosed {
                        if let Some(outcome) = self.engine.on_closed() {
                            self.complete(outcome.map_err(Error::from), now);
                        }
                    }
                    return Err(Error::Transport(e));
                }
            };
            for &byte in &buf[..n] {
                if let Some(line) = self.reader.push(byte) {
                    self.on_line(&line, now);
                }
            }
        }
    }

    fn on_line(&mut self, line: &str, now: Millis) {
        trace!("< {=str}", line);
        let offered = self.urcs.dispatch(line, &mut self.events).unwrap_or(line);
        self.process_events(now);
        if offered.is_empty() {
            return;
        }

        match self.engine.on_line(offered) {
            LineOutcome::Unclaimed => debug!("dropped {=str}", offered),
            LineOutcome::Absorbed => {}
            LineOutcome::Resolved(outcome) => {
                if let Err(e) = &outcome {
                    debug!("command failed: {}", e);
                }
                self.complete(outcome.map_err(Error::from), now);
            }
        }
    }

    fn process_events(&mut self, now: Millis) {
        while let Some(event) = self.events.pop_front() {
            match event {
                ModemEvent::Ready => self.reset(now),
                ModemEvent::PoweredDown => {
                    warn!("modem powered down");
                    self.stop();
                }
            }
        }
    }

    fn complete(&mut self, outcome: Result<Answer, Error>, now: Millis) {
        if let Some(action) = self.advance_job(outcome) {
            self.perform(action, now);
        }
    }

    fn advance_job(&mut self, outcome: Result<Answer, Error>) -> Option<Action> {
        match self.job {
            Job::Idle => None,
            Job::Provisioning => Some(self.provisioner.advance(outcome)),
            Job::Polling => Some(self.poller.advance(outcome, &mut self.state)),
        }
    }

    fn perform(&mut self, mut action: Action, now: Millis) {
        loop {
            match action {
                Action::Send(command) => match self.engine.send(&mut self.port, command, now) {
                    Ok(()) => return,
                    Err(e) => {
                        warn!("send failed: {}", e);
                        match self.advance_job(Err(e)) {
                            Some(next) => action = next,
                            None => return,
                        }
                    }
                },
                Action::Wait(ms) => {
                    self.delay_until = Some(now + u64::from(ms));
                    return;
                }
                Action::Done(result) => {
                    self.finish(result, now);
                    return;
                }
            }
        }
    }

    fn finish(&mut self, result: Result<(), Error>, now: Millis) {
        match core::mem::replace(&mut self.job, Job::Idle) {
            Job::Provisioning => {
                self.provisioning = Some(result);
                self.next_poll = Some(now + u64::from(self.settings.update_interval_ms));
            }
            Job::Polling => {
                if let Err(e) = &result {
                    warn!("polling cycle ended early: {}", e);
                }
                self.render();
            }
            Job::Idle => {}
        }
    }

    fn start_polling(&mut self, now: Millis) {
        self.job = Job::Polling;
        let action = self.poller.start();
        self.perform(action, now);
    }
}
