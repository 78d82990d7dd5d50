//! AT command/response engine.
//!
//! The engine writes one command, then classifies each following line until
//! the command resolves:
//!
//! - `ERROR`, `+CME ERROR...` or end of stream fail it,
//! - with a wait prefix, the first line starting with that prefix succeeds
//!   and becomes the result,
//! - without one, `OK` succeeds and the result is every line collected
//!   before it, joined with `\n`,
//! - no terminal line before the deadline fails it with `TIMEOUT`.
//!
//! At most one command is pending. [`CommandEngine::send`] refuses a second
//! one with [`Error::Busy`] so response lines can never be attributed to the
//! wrong command. The engine never retries; that is left to the sequencers.

use super::Millis;
use super::error::Error;
use super::response::ResponseKind;
use crate::network::{self, Write};
use core::fmt::{self, Write as _};
use heapless::String;

/// Command line terminator.
pub const TERMINATOR: &[u8] = b"\r\n";
/// Timeout used when a command does not set one.
pub const DEFAULT_TIMEOUT_MS: u32 = 1_000;
/// Longest command text.
pub const MAX_COMMAND_LEN: usize = 128;
/// Longest wait prefix.
pub const MAX_PREFIX_LEN: usize = 16;
/// Longest collected answer.
pub const MAX_ANSWER_LEN: usize = 256;

/// Result of a successful command: the matched line or the joined answer.
pub type Answer = String<MAX_ANSWER_LEN>;

/// An AT command ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    text: String<MAX_COMMAND_LEN>,
    wait_for: Option<String<MAX_PREFIX_LEN>>,
    timeout_ms: u32,
}

impl Command {
    /// Creates a command that completes on `OK` within the default timeout.
    pub fn new(text: &str) -> Result<Self, Error> {
        Ok(Self {
            text: String::try_from(text).map_err(|_| Error::Capacity)?,
            wait_for: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        })
    }

    /// Creates a command from format arguments.
    ///
    /// ```rust
    /// use nbiot_explorer::modem::Command;
    ///
    /// let cmd = Command::format(format_args!("AT+QCFG=\"band\",0,0,{},1", "80")).unwrap();
    /// assert_eq!(cmd.text(), "AT+QCFG=\"band\",0,0,80,1");
    /// ```
    pub fn format(args: fmt::Arguments<'_>) -> Result<Self, Error> {
        let mut text = String::new();
        text.write_fmt(args).map_err(|_| Error::Capacity)?;
        Ok(Self {
            text,
            wait_for: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        })
    }

    /// Completes the command on the first line starting with `prefix`
    /// instead of on `OK`.
    pub fn wait_for(mut self, prefix: &str) -> Result<Self, Error> {
        self.wait_for = Some(String::try_from(prefix).map_err(|_| Error::Capacity)?);
        Ok(self)
    }

    /// Overrides the timeout.
    pub fn timeout(mut self, timeout_ms: u32) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// The command text, without terminator.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The wait prefix, if any.
    pub fn waits_for(&self) -> Option<&str> {
        self.wait_for.as_deref()
    }

    /// Timeout in milliseconds.
    pub fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }
}

/// Renders a string as a quoted protocol literal, escaping `"` and `\`.
#[derive(Debug, Clone, Copy)]
pub struct Quoted<'a>(pub &'a str);

impl fmt::Display for Quoted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_char('"')?;
        for c in self.0.chars() {
            match c {
                '"' => f.write_str("\\\"")?,
                '\\' => f.write_str("\\\\")?,
                '\n' => f.write_str("\\n")?,
                '\r' => f.write_str("\\r")?,
                '\t' => f.write_str("\\t")?,
                c => f.write_char(c)?,
            }
        }
        f.write_char('"')
    }
}

/// Why a command failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// No terminal line arrived before the deadline.
    Timeout,
    /// The modem answered `ERROR` or `+CME ERROR...`; holds that line.
    Rejected(String<MAX_ANSWER_LEN>),
    /// The stream ended while the command was pending.
    Closed,
    /// The answer did not fit into [`MAX_ANSWER_LEN`] bytes.
    Overflow,
}

/// A failed command together with its text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandError {
    /// The command that failed.
    pub command: String<MAX_COMMAND_LEN>,
    /// What went wrong.
    pub failure: Failure,
}

impl CommandError {
    /// The numeric code of a `+CME ERROR: <code>` rejection.
    pub fn cme_code(&self) -> Option<u16> {
        match &self.failure {
            Failure::Rejected(line) => line
                .strip_prefix(ResponseKind::CME_ERROR)?
                .trim_start_matches(':')
                .trim()
                .parse()
                .ok(),
            _ => None,
        }
    }

    /// Whether the command timed out.
    pub fn is_timeout(&self) -> bool {
        self.failure == Failure::Timeout
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.failure {
            Failure::Timeout => write!(f, "{}: TIMEOUT", self.command),
            Failure::Rejected(line) => write!(f, "{}: {}", self.command, line),
            Failure::Closed => write!(f, "{}: CLOSED", self.command),
            Failure::Overflow => write!(f, "{}: OVERFLOW", self.command),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for CommandError {
    fn format(&self, f: defmt::Formatter) {
        match &self.failure {
            Failure::Timeout => defmt::write!(f, "{}: TIMEOUT", self.command),
            Failure::Rejected(line) => defmt::write!(f, "{}: {}", self.command, line),
            Failure::Closed => defmt::write!(f, "{}: CLOSED", self.command),
            Failure::Overflow => defmt::write!(f, "{}: OVERFLOW", self.command),
        }
    }
}

/// The one command currently waiting for its terminal line.
#[derive(Debug)]
pub struct PendingCommand {
    command: Command,
    deadline: Millis,
    answer: Answer,
}

impl PendingCommand {
    /// The command being waited on.
    pub fn command(&self) -> &Command {
        &self.command
    }

    /// When the command times out.
    pub fn deadline(&self) -> Millis {
        self.deadline
    }

    fn fail(self, failure: Failure) -> CommandError {
        CommandError {
            command: self.command.text,
            failure,
        }
    }
}

/// What the engine did with a line.
#[derive(Debug, PartialEq, Eq)]
pub enum LineOutcome {
    /// No command is pending; the line belongs to nobody.
    Unclaimed,
    /// The line was added to the pending command's answer.
    Absorbed,
    /// The line resolved the pending command.
    Resolved(Result<Answer, CommandError>),
}

/// Command/response engine with a single pending slot.
#[derive(Debug, Default)]
pub struct CommandEngine {
    pending: Option<PendingCommand>,
}

impl CommandEngine {
    /// Creates an idle engine.
    pub const fn new() -> Self {
        Self { pending: None }
    }

    /// Whether a command is waiting for its terminal line.
    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    /// The pending command, if any.
    pub fn pending(&self) -> Option<&PendingCommand> {
        self.pending.as_ref()
    }

    /// Writes `command` followed by `\r\n` and makes it the pending command.
    ///
    /// # Errors
    ///
    /// * [`Error::Busy`] - another command is still pending; nothing is written
    /// * [`Error::Transport`] - the write failed; no command is left pending
    pub fn send<W: Write + ?Sized>(
        &mut self,
        port: &mut W,
        command: Command,
        now: Millis,
    ) -> Result<(), Error> {
        if self.pending.is_some() {
            return Err(Error::Busy);
        }

        debug!("> {}", command.text());
        network::write_all(port, command.text().as_bytes())?;
        network::write_all(port, TERMINATOR)?;

        self.pending = Some(PendingCommand {
            deadline: now + u64::from(command.timeout_ms),
            command,
            answer: Answer::new(),
        });
        Ok(())
    }

    /// Offers a received line to the pending command.
    pub fn on_line(&mut self, line: &str) -> LineOutcome {
        let Some(pending) = self.pending.as_mut() else {
            return LineOutcome::Unclaimed;
        };

        let kind = ResponseKind::classify(line);
        if kind.is_failure() {
            let rejected = String::try_from(line).unwrap_or_default();
            return self.resolve(Err(Failure::Rejected(rejected)));
        }

        match pending.command.wait_for.as_deref() {
            Some(prefix) if line.starts_with(prefix) => {
                let matched = String::try_from(line).unwrap_or_default();
                return self.resolve(Ok(matched));
            }
            None if kind == ResponseKind::Ok => {
                let answer = core::mem::take(&mut pending.answer);
                return self.resolve(Ok(answer));
            }
            _ => {}
        }

        let appended = if pending.answer.is_empty() {
            pending.answer.push_str(line)
        } else {
            pending
                .answer
                .push('\n')
                .and_then(|_| pending.answer.push_str(line))
        };
        match appended {
            Ok(()) => LineOutcome::Absorbed,
            Err(()) => self.resolve(Err(Failure::Overflow)),
        }
    }

    /// Fails the pending command because the stream ended.
    pub fn on_closed(&mut self) -> Option<Result<Answer, CommandError>> {
        let pending = self.pending.take()?;
        Some(Err(pending.fail(Failure::Closed)))
    }

    /// Fails the pending command if its deadline has passed.
    pub fn on_tick(&mut self, now: Millis) -> Option<Result<Answer, CommandError>> {
        if now < self.pending.as_ref()?.deadline {
            return None;
        }
        let pending = self.pending.take()?;
        Some(Err(pending.fail(Failure::Timeout)))
    }

    /// Drops the pending command without resolving it.
    pub fn abandon(&mut self) -> Option<Command> {
        self.pending.take().map(|p| p.command)
    }

    fn resolve(&mut self, result: Result<Answer, Failure>) -> LineOutcome {
        match self.pending.take() {
            Some(pending) => LineOutcome::Resolved(result.map_err(|f| pending.fail(f))),
            None => LineOutcome::Unclaimed,
        }
    }
}
