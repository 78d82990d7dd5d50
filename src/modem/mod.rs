//! # NB-IoT Modem Session Engine
//!
//! This module drives a Quectel BG96 class modem over its AT-command serial
//! interface. It is built as a set of small, non-blocking state machines that
//! are pumped by [`Explorer::poll`]:
//!
//! ```text
//! ┌─────────────┐    ┌──────────────┐    ┌──────────────────┐
//! │ LineReader  │───▶│ UrcDispatcher│───▶│  CommandEngine   │
//! │ (bytes →    │    │ (RDY, ...)   │    │ (one pending     │
//! │  lines)     │    │              │    │  command)        │
//! └─────────────┘    └──────┬───────┘    └────────┬─────────┘
//!                           │ ModemEvent          │ completion
//!                           ▼                     ▼
//!                    ┌──────────────────────────────────────┐
//!                    │ Explorer: Provisioner / Poller jobs,  │
//!                    │ timers, NetworkState, Renderer        │
//!                    └──────────────────────────────────────┘
//! ```
//!
//! Nothing here blocks. A sequencer hands the driver an [`Action`]; the
//! driver writes the command, and when the engine resolves it the outcome is
//! fed back into the sequencer, which returns the next action.
//!
//! ## Example
//!
//! ```rust,no_run
//! use nbiot_explorer::display::{Renderer, Screen};
//! use nbiot_explorer::modem::{ConnectionOptions, Explorer, NetworkState, Settings};
//! # use nbiot_explorer::network::{Close, Connection, Read, Write, error::Error};
//! # struct Uart;
//! # impl Connection for Uart {}
//! # impl Read for Uart {
//! #     type Error = Error;
//! #     fn read(&mut self, _buf: &mut [u8]) -> Result<usize, Self::Error> { Ok(0) }
//! # }
//! # impl Write for Uart {
//! #     type Error = Error;
//! #     fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> { Ok(buf.len()) }
//! #     fn flush(&mut self) -> Result<(), Self::Error> { Ok(()) }
//! # }
//! # impl Close for Uart {
//! #     type Error = Error;
//! #     fn close(self) -> Result<(), Self::Error> { Ok(()) }
//! # }
//! # fn millis() -> u64 { 0 }
//!
//! struct Lcd;
//!
//! impl Renderer for Lcd {
//!     fn render(&mut self, screen: &Screen, state: &NetworkState) {
//!         // draw screen.title and each row here
//!     }
//! }
//!
//! let settings = Settings::new(ConnectionOptions::one_nce());
//! let mut explorer = Explorer::new(Uart, Lcd, settings);
//!
//! loop {
//!     // Provisioning starts on its own once the modem prints "RDY".
//!     let _ = explorer.poll(millis());
//! #   break;
//! }
//! ```

pub mod command;
pub mod config;
pub mod error;
pub mod explorer;
pub mod line;
pub mod poll;
pub mod provision;
pub mod response;
pub mod state;
pub mod tables;
pub mod urc;

pub use command::{Answer, Command, CommandEngine, CommandError, Failure};
pub use config::{ConnectionOptions, Settings};
pub use error::{Error, ParseError};
pub use explorer::Explorer;
pub use line::{Line, LineReader};
pub use poll::{PollStep, Poller};
pub use provision::{ProvisionStep, Provisioner};
pub use response::ResponseKind;
pub use state::NetworkState;
pub use urc::{ModemEvent, UrcDispatcher};

/// Monotonic time in milliseconds, supplied by the caller of
/// [`Explorer::poll`].
pub type Millis = u64;

/// What a sequencer wants the driver to do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Write the command and report its outcome back to the sequencer.
    Send(Command),
    /// Report back with an empty answer after the given number of milliseconds.
    Wait(u32),
    /// The sequence is over.
    Done(Result<(), Error>),
}
