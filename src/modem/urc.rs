//! Unsolicited result code dispatcher.
//!
//! Modems print some lines on their own, not in answer to a command. The
//! dispatcher sees every line before the command engine does and hands lines
//! starting with a registered prefix to that prefix's handler.
//!
//! A handler receives the rest of the line after the prefix and an event
//! queue. It returns whatever part of the line should still be treated as
//! ordinary input; a non-empty return is offered to the command engine.
//! Handlers do no I/O themselves. They push [`ModemEvent`]s, which the
//! explorer acts on after dispatch.
//!
//! # Examples
//!
//! ```rust
//! use nbiot_explorer::modem::urc::{Events, ModemEvent, UrcDispatcher};
//!
//! fn on_power_down<'a>(rest: &'a str, events: &mut Events) -> &'a str {
//!     let _ = events.push_back(ModemEvent::PoweredDown);
//!     rest
//! }
//!
//! let mut urcs = UrcDispatcher::with_defaults();
//! urcs.register("POWERED DOWN", on_power_down).unwrap();
//!
//! let mut events = Events::new();
//! assert_eq!(urcs.dispatch("RDY", &mut events), Some(""));
//! assert_eq!(events.pop_front(), Some(ModemEvent::Ready));
//! assert_eq!(urcs.dispatch("+CSQ: 20,99", &mut events), None);
//! ```

use super::error::Error;
use super::response::ResponseKind;
use heapless::{Deque, Vec};

/// Maximum number of registered prefixes.
pub const MAX_URC_HANDLERS: usize = 8;
/// Maximum number of events queued between two explorer passes.
pub const MAX_EVENTS: usize = 4;

/// Something the modem reported on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModemEvent {
    /// The modem finished booting (`RDY`).
    Ready,
    /// The modem announced it is powering down.
    PoweredDown,
}

/// Queue handlers push events into.
pub type Events = Deque<ModemEvent, MAX_EVENTS>;

/// Handler signature: remainder after the prefix in, remainder to republish out.
pub type UrcHandler = for<'a> fn(&'a str, &mut Events) -> &'a str;

/// Built-in handler for `RDY`.
pub fn on_ready<'a>(rest: &'a str, events: &mut Events) -> &'a str {
    if events.push_back(ModemEvent::Ready).is_err() {
        warn!("event queue full, RDY dropped");
    }
    rest
}

/// Prefix registry, matched in registration order.
#[derive(Debug, Default)]
pub struct UrcDispatcher {
    handlers: Vec<(&'static str, UrcHandler), MAX_URC_HANDLERS>,
}

impl UrcDispatcher {
    /// Creates a dispatcher with no handlers.
    pub const fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    /// Creates a dispatcher with the `RDY` handler registered.
    pub fn with_defaults() -> Self {
        let mut dispatcher = Self::new();
        // The registry is empty, so the first registration always fits.
        let _ = dispatcher.register(ResponseKind::READY, on_ready);
        dispatcher
    }

    /// Registers a handler for lines starting with `prefix`.
    ///
    /// Returns [`Error::Capacity`] when [`MAX_URC_HANDLERS`] are already registered.
    pub fn register(&mut self, prefix: &'static str, handler: UrcHandler) -> Result<(), Error> {
        self.handlers
            .push((prefix, handler))
            .map_err(|_| Error::Capacity)
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether no handler is registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Runs the first handler whose prefix matches `line`.
    ///
    /// Returns `None` if no prefix matched, so the whole line goes to the
    /// command engine, otherwise the remainder the handler republished.
    pub fn dispatch<'a>(&self, line: &'a str, events: &mut Events) -> Option<&'a str> {
        self.handlers.iter().find_map(|&(prefix, handler)| {
            let rest = line.strip_prefix(prefix)?;
            trace!("urc {=str}", prefix);
            Some(handler(rest, events))
        })
    }
}
