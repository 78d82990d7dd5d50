//! Screen model for a small text display.
//!
//! The explorer shows one [`Screen`] at a time: a title and a few labelled
//! rows, each bound to a [`Field`] of the [`NetworkState`]. Drawing is left to
//! a [`Renderer`] implementation, so any display driver can be plugged in.
//!
//! ```rust
//! use nbiot_explorer::display::{field_text, Renderer, Screen, ScreenCursor};
//! use nbiot_explorer::modem::NetworkState;
//!
//! struct Console;
//!
//! impl Renderer for Console {
//!     fn render(&mut self, screen: &Screen, state: &NetworkState) {
//!         println!("== {} ==", screen.title);
//!         for row in screen.rows {
//!             println!("{:<12}{}", row.label, field_text(state, row.field));
//!         }
//!     }
//! }
//!
//! let mut cursor = ScreenCursor::new();
//! cursor.back();
//! Console.render(cursor.current(), &NetworkState::default());
//! assert_eq!(cursor.current().title, "Date and Time");
//! ```

use crate::modem::NetworkState;
use core::fmt::Write as _;
use heapless::String;

/// Longest text [`field_text`] produces.
pub const MAX_FIELD_TEXT: usize = 64;

/// A value of the [`NetworkState`] that can be shown in a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// Full network name
    NetworkName,
    /// Registered PLMN
    Rplmn,
    /// Service provider name
    ProviderName,
    /// First registration status phrase
    StatusPrimary,
    /// Second registration status phrase
    StatusSecondary,
    /// RSSI descriptor
    Rssi,
    /// Tracking area code
    TrackingAreaCode,
    /// Cell id with `h` suffix
    CellId,
    /// eNodeB id, empty until known
    EnodebId,
    /// Sector, empty until known
    Sector,
    /// Access technology name
    AccessTechnology,
    /// Band text
    Band,
    /// Channel number
    Channel,
    /// PDP context address
    IpAddress,
    /// Longitude in degrees
    Longitude,
    /// Latitude in degrees
    Latitude,
    /// Elevation with unit
    Elevation,
    /// Satellites in use
    Satellites,
    /// GNSS date
    Date,
    /// GNSS time
    TimeUtc,
}

/// One labelled row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Row {
    /// Label drawn left of the value, may be empty
    pub label: &'static str,
    /// Value drawn right of the label
    pub field: Field,
}

/// A titled page of rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Screen {
    /// Title line
    pub title: &'static str,
    /// Rows below the title
    pub rows: &'static [Row],
}

const fn row(label: &'static str, field: Field) -> Row {
    Row { label, field }
}

/// All screens in navigation order.
pub static SCREENS: [Screen; 7] = [
    Screen {
        title: "Registered Network",
        rows: &[
            row("Network", Field::NetworkName),
            row("RPLMN", Field::Rplmn),
            row("Provider", Field::ProviderName),
        ],
    },
    Screen {
        title: "Registration Status",
        rows: &[
            row("Status", Field::StatusPrimary),
            row("", Field::StatusSecondary),
            row("RSSI", Field::Rssi),
        ],
    },
    Screen {
        title: "Cell Information",
        rows: &[
            row("TAC", Field::TrackingAreaCode),
            row("Cell ID", Field::CellId),
            row("eNB ID", Field::EnodebId),
            row("Sector", Field::Sector),
        ],
    },
    Screen {
        title: "Network Information",
        rows: &[
            row("Access", Field::AccessTechnology),
            row("Band", Field::Band),
            row("Channel", Field::Channel),
        ],
    },
    Screen {
        title: "IP Address",
        rows: &[row("Address", Field::IpAddress)],
    },
    Screen {
        title: "Geo Position",
        rows: &[
            row("Longitude", Field::Longitude),
            row("Latitude", Field::Latitude),
            row("Elevation", Field::Elevation),
            row("Satellites", Field::Satellites),
        ],
    },
    Screen {
        title: "Date and Time",
        rows: &[row("Date", Field::Date), row("Time (UTC)", Field::TimeUtc)],
    },
];

/// Draws screens.
pub trait Renderer {
    /// Draws `screen` with values from `state`.
    fn render(&mut self, screen: &Screen, state: &NetworkState);
}

/// Formats one field for display.
pub fn field_text(state: &NetworkState, field: Field) -> String<MAX_FIELD_TEXT> {
    let mut out = String::new();
    // Every field is at most MAX_FIELD_TEXT long.
    let _ = match field {
        Field::NetworkName => out.write_str(&state.network_name),
        Field::Rplmn => out.write_str(&state.rplmn),
        Field::ProviderName => out.write_str(&state.provider_name),
        Field::StatusPrimary => out.write_str(&state.status_primary),
        Field::StatusSecondary => out.write_str(&state.status_secondary),
        Field::Rssi => out.write_str(&state.rssi),
        Field::TrackingAreaCode => out.write_str(&state.tracking_area_code),
        Field::CellId => out.write_str(&state.cell_id),
        Field::EnodebId => match state.enodeb_id {
            Some(id) => write!(out, "{}", id),
            None => Ok(()),
        },
        Field::Sector => match state.sector {
            Some(sector) => write!(out, "{}", sector),
            None => Ok(()),
        },
        Field::AccessTechnology => out.write_str(state.access_technology),
        Field::Band => out.write_str(&state.band),
        Field::Channel => out.write_str(&state.channel),
        Field::IpAddress => out.write_str(&state.ip_address),
        Field::Longitude => write!(out, "{}", state.longitude),
        Field::Latitude => write!(out, "{}", state.latitude),
        Field::Elevation => out.write_str(&state.elevation),
        Field::Satellites => write!(out, "{}", state.satellites),
        Field::Date => out.write_str(&state.date),
        Field::TimeUtc => out.write_str(&state.time_utc),
    };
    out
}

/// Index of the screen on display, wrapping at both ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScreenCursor {
    index: usize,
}

impl ScreenCursor {
    /// Starts at the first screen.
    pub const fn new() -> Self {
        Self { index: 0 }
    }

    /// Position in [`SCREENS`].
    pub fn index(&self) -> usize {
        self.index
    }

    /// The screen on display.
    pub fn current(&self) -> &'static Screen {
        &SCREENS[self.index % SCREENS.len()]
    }

    /// Moves forward, from the last screen to the first.
    pub fn forward(&mut self) -> &'static Screen {
        self.index = (self.index + 1) % SCREENS.len();
        self.current()
    }

    /// Moves back, from the first screen to the last.
    pub fn back(&mut self) -> &'static Screen {
        self.index = self.index.checked_sub(1).unwrap_or(SCREENS.len() - 1);
        self.current()
    }
}
