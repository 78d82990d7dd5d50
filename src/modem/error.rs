//! Error types for the modem session.

use super::command::CommandError;
use super::config::MAX_BAND_LEN;
use crate::gps::GnssError;
use crate::network;
use heapless::String;

/// Top-level error of the modem session.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Error {
    /// A command failed: timeout, `ERROR`/`+CME ERROR`, or end of stream.
    Command(CommandError),
    /// A command was issued while another one was still pending.
    Busy,
    /// The configured radio band is not in the band table.
    UnknownBand(String<MAX_BAND_LEN>),
    /// The settings document could not be read.
    InvalidSettings,
    /// A response did not have the expected shape.
    Parse(ParseError),
    /// The transport failed.
    Transport(network::error::Error),
    /// A fixed-size buffer was too small.
    Capacity,
}

/// Reasons a response could not be parsed.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ParseError {
    /// No line with the expected prefix was found in the answer.
    MissingResponse(&'static str),
    /// The response had fewer fields than expected.
    MissingField(&'static str),
    /// A field could not be converted.
    InvalidField(&'static str),
    /// A numeric code is not in the lookup table.
    UnknownCode(&'static str),
    /// The value does not fit the state record.
    TooLong(&'static str),
    /// The GNSS fix could not be parsed.
    Gnss(GnssError),
}

impl From<CommandError> for Error {
    fn from(e: CommandError) -> Self {
        Error::Command(e)
    }
}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        Error::Parse(e)
    }
}

impl From<GnssError> for ParseError {
    fn from(e: GnssError) -> Self {
        ParseError::Gnss(e)
    }
}

impl From<network::error::Error> for Error {
    fn from(e: network::error::Error) -> Self {
        Error::Transport(e)
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Command(e) => write!(f, "{}", e),
            Error::Busy => f.write_str("another command is pending"),
            Error::UnknownBand(band) => write!(f, "Unknown band: {}", band),
            Error::InvalidSettings => f.write_str("invalid settings"),
            Error::Parse(e) => write!(f, "{}", e),
            Error::Transport(e) => write!(f, "transport: {}", e),
            Error::Capacity => f.write_str("buffer too small"),
        }
    }
}

impl core::fmt::Display for ParseError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ParseError::MissingResponse(what) => write!(f, "no {} response", what),
            ParseError::MissingField(what) => write!(f, "missing {}", what),
            ParseError::InvalidField(what) => write!(f, "invalid {}", what),
            ParseError::UnknownCode(what) => write!(f, "unknown {}", what),
            ParseError::TooLong(what) => write!(f, "{} too long", what),
            ParseError::Gnss(e) => write!(f, "gnss: {:?}", e),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Error::Command(e) => defmt::write!(f, "Command({})", e),
            Error::Busy => defmt::write!(f, "Busy"),
            Error::UnknownBand(band) => defmt::write!(f, "UnknownBand({})", band),
            Error::InvalidSettings => defmt::write!(f, "InvalidSettings"),
            Error::Parse(e) => defmt::write!(f, "Parse({})", e),
            Error::Transport(e) => defmt::write!(f, "Transport({})", e),
            Error::Capacity => defmt::write!(f, "Capacity"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ParseError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            ParseError::MissingResponse(what) => defmt::write!(f, "MissingResponse({=str})", what),
            ParseError::MissingField(what) => defmt::write!(f, "MissingField({=str})", what),
            ParseError::InvalidField(what) => defmt::write!(f, "InvalidField({=str})", what),
            ParseError::UnknownCode(what) => defmt::write!(f, "UnknownCode({=str})", what),
            ParseError::TooLong(what) => defmt::write!(f, "TooLong({=str})", what),
            ParseError::Gnss(e) => defmt::write!(f, "Gnss({})", e),
        }
    }
}
