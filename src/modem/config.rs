//! Connection options and timing settings.
//!
//! Settings can be built in code or read from a small JSON document:
//!
//! ```rust
//! use nbiot_explorer::modem::Settings;
//!
//! let settings = Settings::from_json(
//!     r#"{"connection":{"band":"B20","apn":"vgesace.nb.iot","operator":"26202"}}"#,
//! ).unwrap();
//! assert_eq!(settings.connection.band.as_str(), "B20");
//! assert_eq!(settings.update_interval_ms, 10_000);
//! ```

use super::error::Error;
use heapless::String;
use serde::{Deserialize, Serialize};

/// Maximum band name length.
pub const MAX_BAND_LEN: usize = 8;
/// Maximum access point name length.
pub const MAX_APN_LEN: usize = 64;
/// Maximum operator code length.
pub const MAX_OPERATOR_LEN: usize = 8;

/// Time between two polling cycles.
pub const DEFAULT_UPDATE_INTERVAL_MS: u32 = 10_000;
/// Time provisioning waits before the first command.
pub const DEFAULT_STARTUP_DELAY_MS: u32 = 1_000;

/// Network the modem should attach to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionOptions {
    /// Radio band name, e.g. `B8`
    pub band: String<MAX_BAND_LEN>,
    /// Access point name of PDP context 1
    pub apn: String<MAX_APN_LEN>,
    /// Numeric operator code (MCC and MNC), e.g. `26201`
    pub operator: String<MAX_OPERATOR_LEN>,
}

impl ConnectionOptions {
    /// Creates connection options, failing with [`Error::Capacity`] if a value is too long.
    pub fn new(band: &str, apn: &str, operator: &str) -> Result<Self, Error> {
        Ok(Self {
            band: String::try_from(band).map_err(|_| Error::Capacity)?,
            apn: String::try_from(apn).map_err(|_| Error::Capacity)?,
            operator: String::try_from(operator).map_err(|_| Error::Capacity)?,
        })
    }

    /// 1NCE on Deutsche Telekom, band 8.
    pub fn one_nce() -> Self {
        Self {
            band: String::try_from("B8").unwrap_or_default(),
            apn: String::try_from("iot.1nce.net").unwrap_or_default(),
            operator: String::try_from("26201").unwrap_or_default(),
        }
    }

    /// Vodafone Germany, band 20.
    pub fn vodafone_de() -> Self {
        Self {
            band: String::try_from("B20").unwrap_or_default(),
            apn: String::try_from("vgesace.nb.iot").unwrap_or_default(),
            operator: String::try_from("26202").unwrap_or_default(),
        }
    }
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self::one_nce()
    }
}

fn default_update_interval() -> u32 {
    DEFAULT_UPDATE_INTERVAL_MS
}

fn default_startup_delay() -> u32 {
    DEFAULT_STARTUP_DELAY_MS
}

/// Everything the explorer needs to know up front.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Network to attach to
    pub connection: ConnectionOptions,
    /// Milliseconds between polling cycles
    #[serde(default = "default_update_interval")]
    pub update_interval_ms: u32,
    /// Milliseconds to wait after `RDY` before provisioning
    #[serde(default = "default_startup_delay")]
    pub startup_delay_ms: u32,
}

impl Settings {
    /// Default timing for the given connection.
    pub fn new(connection: ConnectionOptions) -> Self {
        Self {
            connection,
            update_interval_ms: DEFAULT_UPDATE_INTERVAL_MS,
            startup_delay_ms: DEFAULT_STARTUP_DELAY_MS,
        }
    }

    /// Reads settings from JSON. Timing fields are optional.
    ///
    /// Fails with [`Error::InvalidSettings`] on malformed JSON, values that
    /// do not fit, or a zero update interval.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let (settings, _): (Self, usize) =
            serde_json_core::from_str(json).map_err(|_| Error::InvalidSettings)?;
        if settings.update_interval_ms == 0 {
            return Err(Error::InvalidSettings);
        }
        Ok(settings)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new(ConnectionOptions::default())
    }
}
