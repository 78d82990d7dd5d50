//! Lookup tables for configuration values and response codes.

use core::fmt::Write as _;
use heapless::String;

/// Radio band names and the hex mask `AT+QCFG="band"` expects for them.
pub const BANDS: [(&str, &str); 13] = [
    ("B1", "1"),
    ("B2", "2"),
    ("B3", "4"),
    ("B4", "8"),
    ("B5", "10"),
    ("B8", "80"),
    ("B12", "800"),
    ("B13", "1000"),
    ("B18", "20000"),
    ("B19", "40000"),
    ("B20", "80000"),
    ("B26", "2000000"),
    ("B28", "8000000"),
];

/// `+CEREG` status codes. The text is shown on two rows, split at the first space.
pub const REGISTRATION_STATUS: [(u8, &str); 6] = [
    (0, "Not registered"),
    (1, "Registered Home-Network"),
    (2, "Searching"),
    (3, "Registration denied"),
    (4, "Unknown"),
    (5, "Registered Roaming"),
];

/// `+CEREG` access technology codes.
pub const ACCESS_TECHNOLOGY: [(u8, &str); 3] = [(0, "GSM"), (8, "LTE Cat M1"), (9, "LTE Cat NB1")];

/// Longest RSSI descriptor, e.g. `"Invalid (4294967295)"`.
pub const MAX_RSSI_LEN: usize = 24;

/// Looks up the band mask for a band name such as `"B8"`.
pub fn band_mask(band: &str) -> Option<&'static str> {
    BANDS
        .iter()
        .find(|(name, _)| *name == band)
        .map(|&(_, mask)| mask)
}

/// Looks up the status text for a registration status code.
pub fn registration_status(code: u8) -> Option<&'static str> {
    REGISTRATION_STATUS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|&(_, text)| text)
}

/// Splits a status text into its two display phrases.
///
/// ```rust
/// use nbiot_explorer::modem::tables::status_phrases;
///
/// assert_eq!(status_phrases("Registered Home-Network"), ("Registered", "Home-Network"));
/// assert_eq!(status_phrases("Searching"), ("Searching", ""));
/// ```
pub fn status_phrases(text: &str) -> (&str, &str) {
    text.split_once(' ').unwrap_or((text, ""))
}

/// Name of an access technology code, `"Unknown"` if not in the table.
pub fn access_technology(code: u8) -> &'static str {
    ACCESS_TECHNOLOGY
        .iter()
        .find(|(c, _)| *c == code)
        .map(|&(_, name)| name)
        .unwrap_or("Unknown")
}

/// Formats a raw `+CSQ` RSSI code for display.
pub fn rssi_descriptor(code: u32) -> String<MAX_RSSI_LEN> {
    let mut text = String::new();
    // Every branch fits MAX_RSSI_LEN.
    let _ = match code {
        0 => write!(text, "< -113dBm (0)"),
        31 => write!(text, "> -51dBm (31)"),
        1..=30 => write!(text, "{}dBm ({})", (code as i32 - 1) * 2 - 111, code),
        99 => write!(text, "Unknown (99)"),
        _ => write!(text, "Invalid ({})", code),
    };
    text
}
