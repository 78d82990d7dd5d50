//! Response classification and typed response parsers.
//!
//! Every line the modem sends is mapped to a [`ResponseKind`] by one ordered
//! matcher. The parsers below take the answer of a query command (one or
//! more lines joined with `\n`) and extract the fields of the line carrying
//! the expected prefix.

use super::error::ParseError;
use crate::gps::{GnssFix, GnssParser};
use heapless::Vec;

/// Upper bound on comma separated fields looked at in one response.
pub const MAX_FIELDS: usize = 12;

/// Kind of a received line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    /// `OK`
    Ok,
    /// `ERROR`
    Error,
    /// `+CME ERROR: <code>`
    CmeError,
    /// `RDY`, printed once the modem has booted
    Ready,
    /// `+CEREG:` EPS registration status
    Registration,
    /// `+CGPADDR:` PDP address
    PdpAddress,
    /// `+CSQ:` signal quality
    SignalQuality,
    /// `+QNWINFO:` serving network information
    NetworkInfo,
    /// `+QSPN:` service provider name
    ServiceProvider,
    /// `+QGPSLOC:` GNSS position
    GnssLocation,
    /// `+QGPS:` GNSS power state
    GnssPower,
    /// Anything else
    Other,
}

impl ResponseKind {
    /// Success token.
    pub const OK: &'static str = "OK";
    /// Generic failure token.
    pub const ERROR: &'static str = "ERROR";
    /// Structured failure prefix.
    pub const CME_ERROR: &'static str = "+CME ERROR";
    /// Boot notification.
    pub const READY: &'static str = "RDY";

    // Checked in order; the first matching prefix wins.
    const PREFIXES: [(&'static str, ResponseKind); 9] = [
        (Self::CME_ERROR, ResponseKind::CmeError),
        ("+CEREG:", ResponseKind::Registration),
        ("+CGPADDR:", ResponseKind::PdpAddress),
        ("+CSQ:", ResponseKind::SignalQuality),
        ("+QNWINFO:", ResponseKind::NetworkInfo),
        ("+QSPN:", ResponseKind::ServiceProvider),
        ("+QGPSLOC:", ResponseKind::GnssLocation),
        ("+QGPS:", ResponseKind::GnssPower),
        (Self::READY, ResponseKind::Ready),
    ];

    /// Classifies a line.
    pub fn classify(line: &str) -> Self {
        match line {
            Self::OK => return ResponseKind::Ok,
            Self::ERROR => return ResponseKind::Error,
            _ => {}
        }
        Self::PREFIXES
            .iter()
            .find(|(prefix, _)| line.starts_with(prefix))
            .map(|&(_, kind)| kind)
            .unwrap_or(ResponseKind::Other)
    }

    /// The line prefix of this kind, if it has one.
    pub fn prefix(self) -> Option<&'static str> {
        match self {
            ResponseKind::Ok => Some(Self::OK),
            ResponseKind::Error => Some(Self::ERROR),
            ResponseKind::Other => None,
            kind => Self::PREFIXES
                .iter()
                .find(|&&(_, k)| k == kind)
                .map(|&(prefix, _)| prefix),
        }
    }

    /// Whether a line of this kind fails the pending command.
    pub fn is_failure(self) -> bool {
        matches!(self, ResponseKind::Error | ResponseKind::CmeError)
    }
}

/// Finds the first line of `kind` in `answer` and returns what follows its prefix.
pub fn payload(answer: &str, kind: ResponseKind) -> Result<&str, ParseError> {
    let prefix = kind.prefix().ok_or(ParseError::MissingResponse("prefix"))?;
    payloads(answer, prefix)
        .next()
        .ok_or(ParseError::MissingResponse(prefix))
}

fn payloads<'a>(answer: &'a str, prefix: &'static str) -> impl Iterator<Item = &'a str> {
    answer
        .lines()
        .filter_map(move |line| line.trim().strip_prefix(prefix))
        .map(str::trim_start)
}

/// Splits a payload on commas.
pub fn fields(payload: &str) -> Vec<&str, MAX_FIELDS> {
    payload.split(',').map(str::trim).take(MAX_FIELDS).collect()
}

/// Removes one pair of surrounding double quotes, if present.
pub fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

fn field<'a>(fields: &[&'a str], index: usize, name: &'static str) -> Result<&'a str, ParseError> {
    fields
        .get(index)
        .copied()
        .ok_or(ParseError::MissingField(name))
}

/// `+CEREG: <n>,<stat>[,<tac>,<ci>[,<AcT>]]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registration<'a> {
    /// Registration status code
    pub status: u8,
    /// Tracking area code, unquoted
    pub tracking_area_code: Option<&'a str>,
    /// Cell id in hex, unquoted
    pub cell_id: Option<&'a str>,
    /// Access technology code
    pub access_technology: Option<u8>,
}

impl Registration<'_> {
    /// Whether the modem is neither registered nor done searching, so a manual
    /// registration request is due.
    pub fn needs_registration(&self) -> bool {
        matches!(self.status, 0 | 2)
    }
}

/// Parses the answer of `AT+CEREG?`.
///
/// Unsolicited `+CEREG: <stat>[,<tac>,<ci>[,<AcT>]]` notifications caught in
/// the answer are skipped: the query form always has an unquoted status in
/// its second field.
pub fn parse_registration(answer: &str) -> Result<Registration<'_>, ParseError> {
    let prefix = ResponseKind::Registration
        .prefix()
        .ok_or(ParseError::MissingResponse("prefix"))?;
    let items = payloads(answer, prefix)
        .map(fields)
        .find(|items| items.get(1).is_some_and(|stat| !stat.starts_with('"')))
        .ok_or(ParseError::MissingResponse(prefix))?;
    let status = field(&items, 1, "registration status")?
        .parse()
        .map_err(|_| ParseError::InvalidField("registration status"))?;
    let access_technology = match items.get(4) {
        Some(code) => Some(
            code.parse()
                .map_err(|_| ParseError::InvalidField("access technology"))?,
        ),
        None => None,
    };

    Ok(Registration {
        status,
        tracking_area_code: items.get(2).copied().map(unquote),
        cell_id: items.get(3).copied().map(unquote),
        access_technology,
    })
}

/// An LTE cell id split into eNodeB id and sector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellId {
    /// All but the low two hex digits
    pub enodeb: u32,
    /// The low two hex digits
    pub sector: u8,
}

impl CellId {
    /// Splits a hex cell id such as `"1A2B"` into eNodeB `0x1A` and sector `0x2B`.
    pub fn parse(hex: &str) -> Result<Self, ParseError> {
        if hex.len() <= 2 || !hex.is_ascii() {
            return Err(ParseError::InvalidField("cell id"));
        }
        let (high, low) = hex.split_at(hex.len() - 2);
        Ok(Self {
            enodeb: u32::from_str_radix(high, 16)
                .map_err(|_| ParseError::InvalidField("cell id"))?,
            sector: u8::from_str_radix(low, 16).map_err(|_| ParseError::InvalidField("cell id"))?,
        })
    }
}

/// Parses the answer of `AT+CGPADDR=1` into the address of the context.
pub fn parse_pdp_address(answer: &str) -> Result<&str, ParseError> {
    let items = fields(payload(answer, ResponseKind::PdpAddress)?);
    field(&items, 1, "ip address").map(unquote)
}

/// `+CSQ: <rssi>,<ber>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalQuality {
    /// Raw RSSI code (0-31, 99), anything else is out of range
    pub rssi: u32,
    /// Raw bit error rate code, 99 if unknown
    pub ber: u8,
}

/// Parses the answer of `AT+CSQ`.
pub fn parse_signal_quality(answer: &str) -> Result<SignalQuality, ParseError> {
    let items = fields(payload(answer, ResponseKind::SignalQuality)?);
    Ok(SignalQuality {
        rssi: field(&items, 0, "rssi")?
            .parse()
            .map_err(|_| ParseError::InvalidField("rssi"))?,
        ber: items.get(1).and_then(|v| v.parse().ok()).unwrap_or(99),
    })
}

/// `+QNWINFO: <access>,<operator>,<band>,<channel>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkInfo<'a> {
    /// Access technology text, e.g. `CAT-NB1`
    pub access: &'a str,
    /// Operator code, e.g. `26201`
    pub operator: &'a str,
    /// Band text, e.g. `LTE BAND 8`
    pub band: &'a str,
    /// Channel number as reported
    pub channel: &'a str,
}

/// Parses the answer of `AT+QNWINFO`.
pub fn parse_network_info(answer: &str) -> Result<NetworkInfo<'_>, ParseError> {
    let items = fields(payload(answer, ResponseKind::NetworkInfo)?);
    Ok(NetworkInfo {
        access: unquote(field(&items, 0, "access technology")?),
        operator: unquote(field(&items, 1, "operator")?),
        band: unquote(field(&items, 2, "band")?),
        channel: field(&items, 3, "channel")?,
    })
}

/// `+QSPN: <fnn>,<snn>,<spn>,<alphabet>,<rplmn>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceProvider<'a> {
    /// Full network name
    pub network_name: &'a str,
    /// Short network name
    pub short_name: &'a str,
    /// Service provider name
    pub provider_name: &'a str,
    /// Registered PLMN
    pub rplmn: &'a str,
    /// Mobile country code, first three digits of the PLMN
    pub mcc: &'a str,
    /// Mobile network code, next two digits of the PLMN
    pub mnc: &'a str,
}

/// Parses the answer of `AT+QSPN`.
pub fn parse_service_provider(answer: &str) -> Result<ServiceProvider<'_>, ParseError> {
    let items = fields(payload(answer, ResponseKind::ServiceProvider)?);
    let rplmn = unquote(field(&items, 4, "rplmn")?);
    let mcc = rplmn.get(..3).ok_or(ParseError::InvalidField("rplmn"))?;
    let mnc = rplmn
        .get(3..rplmn.len().min(5))
        .ok_or(ParseError::InvalidField("rplmn"))?;

    Ok(ServiceProvider {
        network_name: unquote(field(&items, 0, "network name")?),
        short_name: unquote(field(&items, 1, "short name")?),
        provider_name: unquote(field(&items, 2, "provider name")?),
        rplmn,
        mcc,
        mnc,
    })
}

/// Parses the answer of `AT+QGPS?`; `true` when GNSS is powered on.
pub fn parse_gnss_power(answer: &str) -> Result<bool, ParseError> {
    let items = fields(payload(answer, ResponseKind::GnssPower)?);
    match field(&items, 0, "gnss state")? {
        "0" => Ok(false),
        "1" => Ok(true),
        _ => Err(ParseError::InvalidField("gnss state")),
    }
}

/// Parses the answer of `AT+QGPSLOC=2`. An empty answer means no fix yet.
pub fn parse_gnss_location(answer: &str) -> Result<Option<GnssFix<'_>>, ParseError> {
    if answer.trim().is_empty() {
        return Ok(None);
    }
    let report = payload(answer, ResponseKind::GnssLocation)?;
    Ok(Some(GnssParser::parse_location(report)?))
}
