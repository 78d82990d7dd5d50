//! The telemetry record shown on the display.
//!
//! Each `apply_*` method converts everything it needs first and only then
//! assigns, so a value that does not fit leaves the whole record as it was.

use super::error::{Error, ParseError};
use super::response::{CellId, NetworkInfo, Registration, ServiceProvider, SignalQuality};
use super::tables;
use crate::gps::GnssFix;
use core::fmt::Write as _;
use heapless::String;
use serde::Serialize;

/// Latest parsed telemetry.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct NetworkState {
    /// First phrase of the registration status, e.g. `Registered`
    pub status_primary: String<16>,
    /// Second phrase of the registration status, e.g. `Home-Network`
    pub status_secondary: String<16>,
    /// RSSI descriptor, e.g. `-73dBm (20)`
    pub rssi: String<{ tables::MAX_RSSI_LEN }>,
    /// Raw RSSI code
    pub rssi_code: u32,
    /// Operator code of the serving network
    pub operator: String<8>,
    /// Band text, e.g. `LTE BAND 8`
    pub band: String<16>,
    /// Channel number
    pub channel: String<8>,
    /// Tracking area code
    pub tracking_area_code: String<8>,
    /// Cell id in hex with an `h` suffix
    pub cell_id: String<12>,
    /// eNodeB id decoded from the cell id
    pub enodeb_id: Option<u32>,
    /// Sector decoded from the cell id
    pub sector: Option<u8>,
    /// Access technology name
    pub access_technology: &'static str,
    /// Address of PDP context 1
    pub ip_address: String<64>,
    /// Full network name
    pub network_name: String<32>,
    /// Service provider name
    pub provider_name: String<32>,
    /// Registered PLMN
    pub rplmn: String<8>,
    /// Mobile country code
    pub mcc: String<4>,
    /// Mobile network code
    pub mnc: String<4>,
    /// GNSS time, `HH:MM:SS`
    pub time_utc: String<8>,
    /// GNSS date, `YYYY-MM-DD`
    pub date: String<12>,
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// Elevation with unit, e.g. `545.4m`
    pub elevation: String<16>,
    /// Satellites used for the fix
    pub satellites: u8,
}

fn text<const N: usize>(value: &str, name: &'static str) -> Result<String<N>, ParseError> {
    String::try_from(value).map_err(|_| ParseError::TooLong(name))
}

fn display<const N: usize>(
    value: impl core::fmt::Display,
    name: &'static str,
) -> Result<String<N>, ParseError> {
    let mut out = String::new();
    write!(out, "{}", value).map_err(|_| ParseError::TooLong(name))?;
    Ok(out)
}

impl NetworkState {
    /// Stores the status phrases for a registration status code.
    pub fn apply_registration_status(&mut self, status: u8) -> Result<(), ParseError> {
        let status_text = tables::registration_status(status)
            .ok_or(ParseError::UnknownCode("registration status"))?;
        let (primary, secondary) = tables::status_phrases(status_text);
        self.status_primary = text(primary, "status")?;
        self.status_secondary = text(secondary, "status")?;
        Ok(())
    }

    /// Stores tracking area, cell and access technology of a registered modem.
    pub fn apply_cell(&mut self, registration: &Registration<'_>) -> Result<(), ParseError> {
        let tac = registration
            .tracking_area_code
            .ok_or(ParseError::MissingField("tracking area code"))?;
        let cell = registration
            .cell_id
            .ok_or(ParseError::MissingField("cell id"))?;
        let act = registration
            .access_technology
            .ok_or(ParseError::MissingField("access technology"))?;

        let tracking_area_code = text(tac, "tracking area code")?;
        let mut cell_id: String<12> = text(cell, "cell id")?;
        cell_id.push('h').map_err(|_| ParseError::TooLong("cell id"))?;
        let decoded = CellId::parse(cell)?;

        self.tracking_area_code = tracking_area_code;
        self.cell_id = cell_id;
        self.access_technology = tables::access_technology(act);
        self.enodeb_id = Some(decoded.enodeb);
        self.sector = Some(decoded.sector);
        Ok(())
    }

    /// Stores the PDP context address.
    pub fn apply_pdp_address(&mut self, address: &str) -> Result<(), ParseError> {
        self.ip_address = text(address, "ip address")?;
        Ok(())
    }

    /// Stores the RSSI code and its descriptor.
    pub fn apply_signal_quality(&mut self, signal: SignalQuality) {
        self.rssi = tables::rssi_descriptor(signal.rssi);
        self.rssi_code = signal.rssi;
    }

    /// Stores operator, band and channel.
    pub fn apply_network_info(&mut self, info: &NetworkInfo<'_>) -> Result<(), ParseError> {
        let operator = text(info.operator, "operator")?;
        let band = text(info.band, "band")?;
        let channel = text(info.channel, "channel")?;

        self.operator = operator;
        self.band = band;
        self.channel = channel;
        Ok(())
    }

    /// Stores network and provider names and the registered PLMN.
    pub fn apply_service_provider(&mut self, provider: &ServiceProvider<'_>) -> Result<(), ParseError> {
        let network_name = text(provider.network_name, "network name")?;
        let provider_name = text(provider.provider_name, "provider name")?;
        let rplmn = text(provider.rplmn, "rplmn")?;
        let mcc = text(provider.mcc, "mcc")?;
        let mnc = text(provider.mnc, "mnc")?;

        self.network_name = network_name;
        self.provider_name = provider_name;
        self.rplmn = rplmn;
        self.mcc = mcc;
        self.mnc = mnc;
        Ok(())
    }

    /// Stores a GNSS fix.
    pub fn apply_gnss_fix(&mut self, fix: &GnssFix<'_>) -> Result<(), ParseError> {
        let time_utc = display(fix.time, "time")?;
        let date = display(fix.date, "date")?;
        let mut elevation: String<16> = text(fix.altitude, "elevation")?;
        elevation.push('m').map_err(|_| ParseError::TooLong("elevation"))?;

        self.time_utc = time_utc;
        self.date = date;
        self.latitude = fix.latitude;
        self.longitude = fix.longitude;
        self.elevation = elevation;
        self.satellites = fix.satellites;
        Ok(())
    }

    /// Clears the GNSS fields while no fix is available.
    pub fn reset_gnss(&mut self) {
        self.time_utc.clear();
        self.date.clear();
        self.latitude = 0.0;
        self.longitude = 0.0;
        self.elevation.clear();
        // "0m" always fits.
        let _ = self.elevation.push_str("0m");
        self.satellites = 0;
    }

    /// Serializes the record as JSON into `buf` and returns the length written.
    pub fn to_json(&self, buf: &mut [u8]) -> Result<usize, Error> {
        serde_json_core::to_slice(self, buf).map_err(|_| Error::Capacity)
    }
}
