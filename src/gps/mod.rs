//! GNSS fix parser
//!
//! This module parses the position report the modem returns for
//! `AT+QGPSLOC=2`, where coordinates are signed decimal degrees:
//!
//! ```text
//! +QGPSLOC: <UTC>,<latitude>,<longitude>,<hdop>,<altitude>,<fix>,<cog>,<spkm>,<spkn>,<date>,<nsat>
//! +QGPSLOC: 132413.0,48.11730,11.51667,1.2,545.4,3,0.00,0.0,0.0,160919,07
//! ```

use core::fmt;

/// Number of comma separated fields in a mode 2 report.
pub const LOCATION_FIELDS: usize = 11;

/// Time of fix in UTC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UtcTime {
    /// Hour (0-23)
    pub hour: u8,
    /// Minute (0-59)
    pub minute: u8,
    /// Second (0-59)
    pub second: u8,
}

impl fmt::Display for UtcTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hour, self.minute, self.second)
    }
}

/// Date of fix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixDate {
    /// Day of month (1-31)
    pub day: u8,
    /// Month (1-12)
    pub month: u8,
    /// Year (4-digit)
    pub year: u16,
}

impl Default for FixDate {
    fn default() -> Self {
        Self {
            day: 1,
            month: 1,
            year: 2000,
        }
    }
}

impl fmt::Display for FixDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// A parsed position report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GnssFix<'a> {
    /// UTC time of the fix
    pub time: UtcTime,
    /// Latitude in decimal degrees, negative south of the equator
    pub latitude: f64,
    /// Longitude in decimal degrees, negative west of Greenwich
    pub longitude: f64,
    /// Horizontal dilution of precision
    pub hdop: f32,
    /// Altitude above sea level in meters, as reported
    pub altitude: &'a str,
    /// Fix mode (2 = 2D, 3 = 3D)
    pub fix_mode: u8,
    /// Course over ground in degrees
    pub course: f32,
    /// Speed over ground in km/h
    pub speed_kmh: f32,
    /// Speed over ground in knots
    pub speed_knots: f32,
    /// Date of the fix
    pub date: FixDate,
    /// Number of satellites used
    pub satellites: u8,
}

/// GNSS parsing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GnssError {
    /// The report has fewer fields than expected
    MissingField,
    /// The UTC time field is malformed
    InvalidTime,
    /// The date field is malformed
    InvalidDate,
    /// A coordinate is malformed or out of range
    InvalidCoordinate,
    /// A numeric field could not be parsed
    InvalidNumber,
}

#[cfg(feature = "defmt")]
impl defmt::Format for GnssError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            GnssError::MissingField => defmt::write!(f, "MissingField"),
            GnssError::InvalidTime => defmt::write!(f, "InvalidTime"),
            GnssError::InvalidDate => defmt::write!(f, "InvalidDate"),
            GnssError::InvalidCoordinate => defmt::write!(f, "InvalidCoordinate"),
            GnssError::InvalidNumber => defmt::write!(f, "InvalidNumber"),
        }
    }
}

/// GNSS report parser utilities
#[derive(Debug)]
pub struct GnssParser;

impl GnssParser {
    /// Parse time from the fixed-width `hhmmss` format, fractional seconds ignored
    pub fn parse_time(value: &str) -> Result<UtcTime, GnssError> {
        let time_str = match value.find('.') {
            Some(dot_pos) => &value[..dot_pos],
            None => value,
        };

        if time_str.len() != 6 || !time_str.bytes().all(|b| b.is_ascii_digit()) {
            return Err(GnssError::InvalidTime);
        }

        let time_num = time_str.parse::<u32>().map_err(|_| GnssError::InvalidTime)?;

        let hour = (time_num / 10000) as u8;
        let minute = ((time_num % 10000) / 100) as u8;
        let second = (time_num % 100) as u8;

        if hour > 23 || minute > 59 || second > 59 {
            return Err(GnssError::InvalidTime);
        }

        Ok(UtcTime {
            hour,
            minute,
            second,
        })
    }

    /// Parse date from the fixed-width `ddmmyy` format (e.g. "160919" for 2019-09-16)
    pub fn parse_date(value: &str) -> Result<FixDate, GnssError> {
        if value.len() != 6 || !value.bytes().all(|b| b.is_ascii_digit()) {
            return Err(GnssError::InvalidDate);
        }

        let date_num = value.parse::<u32>().map_err(|_| GnssError::InvalidDate)?;

        let day = (date_num / 10000) as u8;
        let month = ((date_num % 10000) / 100) as u8;
        let year = 2000 + (date_num % 100) as u16;

        if day == 0 || day > 31 || month == 0 || month > 12 {
            return Err(GnssError::InvalidDate);
        }

        Ok(FixDate { day, month, year })
    }

    /// Parse a signed decimal-degree coordinate bounded by `limit`
    pub fn parse_coordinate(value: &str, limit: f64) -> Result<f64, GnssError> {
        let degrees = value
            .trim()
            .parse::<f64>()
            .map_err(|_| GnssError::InvalidCoordinate)?;
        if !(-limit..=limit).contains(&degrees) {
            return Err(GnssError::InvalidCoordinate);
        }
        Ok(degrees)
    }

    /// Parse the payload of a `+QGPSLOC:` line (everything after the prefix)
    pub fn parse_location(payload: &str) -> Result<GnssFix<'_>, GnssError> {
        let mut fields = [""; LOCATION_FIELDS];
        let mut count = 0;
        for field in payload.split(',') {
            if count == LOCATION_FIELDS {
                break;
            }
            fields[count] = field.trim();
            count += 1;
        }
        if count < LOCATION_FIELDS {
            return Err(GnssError::MissingField);
        }

        let altitude = fields[4];
        altitude
            .parse::<f32>()
            .map_err(|_| GnssError::InvalidNumber)?;

        Ok(GnssFix {
            time: Self::parse_time(fields[0])?,
            latitude: Self::parse_coordinate(fields[1], 90.0)?,
            longitude: Self::parse_coordinate(fields[2], 180.0)?,
            hdop: fields[3].parse().unwrap_or(0.0),
            altitude,
            fix_mode: fields[5].parse().unwrap_or(0),
            course: fields[6].parse().unwrap_or(0.0),
            speed_kmh: fields[7].parse().unwrap_or(0.0),
            speed_knots: fields[8].parse().unwrap_or(0.0),
            date: Self::parse_date(fields[9])?,
            satellites: fields[10].parse().map_err(|_| GnssError::InvalidNumber)?,
        })
    }
}
