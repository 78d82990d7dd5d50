//! Byte transport abstraction for the modem's serial link.
//!
//! The AT engine never talks to a UART driver directly. It reads and writes
//! through these traits so the same code runs against a HAL serial port on
//! the device and against a scripted mock in tests.
//!
//! `read` is expected to be non-blocking: it returns `Ok(0)` when no bytes
//! are waiting. End of stream is reported as
//! [`Error::ConnectionClosed`](error::Error::ConnectionClosed).

#![allow(missing_docs)]
#![deny(unsafe_code)]

/// Common error types for transport operations
pub mod error;

/// Re-exports of common traits
pub mod prelude {
    pub use super::{Close, Connection, Read, Write};
}

pub trait Read {
    /// Associated error type
    type Error: core::fmt::Debug + Into<error::Error>;
    /// Read whatever bytes are available without waiting
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;
}

pub trait Write {
    /// Associated error type
    type Error: core::fmt::Debug + Into<error::Error>;
    /// Write data to the link
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error>;
    /// Flush the write buffer
    fn flush(&mut self) -> Result<(), Self::Error>;
}

pub trait Close {
    /// Associated error type
    type Error: core::fmt::Debug;
    /// Release the link
    fn close(self) -> Result<(), Self::Error>;
}

/// A serial link to the modem.
pub trait Connection: Read + Write + Close {}

/// Writes the whole buffer, retrying short writes.
///
/// A write that accepts zero bytes is reported as
/// [`Error::WriteError`](error::Error::WriteError) rather than spinning.
pub fn write_all<W: Write + ?Sized>(port: &mut W, mut buf: &[u8]) -> Result<(), error::Error> {
    while !buf.is_empty() {
        match port.write(buf) {
            Ok(0) => return Err(error::Error::WriteError),
            Ok(n) => buf = &buf[n..],
            Err(e) => return Err(e.into()),
        }
    }
    port.flush().map_err(Into::into)
}
