//! MODBUS-over-HID transport and typed register access for Schneider
//! Electric / APC Smart-UPS (SMT/SRT family) devices.
//!
//! The crate covers the vendor-specific protocol carried inside 64-byte
//! HID interrupt reports: framing, CRC, quiet-line detection, the
//! request/response engine, the register API, and the declarative
//! binding table that maps UPS variables onto registers. USB enumeration,
//! the generic HID code path, and the surrounding monitoring daemon are
//! out of scope; callers provide a [`transport::UsbTransport`]
//! implementation for the two capabilities this crate actually needs.

pub mod binding;
pub mod bitfield;
pub mod byteorder;
pub mod crc;
pub mod datatype;
pub mod driver;
pub mod engine;
pub mod error;
pub mod framer;
pub mod quietline;
pub mod registers;
pub mod subdriver;
pub mod transport;

#[cfg(any(test, feature = "test-util"))]
pub mod testutil;

pub use driver::{InMemoryVariableStore, SmartUpsDriver, VariableStore};
pub use error::{ModbusError, ModbusResult};
pub use transport::{Config, UsbTransport};
