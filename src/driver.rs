//! The driver facade: ties the register API, binding table, and bitfield
//! formatter together into `poll()`/`instcmd()` against a variable store.

use log::{debug, error};

use crate::binding::{self, AccessFlags, BindingEntry, Formatter};
use crate::bitfield;
use crate::datatype::{self, DataType};
use crate::error::ModbusResult;
use crate::registers::{read_holding, write_multiple};
use crate::transport::{Config, UsbTransport};

/// What the driver pushes decoded/formatted values into. Implemented by
/// the embedding monitoring daemon; a `HashMap`-backed implementation is
/// provided below for demos and tests.
pub trait VariableStore {
    fn define(&mut self, name: &str, access: AccessFlags, datatype: DataType);
    fn set(&mut self, name: &str, value: &str);
}

pub struct SmartUpsDriver<T: UsbTransport> {
    transport: T,
    cfg: Config,
}

impl<T: UsbTransport> SmartUpsDriver<T> {
    pub fn new(transport: T, cfg: Config) -> Self {
        SmartUpsDriver { transport, cfg }
    }

    /// Access to the underlying transport, for inspection in tests.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Registers every binding table entry with the store. Call once at
    /// startup before the first `poll()`.
    pub fn register(&self, store: &mut dyn VariableStore) {
        for entry in binding::BINDING_TABLE {
            store.define(entry.name, entry.access, entry.datatype);
        }
    }

    /// Reads every polled binding entry and pushes its formatted value
    /// into `store`. A read failure for one entry is logged and does not
    /// abort the rest of the cycle.
    pub fn poll(&mut self, store: &mut dyn VariableStore) {
        for entry in binding::BINDING_TABLE {
            if !entry.access.polled {
                continue;
            }
            match self.read_entry(entry) {
                Ok(text) => store.set(entry.name, &text),
                Err(e) => error!("poll: failed to read {}: {e}", entry.name),
            }
        }
    }

    fn read_entry(&mut self, entry: &BindingEntry) -> ModbusResult<String> {
        let raw = read_holding(&mut self.transport, &self.cfg, entry.register, entry.length_in_regs)?;
        let value = datatype::decode(entry.datatype, &raw);
        Ok(format_value(&value, &entry.formatter))
    }

    /// Issues a command or RW-write binding entry.
    ///
    /// For command entries the provided `value` is ignored and the
    /// entry's fixed `bitmask` is written; for RW binary-point entries,
    /// `value` is parsed as a number and encoded per the entry's datatype.
    pub fn instcmd(&mut self, name: &str, value: Option<f64>) -> ModbusResult<()> {
        let entry = binding::find(name).ok_or_else(|| {
            crate::error::ModbusError::Fatal(crate::error::FatalError::Transport(format!(
                "no such binding entry: {name}"
            )))
        })?;

        debug!("instcmd: {name}");

        let data = if entry.access.command {
            crate::byteorder::u64_to_be_bytes(entry.bitmask, entry.byte_len())
        } else {
            let value = value.ok_or_else(|| {
                crate::error::ModbusError::Fatal(crate::error::FatalError::Transport(format!(
                    "{name} requires a numeric value"
                )))
            })?;
            datatype::encode(entry.datatype, value, entry.byte_len())?
        };

        write_multiple(&mut self.transport, &self.cfg, entry.register, entry.length_in_regs, &data)
    }
}

fn format_value(value: &datatype::Value, formatter: &Formatter) -> String {
    match formatter {
        Formatter::Identity => match value {
            datatype::Value::Number(n) => format!("{n:.2}"),
            datatype::Value::Bitfield(v) | datatype::Value::Enumeration(v) => v.to_string(),
            datatype::Value::Text(s) => s.clone(),
        },
        Formatter::BitfieldFlags(dialect, flags) => {
            let raw = value.as_bitfield().unwrap_or(0);
            bitfield::format_bitfield(raw, flags, *dialect)
        }
        Formatter::EnumLookup(dialect, entries, bw_default) => {
            let raw = match value {
                datatype::Value::Enumeration(v) => *v,
                datatype::Value::Bitfield(v) => *v,
                _ => 0,
            };
            bitfield::format_enum(raw, entries, *dialect, *bw_default)
        }
    }
}

/// A simple `HashMap`-backed store, useful for demos and integration tests.
#[derive(Default)]
pub struct InMemoryVariableStore {
    values: std::collections::HashMap<String, String>,
}

impl InMemoryVariableStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }
}

impl VariableStore for InMemoryVariableStore {
    fn define(&mut self, _name: &str, _access: AccessFlags, _datatype: DataType) {}

    fn set(&mut self, name: &str, value: &str) {
        self.values.insert(name.to_string(), value.to_string());
    }
}

#[cfg(all(test, feature = "test-util"))]
mod tests {
    use super::*;
    use crate::testutil::ScriptedTransport;
    use crate::transport::{MODBUS_FC_READ_HOLDING_REGS, MODBUS_HID_RX_ID, REPORT_SIZE};

    #[test]
    fn poll_formats_output_voltage_scenario() {
        let mut t = ScriptedTransport::new();
        t.push_timeout();
        t.push_write_ok();
        let mut report = [0u8; REPORT_SIZE];
        report[0] = MODBUS_HID_RX_ID;
        report[1] = 1;
        report[2] = MODBUS_FC_READ_HOLDING_REGS;
        report[3] = 0x02;
        report[4] = 0x0E;
        report[5] = 0xD8;
        t.push_read(&report);

        let entry = binding::find("output.voltage").unwrap();
        let mut driver = SmartUpsDriver::new(t, Config::default());
        let text = driver.read_entry(entry).unwrap();
        assert_eq!(text, "59.38");
    }
}
