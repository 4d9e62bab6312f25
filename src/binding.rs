//! The declarative UPS-variable-to-register binding table.

use crate::bitfield::{self, Dialect, EnumEntry, FlagEntry};
use crate::datatype::DataType;

/// How a binding entry participates in driver I/O.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessFlags {
    pub command: bool,
    pub polled: bool,
    pub writable: bool,
    pub quick_poll: bool,
}

impl AccessFlags {
    pub const fn polled() -> Self {
        AccessFlags { command: false, polled: true, writable: false, quick_poll: false }
    }
    pub const fn quick_polled() -> Self {
        AccessFlags { command: false, polled: true, writable: false, quick_poll: true }
    }
    pub const fn command() -> Self {
        AccessFlags { command: true, polled: false, writable: false, quick_poll: false }
    }
    pub const fn rw() -> Self {
        AccessFlags { command: false, polled: true, writable: true, quick_poll: false }
    }
}

/// Reshaped from the source's function-pointer dispatch into a tagged
/// variant selected statically per binding entry.
pub enum Formatter {
    /// `%g`-style passthrough of the decoded number/bitfield/enum.
    Identity,
    BitfieldFlags(Dialect, &'static [FlagEntry]),
    EnumLookup(Dialect, &'static [EnumEntry], Option<&'static str>),
}

pub struct BindingEntry {
    pub name: &'static str,
    pub access: AccessFlags,
    pub register: u16,
    pub length_in_regs: u16,
    pub datatype: DataType,
    /// Bitmask written for command entries; 0 for everything else.
    pub bitmask: u64,
    pub formatter: Formatter,
}

impl BindingEntry {
    pub const fn byte_len(&self) -> usize {
        self.length_in_regs as usize * 2
    }
}

use DataType::*;
use Formatter::Identity;

macro_rules! polled {
    ($name:expr, $reg:expr, $len:expr, $dt:expr) => {
        BindingEntry {
            name: $name,
            access: AccessFlags::polled(),
            register: $reg,
            length_in_regs: $len,
            datatype: $dt,
            bitmask: 0,
            formatter: Identity,
        }
    };
    ($name:expr, $reg:expr, $len:expr, $dt:expr, quick) => {
        BindingEntry {
            name: $name,
            access: AccessFlags::quick_polled(),
            register: $reg,
            length_in_regs: $len,
            datatype: $dt,
            bitmask: 0,
            formatter: Identity,
        }
    };
}

macro_rules! command {
    ($name:expr, $reg:expr, $len:expr, $mask:expr) => {
        BindingEntry {
            name: $name,
            access: AccessFlags::command(),
            register: $reg,
            length_in_regs: $len,
            datatype: Bitfield,
            bitmask: $mask,
            formatter: Identity,
        }
    };
}

pub const UPS_OUTLET_GROUP_NUM: usize = 2; // TODO: should be read from register 590 instead

pub static BINDING_TABLE: &[BindingEntry] = &[
    // --- Analog telemetry ---
    polled!("output.voltage", 142, 1, BinaryPointU6),
    polled!("output.current", 140, 1, BinaryPointU5),
    polled!("output.frequency", 144, 1, BinaryPointU7),
    polled!("input.voltage", 151, 1, BinaryPointU6),
    polled!("ups.realpower", 136, 1, BinaryPointU8),
    polled!("battery.temperature", 135, 1, BinaryPointS7),
    polled!("battery.runtime", 128, 2, BinaryPointU0),
    polled!("ups.timer.shutdown", 155, 1, BinaryPointS0, quick),
    polled!("ups.timer.start", 156, 1, BinaryPointS0, quick),
    polled!("ups.timer.stayoff", 157, 2, BinaryPointS0, quick),

    // --- Delays (RW), widths preserved exactly from the original table:
    // shutdown/start are single registers, stayoff spans two ---
    BindingEntry {
        name: "ups.delay.shutdown",
        access: AccessFlags::rw(),
        register: 1029,
        length_in_regs: 1,
        datatype: BinaryPointS0,
        bitmask: 0,
        formatter: Identity,
    },
    BindingEntry {
        name: "ups.delay.start",
        access: AccessFlags::rw(),
        register: 1030,
        length_in_regs: 1,
        datatype: BinaryPointS0,
        bitmask: 0,
        formatter: Identity,
    },
    BindingEntry {
        name: "ups.delay.stayoff",
        access: AccessFlags::rw(),
        register: 1031,
        length_in_regs: 2,
        datatype: BinaryPointS0,
        bitmask: 0,
        formatter: Identity,
    },
    BindingEntry {
        name: "outlet.1.delay.shutdown",
        access: AccessFlags::rw(),
        register: 1034,
        length_in_regs: 1,
        datatype: BinaryPointS0,
        bitmask: 0,
        formatter: Identity,
    },
    BindingEntry {
        name: "outlet.1.delay.start",
        access: AccessFlags::rw(),
        register: 1035,
        length_in_regs: 1,
        datatype: BinaryPointS0,
        bitmask: 0,
        formatter: Identity,
    },
    BindingEntry {
        name: "outlet.1.delay.stayoff",
        access: AccessFlags::rw(),
        register: 1036,
        length_in_regs: 2,
        datatype: BinaryPointS0,
        bitmask: 0,
        formatter: Identity,
    },
    BindingEntry {
        name: "outlet.2.delay.shutdown",
        access: AccessFlags::rw(),
        register: 1039,
        length_in_regs: 1,
        datatype: BinaryPointS0,
        bitmask: 0,
        formatter: Identity,
    },
    BindingEntry {
        name: "outlet.2.delay.start",
        access: AccessFlags::rw(),
        register: 1040,
        length_in_regs: 1,
        datatype: BinaryPointS0,
        bitmask: 0,
        formatter: Identity,
    },
    BindingEntry {
        name: "outlet.2.delay.stayoff",
        access: AccessFlags::rw(),
        register: 1041,
        length_in_regs: 2,
        datatype: BinaryPointS0,
        bitmask: 0,
        formatter: Identity,
    },

    // --- Outlet status, both dialects ---
    BindingEntry {
        name: "outlet.1.status",
        access: AccessFlags::quick_polled(),
        register: 6,
        length_in_regs: 2,
        datatype: Bitfield,
        bitmask: 0,
        formatter: Formatter::BitfieldFlags(Dialect::BackwardCompatible, bitfield::OUTLET_STATUS),
    },
    BindingEntry {
        name: "outlet.1.status.native",
        access: AccessFlags::quick_polled(),
        register: 6,
        length_in_regs: 2,
        datatype: Bitfield,
        bitmask: 0,
        formatter: Formatter::BitfieldFlags(Dialect::Native, bitfield::OUTLET_STATUS),
    },
    BindingEntry {
        name: "outlet.2.status",
        access: AccessFlags::quick_polled(),
        register: 9,
        length_in_regs: 2,
        datatype: Bitfield,
        bitmask: 0,
        formatter: Formatter::BitfieldFlags(Dialect::BackwardCompatible, bitfield::OUTLET_STATUS),
    },
    BindingEntry {
        name: "outlet.2.status.native",
        access: AccessFlags::quick_polled(),
        register: 9,
        length_in_regs: 2,
        datatype: Bitfield,
        bitmask: 0,
        formatter: Formatter::BitfieldFlags(Dialect::Native, bitfield::OUTLET_STATUS),
    },

    // --- Runtime calibration test result, both dialects ---
    BindingEntry {
        name: "ups.test.result",
        access: AccessFlags::polled(),
        register: 23,
        length_in_regs: 1,
        datatype: Enumeration,
        bitmask: 0,
        formatter: Formatter::EnumLookup(
            Dialect::BackwardCompatible,
            bitfield::RUNTIME_CALIBRATION_STATUS,
            Some(bitfield::RUNTIME_CALIBRATION_STATUS_BW_DEFAULT),
        ),
    },
    BindingEntry {
        name: "ups.test.result.native",
        access: AccessFlags::polled(),
        register: 24,
        length_in_regs: 1,
        datatype: Enumeration,
        bitmask: 0,
        formatter: Formatter::EnumLookup(Dialect::Native, bitfield::RUNTIME_CALIBRATION_STATUS, None),
    },

    // --- Outlet load commands, group 1 ---
    command!(
        "outlet.1.load.off",
        1538,
        2,
        bitfield::BF_OUTLETCOMMAND_OUTPUTOFF
            | bitfield::BF_OUTLETCOMMAND_SWITCHEDOUTLETGROUP0
            | bitfield::BF_OUTLETCOMMAND_USBPORT
    ),
    command!(
        "outlet.1.load.on",
        1538,
        2,
        bitfield::BF_OUTLETCOMMAND_OUTPUTON
            | bitfield::BF_OUTLETCOMMAND_SWITCHEDOUTLETGROUP0
            | bitfield::BF_OUTLETCOMMAND_USBPORT
    ),
    command!(
        "outlet.1.load.on.coldboot",
        1538,
        2,
        bitfield::BF_OUTLETCOMMAND_OUTPUTON
            | bitfield::BF_OUTLETCOMMAND_SWITCHEDOUTLETGROUP0
            | bitfield::BF_OUTLETCOMMAND_USBPORT
    ),
    command!(
        "outlet.1.reboot",
        1538,
        2,
        bitfield::BF_OUTLETCOMMAND_OUTPUTREBOOT
            | bitfield::BF_OUTLETCOMMAND_SWITCHEDOUTLETGROUP0
            | bitfield::BF_OUTLETCOMMAND_USBPORT
    ),
    command!(
        "outlet.1.shutdown",
        1538,
        2,
        bitfield::BF_OUTLETCOMMAND_OUTPUTSHUTDOWN
            | bitfield::BF_OUTLETCOMMAND_SWITCHEDOUTLETGROUP0
            | bitfield::BF_OUTLETCOMMAND_USBPORT
    ),
    command!(
        "outlet.1.canceloperation",
        1538,
        2,
        bitfield::BF_OUTLETCOMMAND_CANCEL
            | bitfield::BF_OUTLETCOMMAND_SWITCHEDOUTLETGROUP0
            | bitfield::BF_OUTLETCOMMAND_USBPORT
    ),

    // --- Outlet load commands, group 2 ---
    command!(
        "outlet.2.load.off",
        1538,
        2,
        bitfield::BF_OUTLETCOMMAND_OUTPUTOFF
            | bitfield::BF_OUTLETCOMMAND_SWITCHEDOUTLETGROUP1
            | bitfield::BF_OUTLETCOMMAND_USBPORT
    ),
    command!(
        "outlet.2.load.on",
        1538,
        2,
        bitfield::BF_OUTLETCOMMAND_OUTPUTON
            | bitfield::BF_OUTLETCOMMAND_SWITCHEDOUTLETGROUP1
            | bitfield::BF_OUTLETCOMMAND_USBPORT
    ),
    command!(
        "outlet.2.reboot",
        1538,
        2,
        bitfield::BF_OUTLETCOMMAND_OUTPUTREBOOT
            | bitfield::BF_OUTLETCOMMAND_SWITCHEDOUTLETGROUP1
            | bitfield::BF_OUTLETCOMMAND_USBPORT
    ),
    command!(
        "outlet.2.shutdown",
        1538,
        2,
        bitfield::BF_OUTLETCOMMAND_OUTPUTSHUTDOWN
            | bitfield::BF_OUTLETCOMMAND_SWITCHEDOUTLETGROUP1
            | bitfield::BF_OUTLETCOMMAND_USBPORT
    ),

    // --- Combined (both switched groups) ---
    command!(
        "load.off",
        1538,
        2,
        bitfield::BF_OUTLETCOMMAND_OUTPUTOFF
            | bitfield::BF_OUTLETCOMMAND_SWITCHEDOUTLETGROUP0
            | bitfield::BF_OUTLETCOMMAND_SWITCHEDOUTLETGROUP1
            | bitfield::BF_OUTLETCOMMAND_USBPORT
    ),
    command!(
        "load.on",
        1538,
        2,
        bitfield::BF_OUTLETCOMMAND_OUTPUTON
            | bitfield::BF_OUTLETCOMMAND_SWITCHEDOUTLETGROUP0
            | bitfield::BF_OUTLETCOMMAND_SWITCHEDOUTLETGROUP1
            | bitfield::BF_OUTLETCOMMAND_USBPORT
    ),

    // --- Shutdown/signaling ---
    command!(
        "shutdown.reboot",
        1540,
        1,
        bitfield::BF_SIMPLESIGNALINGCOMMAND_REQUESTSHUTDOWN
    ),
    command!(
        "shutdown.stop",
        1540,
        1,
        bitfield::BF_SIMPLESIGNALINGCOMMAND_REQUESTSHUTDOWN
    ),

    // --- Runtime calibration ---
    command!(
        "test.battery.start.quick",
        1541,
        1,
        bitfield::BF_RUNTIMECALIBRATIONCOMMAND_START
    ),
    command!(
        "test.battery.start.deep",
        1542,
        1,
        bitfield::BF_RUNTIMECALIBRATIONCOMMAND_START
    ),
    command!(
        "test.battery.stop",
        1542,
        1,
        bitfield::BF_RUNTIMECALIBRATIONCOMMAND_ABORT
    ),
];

/// Looks up a binding entry by its UPS variable name.
pub fn find(name: &str) -> Option<&'static BindingEntry> {
    BINDING_TABLE.iter().find(|e| e.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outlet_1_load_off_matches_the_documented_scenario() {
        let entry = find("outlet.1.load.off").unwrap();
        assert_eq!(entry.register, 1538);
        assert_eq!(entry.length_in_regs, 2);
        assert_eq!(
            entry.bitmask,
            bitfield::BF_OUTLETCOMMAND_OUTPUTOFF
                | bitfield::BF_OUTLETCOMMAND_SWITCHEDOUTLETGROUP0
                | bitfield::BF_OUTLETCOMMAND_USBPORT
        );
    }

    #[test]
    fn stayoff_entries_span_two_registers_unlike_shutdown_and_start() {
        assert_eq!(find("ups.delay.shutdown").unwrap().length_in_regs, 1);
        assert_eq!(find("ups.delay.start").unwrap().length_in_regs, 1);
        assert_eq!(find("ups.delay.stayoff").unwrap().length_in_regs, 2);
    }

    #[test]
    fn every_name_is_unique() {
        let mut seen = std::collections::HashSet::new();
        for entry in BINDING_TABLE {
            assert!(seen.insert(entry.name), "duplicate binding name {}", entry.name);
        }
    }
}
