//! Renders decoded bitfields and status enumerations as label strings,
//! in either the documented ("native") vocabulary or a legacy
//! ("backward-compatible") one kept for older monitoring clients.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Native,
    BackwardCompatible,
}

/// One named bit in an ordered bitfield vocabulary. `bw` is `None` for
/// flags the backward-compatible dialect does not recognize at all.
pub struct FlagEntry {
    pub bit: u64,
    pub native: &'static str,
    pub bw: Option<&'static str>,
}

/// One named value in an exclusive (non-bitmask) status enumeration.
pub struct EnumEntry {
    pub value: u64,
    pub native: &'static str,
    pub bw: &'static str,
}

/// Renders `value` against an ordered flag list, joining matched labels
/// with `-`. Flags are checked in table order, matching the order the
/// legacy C formatters checked them in. Yields `"unknown"` if nothing
/// matched.
pub fn format_bitfield(value: u64, flags: &[FlagEntry], dialect: Dialect) -> String {
    let mut labels = Vec::new();
    for entry in flags {
        if value & entry.bit == 0 {
            continue;
        }
        match dialect {
            Dialect::Native => labels.push(entry.native),
            Dialect::BackwardCompatible => {
                if let Some(bw) = entry.bw {
                    labels.push(bw);
                }
            }
        }
    }
    if labels.is_empty() {
        "unknown".to_string()
    } else {
        labels.join("-")
    }
}

/// Renders `value` against an exclusive enumeration. `bw_default_on_miss`
/// is the legacy-dialect fallback label used when no entry matches (the
/// runtime-calibration-status formatter defaults to "Done and passed"
/// rather than "unknown" in backward-compatible mode).
pub fn format_enum(
    value: u64,
    entries: &[EnumEntry],
    dialect: Dialect,
    bw_default_on_miss: Option<&'static str>,
) -> String {
    for entry in entries {
        if entry.value == value {
            return match dialect {
                Dialect::Native => entry.native.to_string(),
                Dialect::BackwardCompatible => entry.bw.to_string(),
            };
        }
    }
    match (dialect, bw_default_on_miss) {
        (Dialect::BackwardCompatible, Some(fallback)) => fallback.to_string(),
        _ => "unknown".to_string(),
    }
}

/// Outlet status bits. Bit positions are reconstructed from the order the
/// upstream formatter checked them in (the literal `#define`s were not
/// present in the recovered source); see DESIGN.md.
pub const OUTLET_STATUS: &[FlagEntry] = &[
    FlagEntry { bit: 0x01, native: "StateOn", bw: Some("on") },
    FlagEntry { bit: 0x02, native: "StateOff", bw: Some("off") },
    FlagEntry { bit: 0x04, native: "ProcessReboot", bw: None },
    FlagEntry { bit: 0x08, native: "ProcessShutdown", bw: None },
    FlagEntry { bit: 0x10, native: "ProcessSleep", bw: None },
    FlagEntry { bit: 0x20, native: "PendingOffDelay", bw: None },
    FlagEntry { bit: 0x40, native: "PendingOnACPresence", bw: None },
    FlagEntry { bit: 0x80, native: "PendingOnMinRuntime", bw: None },
];

/// Runtime-calibration status, an exclusive enumeration (not a bitmask).
pub const RUNTIME_CALIBRATION_STATUS: &[EnumEntry] = &[
    EnumEntry { value: 0, native: "Pending", bw: "Test scheduled" },
    EnumEntry { value: 1, native: "InProgress", bw: "In progress" },
    EnumEntry { value: 2, native: "Passed", bw: "Done and passed" },
    EnumEntry { value: 3, native: "Failed", bw: "Done and error" },
    EnumEntry { value: 4, native: "Refused", bw: "No test initiated" },
    EnumEntry { value: 5, native: "Aborted", bw: "Aborted" },
];

/// Legacy default for the backward-compatible runtime-calibration-status
/// dialect when no bit matches at all.
pub const RUNTIME_CALIBRATION_STATUS_BW_DEFAULT: &str = "Done and passed";

pub const BF_OUTLETCOMMAND_OUTPUTON: u64 = 0x0002;
pub const BF_OUTLETCOMMAND_OUTPUTOFF: u64 = 0x0004;
pub const BF_OUTLETCOMMAND_OUTPUTREBOOT: u64 = 0x0010;
pub const BF_OUTLETCOMMAND_OUTPUTSHUTDOWN: u64 = 0x0008;
pub const BF_OUTLETCOMMAND_CANCEL: u64 = 0x0001;
pub const BF_OUTLETCOMMAND_SWITCHEDOUTLETGROUP0: u64 = 0x0200;
pub const BF_OUTLETCOMMAND_SWITCHEDOUTLETGROUP1: u64 = 0x0400;
pub const BF_OUTLETCOMMAND_USBPORT: u64 = 0x1000;

/// Simple signaling command bits, inferred from `shutdown.reboot`/`shutdown.stop`.
pub const BF_SIMPLESIGNALINGCOMMAND_REQUESTSHUTDOWN: u64 = 0x01;

/// Runtime calibration command bits, inferred from `test.battery.*`.
pub const BF_RUNTIMECALIBRATIONCOMMAND_START: u64 = 0x01;
pub const BF_RUNTIMECALIBRATIONCOMMAND_ABORT: u64 = 0x02;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_dialect_renders_process_reboot() {
        assert_eq!(
            format_bitfield(0x04, OUTLET_STATUS, Dialect::Native),
            "ProcessReboot"
        );
    }

    #[test]
    fn backward_compatible_dialect_reports_unknown_for_process_reboot() {
        assert_eq!(
            format_bitfield(0x04, OUTLET_STATUS, Dialect::BackwardCompatible),
            "unknown"
        );
    }

    #[test]
    fn backward_compatible_dialect_renders_on_off_combo() {
        assert_eq!(
            format_bitfield(0x03, OUTLET_STATUS, Dialect::BackwardCompatible),
            "on-off"
        );
    }

    #[test]
    fn runtime_calibration_status_legacy_phrasing() {
        assert_eq!(
            format_enum(2, RUNTIME_CALIBRATION_STATUS, Dialect::BackwardCompatible, None),
            "Done and passed"
        );
        assert_eq!(
            format_enum(0, RUNTIME_CALIBRATION_STATUS, Dialect::BackwardCompatible, None),
            "Test scheduled"
        );
    }
}
