//! The collaborator-facing subdriver descriptor: claim predicate, vendor
//! usage table, and model/manufacturer/serial formatters.

use crate::transport::{PRODUCT_ID, VENDOR_ID};

pub const SUBDRIVER_VERSION: &str = "APC MODBUS over HID 0.1";

/// Vendor-specific HID usages reserved for the MODBUS-over-HID transport.
pub const MODBUS_RTU_RX_USAGE: u32 = 0xFF8600FC;
pub const MODBUS_RTU_TX_USAGE: u32 = 0xFF8600FD;

/// Returned by `claim` when a device matches; tells the collaborator
/// whether it should disable its generic HID interrupt pipe to avoid
/// interference with the vendor protocol. Replaces the source's
/// module-level `use_interrupt_pipe` flag with a per-claim value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimHint {
    pub disable_interrupt_pipe: bool,
}

/// Decides whether this subdriver handles `(vendor_id, product_id)`.
pub fn claim(vendor_id: u16, product_id: u16) -> Option<ClaimHint> {
    if vendor_id == VENDOR_ID && product_id == PRODUCT_ID {
        Some(ClaimHint { disable_interrupt_pipe: true })
    } else {
        None
    }
}

/// Manufacturer string, defaulting to "APC" if the device did not report one.
pub fn format_mfr(reported: Option<&str>) -> String {
    reported.filter(|s| !s.is_empty()).unwrap_or("APC").to_string()
}

/// Serial number passes through unchanged.
pub fn format_serial(reported: &str) -> String {
    reported.to_string()
}

/// The device's HID product string embeds a firmware suffix
/// (`"<model> FW:<version>"` or `"<model> USB FW:<version>"`); split it
/// into separate model and firmware fields.
pub fn format_model(reported: &str) -> (String, Option<String>) {
    for marker in ["USB FW:", "FW:"] {
        if let Some(idx) = reported.find(marker) {
            let model = reported[..idx].trim().to_string();
            let firmware = reported[idx + marker.len()..].trim().to_string();
            return (model, Some(firmware));
        }
    }
    (reported.trim().to_string(), None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claim_accepts_only_the_documented_product() {
        assert!(claim(VENDOR_ID, PRODUCT_ID).is_some());
        assert!(claim(VENDOR_ID, 0x0099).is_none());
        assert!(claim(0x1234, PRODUCT_ID).is_none());
    }

    #[test]
    fn claim_hints_interrupt_pipe_disabled() {
        let hint = claim(VENDOR_ID, PRODUCT_ID).unwrap();
        assert!(hint.disable_interrupt_pipe);
    }

    #[test]
    fn mfr_defaults_when_absent() {
        assert_eq!(format_mfr(None), "APC");
        assert_eq!(format_mfr(Some("")), "APC");
        assert_eq!(format_mfr(Some("Schneider Electric")), "Schneider Electric");
    }

    #[test]
    fn model_splits_embedded_firmware_suffix() {
        let (model, fw) = format_model("SMT1500 FW:UPS 09.5");
        assert_eq!(model, "SMT1500");
        assert_eq!(fw.as_deref(), Some("UPS 09.5"));
    }

    #[test]
    fn model_without_firmware_suffix_passes_through() {
        let (model, fw) = format_model("SMT1500");
        assert_eq!(model, "SMT1500");
        assert_eq!(fw, None);
    }
}
