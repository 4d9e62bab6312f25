//! Packs/unpacks MODBUS frames into the 64-byte vendor HID reports.
//!
//! The wire never carries the frame's CRC: the USB transport strips it on
//! TX and the receiver re-synthesizes it on RX so upstream code always
//! deals in conventional, CRC-terminated MODBUS frames.

use crate::crc;
use crate::transport::{
    MODBUS_FC_READ_HOLDING_REGS, MODBUS_FC_WRITE_MULTIPLE_REGS, MODBUS_HID_RX_ID,
    MODBUS_HID_TX_ID, REPORT_SIZE,
};

/// Packs `frame` (slave, fc, pdu…, crc_lo, crc_hi) into a 64-byte report.
/// The trailing 2 CRC bytes are stripped; the rest is zero-padded.
pub fn pack(frame: &[u8]) -> [u8; REPORT_SIZE] {
    debug_assert!(frame.len() >= 2);
    let payload = &frame[..frame.len() - 2];
    debug_assert!(payload.len() <= REPORT_SIZE - 1);

    let mut report = [0u8; REPORT_SIZE];
    report[0] = MODBUS_HID_TX_ID;
    report[1..1 + payload.len()].copy_from_slice(payload);
    report
}

/// Unpacks an inbound report into a CRC-terminated frame, or `None` if the
/// report is not a MODBUS response (wrong id or unsupported function code).
pub fn unpack(report: &[u8]) -> Option<Vec<u8>> {
    if report.is_empty() || report[0] != MODBUS_HID_RX_ID {
        return None;
    }

    let fc = *report.get(2)?;
    let frame_len = match fc {
        MODBUS_FC_READ_HOLDING_REGS => *report.get(3)? as usize + 3,
        MODBUS_FC_WRITE_MULTIPLE_REGS => 6,
        _ if fc & 0x80 != 0 => 3, // exception response: slave, fc|0x80, exception code
        _ => return None,
    };

    if report.len() < 1 + frame_len {
        return None;
    }

    let mut frame = report[1..1 + frame_len].to_vec();
    crc::append_crc(&mut frame);
    Some(frame)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_strips_crc_and_prefixes_tx_id() {
        let frame = [0x01, 0x03, 0x00, 0x8E, 0x00, 0x01, 0xAA, 0xBB];
        let report = pack(&frame);
        assert_eq!(report[0], MODBUS_HID_TX_ID);
        assert_eq!(&report[1..7], &frame[..6]);
        assert!(report[7..].iter().all(|&b| b == 0));
    }

    #[test]
    fn unpack_read_holding_response_reappends_crc() {
        let mut report = [0u8; REPORT_SIZE];
        report[0] = MODBUS_HID_RX_ID;
        report[1] = 0x01; // slave
        report[2] = 0x03; // fc
        report[3] = 0x02; // nbytes
        report[4] = 0x0E;
        report[5] = 0xD8;
        let frame = unpack(&report).unwrap();
        assert_eq!(&frame[..5], &[0x01, 0x03, 0x02, 0x0E, 0xD8]);
        assert!(crc::verify(&frame));
    }

    #[test]
    fn unpack_rejects_wrong_report_id() {
        let mut report = [0u8; REPORT_SIZE];
        report[0] = 0x07;
        assert!(unpack(&report).is_none());
    }

    #[test]
    fn unpack_exception_response_is_three_bytes() {
        let mut report = [0u8; REPORT_SIZE];
        report[0] = MODBUS_HID_RX_ID;
        report[1] = 0x01;
        report[2] = 0x83; // fc | 0x80
        report[3] = 0x02; // exception code
        let frame = unpack(&report).unwrap();
        assert_eq!(&frame[..3], &[0x01, 0x83, 0x02]);
    }
}
