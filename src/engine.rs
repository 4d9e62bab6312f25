//! Frame-level request/response engine: build, send, await, validate, retry.

use std::time::{Duration, Instant};

use log::{debug, trace, warn};

use crate::crc;
use crate::error::{FatalError, ModbusError, TransientError};
use crate::framer;
use crate::quietline::wait_idle;
use crate::transport::{
    Config, TransferOutcome, UsbTransport, EP_RX, EP_TX, MODBUS_MAX_PDU_SZ,
    MODBUS_USB_REPORT_MAX_FRAME_SIZE, REPORT_SIZE,
};

const TOTAL_ATTEMPTS: u32 = 3;

/// Sends `tx_pdu` under function code `fc` and returns the response PDU,
/// which is expected to be exactly `rx_pdu_expected_len` bytes.
pub fn send_and_wait<T: UsbTransport>(
    transport: &mut T,
    cfg: &Config,
    fc: u8,
    tx_pdu: &[u8],
    rx_pdu_expected_len: usize,
) -> Result<Vec<u8>, ModbusError> {
    if tx_pdu.len() > MODBUS_MAX_PDU_SZ {
        return Err(ModbusError::Fatal(FatalError::FrameTooLarge {
            size: tx_pdu.len(),
            max: MODBUS_MAX_PDU_SZ,
        }));
    }
    // header(2) + pdu + crc(2) must fit a single 63-byte report payload.
    if tx_pdu.len() + 4 > MODBUS_USB_REPORT_MAX_FRAME_SIZE {
        return Err(ModbusError::Fatal(FatalError::FrameTooLarge {
            size: tx_pdu.len(),
            max: MODBUS_USB_REPORT_MAX_FRAME_SIZE - 4,
        }));
    }

    let mut last_transient = TransientError::Timeout;

    for attempt in 1..=TOTAL_ATTEMPTS {
        debug!("send_and_wait: attempt {attempt}/{TOTAL_ATTEMPTS} for fc {fc:#04x}");

        wait_idle(transport, cfg)?;

        let mut frame = Vec::with_capacity(tx_pdu.len() + 4);
        frame.push(cfg.slave_addr);
        frame.push(fc);
        frame.extend_from_slice(tx_pdu);
        crc::append_crc(&mut frame);

        let report = framer::pack(&frame);
        trace!("TX report: {report:02x?}");
        match transport.usb_interrupt_write(EP_TX, &report, cfg.response_timeout_ms) {
            TransferOutcome::Count(n) if n == REPORT_SIZE => {}
            TransferOutcome::Count(n) => {
                return Err(ModbusError::Fatal(FatalError::Transport(format!(
                    "short USB write ({n} of {REPORT_SIZE} bytes)"
                ))))
            }
            _ => {
                return Err(ModbusError::Fatal(FatalError::Transport(
                    "usb_interrupt_write failed".to_string(),
                )))
            }
        }

        match read_response(transport, cfg) {
            ReadOutcome::Frame(rx_frame) => {
                match validate(&rx_frame, cfg.slave_addr, fc, rx_pdu_expected_len) {
                    Ok(pdu) => return Ok(pdu),
                    Err(Validation::Fatal(e)) => return Err(ModbusError::Fatal(e)),
                    Err(Validation::Retry(e)) => {
                        warn!("send_and_wait: retrying after {e}");
                        last_transient = e;
                    }
                }
            }
            ReadOutcome::Timeout => last_transient = TransientError::Timeout,
            ReadOutcome::Fatal(msg) => return Err(ModbusError::Fatal(FatalError::Transport(msg))),
        }
    }

    Err(ModbusError::RetriesExhausted(last_transient))
}

enum ReadOutcome {
    Frame(Vec<u8>),
    Timeout,
    Fatal(String),
}

/// Keeps reading from the RX endpoint, absorbing reports that the framer
/// does not recognize as a MODBUS response, until one decodes or the
/// response timeout elapses.
fn read_response<T: UsbTransport>(transport: &mut T, cfg: &Config) -> ReadOutcome {
    let deadline = Instant::now() + Duration::from_millis(cfg.response_timeout_ms as u64);

    loop {
        let now = Instant::now();
        if now >= deadline {
            return ReadOutcome::Timeout;
        }
        let timeout_ms = deadline.saturating_duration_since(now).as_millis() as u32;

        let mut report = [0u8; REPORT_SIZE];
        match transport.usb_interrupt_read(EP_RX, &mut report, timeout_ms) {
            TransferOutcome::TimedOut => return ReadOutcome::Timeout,
            TransferOutcome::Interrupted => continue,
            TransferOutcome::Fatal => {
                return ReadOutcome::Fatal("usb_interrupt_read failed".to_string())
            }
            TransferOutcome::Count(n) => match framer::unpack(&report[..n]) {
                Some(frame) => return ReadOutcome::Frame(frame),
                None => continue,
            },
        }
    }
}

enum Validation {
    Fatal(FatalError),
    Retry(TransientError),
}

fn validate(
    frame: &[u8],
    expected_addr: u8,
    fc: u8,
    rx_pdu_expected_len: usize,
) -> Result<Vec<u8>, Validation> {
    if frame.len() < 4 {
        return Err(Validation::Retry(TransientError::ShortFrame(frame.len())));
    }
    if !crc::verify(frame) {
        return Err(Validation::Retry(TransientError::BadCrc));
    }

    let addr = frame[0];
    if addr != expected_addr {
        return Err(Validation::Retry(TransientError::WrongAddress {
            expected: expected_addr,
            got: addr,
        }));
    }

    let resp_fc = frame[1];
    if resp_fc & 0x80 != 0 {
        let code = *frame.get(2).unwrap_or(&0);
        return Err(Validation::Fatal(FatalError::Exception { fc, code }));
    }
    if resp_fc != fc {
        return Err(Validation::Retry(TransientError::UnexpectedFunctionCode(
            resp_fc,
        )));
    }

    if frame.len() != rx_pdu_expected_len + 4 {
        return Err(Validation::Retry(TransientError::WrongSize {
            expected: rx_pdu_expected_len + 4,
            got: frame.len(),
        }));
    }

    Ok(frame[2..2 + rx_pdu_expected_len].to_vec())
}

#[cfg(all(test, feature = "test-util"))]
mod tests {
    use super::*;
    use crate::testutil::ScriptedTransport;
    use crate::transport::{MODBUS_FC_READ_HOLDING_REGS, MODBUS_HID_RX_ID};

    fn read_holding_response_report(slave: u8, data: &[u8]) -> [u8; REPORT_SIZE] {
        let mut r = [0u8; REPORT_SIZE];
        r[0] = MODBUS_HID_RX_ID;
        r[1] = slave;
        r[2] = MODBUS_FC_READ_HOLDING_REGS;
        r[3] = data.len() as u8;
        r[4..4 + data.len()].copy_from_slice(data);
        r
    }

    #[test]
    fn successful_read_returns_pdu() {
        let mut t = ScriptedTransport::new();
        t.push_timeout(); // wait_idle sees immediate quiet
        t.push_write_ok();
        t.push_read(&read_holding_response_report(1, &[0x0E, 0xD8]));
        let cfg = Config::default();
        let pdu = send_and_wait(&mut t, &cfg, MODBUS_FC_READ_HOLDING_REGS, &[0, 0x8E, 0, 1], 3)
            .unwrap();
        assert_eq!(pdu, vec![0x02, 0x0E, 0xD8]);
    }

    #[test]
    fn bad_crc_is_a_retryable_fault() {
        // The framer always re-synthesizes a valid CRC for whatever bytes it
        // receives (the HID transport never carries one on the wire), so a
        // corrupted CRC can only be observed by validate() itself -- this
        // exercises that check directly, the way a non-HID MODBUS transport
        // feeding raw frames into the same validator would hit it.
        let mut frame = vec![0x01, 0x03, 0x02, 0x0E, 0xD8];
        crc::append_crc(&mut frame);
        let last = frame.len() - 1;
        frame[last] ^= 0x01;
        let result = validate(&frame, 1, MODBUS_FC_READ_HOLDING_REGS, 3);
        assert!(matches!(result, Err(Validation::Retry(TransientError::BadCrc))));
    }

    #[test]
    fn wrong_slave_address_retries_then_succeeds() {
        let mut t = ScriptedTransport::new();
        t.push_timeout();
        t.push_write_ok();
        t.push_read(&read_holding_response_report(9, &[0x0E, 0xD8])); // wrong slave

        t.push_timeout();
        t.push_write_ok();
        t.push_read(&read_holding_response_report(1, &[0x0E, 0xD8]));

        let cfg = Config::default();
        let pdu = send_and_wait(&mut t, &cfg, MODBUS_FC_READ_HOLDING_REGS, &[0, 0x8E, 0, 1], 3);
        assert!(pdu.is_ok());
        assert_eq!(t.read_calls(), 2);
    }

    #[test]
    fn pdu_at_59_bytes_sends_at_60_is_rejected() {
        let mut t = ScriptedTransport::new();
        t.push_timeout();
        t.push_write_ok();
        t.push_read(&read_holding_response_report(1, &[0x0E, 0xD8]));
        let cfg = Config::default();

        let pdu_59 = vec![0u8; 59];
        assert!(send_and_wait(&mut t, &cfg, MODBUS_FC_READ_HOLDING_REGS, &pdu_59, 3).is_ok());

        let mut t = ScriptedTransport::new();
        let pdu_60 = vec![0u8; 60];
        let err = send_and_wait(&mut t, &cfg, MODBUS_FC_READ_HOLDING_REGS, &pdu_60, 3).unwrap_err();
        assert!(matches!(err, ModbusError::Fatal(FatalError::FrameTooLarge { size: 60, .. })));
    }

    #[test]
    fn exception_response_is_fatal_with_no_retry() {
        let mut t = ScriptedTransport::new();
        t.push_timeout();
        t.push_write_ok();
        let mut report = [0u8; REPORT_SIZE];
        report[0] = MODBUS_HID_RX_ID;
        report[1] = 1;
        report[2] = MODBUS_FC_READ_HOLDING_REGS | 0x80;
        report[3] = 0x02;
        t.push_read(&report);

        let cfg = Config::default();
        let err = send_and_wait(&mut t, &cfg, MODBUS_FC_READ_HOLDING_REGS, &[0, 0x8E, 0, 1], 3)
            .unwrap_err();
        assert!(matches!(
            err,
            ModbusError::Fatal(FatalError::Exception { code: 0x02, .. })
        ));
        assert_eq!(t.read_calls(), 1);
    }
}
