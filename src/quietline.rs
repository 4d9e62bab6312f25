//! Drains the RX endpoint until it has been quiet for an interframe window.

use std::time::{Duration, Instant};

use log::trace;

use crate::error::{FatalError, ModbusError};
use crate::transport::{Config, TransferOutcome, UsbTransport, EP_RX, MODBUS_HID_RX_ID, REPORT_SIZE};

const MIN_READ_TIMEOUT_MS: u32 = 5;

/// Blocks until the RX endpoint has produced no MODBUS report for
/// `cfg.interframe_timeout_ms`, or the `cfg.idle_wait_timeout_ms` hard
/// ceiling is reached.
pub fn wait_idle<T: UsbTransport>(transport: &mut T, cfg: &Config) -> Result<(), ModbusError> {
    let start = Instant::now();
    let exit_at = start + Duration::from_millis(cfg.idle_wait_timeout_ms as u64);
    let mut quiet_until = start + Duration::from_millis(cfg.interframe_timeout_ms as u64);

    loop {
        let now = Instant::now();
        if quiet_until > exit_at {
            return Err(ModbusError::Fatal(FatalError::Transport(
                "quiet line never idle".to_string(),
            )));
        }

        let remaining_ms = quiet_until.saturating_duration_since(now).as_millis() as u32;
        let timeout = remaining_ms.max(MIN_READ_TIMEOUT_MS);

        let mut report = [0u8; REPORT_SIZE];
        match transport.usb_interrupt_read(EP_RX, &mut report, timeout) {
            TransferOutcome::TimedOut => {
                trace!("quiet line: read timed out, line is idle");
                return Ok(());
            }
            TransferOutcome::Interrupted => continue,
            TransferOutcome::Fatal => {
                return Err(ModbusError::Fatal(FatalError::Transport(
                    "usb_interrupt_read failed while waiting for a quiet line".to_string(),
                )))
            }
            TransferOutcome::Count(n) if n > 0 && report[0] == MODBUS_HID_RX_ID => {
                trace!("quiet line: out of sync, MODBUS report arrived unexpectedly, resetting window");
                quiet_until = Instant::now() + Duration::from_millis(cfg.interframe_timeout_ms as u64);
            }
            TransferOutcome::Count(_) => {
                trace!("quiet line: ignoring unrelated HID report");
            }
        }

        if quiet_until > exit_at {
            return Err(ModbusError::Fatal(FatalError::Transport(
                "quiet line never idle".to_string(),
            )));
        }
    }
}

#[cfg(all(test, feature = "test-util"))]
mod tests {
    use super::*;
    use crate::testutil::ScriptedTransport;

    #[test]
    fn idle_from_the_start_succeeds_immediately() {
        let mut t = ScriptedTransport::new();
        t.push_timeout();
        let cfg = Config::default();
        assert!(wait_idle(&mut t, &cfg).is_ok());
    }

    #[test]
    fn non_modbus_reports_are_drained_without_reset() {
        let mut t = ScriptedTransport::new();
        t.push_read(&{
            let mut r = [0u8; REPORT_SIZE];
            r[0] = 0x07;
            r
        });
        t.push_read(&{
            let mut r = [0u8; REPORT_SIZE];
            r[0] = 0x07;
            r
        });
        t.push_timeout();
        let cfg = Config::default();
        assert!(wait_idle(&mut t, &cfg).is_ok());
    }
}
