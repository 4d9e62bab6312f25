//! Typed register access: `read_holding` (FC 0x03) and `write_multiple` (FC 0x10).

use log::warn;

use crate::engine::send_and_wait;
use crate::error::{FatalError, ModbusError, ModbusResult};
use crate::transport::{Config, UsbTransport, MODBUS_FC_READ_HOLDING_REGS, MODBUS_FC_WRITE_MULTIPLE_REGS};

/// Reads `nregs` holding registers starting at `reg`, returning `nregs * 2`
/// raw big-endian bytes.
pub fn read_holding<T: UsbTransport>(
    transport: &mut T,
    cfg: &Config,
    reg: u16,
    nregs: u16,
) -> ModbusResult<Vec<u8>> {
    if nregs == 0 {
        return Err(ModbusError::Fatal(FatalError::Transport(
            "read_holding: nregs must be non-zero".to_string(),
        )));
    }

    let tx_pdu = [
        (reg >> 8) as u8,
        reg as u8,
        (nregs >> 8) as u8,
        nregs as u8,
    ];
    let expected_len = nregs as usize * 2 + 1;

    let rx_pdu = send_and_wait(transport, cfg, MODBUS_FC_READ_HOLDING_REGS, &tx_pdu, expected_len)?;

    let nbytes = rx_pdu[0] as usize;
    if nbytes != nregs as usize * 2 {
        warn!(
            "read_holding: response byte count {nbytes} disagrees with requested {} bytes, returning data anyway",
            nregs as usize * 2
        );
    }

    Ok(rx_pdu[1..].to_vec())
}

/// Writes `data` (`nregs * 2` bytes) to `nregs` holding registers starting
/// at `reg`.
pub fn write_multiple<T: UsbTransport>(
    transport: &mut T,
    cfg: &Config,
    reg: u16,
    nregs: u16,
    data: &[u8],
) -> ModbusResult<()> {
    if nregs == 0 {
        return Err(ModbusError::Fatal(FatalError::Transport(
            "write_multiple: nregs must be non-zero".to_string(),
        )));
    }
    if data.len() != nregs as usize * 2 {
        return Err(ModbusError::Fatal(FatalError::Transport(format!(
            "write_multiple: data length {} does not match nregs*2 ({})",
            data.len(),
            nregs as usize * 2
        ))));
    }

    let mut tx_pdu = Vec::with_capacity(5 + data.len());
    tx_pdu.push((reg >> 8) as u8);
    tx_pdu.push(reg as u8);
    tx_pdu.push((nregs >> 8) as u8);
    tx_pdu.push(nregs as u8);
    tx_pdu.push(data.len() as u8);
    tx_pdu.extend_from_slice(data);

    let rx_pdu = send_and_wait(transport, cfg, MODBUS_FC_WRITE_MULTIPLE_REGS, &tx_pdu, 4)?;

    if rx_pdu[..4] != tx_pdu[..4] {
        return Err(ModbusError::Fatal(FatalError::WriteMismatch {
            expected: tx_pdu[..4].to_vec(),
            got: rx_pdu[..4].to_vec(),
        }));
    }

    Ok(())
}

#[cfg(all(test, feature = "test-util"))]
mod tests {
    use super::*;
    use crate::testutil::ScriptedTransport;
    use crate::transport::{MODBUS_HID_RX_ID, REPORT_SIZE};

    #[test]
    fn output_voltage_scenario() {
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

        let cfg = Config::default();
        let data = read_holding(&mut t, &cfg, 142, 1).unwrap();
        assert_eq!(data, vec![0x0E, 0xD8]);
    }

    #[test]
    fn write_multiple_rejects_zero_registers() {
        let mut t = ScriptedTransport::new();
        let cfg = Config::default();
        assert!(write_multiple(&mut t, &cfg, 1538, 0, &[]).is_err());
    }
}
