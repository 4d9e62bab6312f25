use std::collections::VecDeque;
use std::fs;

use anyhow::{Context, Result};
use apc_smartups_modbus::transport::{TransferOutcome, UsbTransport, REPORT_SIZE};

/// A `UsbTransport` driven from a text script, for demos without real
/// hardware attached. Lines beginning with `RX ` carry a 64-byte hex
/// report to hand back on the next read; everything else is a comment.
pub struct ReplayTransport {
    reads: VecDeque<[u8; REPORT_SIZE]>,
}

impl ReplayTransport {
    pub fn load(path: &str) -> Result<Self> {
        let text = fs::read_to_string(path).with_context(|| format!("reading replay script {path}"))?;
        let mut reads = VecDeque::new();
        for line in text.lines() {
            let line = line.trim();
            let Some(hex) = line.strip_prefix("RX ") else {
                continue;
            };
            let bytes = decode_hex(hex.trim())?;
            anyhow::ensure!(
                bytes.len() == REPORT_SIZE,
                "replay report must be {REPORT_SIZE} bytes, got {}",
                bytes.len()
            );
            let mut report = [0u8; REPORT_SIZE];
            report.copy_from_slice(&bytes);
            reads.push_back(report);
        }
        Ok(ReplayTransport { reads })
    }
}

fn decode_hex(hex: &str) -> Result<Vec<u8>> {
    anyhow::ensure!(hex.len() % 2 == 0, "odd-length hex string");
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).context("invalid hex digit"))
        .collect()
}

impl UsbTransport for ReplayTransport {
    fn usb_interrupt_write(&mut self, _endpoint: u8, buf: &[u8], _timeout_ms: u32) -> TransferOutcome {
        TransferOutcome::Count(buf.len())
    }

    fn usb_interrupt_read(&mut self, _endpoint: u8, buf: &mut [u8], _timeout_ms: u32) -> TransferOutcome {
        match self.reads.pop_front() {
            Some(report) => {
                let n = report.len().min(buf.len());
                buf[..n].copy_from_slice(&report[..n]);
                TransferOutcome::Count(n)
            }
            None => TransferOutcome::TimedOut,
        }
    }
}
