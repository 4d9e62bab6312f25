//! An in-memory scripted `UsbTransport`, used by this crate's own tests and
//! available to downstream integration tests behind the `test-util` feature.

use std::collections::VecDeque;

use crate::transport::{TransferOutcome, UsbTransport, REPORT_SIZE};

enum ScriptedRead {
    Timeout,
    Interrupted,
    Fatal,
    Data(Vec<u8>),
}

/// A queue of canned reads and writes, consumed in FIFO order.
///
/// Unscripted writes default to a full, successful transfer; unscripted
/// reads default to a timeout, which is usually the quietest way to let a
/// `wait_idle` call fall through once the script runs dry.
#[derive(Default)]
pub struct ScriptedTransport {
    reads: VecDeque<ScriptedRead>,
    writes: VecDeque<TransferOutcome>,
    read_calls: usize,
    write_calls: usize,
    written: Vec<Vec<u8>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_timeout(&mut self) {
        self.reads.push_back(ScriptedRead::Timeout);
    }

    pub fn push_interrupted(&mut self) {
        self.reads.push_back(ScriptedRead::Interrupted);
    }

    pub fn push_fatal_read(&mut self) {
        self.reads.push_back(ScriptedRead::Fatal);
    }

    pub fn push_read(&mut self, report: &[u8]) {
        self.reads.push_back(ScriptedRead::Data(report.to_vec()));
    }

    pub fn push_write_ok(&mut self) {
        self.writes.push_back(TransferOutcome::Count(REPORT_SIZE));
    }

    pub fn push_write_short(&mut self, n: usize) {
        self.writes.push_back(TransferOutcome::Count(n));
    }

    pub fn push_write_fatal(&mut self) {
        self.writes.push_back(TransferOutcome::Fatal);
    }

    pub fn read_calls(&self) -> usize {
        self.read_calls
    }

    pub fn write_calls(&self) -> usize {
        self.write_calls
    }

    /// Every report handed to `usb_interrupt_write`, in call order.
    pub fn written_reports(&self) -> &[Vec<u8>] {
        &self.written
    }
}

impl UsbTransport for ScriptedTransport {
    fn usb_interrupt_write(&mut self, _endpoint: u8, buf: &[u8], _timeout_ms: u32) -> TransferOutcome {
        self.write_calls += 1;
        self.written.push(buf.to_vec());
        self.writes
            .pop_front()
            .unwrap_or(TransferOutcome::Count(buf.len()))
    }

    fn usb_interrupt_read(&mut self, _endpoint: u8, buf: &mut [u8], _timeout_ms: u32) -> TransferOutcome {
        self.read_calls += 1;
        match self.reads.pop_front() {
            None | Some(ScriptedRead::Timeout) => TransferOutcome::TimedOut,
            Some(ScriptedRead::Interrupted) => TransferOutcome::Interrupted,
            Some(ScriptedRead::Fatal) => TransferOutcome::Fatal,
            Some(ScriptedRead::Data(data)) => {
                let n = data.len().min(buf.len());
                buf[..n].copy_from_slice(&data[..n]);
                TransferOutcome::Count(n)
            }
        }
    }
}
