/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use std::collections::VecDeque;
use std::io;
use std::time::Duration;

use super::HIDTransport;
use crate::consts::HID_RPT_SIZE;

enum ScriptedRead {
    Report(Vec<u8>),
    Timeout,
}

/// A device that replays scripted reports and checks every written report
/// against the expected ones, in order.
pub struct TestDevice {
    report_size: usize,
    reads: VecDeque<ScriptedRead>,
    writes: VecDeque<Vec<u8>>,
    check_writes: bool,
    fail_writes_after: Option<usize>,
    pub written: Vec<Vec<u8>>,
}

impl TestDevice {
    pub fn new() -> TestDevice {
        Self::with_report_size(HID_RPT_SIZE)
    }

    pub fn with_report_size(report_size: usize) -> TestDevice {
        TestDevice {
            report_size,
            reads: VecDeque::new(),
            writes: VecDeque::new(),
            check_writes: true,
            fail_writes_after: None,
            written: vec![],
        }
    }

    /// Accepts any write, keeping a copy in `written`. Expected writes are
    /// dropped.
    pub fn recording(mut self) -> TestDevice {
        self.check_writes = false;
        self.writes.clear();
        self
    }

    /// Every write after the first `n` ones only transfers half a report.
    pub fn fail_writes_after(mut self, n: usize) -> TestDevice {
        self.fail_writes_after = Some(n);
        self
    }

    pub fn add_write(&mut self, packet: &[u8], fill_value: u8) {
        if !self.check_writes {
            return;
        }
        let mut write = vec![fill_value; self.report_size];
        write[..packet.len()].copy_from_slice(packet);
        self.writes.push_back(write);
    }

    pub fn take_written(&mut self) -> Vec<Vec<u8>> {
        std::mem::take(&mut self.written)
    }

    pub fn add_read(&mut self, packet: &[u8], fill_value: u8) {
        let mut read = vec![fill_value; self.report_size];
        read[..packet.len()].copy_from_slice(packet);
        self.reads.push_back(ScriptedRead::Report(read));
    }

    pub fn add_raw_read(&mut self, report: Vec<u8>) {
        self.reads.push_back(ScriptedRead::Report(report));
    }

    pub fn add_read_timeout(&mut self) {
        self.reads.push_back(ScriptedRead::Timeout);
    }
}

impl HIDTransport for TestDevice {
    fn write_report(&mut self, bytes: &[u8], _timeout: Duration) -> io::Result<usize> {
        if let Some(limit) = self.fail_writes_after {
            if self.written.len() >= limit {
                return Ok(bytes.len() / 2);
            }
        }

        self.written.push(bytes.to_vec());
        if self.check_writes {
            // Pop a vector from the expected writes, check for equality
            // against bytes array.
            let check = self
                .writes
                .pop_front()
                .expect("Ran out of expected write values!");
            assert_eq!(check.len(), bytes.len());
            assert_eq!(&check[..], bytes);
        }
        Ok(bytes.len())
    }

    fn read_report(&mut self, _timeout: Duration) -> io::Result<Vec<u8>> {
        match self.reads.pop_front().expect("Ran out of read values!") {
            ScriptedRead::Report(report) => Ok(report),
            ScriptedRead::Timeout => Err(io::Error::new(io::ErrorKind::TimedOut, "read timeout")),
        }
    }
}

impl Drop for TestDevice {
    fn drop(&mut self) {
        if !std::thread::panicking() {
            assert_eq!(self.reads.len(), 0, "unconsumed reads");
            assert_eq!(self.writes.len(), 0, "unconsumed writes");
        }
    }
}
