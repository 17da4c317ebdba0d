/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

#![no_main]
#[macro_use]
extern crate libfuzzer_sys;
extern crate u2fhost;

use std::collections::VecDeque;
use std::io;
use std::time::Duration;

use u2fhost::consts::{HID_RPT_SIZE, U2FHID_INIT};
use u2fhost::{ChannelConfig, HIDTransport, HidChannel, Nonce};

const NONCE: [u8; 8] = [0x08, 0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01];

// Answers INIT properly, then replays the fuzz input as input reports.
struct TestDevice {
    reads: VecDeque<Vec<u8>>,
}

impl TestDevice {
    fn new(data: &[u8]) -> Self {
        let mut init = vec![0xff, 0xff, 0xff, 0xff, U2FHID_INIT, 0x00, 0x11];
        init.extend_from_slice(&NONCE);
        init.extend_from_slice(&[0x01, 0x02, 0x03, 0x04, 0x02, 0x01, 0x00, 0x00, 0x01]);
        init.resize(HID_RPT_SIZE, 0);

        let mut reads = VecDeque::new();
        reads.push_back(init);
        for chunk in data.chunks(HID_RPT_SIZE) {
            let mut report = chunk.to_vec();
            report.resize(HID_RPT_SIZE, 0);
            reads.push_back(report);
        }
        Self { reads }
    }
}

impl HIDTransport for TestDevice {
    fn write_report(&mut self, report: &[u8], _timeout: Duration) -> io::Result<usize> {
        assert_eq!(report.len(), HID_RPT_SIZE);
        Ok(report.len())
    }

    fn read_report(&mut self, _timeout: Duration) -> io::Result<Vec<u8>> {
        self.reads
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::TimedOut, "done"))
    }
}

fuzz_target!(|data: &[u8]| {
    if !data.is_empty() {
        let cmd = data[0];
        let data = &data[1..];
        let mut channel = HidChannel::new(TestDevice::new(data), ChannelConfig::default());
        if channel.init(Nonce::Use(NONCE), &|| true).is_ok() {
            let _ = channel.transmit(cmd, data);
        }
    }
});
