/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use std::io;
use std::time::Duration;

use crate::consts::{HID_RPT_SIZE, U2FHID_FRAME_TIMEOUT, U2FHID_INIT_RETRY_DELAY};

pub mod hid;

#[cfg(test)]
pub(crate) mod testdevice;

/// Raw access to an opened HID device. Implementations block until the
/// report was transferred or `timeout` elapsed; a timeout must be reported as
/// `io::ErrorKind::TimedOut`.
pub trait HIDTransport {
    /// Writes one output report and returns the number of bytes accepted.
    fn write_report(&mut self, report: &[u8], timeout: Duration) -> io::Result<usize>;

    /// Reads one input report.
    fn read_report(&mut self, timeout: Duration) -> io::Result<Vec<u8>>;
}

impl<T: HIDTransport + ?Sized> HIDTransport for Box<T> {
    fn write_report(&mut self, report: &[u8], timeout: Duration) -> io::Result<usize> {
        (**self).write_report(report, timeout)
    }

    fn read_report(&mut self, timeout: Duration) -> io::Result<Vec<u8>> {
        (**self).read_report(timeout)
    }
}

impl<T: HIDTransport + ?Sized> HIDTransport for &mut T {
    fn write_report(&mut self, report: &[u8], timeout: Duration) -> io::Result<usize> {
        (**self).write_report(report, timeout)
    }

    fn read_report(&mut self, timeout: Duration) -> io::Result<Vec<u8>> {
        (**self).read_report(timeout)
    }
}

/// Device discovery, provided by the platform layer. Closing a device is
/// dropping it.
pub trait HIDEnumerator {
    type Device: HIDTransport;

    fn open(&self, vendor_id: u16, product_id: u16) -> Option<Self::Device>;
}

// (vendor id, product id) of tokens known to speak U2FHID.
pub const KNOWN_DEVICES: &[(u16, u16)] = &[
    (0x1050, 0x0200), // Gnubby
    (0x1050, 0x0113), // YubiKey NEO U2F
    (0x1050, 0x0114), // YubiKey NEO OTP+U2F
    (0x1050, 0x0115), // YubiKey NEO U2F+CCID
    (0x1050, 0x0116), // YubiKey NEO OTP+U2F+CCID
    (0x1050, 0x0120), // Security Key by Yubico
    (0x1050, 0x0410), // YubiKey Plus
    (0x1050, 0x0402), // YubiKey 4 U2F
    (0x1050, 0x0403), // YubiKey 4 OTP+U2F
    (0x1050, 0x0406), // YubiKey 4 U2F+CCID
    (0x1050, 0x0407), // YubiKey 4 OTP+U2F+CCID
];

/// Opens the first connected device from `KNOWN_DEVICES`.
pub fn open_known_device<E: HIDEnumerator>(enumerator: &E) -> Option<E::Device> {
    KNOWN_DEVICES.iter().find_map(|&(vendor_id, product_id)| {
        let device = enumerator.open(vendor_id, product_id);
        if device.is_some() {
            debug!("found token {:04x}:{:04x}", vendor_id, product_id);
        }
        device
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelConfig {
    /// Size of every input and output report, without a report id.
    pub report_size: usize,
    /// Applied to each single report read or write.
    pub timeout: Duration,
    /// Pause before re-sending INIT after somebody else's nonce was echoed.
    pub init_retry_delay: Duration,
    /// `None` keeps retrying INIT until the caller cancels.
    pub max_init_attempts: Option<usize>,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            report_size: HID_RPT_SIZE,
            timeout: U2FHID_FRAME_TIMEOUT,
            init_retry_delay: U2FHID_INIT_RETRY_DELAY,
            max_init_attempts: None,
        }
    }
}
