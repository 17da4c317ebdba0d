/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use rand::{thread_rng, RngCore};
use std::cmp;
use std::thread;

use super::{ChannelConfig, HIDTransport};
use crate::apdu::APDUDevice;
use crate::consts::*;
use crate::errors::{AuthenticatorError, FramingError, TransportError};
use crate::u2ftypes::{
    Capability, Cid, U2FDeviceInfo, U2FHIDCont, U2FHIDFrame, U2FHIDInit, U2FHIDInitResp,
};
use crate::util::trace_hex;
use crate::Result;

pub enum Nonce {
    CreateRandom,
    Use([u8; INIT_NONCE_SIZE]),
}

enum ChannelState {
    Unbound,
    Bound(U2FDeviceInfo),
}

/// A U2FHID channel over one HID device. Starts out on the broadcast channel
/// and only carries commands once `init` negotiated a channel id.
pub struct HidChannel<T: HIDTransport> {
    transport: T,
    config: ChannelConfig,
    cid: Cid,
    state: ChannelState,
}

impl<T: HIDTransport> HidChannel<T> {
    pub fn new(transport: T, config: ChannelConfig) -> Self {
        Self {
            transport,
            config,
            cid: CID_BROADCAST,
            state: ChannelState::Unbound,
        }
    }

    /// Creates a channel and runs the INIT handshake with a random nonce.
    pub fn open(transport: T, config: ChannelConfig, alive: &dyn Fn() -> bool) -> Result<Self> {
        let mut channel = Self::new(transport, config);
        channel.init(Nonce::CreateRandom, alive)?;
        Ok(channel)
    }

    pub fn init(&mut self, noncecmd: Nonce, alive: &dyn Fn() -> bool) -> Result<()> {
        let nonce = match noncecmd {
            Nonce::Use(x) => x,
            Nonce::CreateRandom => {
                let mut nonce = [0u8; INIT_NONCE_SIZE];
                thread_rng().fill_bytes(&mut nonce);
                nonce
            }
        };

        // Send Init to broadcast address to create a new channel
        self.cid = CID_BROADCAST;
        self.state = ChannelState::Unbound;

        let mut attempts = 0;
        loop {
            if !alive() {
                return Err(AuthenticatorError::Cancelled);
            }
            attempts += 1;

            let raw = self.call(CID_BROADCAST, U2FHID_INIT, &nonce)?;
            if let Some(rsp) = U2FHIDInitResp::read(&raw, &nonce)? {
                let info = U2FDeviceInfo::from(&rsp);
                debug!("bound channel {:02x?}: {}", rsp.cid, info);

                self.cid = rsp.cid;
                self.state = ChannelState::Bound(info);
                return Ok(());
            }

            // Another host is initializing on the broadcast channel too.
            debug!("INIT answered a different nonce (attempt {})", attempts);
            if let Some(max) = self.config.max_init_attempts {
                if attempts >= max {
                    return Err(FramingError::InitAttemptsExhausted(attempts).into());
                }
            }
            thread::sleep(self.config.init_retry_delay);
        }
    }

    pub fn is_bound(&self) -> bool {
        matches!(self.state, ChannelState::Bound(_))
    }

    pub fn cid(&self) -> &Cid {
        &self.cid
    }

    pub fn device_info(&self) -> Option<&U2FDeviceInfo> {
        match self.state {
            ChannelState::Bound(ref info) => Some(info),
            ChannelState::Unbound => None,
        }
    }

    pub fn into_inner(self) -> T {
        self.transport
    }

    /// Sends one U2FHID command on the bound channel and returns the payload
    /// of the matching response.
    pub fn transmit(&mut self, cmd: u8, data: &[u8]) -> Result<Vec<u8>> {
        if !self.is_bound() {
            return Err(FramingError::ChannelNotBound.into());
        }
        let cid = self.cid;
        self.call(cid, cmd, data)
    }

    pub fn ping(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        self.transmit(U2FHID_PING, data)
    }

    /// Asks the device to identify itself. Returns `false` without talking to
    /// the device if it didn't advertise the capability.
    pub fn wink(&mut self) -> Result<bool> {
        let can_wink = match self.state {
            ChannelState::Bound(ref info) => info.cap_flags.contains(Capability::WINK),
            ChannelState::Unbound => return Err(FramingError::ChannelNotBound.into()),
        };
        if !can_wink {
            debug!("device doesn't support wink");
            return Ok(false);
        }

        self.transmit(U2FHID_WINK, &[])?;
        Ok(true)
    }

    fn call(&mut self, cid: Cid, cmd: u8, data: &[u8]) -> Result<Vec<u8>> {
        let report_size = self.config.report_size;
        if report_size < MIN_HID_RPT_SIZE {
            return Err(FramingError::InvalidReportSize(report_size).into());
        }

        // Responses carry the command with the init bit set.
        let cmd = TYPE_INIT | cmd;
        self.send_request(cid, cmd, data)?;
        self.read_response(cid, cmd)
    }

    fn send_request(&mut self, cid: Cid, cmd: u8, data: &[u8]) -> Result<()> {
        if data.len() > MAX_HID_PAYLOAD {
            return Err(FramingError::PayloadTooLarge {
                len: data.len(),
                max: MAX_HID_PAYLOAD,
            }
            .into());
        }

        let report_size = self.config.report_size;
        let first = cmp::min(data.len(), U2FHIDInit::capacity(report_size));
        let (init_data, rest) = data.split_at(first);

        let init = U2FHIDInit::new(report_size, cid, cmd, data.len() as u16, init_data);
        self.write_frame(&init.to_bytes())?;

        // Send continuation packets. Sequence numbers wrap at 128.
        for (sequence, chunk) in rest.chunks(U2FHIDCont::capacity(report_size)).enumerate() {
            let cont = U2FHIDCont::new(report_size, cid, sequence as u8, chunk);
            self.write_frame(&cont.to_bytes())?;
        }

        Ok(())
    }

    fn read_response(&mut self, cid: Cid, cmd: u8) -> Result<Vec<u8>> {
        let report_size = self.config.report_size;

        let init = loop {
            let report = self.read_frame()?;
            match U2FHIDFrame::from_bytes(report_size, &report)? {
                U2FHIDFrame::Init(init) if init.cid == cid && init.cmd == cmd => break init,
                U2FHIDFrame::Init(ref init) if init.cid == cid && init.cmd == U2FHID_ERROR => {
                    return Err(device_error(init).into());
                }
                frame => trace!(
                    "ignoring frame on {:02x?} while waiting for {:#04x}",
                    frame.cid(),
                    cmd
                ),
            }
        };

        let total = init.bcnt();
        let mut data = Vec::with_capacity(total);
        let first = cmp::min(total, init.data().len());
        data.extend_from_slice(&init.data()[..first]);

        let mut sequence = 0u8;
        while data.len() < total {
            let report = self.read_frame()?;
            let frame = U2FHIDFrame::from_bytes(report_size, &report)?;
            if *frame.cid() != cid {
                return Err(FramingError::WrongChannel {
                    expected: cid,
                    actual: *frame.cid(),
                }
                .into());
            }

            match frame {
                U2FHIDFrame::Cont(cont) => {
                    if cont.seq != sequence {
                        return Err(FramingError::WrongSequence {
                            expected: sequence,
                            actual: cont.seq,
                        }
                        .into());
                    }
                    let max = cmp::min(total - data.len(), cont.data().len());
                    data.extend_from_slice(&cont.data()[..max]);
                    sequence = (sequence + 1) & SEQ_MASK;
                }
                U2FHIDFrame::Init(ref init) if init.cmd == U2FHID_ERROR => {
                    return Err(device_error(init).into());
                }
                U2FHIDFrame::Init(init) => {
                    return Err(FramingError::WrongSequence {
                        expected: sequence,
                        actual: init.cmd,
                    }
                    .into());
                }
            }
        }

        trace!("response cmd={:#04x}: {} bytes", cmd, data.len());
        Ok(data)
    }

    fn write_frame(&mut self, frame: &[u8]) -> Result<()> {
        trace_hex("send", frame);
        let written = self.transport.write_report(frame, self.config.timeout)?;
        if written != frame.len() {
            return Err(TransportError::IncompleteWrite {
                expected: frame.len(),
                written,
            }
            .into());
        }
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Vec<u8>> {
        let report = self.transport.read_report(self.config.timeout)?;
        trace_hex("recv", &report);
        Ok(report)
    }
}

fn device_error(init: &U2FHIDInit) -> FramingError {
    if init.bcnt() > 0 {
        FramingError::DeviceError(init.data().first().copied())
    } else {
        FramingError::DeviceError(None)
    }
}

impl<T: HIDTransport> APDUDevice for HidChannel<T> {
    fn send_apdu(&mut self, request: &[u8]) -> Result<Vec<u8>> {
        self.transmit(U2FHID_MSG, request)
    }
}

#[cfg(test)]
mod tests {
    use super::{HidChannel, Nonce};
    use crate::apdu::APDUDevice;
    use crate::consts::*;
    use crate::errors::{AuthenticatorError, FramingError, TransportError};
    use crate::transport::testdevice::TestDevice;
    use crate::transport::ChannelConfig;
    use crate::u2ftypes::{Capability, Cid};
    use std::cell::Cell;
    use std::cmp;
    use std::time::Duration;

    const NONCE: [u8; 8] = [0x08, 0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01];
    const CID: Cid = [0x00, 0x03, 0x02, 0x01];

    fn fast_config() -> ChannelConfig {
        ChannelConfig {
            init_retry_delay: Duration::from_millis(1),
            ..ChannelConfig::default()
        }
    }

    fn add_init_exchange(device: &mut TestDevice, echoed: &[u8; 8], cid: &Cid, caps: u8) {
        let mut write = vec![0xff, 0xff, 0xff, 0xff, U2FHID_INIT, 0x00, 0x08];
        write.extend_from_slice(&NONCE);
        device.add_write(&write, 0);

        let mut read = vec![0xff, 0xff, 0xff, 0xff, U2FHID_INIT, 0x00, 0x11];
        read.extend_from_slice(echoed);
        read.extend_from_slice(cid);
        read.extend_from_slice(&[0x02, 0x04, 0x01, 0x08, caps]);
        device.add_read(&read, 0);
    }

    fn scripted() -> TestDevice {
        let mut device = TestDevice::new();
        add_init_exchange(&mut device, &NONCE, &CID, Capability::WINK.bits());
        device
    }

    fn bound(device: TestDevice) -> HidChannel<TestDevice> {
        let mut channel = HidChannel::new(device, fast_config());
        channel.init(Nonce::Use(NONCE), &|| true).unwrap();
        channel
    }

    // Splits a message into the frames a 64 byte report device exchanges.
    fn frames(cid: &Cid, cmd: u8, data: &[u8]) -> Vec<Vec<u8>> {
        let mut init = cid.to_vec();
        init.push(cmd);
        init.push((data.len() >> 8) as u8);
        init.push(data.len() as u8);
        let first = cmp::min(data.len(), 57);
        init.extend_from_slice(&data[..first]);

        let mut frames = vec![init];
        for (seq, chunk) in data[first..].chunks(59).enumerate() {
            let mut cont = cid.to_vec();
            cont.push((seq % 128) as u8);
            cont.extend_from_slice(chunk);
            frames.push(cont);
        }
        frames
    }

    fn empty_response(device: &mut TestDevice, cmd: u8) {
        let mut read = CID.to_vec();
        read.extend_from_slice(&[cmd, 0x00, 0x00]);
        device.add_read(&read, 0);
    }

    #[test]
    fn test_init_binds_channel() {
        let mut device = TestDevice::new();
        add_init_exchange(&mut device, &NONCE, &CID, Capability::WINK.bits());

        let mut channel = HidChannel::new(device, fast_config());
        assert!(!channel.is_bound());
        assert_eq!(channel.cid(), &CID_BROADCAST);

        channel.init(Nonce::Use(NONCE), &|| true).unwrap();
        assert!(channel.is_bound());
        assert_eq!(channel.cid(), &CID);

        let info = channel.device_info().unwrap();
        assert_eq!(info.version_interface, 0x02);
        assert_eq!(info.version_major, 0x04);
        assert_eq!(info.version_minor, 0x01);
        assert_eq!(info.version_build, 0x08);
        assert_eq!(info.cap_flags, Capability::WINK);
    }

    #[test]
    fn test_init_retries_on_foreign_nonce() {
        let mut device = TestDevice::new();
        add_init_exchange(&mut device, &[0xee; 8], &[0x0d, 0x0e, 0x0a, 0x0d], 0);
        add_init_exchange(&mut device, &NONCE, &CID, 0);

        let mut channel = HidChannel::new(device, fast_config());
        channel.init(Nonce::Use(NONCE), &|| true).unwrap();
        assert_eq!(channel.cid(), &CID);
    }

    #[test]
    fn test_init_attempts_exhausted() {
        let mut device = TestDevice::new();
        add_init_exchange(&mut device, &[0xee; 8], &CID, 0);
        add_init_exchange(&mut device, &[0xdd; 8], &CID, 0);

        let config = ChannelConfig {
            max_init_attempts: Some(2),
            ..fast_config()
        };
        let mut channel = HidChannel::new(device, config);
        assert_matches!(
            channel.init(Nonce::Use(NONCE), &|| true),
            Err(AuthenticatorError::Framing(FramingError::InitAttemptsExhausted(2)))
        );
        assert!(!channel.is_bound());
    }

    #[test]
    fn test_init_cancelled() {
        // No I/O at all when the caller is already gone.
        let mut channel = HidChannel::new(TestDevice::new(), fast_config());
        assert_matches!(
            channel.init(Nonce::Use(NONCE), &|| false),
            Err(AuthenticatorError::Cancelled)
        );

        // Cancelled while waiting for our own nonce.
        let mut device = TestDevice::new();
        add_init_exchange(&mut device, &[0xee; 8], &CID, 0);
        let budget = Cell::new(1);
        let alive = || {
            let left = budget.get();
            budget.set(left - 1);
            left > 0
        };

        let mut channel = HidChannel::new(device, fast_config());
        assert_matches!(
            channel.init(Nonce::Use(NONCE), &alive),
            Err(AuthenticatorError::Cancelled)
        );
    }

    #[test]
    fn test_init_response_too_short() {
        let mut device = TestDevice::new();
        let mut write = vec![0xff, 0xff, 0xff, 0xff, U2FHID_INIT, 0x00, 0x08];
        write.extend_from_slice(&NONCE);
        device.add_write(&write, 0);
        let mut read = vec![0xff, 0xff, 0xff, 0xff, U2FHID_INIT, 0x00, 0x0a];
        read.extend_from_slice(&NONCE);
        device.add_read(&read, 0);

        let mut channel = HidChannel::new(device, fast_config());
        assert_matches!(
            channel.init(Nonce::Use(NONCE), &|| true),
            Err(AuthenticatorError::Framing(FramingError::InvalidInitResponse(10)))
        );
    }

    #[test]
    fn test_transmit_requires_binding() {
        let mut channel = HidChannel::new(TestDevice::new(), fast_config());
        assert_matches!(
            channel.ping(&[1, 2, 3]),
            Err(AuthenticatorError::Framing(FramingError::ChannelNotBound))
        );
        assert_matches!(
            channel.wink(),
            Err(AuthenticatorError::Framing(FramingError::ChannelNotBound))
        );
    }

    #[test]
    fn test_ping_multiple_frames() {
        let data: Vec<u8> = (0..228).map(|i| i as u8).collect();
        let expected = frames(&CID, U2FHID_PING, &data);
        assert_eq!(expected.len(), 4);
        assert_eq!(&expected[0][..7], &[0x00, 0x03, 0x02, 0x01, U2FHID_PING, 0x00, 0xe4]);
        assert_eq!(expected[3][4], 0x02);

        let mut device = scripted();
        for frame in &expected {
            device.add_write(frame, 0);
        }
        for frame in &expected {
            device.add_read(frame, 0);
        }

        let mut channel = bound(device);
        assert_eq!(channel.ping(&data).unwrap(), data);
    }

    #[test]
    fn test_frame_counts() {
        for &(len, count) in &[(0, 1), (56, 1), (57, 1), (58, 2), (116, 2), (117, 3), (1024, 18)] {
            let mut device = scripted().recording();
            empty_response(&mut device, U2FHID_PING);

            let mut channel = bound(device);
            channel.ping(&vec![0x5a; len]).unwrap();

            // Minus the INIT handshake.
            let written = channel.into_inner().take_written();
            let written = &written[1..];
            assert_eq!(written.len(), count, "payload of {} bytes", len);
            assert_eq!(written[0][5..7], [(len >> 8) as u8, len as u8]);
            assert!(written.iter().all(|frame| frame.len() == HID_RPT_SIZE));
        }
    }

    #[test]
    fn test_sequence_wraps() {
        let len = 57 + 59 * 130;
        let mut device = scripted().recording();
        empty_response(&mut device, U2FHID_PING);

        let mut channel = bound(device);
        channel.ping(&vec![0x33; len]).unwrap();

        let written = channel.into_inner().take_written();
        let written = &written[1..];
        assert_eq!(written.len(), 131);
        let sequences: Vec<u8> = written[1..].iter().map(|frame| frame[4]).collect();
        assert_eq!(sequences[0], 0);
        assert_eq!(sequences[127], 127);
        assert_eq!(sequences[128], 0);
        assert_eq!(sequences[129], 1);
    }

    #[test]
    fn test_small_reports() {
        let mut device = TestDevice::with_report_size(16).recording();
        let mut write = vec![0xff, 0xff, 0xff, 0xff, U2FHID_INIT, 0x00, 0x08];
        write.extend_from_slice(&NONCE[..]);
        let mut read = vec![0xff, 0xff, 0xff, 0xff, U2FHID_INIT, 0x00, 0x0c];
        read.extend_from_slice(&NONCE);
        read.push(0x07);
        device.add_read(&read, 0);
        let mut cont = vec![0xff, 0xff, 0xff, 0xff, 0x00];
        cont.extend_from_slice(&[0x02, 0x03, 0x01]);
        device.add_read(&cont, 0);

        let data: Vec<u8> = (0..20).collect();
        let mut echo = vec![0x07, 0x02, 0x03, 0x01, U2FHID_PING, 0x00, 20];
        echo.extend_from_slice(&data[..9]);
        device.add_read(&echo, 0);
        let mut echo_cont = vec![0x07, 0x02, 0x03, 0x01, 0x00];
        echo_cont.extend_from_slice(&data[9..]);
        device.add_read(&echo_cont, 0);

        let config = ChannelConfig {
            report_size: 16,
            ..fast_config()
        };
        let mut channel = HidChannel::new(device, config);
        channel.init(Nonce::Use(NONCE), &|| true).unwrap();
        assert_eq!(channel.cid(), &[0x07, 0x02, 0x03, 0x01]);
        assert_eq!(channel.ping(&data).unwrap(), data);

        let written = channel.into_inner().take_written();
        // INIT fits in one report, the ping needs a continuation.
        assert_eq!(written.len(), 3);
        assert_eq!(&written[0][..15], &write[..15]);
        assert_eq!(written[2][4], 0x00);
    }

    #[test]
    fn test_report_size_too_small() {
        for &size in &[0, 5, INIT_HEADER_SIZE] {
            let config = ChannelConfig {
                report_size: size,
                ..fast_config()
            };
            let mut channel = HidChannel::new(TestDevice::with_report_size(size), config);
            assert_matches!(
                channel.init(Nonce::Use(NONCE), &|| true),
                Err(AuthenticatorError::Framing(FramingError::InvalidReportSize(s))) if s == size
            );
        }
    }

    #[test]
    fn test_transmit_bare_command() {
        let mut device = scripted();
        let request = frames(&CID, U2FHID_PING, &[1, 2, 3]);
        device.add_write(&request[0], 0);
        device.add_read(&request[0], 0);

        let mut channel = bound(device);
        assert_eq!(channel.transmit(0x01, &[1, 2, 3]).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_payload_too_large() {
        let mut channel = bound(scripted());
        assert_matches!(
            channel.ping(&vec![0u8; MAX_HID_PAYLOAD + 1]),
            Err(AuthenticatorError::Framing(FramingError::PayloadTooLarge { .. }))
        );
    }

    #[test]
    fn test_wrong_sequence() {
        let mut device = scripted().recording();
        let mut init = CID.to_vec();
        init.extend_from_slice(&[U2FHID_PING, 0x00, 100]);
        device.add_read(&init, 0);
        let mut cont = CID.to_vec();
        cont.push(0x01);
        device.add_read(&cont, 0);

        let mut channel = bound(device);
        assert_matches!(
            channel.ping(&[]),
            Err(AuthenticatorError::Framing(FramingError::WrongSequence {
                expected: 0,
                actual: 1
            }))
        );
    }

    #[test]
    fn test_wrong_channel() {
        let mut device = scripted().recording();
        let mut init = CID.to_vec();
        init.extend_from_slice(&[U2FHID_PING, 0x00, 100]);
        device.add_read(&init, 0);
        device.add_read(&[0x0a, 0x0b, 0x0c, 0x0d, 0x00], 0);

        let mut channel = bound(device);
        assert_matches!(
            channel.ping(&[]),
            Err(AuthenticatorError::Framing(FramingError::WrongChannel {
                actual: [0x0a, 0x0b, 0x0c, 0x0d],
                ..
            }))
        );
    }

    #[test]
    fn test_device_error() {
        let mut device = scripted().recording();
        let mut error = CID.to_vec();
        error.extend_from_slice(&[U2FHID_ERROR, 0x00, 0x01, ERR_CHANNEL_BUSY]);
        device.add_read(&error, 0);

        let mut channel = bound(device);
        assert_matches!(
            channel.ping(&[1]),
            Err(AuthenticatorError::Framing(FramingError::DeviceError(Some(ERR_CHANNEL_BUSY))))
        );
    }

    #[test]
    fn test_stray_frames_ignored() {
        let mut device = scripted().recording();
        // Somebody else's conversation, then a stale continuation.
        device.add_read(&[0x0a, 0x0b, 0x0c, 0x0d, U2FHID_MSG, 0x00, 0x02, 0x90, 0x00], 0);
        device.add_read(&[0x0a, 0x0b, 0x0c, 0x0d, 0x00, 0xff], 0);
        for frame in frames(&CID, U2FHID_PING, &[4, 5, 6]) {
            device.add_read(&frame, 0);
        }

        let mut channel = bound(device);
        assert_eq!(channel.ping(&[4, 5, 6]).unwrap(), vec![4, 5, 6]);
    }

    #[test]
    fn test_read_timeout() {
        let mut device = scripted().recording();
        device.add_read_timeout();

        let mut channel = bound(device);
        assert_matches!(
            channel.ping(&[1]),
            Err(AuthenticatorError::Transport(TransportError::Timeout))
        );
    }

    #[test]
    fn test_unexpected_report_size() {
        let mut device = scripted().recording();
        device.add_raw_read(vec![0u8; 32]);

        let mut channel = bound(device);
        assert_matches!(
            channel.ping(&[1]),
            Err(AuthenticatorError::Transport(TransportError::UnexpectedReportSize {
                expected: 64,
                actual: 32
            }))
        );
    }

    #[test]
    fn test_incomplete_write() {
        let mut device = TestDevice::new().fail_writes_after(1);
        add_init_exchange(&mut device, &NONCE, &CID, 0);

        let mut channel = HidChannel::new(device, fast_config());
        channel.init(Nonce::Use(NONCE), &|| true).unwrap();
        assert_matches!(
            channel.ping(&[1, 2, 3]),
            Err(AuthenticatorError::Transport(TransportError::IncompleteWrite {
                expected: 64,
                written: 32
            }))
        );
    }

    #[test]
    fn test_wink() {
        let mut device = scripted();
        let mut wink = CID.to_vec();
        wink.extend_from_slice(&[U2FHID_WINK, 0x00, 0x00]);
        device.add_write(&wink, 0);
        device.add_read(&wink, 0);

        let mut channel = bound(device);
        assert!(channel.wink().unwrap());

        // Without the capability nothing is sent.
        let mut device = TestDevice::new();
        add_init_exchange(&mut device, &NONCE, &CID, 0);
        let mut channel = HidChannel::new(device, fast_config());
        channel.init(Nonce::Use(NONCE), &|| true).unwrap();
        assert!(!channel.wink().unwrap());
    }

    #[test]
    fn test_apdu_over_msg() {
        let mut device = scripted();
        let mut request = CID.to_vec();
        request.extend_from_slice(&[U2FHID_MSG, 0x00, 0x09]);
        request.extend_from_slice(&[0x00, U2F_VERSION, 0x00, 0x00, 0x00, 0x00, 0x00, 0x04, 0x00]);
        device.add_write(&request, 0);

        let mut response = CID.to_vec();
        response.extend_from_slice(&[U2FHID_MSG, 0x00, 0x08]);
        response.extend_from_slice(b"U2F_V2");
        response.extend_from_slice(&[0x90, 0x00]);
        device.add_read(&response, 0);

        let mut channel = bound(device);
        assert_eq!(channel.get_supported_versions().unwrap(), vec!["U2F_V2"]);
    }
}
