/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use std::fmt;

use crate::consts::*;
use crate::errors::{FramingError, TransportError};

pub type Cid = [u8; 4];

bitflags! {
    pub struct Capability: u8 {
        const WINK = 0x01;
        const LOCK = 0x02;
    }
}

// Init structure for U2F Communications. Tells the receiver what channel
// communication is happening on, what command is running, and how much data to
// expect to receive over all.
//
// Spec at https://fidoalliance.org/specs/fido-u2f-v1.
// 0-nfc-bt-amendment-20150514/fido-u2f-hid-protocol.html#message--and-packet-structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct U2FHIDInit {
    // U2F Channel ID
    pub cid: Cid,
    // U2F Command, with the TYPE_INIT bit set
    pub cmd: u8,
    // 16-bit size of the whole message
    pub bcnt: u16,
    // Packet data, zero padded to the report capacity
    data: Vec<u8>,
}

impl U2FHIDInit {
    pub fn capacity(report_size: usize) -> usize {
        report_size - INIT_HEADER_SIZE
    }

    pub fn new(report_size: usize, cid: Cid, cmd: u8, bcnt: u16, init_data: &[u8]) -> Self {
        let capacity = Self::capacity(report_size);
        assert!(init_data.len() <= capacity, "init chunk exceeds frame capacity");

        let mut data = vec![0u8; capacity];
        data[..init_data.len()].copy_from_slice(init_data);

        Self {
            cid,
            cmd: TYPE_INIT | cmd,
            bcnt,
            data,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut frame = Vec::with_capacity(INIT_HEADER_SIZE + self.data.len());
        frame.extend_from_slice(&self.cid);
        frame.push(self.cmd);
        frame.push((self.bcnt >> 8) as u8);
        frame.push(self.bcnt as u8);
        frame.extend_from_slice(&self.data);
        frame
    }

    pub fn bcnt(&self) -> usize {
        self.bcnt as usize
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

// Continuation structure for U2F Communications. After an Init structure is
// sent, continuation structures are used to transmit all extra data that
// wouldn't fit in the initial packet. The sequence number increases with every
// packet, until all data is received.
//
// https://fidoalliance.org/specs/fido-u2f-v1.0-nfc-bt-amendment-20150514/fido-u2f-hid-protocol.
// html#message--and-packet-structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct U2FHIDCont {
    // U2F Channel ID
    pub cid: Cid,
    // Continuation Sequence Number
    pub seq: u8,
    // Packet Data
    data: Vec<u8>,
}

impl U2FHIDCont {
    pub fn capacity(report_size: usize) -> usize {
        report_size - CONT_HEADER_SIZE
    }

    pub fn new(report_size: usize, cid: Cid, seq: u8, cont_data: &[u8]) -> Self {
        let capacity = Self::capacity(report_size);
        assert!(cont_data.len() <= capacity, "cont chunk exceeds frame capacity");

        let mut data = vec![0u8; capacity];
        data[..cont_data.len()].copy_from_slice(cont_data);

        Self {
            cid,
            seq: seq & SEQ_MASK,
            data,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut frame = Vec::with_capacity(CONT_HEADER_SIZE + self.data.len());
        frame.extend_from_slice(&self.cid);
        frame.push(self.seq);
        frame.extend_from_slice(&self.data);
        frame
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// A decoded report. The high bit of byte 4 tells both shapes apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum U2FHIDFrame {
    Init(U2FHIDInit),
    Cont(U2FHIDCont),
}

impl U2FHIDFrame {
    pub fn from_bytes(report_size: usize, buf: &[u8]) -> Result<Self, TransportError> {
        if buf.len() != report_size {
            return Err(TransportError::UnexpectedReportSize {
                expected: report_size,
                actual: buf.len(),
            });
        }

        let mut cid = [0u8; 4];
        cid.copy_from_slice(&buf[..4]);

        if buf[4] & TYPE_MASK == TYPE_INIT {
            Ok(U2FHIDFrame::Init(U2FHIDInit {
                cid,
                cmd: buf[4],
                bcnt: (buf[5] as u16) << 8 | (buf[6] as u16),
                data: buf[INIT_HEADER_SIZE..].to_vec(),
            }))
        } else {
            Ok(U2FHIDFrame::Cont(U2FHIDCont {
                cid,
                seq: buf[4],
                data: buf[CONT_HEADER_SIZE..].to_vec(),
            }))
        }
    }

    pub fn cid(&self) -> &Cid {
        match *self {
            U2FHIDFrame::Init(ref init) => &init.cid,
            U2FHIDFrame::Cont(ref cont) => &cont.cid,
        }
    }
}

// Reply sent after initialization command. Contains information about U2F USB
// Key versioning, as well as the communication channel to be used for all
// further requests.
//
// https://fidoalliance.org/specs/fido-u2f-v1.0-nfc-bt-amendment-20150514/fido-u2f-hid-protocol.
// html#u2fhid_init
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct U2FHIDInitResp {
    pub cid: Cid,
    pub version_interface: u8,
    pub version_major: u8,
    pub version_minor: u8,
    pub version_build: u8,
    pub cap_flags: Capability,
}

impl U2FHIDInitResp {
    /// Returns `Ok(None)` when the response answers somebody else's nonce.
    pub fn read(data: &[u8], nonce: &[u8]) -> Result<Option<Self>, FramingError> {
        if data.len() < INIT_NONCE_SIZE || nonce != &data[..INIT_NONCE_SIZE] {
            return Ok(None);
        }

        if data.len() < INIT_NONCE_SIZE + 4 {
            return Err(FramingError::InvalidInitResponse(data.len()));
        }

        let mut cid = [0u8; 4];
        cid.copy_from_slice(&data[INIT_NONCE_SIZE..INIT_NONCE_SIZE + 4]);

        // Older tokens stop after the channel id. A CTAPHID host SHALL accept
        // a response size that is longer than the anticipated size.
        let byte = |i: usize| data.get(INIT_NONCE_SIZE + 4 + i).copied().unwrap_or(0);

        Ok(Some(Self {
            cid,
            version_interface: byte(0),
            version_major: byte(1),
            version_minor: byte(2),
            version_build: byte(3),
            cap_flags: Capability::from_bits_truncate(byte(4)),
        }))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct U2FDeviceInfo {
    pub version_interface: u8,
    pub version_major: u8,
    pub version_minor: u8,
    pub version_build: u8,
    pub cap_flags: Capability,
}

impl From<&U2FHIDInitResp> for U2FDeviceInfo {
    fn from(rsp: &U2FHIDInitResp) -> Self {
        Self {
            version_interface: rsp.version_interface,
            version_major: rsp.version_major,
            version_minor: rsp.version_minor,
            version_build: rsp.version_build,
            cap_flags: rsp.cap_flags,
        }
    }
}

impl fmt::Display for U2FDeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "U2FHID interface v{}, device v{}.{}.{}, capabilities {:?}",
            self.version_interface,
            self.version_major,
            self.version_minor,
            self.version_build,
            self.cap_flags
        )
    }
}
