/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

// Allow dead code in this module, since it's all packet consts anyways.
#![allow(dead_code)]

use std::time::Duration;

pub const HID_RPT_SIZE: usize = 64;
pub const INIT_HEADER_SIZE: usize = 7;
pub const CONT_HEADER_SIZE: usize = 5;
// An INIT frame needs room for at least one payload byte.
pub const MIN_HID_RPT_SIZE: usize = INIT_HEADER_SIZE + 1;
pub const U2FAPDUHEADER_SIZE: usize = 7;
pub const CID_BROADCAST: [u8; 4] = [0xff, 0xff, 0xff, 0xff];
pub const TYPE_MASK: u8 = 0x80;
pub const TYPE_INIT: u8 = 0x80;
pub const TYPE_CONT: u8 = 0x00;
pub const SEQ_MASK: u8 = 0x7f;

// Largest payload the 16-bit INIT length field can describe.
pub const MAX_HID_PAYLOAD: usize = 0xffff;
// Largest payload the 24-bit APDU length field can describe.
pub const MAX_APDU_PAYLOAD: usize = 0x00ff_ffff;

// General constants

pub const U2FHID_IF_VERSION: u32 = 2; // Current interface implementation version
pub const U2FHID_FRAME_TIMEOUT: Duration = Duration::from_millis(1000); // Per report read/write
pub const U2FHID_INIT_RETRY_DELAY: Duration = Duration::from_millis(100); // Nonce mismatch backoff
pub const TOUCH_RETRY_DELAY: Duration = Duration::from_millis(250); // Wait for user presence

// U2FHID native commands

pub const U2FHID_PING: u8 = TYPE_INIT | 0x01; // Echo data through local processor only
pub const U2FHID_MSG: u8 = TYPE_INIT | 0x03; // Send U2F message frame
pub const U2FHID_LOCK: u8 = TYPE_INIT | 0x04; // Send lock channel command
pub const U2FHID_INIT: u8 = TYPE_INIT | 0x06; // Channel initialization
pub const U2FHID_WINK: u8 = TYPE_INIT | 0x08; // Send device identification wink
pub const U2FHID_ERROR: u8 = TYPE_INIT | 0x3f; // Error response (STAT_ERR)

// U2FHID_INIT command defines

pub const INIT_NONCE_SIZE: usize = 8; // Size of channel initialization challenge
pub const INIT_RESP_SIZE: usize = INIT_NONCE_SIZE + 9; // Nonce, cid, versions, flags

// U2F raw message instructions

pub const U2F_REGISTER: u8 = 0x01; // Registration command (ENROLL)
pub const U2F_AUTHENTICATE: u8 = 0x02; // Authenticate/sign command
pub const U2F_VERSION: u8 = 0x03; // Read version string command

// U2F_REGISTER / U2F_AUTHENTICATE control bytes

pub const U2F_REQUEST_USER_PRESENCE: u8 = 0x03; // Verify user presence and sign
pub const U2F_CHECK_IS_REGISTERED: u8 = 0x07; // Check if the key handle is registered

// APDU request trailer: maximum expected response length, 2^16.
pub const APDU_LE: [u8; 2] = [0x04, 0x00];

// APDU response status words

pub const SW_NO_ERROR: u16 = 0x9000;
pub const SW_CONDITIONS_NOT_SATISFIED: u16 = 0x6985;
pub const SW_WRONG_DATA: u16 = 0x6a80;
pub const SW_WRONG_LENGTH: u16 = 0x6700;
pub const SW_INS_NOT_SUPPORTED: u16 = 0x6d00;
pub const SW_CLA_NOT_SUPPORTED: u16 = 0x6e00;

// U2F message parameters

pub const PARAMETER_SIZE: usize = 32;
pub const U2F_V2: &str = "U2F_V2";
pub const LEGACY_VERSION: &str = "v0";
pub const REGISTER_RESERVED_BYTE: u8 = 0x05;
pub const P256_POINT_SIZE: usize = 65;
pub const MAX_KEY_HANDLE_SIZE: usize = 255;

// Client data types

pub const TYP_REGISTRATION: &str = "navigator.id.finishEnrollment";
pub const TYP_AUTHENTICATION: &str = "navigator.id.getAssertion";

// Low-level error codes carried in U2FHID_ERROR frames.

pub const ERR_NONE: u8 = 0x00; // No error
pub const ERR_INVALID_CMD: u8 = 0x01; // Invalid command
pub const ERR_INVALID_PAR: u8 = 0x02; // Invalid parameter
pub const ERR_INVALID_LEN: u8 = 0x03; // Invalid message length
pub const ERR_INVALID_SEQ: u8 = 0x04; // Invalid message sequencing
pub const ERR_MSG_TIMEOUT: u8 = 0x05; // Message has timed out
pub const ERR_CHANNEL_BUSY: u8 = 0x06; // Channel busy
pub const ERR_LOCK_REQUIRED: u8 = 0x0a; // Command requires channel lock
pub const ERR_INVALID_CID: u8 = 0x0b; // Command not allowed on this cid
pub const ERR_OTHER: u8 = 0x7f; // Other unspecified error
