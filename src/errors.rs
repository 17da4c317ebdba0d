/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use std::error::Error as StdErrorT;
use std::fmt;
use std::io;

use crate::consts::*;

/// Failures of the underlying HID bus. These abort the current operation and
/// are never retried internally.
#[derive(Debug)]
pub enum TransportError {
    IO(io::Error),
    Timeout,
    IncompleteWrite { expected: usize, written: usize },
    UnexpectedReportSize { expected: usize, actual: usize },
}

impl From<io::Error> for TransportError {
    fn from(e: io::Error) -> Self {
        if e.kind() == io::ErrorKind::TimedOut {
            TransportError::Timeout
        } else {
            TransportError::IO(e)
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            TransportError::IO(ref e) => write!(f, "TransportError: I/O error: {}", e),
            TransportError::Timeout => write!(f, "TransportError: report timed out"),
            TransportError::IncompleteWrite { expected, written } => write!(
                f,
                "TransportError: wrote {} of {} report bytes",
                written, expected
            ),
            TransportError::UnexpectedReportSize { expected, actual } => write!(
                f,
                "TransportError: expected a {} byte report, got {}",
                expected, actual
            ),
        }
    }
}

/// Violations of the U2FHID framing rules, or errors reported by the device
/// itself through a `U2FHID_ERROR` frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FramingError {
    WrongChannel { expected: [u8; 4], actual: [u8; 4] },
    WrongSequence { expected: u8, actual: u8 },
    DeviceError(Option<u8>),
    PayloadTooLarge { len: usize, max: usize },
    ChannelNotBound,
    InvalidInitResponse(usize),
    InitAttemptsExhausted(usize),
    ShortApduResponse(usize),
    InvalidReportSize(usize),
}

impl fmt::Display for FramingError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            FramingError::WrongChannel { expected, actual } => write!(
                f,
                "FramingError: wrong CID {:02x?}, expected {:02x?}",
                actual, expected
            ),
            FramingError::WrongSequence { expected, actual } => write!(
                f,
                "FramingError: wrong SEQ {}, expected {}",
                actual, expected
            ),
            FramingError::DeviceError(Some(code)) => {
                write!(f, "FramingError: device reported error {:#04x}", code)
            }
            FramingError::DeviceError(None) => write!(f, "FramingError: device reported an error"),
            FramingError::PayloadTooLarge { len, max } => write!(
                f,
                "FramingError: payload of {} bytes exceeds {} bytes",
                len, max
            ),
            FramingError::ChannelNotBound => write!(f, "FramingError: channel is not initialized"),
            FramingError::InvalidInitResponse(len) => {
                write!(f, "FramingError: invalid init response of {} bytes", len)
            }
            FramingError::InitAttemptsExhausted(n) => {
                write!(f, "FramingError: no matching init response after {} attempts", n)
            }
            FramingError::ShortApduResponse(len) => {
                write!(f, "FramingError: APDU response of {} bytes has no status", len)
            }
            FramingError::InvalidReportSize(size) => {
                write!(f, "FramingError: {} byte reports can't carry a frame", size)
            }
        }
    }
}

/// Non-success APDU status words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApduErrorStatus {
    ConditionsNotSatisfied,
    WrongData,
    WrongLength,
    InsNotSupported,
    ClaNotSupported,
    Unknown(u16),
}

impl ApduErrorStatus {
    pub fn code(self) -> u16 {
        match self {
            ApduErrorStatus::ConditionsNotSatisfied => SW_CONDITIONS_NOT_SATISFIED,
            ApduErrorStatus::WrongData => SW_WRONG_DATA,
            ApduErrorStatus::WrongLength => SW_WRONG_LENGTH,
            ApduErrorStatus::InsNotSupported => SW_INS_NOT_SUPPORTED,
            ApduErrorStatus::ClaNotSupported => SW_CLA_NOT_SUPPORTED,
            ApduErrorStatus::Unknown(code) => code,
        }
    }
}

impl From<u16> for ApduErrorStatus {
    fn from(code: u16) -> Self {
        match code {
            SW_CONDITIONS_NOT_SATISFIED => ApduErrorStatus::ConditionsNotSatisfied,
            SW_WRONG_DATA => ApduErrorStatus::WrongData,
            SW_WRONG_LENGTH => ApduErrorStatus::WrongLength,
            SW_INS_NOT_SUPPORTED => ApduErrorStatus::InsNotSupported,
            SW_CLA_NOT_SUPPORTED => ApduErrorStatus::ClaNotSupported,
            other => ApduErrorStatus::Unknown(other),
        }
    }
}

impl fmt::Display for ApduErrorStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let desc = match *self {
            ApduErrorStatus::ConditionsNotSatisfied => "conditions not satisfied",
            ApduErrorStatus::WrongData => "wrong data",
            ApduErrorStatus::WrongLength => "wrong length",
            ApduErrorStatus::InsNotSupported => "instruction not supported",
            ApduErrorStatus::ClaNotSupported => "class not supported",
            ApduErrorStatus::Unknown(_) => "unknown status",
        };
        write!(f, "ApduErrorStatus: {} ({:#06x})", desc, self.code())
    }
}

/// Rejections of a request or of a device answer by the relying-party side
/// checks. These are never retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    UnsupportedVersion(String),
    UnknownKeyHandle,
    KeyHandleTooLarge(usize),
    MalformedEncoding(&'static str),
    MalformedClientData(String),
    ClientDataType { expected: &'static str, actual: String },
    ChallengeMismatch,
    OriginMismatch(String),
    MalformedRegistration(&'static str),
    MalformedSignature(&'static str),
    BadAttestation,
    BadSignature,
    UserPresenceMissing,
    CounterDecreased { stored: u32, received: u32 },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ValidationError::UnsupportedVersion(ref v) => {
                write!(f, "ValidationError: unsupported U2F version: {}", v)
            }
            ValidationError::UnknownKeyHandle => write!(f, "ValidationError: unknown key handle"),
            ValidationError::KeyHandleTooLarge(len) => {
                write!(f, "ValidationError: key handle of {} bytes is too large", len)
            }
            ValidationError::MalformedEncoding(what) => {
                write!(f, "ValidationError: malformed base64 in {}", what)
            }
            ValidationError::MalformedClientData(ref e) => {
                write!(f, "ValidationError: malformed client data: {}", e)
            }
            ValidationError::ClientDataType {
                expected,
                ref actual,
            } => write!(
                f,
                "ValidationError: client data type {:?}, expected {:?}",
                actual, expected
            ),
            ValidationError::ChallengeMismatch => write!(f, "ValidationError: wrong challenge"),
            ValidationError::OriginMismatch(ref origin) => {
                write!(f, "ValidationError: origin {:?} is not a valid facet", origin)
            }
            ValidationError::MalformedRegistration(why) => {
                write!(f, "ValidationError: malformed registration data: {}", why)
            }
            ValidationError::MalformedSignature(why) => {
                write!(f, "ValidationError: malformed signature data: {}", why)
            }
            ValidationError::BadAttestation => {
                write!(f, "ValidationError: attestation signature is invalid")
            }
            ValidationError::BadSignature => write!(f, "ValidationError: signature is invalid"),
            ValidationError::UserPresenceMissing => {
                write!(f, "ValidationError: user presence was not verified")
            }
            ValidationError::CounterDecreased { stored, received } => write!(
                f,
                "ValidationError: counter went from {} to {}",
                stored, received
            ),
        }
    }
}

#[derive(Debug)]
pub enum AuthenticatorError {
    Transport(TransportError),
    Framing(FramingError),
    Apdu(ApduErrorStatus),
    Validation(ValidationError),
    Cancelled,
    Internal(String),
}

impl AuthenticatorError {
    pub fn is_transport(&self) -> bool {
        matches!(*self, AuthenticatorError::Transport(_))
    }

    pub fn is_framing(&self) -> bool {
        matches!(*self, AuthenticatorError::Framing(_))
    }
}

impl fmt::Display for AuthenticatorError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            AuthenticatorError::Transport(ref e) => write!(f, "{}", e),
            AuthenticatorError::Framing(ref e) => write!(f, "{}", e),
            AuthenticatorError::Apdu(ref e) => write!(f, "{}", e),
            AuthenticatorError::Validation(ref e) => write!(f, "{}", e),
            AuthenticatorError::Cancelled => write!(f, "AuthenticatorError: cancelled by caller"),
            AuthenticatorError::Internal(ref msg) => {
                write!(f, "AuthenticatorError: internal error: {}", msg)
            }
        }
    }
}

impl StdErrorT for TransportError {
    fn source(&self) -> Option<&(dyn StdErrorT + 'static)> {
        match *self {
            TransportError::IO(ref e) => Some(e),
            _ => None,
        }
    }
}

impl StdErrorT for FramingError {}
impl StdErrorT for ApduErrorStatus {}
impl StdErrorT for ValidationError {}

impl StdErrorT for AuthenticatorError {
    fn source(&self) -> Option<&(dyn StdErrorT + 'static)> {
        match *self {
            AuthenticatorError::Transport(ref e) => Some(e),
            AuthenticatorError::Framing(ref e) => Some(e),
            AuthenticatorError::Apdu(ref e) => Some(e),
            AuthenticatorError::Validation(ref e) => Some(e),
            _ => None,
        }
    }
}

impl From<TransportError> for AuthenticatorError {
    fn from(e: TransportError) -> Self {
        AuthenticatorError::Transport(e)
    }
}

impl From<io::Error> for AuthenticatorError {
    fn from(e: io::Error) -> Self {
        AuthenticatorError::Transport(e.into())
    }
}

impl From<FramingError> for AuthenticatorError {
    fn from(e: FramingError) -> Self {
        AuthenticatorError::Framing(e)
    }
}

impl From<ApduErrorStatus> for AuthenticatorError {
    fn from(e: ApduErrorStatus) -> Self {
        AuthenticatorError::Apdu(e)
    }
}

impl From<ValidationError> for AuthenticatorError {
    fn from(e: ValidationError) -> Self {
        AuthenticatorError::Validation(e)
    }
}
