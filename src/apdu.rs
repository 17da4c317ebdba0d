/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use crate::consts::*;
use crate::errors::{ApduErrorStatus, AuthenticatorError, FramingError};
use crate::Result;

// https://en.wikipedia.org/wiki/Smart_card_application_protocol_data_unit
// https://fidoalliance.org/specs/fido-u2f-v1.
// 0-nfc-bt-amendment-20150514/fido-u2f-raw-message-formats.html#u2f-message-framing
pub struct APDU {}

impl APDU {
    pub fn serialize(ins: u8, p1: u8, p2: u8, data: &[u8]) -> Result<Vec<u8>> {
        if data.len() > MAX_APDU_PAYLOAD {
            return Err(FramingError::PayloadTooLarge {
                len: data.len(),
                max: MAX_APDU_PAYLOAD,
            }
            .into());
        }

        let class: u8 = 0x00;
        let mut bytes = Vec::with_capacity(U2FAPDUHEADER_SIZE + data.len() + APDU_LE.len());
        bytes.push(class);
        bytes.push(ins);
        bytes.push(p1);
        bytes.push(p2);
        bytes.push((data.len() >> 16) as u8);
        bytes.push((data.len() >> 8) as u8);
        bytes.push(data.len() as u8);
        bytes.extend_from_slice(data);
        bytes.extend_from_slice(&APDU_LE);

        Ok(bytes)
    }

    pub fn deserialize(mut data: Vec<u8>) -> Result<(Vec<u8>, u16)> {
        if data.len() < 2 {
            return Err(FramingError::ShortApduResponse(data.len()).into());
        }

        let split_at = data.len() - 2;
        let status = data.split_off(split_at);

        Ok((data, (status[0] as u16) << 8 | status[1] as u16))
    }
}

/// A decoded APDU response. `Busy` is the "touch your token" status, kept
/// apart so retry loops can match on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApduOutcome {
    Ok(Vec<u8>),
    Busy,
    Error(ApduErrorStatus),
}

impl ApduOutcome {
    pub fn from_response(raw: Vec<u8>) -> Result<Self> {
        let (data, status) = APDU::deserialize(raw)?;
        Ok(match status {
            SW_NO_ERROR => ApduOutcome::Ok(data),
            SW_CONDITIONS_NOT_SATISFIED => ApduOutcome::Busy,
            other => ApduOutcome::Error(other.into()),
        })
    }

    pub fn into_result(self) -> Result<Vec<u8>> {
        match self {
            ApduOutcome::Ok(data) => Ok(data),
            ApduOutcome::Busy => Err(ApduErrorStatus::ConditionsNotSatisfied.into()),
            ApduOutcome::Error(status) => Err(status.into()),
        }
    }
}

pub trait APDUDevice {
    /// Exchanges one serialized APDU for the raw response, status included.
    fn send_apdu(&mut self, request: &[u8]) -> Result<Vec<u8>>;

    fn send_command_outcome(
        &mut self,
        ins: u8,
        p1: u8,
        p2: u8,
        data: &[u8],
    ) -> Result<ApduOutcome> {
        let request = APDU::serialize(ins, p1, p2, data)?;
        let response = self.send_apdu(&request)?;
        ApduOutcome::from_response(response)
    }

    fn send_command(&mut self, ins: u8, p1: u8, p2: u8, data: &[u8]) -> Result<Vec<u8>> {
        self.send_command_outcome(ins, p1, p2, data)?.into_result()
    }

    fn get_supported_versions(&mut self) -> Result<Vec<String>> {
        match self.send_command(U2F_VERSION, 0x00, 0x00, &[]) {
            Ok(version) => Ok(vec![String::from_utf8_lossy(&version).into_owned()]),
            // v0 didn't support the instruction
            Err(AuthenticatorError::Apdu(ApduErrorStatus::InsNotSupported)) => {
                Ok(vec![LEGACY_VERSION.to_string()])
            }
            Err(AuthenticatorError::Apdu(status)) => {
                debug!("version probe failed: {}", status);
                Ok(vec![])
            }
            Err(e) => Err(e),
        }
    }
}
