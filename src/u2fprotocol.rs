/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use std::sync::mpsc::Sender;
use std::thread;

use crate::apdu::{APDUDevice, ApduOutcome};
use crate::client_data::ClientData;
use crate::consts::*;
use crate::errors::{ApduErrorStatus, AuthenticatorError, ValidationError};
use crate::server::{
    AuthenticateResponse, RegisterResponse, StartedAuthentication, StartedRegistration,
};
use crate::status_update::{send_status, StatusUpdate};
use crate::util::{sha256, websafe_decode, websafe_encode};
use crate::Result;

/// Outcome of a single attempt at a command that needs user presence.
#[derive(Debug)]
pub enum Retryable<T> {
    Retry,
    Error(T),
}

impl<T> Retryable<T> {
    pub fn is_retry(&self) -> bool {
        matches!(*self, Retryable::Retry)
    }
}

impl<T> From<T> for Retryable<T> {
    fn from(e: T) -> Self {
        Retryable::Error(e)
    }
}

pub type AttemptResult<T> = std::result::Result<T, Retryable<AuthenticatorError>>;

fn check_version(version: &str) -> Result<()> {
    if version != U2F_V2 {
        return Err(ValidationError::UnsupportedVersion(version.to_string()).into());
    }
    Ok(())
}

fn outcome_to_attempt(outcome: ApduOutcome) -> AttemptResult<Vec<u8>> {
    match outcome {
        ApduOutcome::Ok(data) => Ok(data),
        ApduOutcome::Busy => Err(Retryable::Retry),
        ApduOutcome::Error(status) => Err(Retryable::Error(status.into())),
    }
}

/// An ENROLL command, ready to be sent as often as the token asks for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterRequest {
    client_data: String,
    payload: Vec<u8>,
}

impl RegisterRequest {
    pub fn new(started: &StartedRegistration, facet: &str) -> Result<Self> {
        check_version(&started.version)?;

        let client_data = ClientData::registration(&started.challenge, facet).to_json()?;

        let mut payload = Vec::with_capacity(2 * PARAMETER_SIZE);
        payload.extend_from_slice(&sha256(client_data.as_bytes()));
        payload.extend_from_slice(&sha256(started.app_id.as_bytes()));

        Ok(Self {
            client_data,
            payload,
        })
    }

    pub fn client_data(&self) -> &str {
        &self.client_data
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }
}

/// A SIGN command. With `check_only` the token only tells whether it knows
/// the key handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticateRequest {
    client_data: String,
    key_handle: String,
    p1: u8,
    payload: Vec<u8>,
}

impl AuthenticateRequest {
    pub fn new(started: &StartedAuthentication, facet: &str, check_only: bool) -> Result<Self> {
        check_version(&started.version)?;

        let key_handle = websafe_decode(&started.key_handle, "key handle")?;
        if key_handle.len() > MAX_KEY_HANDLE_SIZE {
            return Err(ValidationError::KeyHandleTooLarge(key_handle.len()).into());
        }

        let client_data = ClientData::authentication(&started.challenge, facet).to_json()?;

        let mut payload = Vec::with_capacity(2 * PARAMETER_SIZE + 1 + key_handle.len());
        payload.extend_from_slice(&sha256(client_data.as_bytes()));
        payload.extend_from_slice(&sha256(started.app_id.as_bytes()));
        payload.push(key_handle.len() as u8);
        payload.extend_from_slice(&key_handle);

        let p1 = if check_only {
            U2F_CHECK_IS_REGISTERED
        } else {
            U2F_REQUEST_USER_PRESENCE
        };

        Ok(Self {
            client_data,
            key_handle: started.key_handle.clone(),
            p1,
            payload,
        })
    }

    pub fn client_data(&self) -> &str {
        &self.client_data
    }

    pub fn p1(&self) -> u8 {
        self.p1
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }
}

////////////////////////////////////////////////////////////////////////
// Device Commands
////////////////////////////////////////////////////////////////////////

pub fn u2f_register<D>(dev: &mut D, request: &RegisterRequest) -> AttemptResult<RegisterResponse>
where
    D: APDUDevice + ?Sized,
{
    let outcome = dev.send_command_outcome(
        U2F_REGISTER,
        U2F_REQUEST_USER_PRESENCE,
        0x00,
        request.payload(),
    )?;
    let data = outcome_to_attempt(outcome)?;

    Ok(RegisterResponse {
        registration_data: websafe_encode(&data),
        client_data: websafe_encode(request.client_data().as_bytes()),
    })
}

pub fn u2f_authenticate<D>(
    dev: &mut D,
    request: &AuthenticateRequest,
) -> AttemptResult<AuthenticateResponse>
where
    D: APDUDevice + ?Sized,
{
    let outcome =
        dev.send_command_outcome(U2F_AUTHENTICATE, request.p1(), 0x00, request.payload())?;
    let data = outcome_to_attempt(outcome)?;

    Ok(AuthenticateResponse {
        client_data: websafe_encode(request.client_data().as_bytes()),
        signature_data: websafe_encode(&data),
        key_handle: request.key_handle.clone(),
    })
}

/// Asks the token whether it knows the key handle, without waiting for a
/// touch. "Touch required" is how tokens say yes.
pub fn u2f_check_key_handle<D>(
    dev: &mut D,
    started: &StartedAuthentication,
    facet: &str,
) -> Result<bool>
where
    D: APDUDevice + ?Sized,
{
    let request = AuthenticateRequest::new(started, facet, true)?;
    match dev.send_command_outcome(U2F_AUTHENTICATE, request.p1(), 0x00, request.payload())? {
        ApduOutcome::Ok(_) | ApduOutcome::Busy => Ok(true),
        ApduOutcome::Error(ApduErrorStatus::WrongData) => Ok(false),
        ApduOutcome::Error(status) => Err(status.into()),
    }
}

/// Runs `attempt` until it stops asking for a retry, pausing between
/// attempts. The first retry is reported as `StatusUpdate::PresenceRequired`.
pub fn wait_for_touch<T, F>(
    alive: &dyn Fn() -> bool,
    status: Option<&Sender<StatusUpdate>>,
    mut attempt: F,
) -> Result<T>
where
    F: FnMut() -> AttemptResult<T>,
{
    let mut notified = false;
    loop {
        if !alive() {
            debug!("cancelled while waiting for user presence");
            return Err(AuthenticatorError::Cancelled);
        }

        match attempt() {
            Ok(rv) => return Ok(rv),
            Err(Retryable::Retry) => {
                if !notified {
                    info!("touch your token");
                    send_status(status, StatusUpdate::PresenceRequired);
                    notified = true;
                }
                thread::sleep(TOUCH_RETRY_DELAY);
            }
            Err(Retryable::Error(e)) => return Err(e),
        }
    }
}

/// Registers with the token, waiting for the user to touch it.
pub fn register<D>(
    dev: &mut D,
    started: &StartedRegistration,
    facet: &str,
    alive: &dyn Fn() -> bool,
    status: Option<&Sender<StatusUpdate>>,
) -> Result<RegisterResponse>
where
    D: APDUDevice + ?Sized,
{
    let request = RegisterRequest::new(started, facet)?;
    wait_for_touch(alive, status, || u2f_register(&mut *dev, &request))
}

/// Signs the challenge with the token, waiting for the user to touch it.
pub fn authenticate<D>(
    dev: &mut D,
    started: &StartedAuthentication,
    facet: &str,
    alive: &dyn Fn() -> bool,
    status: Option<&Sender<StatusUpdate>>,
) -> Result<AuthenticateResponse>
where
    D: APDUDevice + ?Sized,
{
    let request = AuthenticateRequest::new(started, facet, false)?;
    wait_for_touch(alive, status, || u2f_authenticate(&mut *dev, &request))
}
