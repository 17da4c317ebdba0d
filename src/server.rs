/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! The relying-party half of a U2F ceremony: issuing challenges and checking
//! what the token signed.

use serde::{Deserialize, Serialize};

use crate::client_data::{ClientData, ClientDataType};
use crate::consts::*;
use crate::crypto::der::{certificate_public_key, split_certificate};
use crate::crypto::{is_p256_point, random_bytes, sha256, verify_p256};
use crate::errors::ValidationError;
use crate::util::{websafe_decode, websafe_encode};
use crate::Result;

const CHALLENGE_SIZE: usize = 32;
const USER_PRESENCE_FLAG: u8 = 0x01;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartedRegistration {
    pub version: String,
    pub challenge: String,
    pub app_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub registration_data: String,
    pub client_data: String,
}

/// A registered credential. Fields are websafe base64 when serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRegistration {
    #[serde(with = "websafe")]
    key_handle: Vec<u8>,
    #[serde(with = "websafe")]
    public_key: Vec<u8>,
    #[serde(with = "websafe")]
    attestation_cert: Vec<u8>,
    counter: u32,
}

impl DeviceRegistration {
    pub fn new(
        key_handle: Vec<u8>,
        public_key: Vec<u8>,
        attestation_cert: Vec<u8>,
        counter: u32,
    ) -> Self {
        Self {
            key_handle,
            public_key,
            attestation_cert,
            counter,
        }
    }

    pub fn key_handle(&self) -> &[u8] {
        &self.key_handle
    }

    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    pub fn attestation_cert(&self) -> &[u8] {
        &self.attestation_cert
    }

    pub fn counter(&self) -> u32 {
        self.counter
    }

    /// The same registration after a successful authentication moved the
    /// counter forward.
    pub fn with_counter(&self, counter: u32) -> Self {
        Self {
            counter,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartedAuthentication {
    pub version: String,
    pub challenge: String,
    pub app_id: String,
    pub key_handle: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticateResponse {
    pub client_data: String,
    pub signature_data: String,
    pub key_handle: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticationResult {
    pub counter: u32,
    pub user_presence: bool,
}

mod websafe {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::util::{websafe_decode, websafe_encode};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&websafe_encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded = String::deserialize(deserializer)?;
        websafe_decode(&encoded, "device registration").map_err(D::Error::custom)
    }
}

fn check_version(version: &str) -> Result<()> {
    if version != U2F_V2 {
        return Err(ValidationError::UnsupportedVersion(version.to_string()).into());
    }
    Ok(())
}

pub fn start_registration(app_id: &str) -> StartedRegistration {
    StartedRegistration {
        version: U2F_V2.to_string(),
        challenge: websafe_encode(&random_bytes(CHALLENGE_SIZE)),
        app_id: app_id.to_string(),
    }
}

// 0x05 | public key (65) | key handle length | key handle | certificate | signature
struct RegistrationData<'a> {
    public_key: &'a [u8],
    key_handle: &'a [u8],
    certificate: &'a [u8],
    signature: &'a [u8],
}

impl<'a> RegistrationData<'a> {
    fn parse(data: &'a [u8]) -> std::result::Result<Self, ValidationError> {
        let (reserved, data) = data
            .split_first()
            .ok_or(ValidationError::MalformedRegistration("empty"))?;
        if *reserved != REGISTER_RESERVED_BYTE {
            return Err(ValidationError::MalformedRegistration("reserved byte"));
        }

        if data.len() < P256_POINT_SIZE + 1 {
            return Err(ValidationError::MalformedRegistration("public key"));
        }
        let (public_key, data) = data.split_at(P256_POINT_SIZE);
        if !is_p256_point(public_key) {
            return Err(ValidationError::MalformedRegistration("public key"));
        }

        let key_handle_len = data[0] as usize;
        let data = &data[1..];
        if data.len() < key_handle_len {
            return Err(ValidationError::MalformedRegistration("key handle"));
        }
        let (key_handle, data) = data.split_at(key_handle_len);

        let (certificate, signature) = split_certificate(data)?;
        if signature.is_empty() {
            return Err(ValidationError::MalformedRegistration("signature"));
        }

        Ok(Self {
            public_key,
            key_handle,
            certificate,
            signature,
        })
    }
}

/// Checks a registration answer and turns it into a stored credential.
/// `facets`, when given, lists the origins the client data may carry.
pub fn finish_registration(
    started: &StartedRegistration,
    response: &RegisterResponse,
    facets: Option<&[String]>,
) -> Result<DeviceRegistration> {
    check_version(&started.version)?;

    let (client_data, raw_client_data) = ClientData::from_websafe(&response.client_data)?;
    client_data.verify(ClientDataType::Registration, &started.challenge, facets)?;

    let raw = websafe_decode(&response.registration_data, "registration data")?;
    let registration = RegistrationData::parse(&raw)?;

    let mut message = vec![0x00];
    message.extend_from_slice(&sha256(started.app_id.as_bytes()));
    message.extend_from_slice(&sha256(&raw_client_data));
    message.extend_from_slice(registration.key_handle);
    message.extend_from_slice(registration.public_key);

    let attestation_key = certificate_public_key(registration.certificate)?;
    if !verify_p256(attestation_key, &message, registration.signature) {
        return Err(ValidationError::BadAttestation.into());
    }

    debug!(
        "registered key handle {}",
        websafe_encode(registration.key_handle)
    );
    Ok(DeviceRegistration::new(
        registration.key_handle.to_vec(),
        registration.public_key.to_vec(),
        registration.certificate.to_vec(),
        0,
    ))
}

pub fn start_authentication(
    app_id: &str,
    registration: &DeviceRegistration,
) -> StartedAuthentication {
    StartedAuthentication {
        version: U2F_V2.to_string(),
        challenge: websafe_encode(&random_bytes(CHALLENGE_SIZE)),
        app_id: app_id.to_string(),
        key_handle: websafe_encode(registration.key_handle()),
    }
}

/// Checks an assertion against the stored credential. Storing the returned
/// counter is up to the caller.
pub fn finish_authentication(
    started: &StartedAuthentication,
    response: &AuthenticateResponse,
    registration: &DeviceRegistration,
) -> Result<AuthenticationResult> {
    check_version(&started.version)?;

    let key_handle = websafe_decode(&started.key_handle, "key handle")?;
    if key_handle != registration.key_handle()
        || websafe_decode(&response.key_handle, "key handle")? != key_handle
    {
        return Err(ValidationError::UnknownKeyHandle.into());
    }

    let (client_data, raw_client_data) = ClientData::from_websafe(&response.client_data)?;
    client_data.verify(ClientDataType::Authentication, &started.challenge, None)?;

    // user presence (1) | counter (4) | signature
    let raw = websafe_decode(&response.signature_data, "signature data")?;
    if raw.len() <= 5 {
        return Err(ValidationError::MalformedSignature("too short").into());
    }
    let user_presence = raw[0];
    let counter = u32::from_be_bytes([raw[1], raw[2], raw[3], raw[4]]);

    let mut message = Vec::with_capacity(PARAMETER_SIZE * 2 + 5);
    message.extend_from_slice(&sha256(started.app_id.as_bytes()));
    message.extend_from_slice(&raw[..5]);
    message.extend_from_slice(&sha256(&raw_client_data));

    if !verify_p256(registration.public_key(), &message, &raw[5..]) {
        return Err(ValidationError::BadSignature.into());
    }

    if user_presence & USER_PRESENCE_FLAG == 0 {
        return Err(ValidationError::UserPresenceMissing.into());
    }

    if counter < registration.counter() {
        warn!(
            "counter went backwards ({} < {}), the token may be cloned",
            counter,
            registration.counter()
        );
        return Err(ValidationError::CounterDecreased {
            stored: registration.counter(),
            received: counter,
        }
        .into());
    }

    Ok(AuthenticationResult {
        counter,
        user_presence: true,
    })
}
