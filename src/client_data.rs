/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use serde::{Deserialize, Serialize};
use serde_json as json;

use crate::consts::{TYP_AUTHENTICATION, TYP_REGISTRATION};
use crate::errors::{AuthenticatorError, ValidationError};
use crate::util::{sha256, websafe_decode};

/// The `typ` member.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ClientDataType {
    Registration,
    Authentication,
}

impl ClientDataType {
    pub fn as_str(self) -> &'static str {
        match self {
            ClientDataType::Registration => TYP_REGISTRATION,
            ClientDataType::Authentication => TYP_AUTHENTICATION,
        }
    }
}

// The member order is part of the format: the relying party hashes the exact
// bytes the client produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientData {
    pub typ: String,
    pub challenge: String,
    pub origin: String,
}

impl ClientData {
    pub fn new(typ: ClientDataType, challenge: &str, origin: &str) -> Self {
        Self {
            typ: typ.as_str().to_string(),
            challenge: challenge.to_string(),
            origin: origin.to_string(),
        }
    }

    pub fn registration(challenge: &str, origin: &str) -> Self {
        Self::new(ClientDataType::Registration, challenge, origin)
    }

    pub fn authentication(challenge: &str, origin: &str) -> Self {
        Self::new(ClientDataType::Authentication, challenge, origin)
    }

    /// Compact JSON, without whitespace.
    pub fn to_json(&self) -> Result<String, AuthenticatorError> {
        json::to_string(self).map_err(|e| AuthenticatorError::Internal(e.to_string()))
    }

    pub fn hash(&self) -> Result<[u8; 32], AuthenticatorError> {
        Ok(sha256(self.to_json()?.as_bytes()))
    }

    /// Decodes base64url client data as sent back by the client. Returns the
    /// raw bytes as well, since signatures cover those and not a
    /// re-serialization.
    pub fn from_websafe(encoded: &str) -> Result<(Self, Vec<u8>), ValidationError> {
        let raw = websafe_decode(encoded, "client data")?;
        let client_data = json::from_slice(&raw)
            .map_err(|e| ValidationError::MalformedClientData(e.to_string()))?;
        Ok((client_data, raw))
    }

    /// Checks type and challenge, and the origin if `facets` is given.
    pub fn verify(
        &self,
        typ: ClientDataType,
        challenge: &str,
        facets: Option<&[String]>,
    ) -> Result<(), ValidationError> {
        if self.typ != typ.as_str() {
            return Err(ValidationError::ClientDataType {
                expected: typ.as_str(),
                actual: self.typ.clone(),
            });
        }

        if self.challenge != challenge {
            return Err(ValidationError::ChallengeMismatch);
        }

        if let Some(facets) = facets {
            if !facets.iter().any(|facet| *facet == self.origin) {
                return Err(ValidationError::OriginMismatch(self.origin.clone()));
            }
        }

        Ok(())
    }
}
