/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use sha2::{Digest, Sha256};

use crate::errors::ValidationError;

macro_rules! try_or {
    ($val:expr, $or:expr) => {
        match $val {
            Ok(v) => v,
            Err(e) => {
                return $or(e);
            }
        }
    };
}

pub fn trace_hex(direction: &str, data: &[u8]) {
    if log_enabled!(log::Level::Trace) {
        let parts: Vec<String> = data.iter().map(|byte| format!("{:02x}", byte)).collect();
        trace!("USB {}: {}", direction, parts.join(""));
    }
}

pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);

    let mut output = [0u8; 32];
    output.copy_from_slice(hasher.finalize().as_slice());
    output
}

// The term Base64url Encoding refers to the base64 encoding using the URL- and
// filename-safe character set defined in Section 5 of [RFC4648], with all
// trailing '=' characters omitted.
pub fn websafe_encode(data: &[u8]) -> String {
    base64::encode_config(data, base64::URL_SAFE_NO_PAD)
}

pub fn websafe_decode(data: &str, what: &'static str) -> Result<Vec<u8>, ValidationError> {
    base64::decode_config(data.trim_end_matches('='), base64::URL_SAFE_NO_PAD)
        .map_err(|_| ValidationError::MalformedEncoding(what))
}
