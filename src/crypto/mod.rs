/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use rand::{thread_rng, RngCore};
use ring::signature::{UnparsedPublicKey, ECDSA_P256_SHA256_ASN1};

use crate::consts::P256_POINT_SIZE;

pub mod der;

pub use crate::util::sha256;

pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    thread_rng().fill_bytes(&mut bytes);
    bytes
}

/// Whether `public_key` looks like an uncompressed P-256 point.
pub fn is_p256_point(public_key: &[u8]) -> bool {
    public_key.len() == P256_POINT_SIZE && public_key[0] == 0x04
}

/// Verifies an ASN.1 encoded ECDSA P-256 SHA-256 signature.
pub fn verify_p256(public_key: &[u8], message: &[u8], signature: &[u8]) -> bool {
    UnparsedPublicKey::new(&ECDSA_P256_SHA256_ASN1, public_key)
        .verify(message, signature)
        .is_ok()
}
