/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

#![no_main]
#[macro_use]
extern crate libfuzzer_sys;
extern crate u2fhost;

use u2fhost::crypto::der;
use u2fhost::{
    finish_registration, start_registration, websafe_encode, ApduOutcome, RegisterResponse,
};

fuzz_target!(|data: &[u8]| {
    let _ = ApduOutcome::from_response(data.to_vec());
    let _ = der::certificate_public_key(data);

    // Garbage registration data must be rejected, never accepted.
    let started = start_registration("https://example.com");
    let response = RegisterResponse {
        registration_data: websafe_encode(data),
        client_data: websafe_encode(b"{}"),
    };
    assert!(finish_registration(&started, &response, None).is_err());
});
