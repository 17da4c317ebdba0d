/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

#[macro_use]
extern crate log;
#[macro_use]
extern crate bitflags;

#[cfg(test)]
#[macro_use]
extern crate assert_matches;
#[cfg(test)]
#[macro_use]
extern crate hex_literal;

#[macro_use]
mod util;

pub mod apdu;
pub mod client_data;
pub mod consts;
pub mod crypto;
pub mod errors;
pub mod manager;
pub mod runloop;
pub mod server;
mod status_update;
pub mod transport;
pub mod u2fprotocol;
pub mod u2ftypes;

#[cfg(test)]
mod tests;

pub use crate::apdu::{APDUDevice, ApduOutcome, APDU};
pub use crate::client_data::{ClientData, ClientDataType};
pub use crate::errors::*;
pub use crate::manager::{Authentication, StateCallback, U2FHost, U2FManager};
pub use crate::server::{
    finish_authentication, finish_registration, start_authentication, start_registration,
    AuthenticateResponse, AuthenticationResult, DeviceRegistration, RegisterResponse,
    StartedAuthentication, StartedRegistration,
};
pub use crate::status_update::StatusUpdate;
pub use crate::transport::hid::{HidChannel, Nonce};
pub use crate::transport::{
    open_known_device, ChannelConfig, HIDEnumerator, HIDTransport, KNOWN_DEVICES,
};
pub use crate::u2ftypes::{Capability, Cid, U2FDeviceInfo};
pub use crate::util::{websafe_decode, websafe_encode};

pub type Result<T> = std::result::Result<T, AuthenticatorError>;
