/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use std::sync::mpsc::Sender;

use crate::u2ftypes::U2FDeviceInfo;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusUpdate {
    /// The channel to the token was initialized
    DeviceSelected(U2FDeviceInfo),
    /// The token is waiting for the user to touch it
    PresenceRequired,
    /// We successfully finished the register or sign request
    Success,
}

pub(crate) fn send_status(status: Option<&Sender<StatusUpdate>>, msg: StatusUpdate) {
    if let Some(status) = status {
        match status.send(msg) {
            Ok(_) => {}
            Err(e) => error!("Couldn't send status: {:?}", e),
        };
    }
}
