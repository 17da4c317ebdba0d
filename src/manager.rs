/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use std::io;
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};

use crate::errors::ValidationError;
use crate::runloop::RunLoop;
use crate::server::{
    finish_authentication, finish_registration, start_authentication, start_registration,
    DeviceRegistration,
};
use crate::status_update::{send_status, StatusUpdate};
use crate::transport::hid::HidChannel;
use crate::transport::{ChannelConfig, HIDTransport};
use crate::u2fprotocol;
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authentication {
    /// The token signed the challenge and the signature checked out.
    Verified { counter: u32, user_presence: bool },
    /// Check-only mode: the token knows the key handle.
    KeyHandleRecognized,
}

/// Runs complete ceremonies against one token, blocking the calling thread.
pub struct U2FHost {
    config: ChannelConfig,
    status: Option<Sender<StatusUpdate>>,
}

impl U2FHost {
    pub fn new(config: ChannelConfig) -> Self {
        Self {
            config,
            status: None,
        }
    }

    pub fn with_status(mut self, status: Sender<StatusUpdate>) -> Self {
        self.status = Some(status);
        self
    }

    fn open<T: HIDTransport>(
        &self,
        transport: T,
        alive: &dyn Fn() -> bool,
    ) -> Result<HidChannel<T>> {
        let channel = HidChannel::open(transport, self.config.clone(), alive)?;
        if let Some(info) = channel.device_info() {
            info!("using token: {}", info);
            send_status(self.status.as_ref(), StatusUpdate::DeviceSelected(info.clone()));
        }
        Ok(channel)
    }

    pub fn register<T: HIDTransport>(
        &self,
        transport: T,
        app_id: &str,
        facet: &str,
        alive: &dyn Fn() -> bool,
    ) -> Result<DeviceRegistration> {
        let mut channel = self.open(transport, alive)?;

        let started = start_registration(app_id);
        let response =
            u2fprotocol::register(&mut channel, &started, facet, alive, self.status.as_ref())?;
        let facets = [facet.to_string()];
        let registration = finish_registration(&started, &response, Some(&facets[..]))?;

        info!("registered");
        send_status(self.status.as_ref(), StatusUpdate::Success);
        Ok(registration)
    }

    pub fn authenticate<T: HIDTransport>(
        &self,
        transport: T,
        registration: &DeviceRegistration,
        app_id: &str,
        facet: &str,
        check_only: bool,
        alive: &dyn Fn() -> bool,
    ) -> Result<Authentication> {
        let mut channel = self.open(transport, alive)?;
        let started = start_authentication(app_id, registration);

        let rv = if check_only {
            if !u2fprotocol::u2f_check_key_handle(&mut channel, &started, facet)? {
                return Err(ValidationError::UnknownKeyHandle.into());
            }
            Authentication::KeyHandleRecognized
        } else {
            let response = u2fprotocol::authenticate(
                &mut channel,
                &started,
                facet,
                alive,
                self.status.as_ref(),
            )?;
            let result = finish_authentication(&started, &response, registration)?;
            Authentication::Verified {
                counter: result.counter,
                user_presence: result.user_presence,
            }
        };

        info!("authenticated");
        send_status(self.status.as_ref(), StatusUpdate::Success);
        Ok(rv)
    }
}

/// A completion callback that runs at most once, from whichever side gets to
/// it first.
pub struct StateCallback<T> {
    callback: Arc<Mutex<Option<Box<dyn FnOnce(T) + Send>>>>,
}

impl<T> StateCallback<T> {
    pub fn new(cb: Box<dyn FnOnce(T) + Send>) -> Self {
        Self {
            callback: Arc::new(Mutex::new(Some(cb))),
        }
    }

    pub fn call(&self, rv: T) {
        if let Ok(mut cb) = self.callback.lock() {
            if let Some(cb) = cb.take() {
                cb(rv);
            }
        }
    }
}

impl<T> Clone for StateCallback<T> {
    fn clone(&self) -> Self {
        Self {
            callback: self.callback.clone(),
        }
    }
}

/// Runs ceremonies on a background thread. Starting a new one cancels the
/// one in flight.
pub struct U2FManager {
    config: ChannelConfig,
    transaction: Option<RunLoop>,
}

impl U2FManager {
    pub fn new(config: ChannelConfig) -> Self {
        Self {
            config,
            transaction: None,
        }
    }

    pub fn register<T>(
        &mut self,
        transport: T,
        app_id: String,
        facet: String,
        timeout: u64,
        status: Sender<StatusUpdate>,
        callback: StateCallback<Result<DeviceRegistration>>,
    ) where
        T: HIDTransport + Send + 'static,
    {
        // Abort any prior register/authenticate calls.
        self.cancel();

        let host = U2FHost::new(self.config.clone()).with_status(status);
        let cbc = callback.clone();

        let transaction = RunLoop::new_with_timeout(
            move |alive| {
                callback.call(host.register(transport, &app_id, &facet, alive));
            },
            timeout,
        );

        self.transaction = Some(try_or!(transaction, |e: io::Error| cbc.call(Err(e.into()))));
    }

    #[allow(clippy::too_many_arguments)]
    pub fn authenticate<T>(
        &mut self,
        transport: T,
        registration: DeviceRegistration,
        app_id: String,
        facet: String,
        check_only: bool,
        timeout: u64,
        status: Sender<StatusUpdate>,
        callback: StateCallback<Result<Authentication>>,
    ) where
        T: HIDTransport + Send + 'static,
    {
        // Abort any prior register/authenticate calls.
        self.cancel();

        let host = U2FHost::new(self.config.clone()).with_status(status);
        let cbc = callback.clone();

        let transaction = RunLoop::new_with_timeout(
            move |alive| {
                callback.call(host.authenticate(
                    transport,
                    &registration,
                    &app_id,
                    &facet,
                    check_only,
                    alive,
                ));
            },
            timeout,
        );

        self.transaction = Some(try_or!(transaction, |e: io::Error| cbc.call(Err(e.into()))));
    }

    // This blocks.
    pub fn cancel(&mut self) {
        if let Some(transaction) = self.transaction.take() {
            transaction.cancel();
        }
    }
}

impl Drop for U2FManager {
    fn drop(&mut self) {
        self.cancel();
    }
}
