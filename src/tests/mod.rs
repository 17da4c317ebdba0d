/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use std::sync::mpsc::{channel, RecvTimeoutError};
use std::time::{Duration, Instant};

use crate::apdu::APDUDevice;
use crate::consts::*;
use crate::crypto::random_bytes;
use crate::errors::{ApduErrorStatus, AuthenticatorError, ValidationError};
use crate::manager::{Authentication, StateCallback, U2FHost, U2FManager};
use crate::server::DeviceRegistration;
use crate::status_update::StatusUpdate;
use crate::transport::hid::HidChannel;
use crate::transport::ChannelConfig;
use crate::u2ftypes::Capability;


use self::softtoken::SoftToken;

const APP_ID: &str = "https://example.com";

fn setup() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn test_init_and_ping() {
    setup();
    let mut channel =
        HidChannel::open(SoftToken::new(), ChannelConfig::default(), &|| true).unwrap();
    assert_eq!(channel.cid(), &[0x01, 0x02, 0x03, 0x04]);

    let info = channel.device_info().unwrap();
    assert_eq!(info.version_interface, 0x02);
    assert!(info.cap_flags.contains(Capability::WINK));

    let data: Vec<u8> = (0..1024).map(|i| i as u8).collect();
    assert_eq!(channel.ping(&data).unwrap(), data);

    assert!(channel.wink().unwrap());
    assert_eq!(channel.into_inner().winks, 1);
}

#[test]
fn test_transmit_bare_command() {
    setup();
    let mut channel =
        HidChannel::open(SoftToken::new(), ChannelConfig::default(), &|| true).unwrap();
    assert_eq!(channel.transmit(0x01, &[1, 2, 3]).unwrap(), vec![1, 2, 3]);
    assert_eq!(channel.transmit(U2FHID_PING, &[4, 5]).unwrap(), vec![4, 5]);
}

#[test]
fn test_ping_wraps_sequence() {
    setup();
    let mut channel =
        HidChannel::open(SoftToken::new(), ChannelConfig::default(), &|| true).unwrap();

    // One INIT frame and 130 continuations, so both directions pass seq 127.
    let data: Vec<u8> = (0..57 + 59 * 130).map(|i| (i % 251) as u8).collect();
    assert_eq!(channel.ping(&data).unwrap(), data);
}

#[test]
fn test_supported_versions() {
    setup();
    let mut channel =
        HidChannel::open(SoftToken::new(), ChannelConfig::default(), &|| true).unwrap();
    assert_eq!(channel.get_supported_versions().unwrap(), vec!["U2F_V2"]);

    let mut channel =
        HidChannel::open(SoftToken::new().legacy(), ChannelConfig::default(), &|| true).unwrap();
    assert_eq!(channel.get_supported_versions().unwrap(), vec!["v0"]);
}

#[test]
fn test_register_and_authenticate() {
    setup();
    let mut token = SoftToken::new();
    let (tx, rx) = channel();
    let host = U2FHost::new(ChannelConfig::default()).with_status(tx);

    let registration = host.register(&mut token, APP_ID, APP_ID, &|| true).unwrap();
    assert_eq!(registration.counter(), 0);
    assert_eq!(registration.attestation_cert(), token.authenticator.certificate());

    let rv = host
        .authenticate(&mut token, &registration, APP_ID, APP_ID, true, &|| true)
        .unwrap();
    assert_eq!(rv, Authentication::KeyHandleRecognized);

    let rv = host
        .authenticate(&mut token, &registration, APP_ID, APP_ID, false, &|| true)
        .unwrap();
    assert_eq!(
        rv,
        Authentication::Verified {
            counter: 1,
            user_presence: true
        }
    );

    assert_eq!(
        token.commands,
        vec![
            (U2F_REGISTER, U2F_REQUEST_USER_PRESENCE),
            (U2F_AUTHENTICATE, U2F_CHECK_IS_REGISTERED),
            (U2F_AUTHENTICATE, U2F_REQUEST_USER_PRESENCE),
        ]
    );

    let updates: Vec<StatusUpdate> = rx.try_iter().collect();
    assert_eq!(updates.len(), 6);
    assert_matches!(updates[0], StatusUpdate::DeviceSelected(_));
    assert_eq!(updates[1], StatusUpdate::Success);
    assert!(!updates.contains(&StatusUpdate::PresenceRequired));
}

#[test]
fn test_touch_required() {
    setup();
    let mut token = SoftToken::new().busy(2);
    let (tx, rx) = channel();
    let host = U2FHost::new(ChannelConfig::default()).with_status(tx);

    let start = Instant::now();
    host.register(&mut token, APP_ID, APP_ID, &|| true).unwrap();
    assert!(start.elapsed() >= TOUCH_RETRY_DELAY * 2);
    assert_eq!(token.commands.len(), 3);

    let updates: Vec<StatusUpdate> = rx.try_iter().collect();
    assert_matches!(updates[0], StatusUpdate::DeviceSelected(_));
    assert_eq!(
        &updates[1..],
        &[StatusUpdate::PresenceRequired, StatusUpdate::Success]
    );
}

#[test]
fn test_unknown_key_handle() {
    setup();
    let mut token = SoftToken::new();
    let host = U2FHost::new(ChannelConfig::default());
    let registration = host.register(&mut token, APP_ID, APP_ID, &|| true).unwrap();

    let stranger = DeviceRegistration::new(
        random_bytes(32),
        registration.public_key().to_vec(),
        vec![],
        0,
    );
    assert_matches!(
        host.authenticate(&mut token, &stranger, APP_ID, APP_ID, true, &|| true),
        Err(AuthenticatorError::Validation(ValidationError::UnknownKeyHandle))
    );
    assert_matches!(
        host.authenticate(&mut token, &stranger, APP_ID, APP_ID, false, &|| true),
        Err(AuthenticatorError::Apdu(ApduErrorStatus::WrongData))
    );

    // The key handle is bound to the application it was registered for.
    assert_matches!(
        host.authenticate(
            &mut token,
            &registration,
            "https://other.example.com",
            APP_ID,
            true,
            &|| true
        ),
        Err(AuthenticatorError::Validation(ValidationError::UnknownKeyHandle))
    );
}

#[test]
fn test_cancelled_host() {
    setup();
    let mut token = SoftToken::new();
    let host = U2FHost::new(ChannelConfig::default());
    assert_matches!(
        host.register(&mut token, APP_ID, APP_ID, &|| false),
        Err(AuthenticatorError::Cancelled)
    );
    assert!(token.commands.is_empty());
}

#[test]
fn test_manager_register() {
    setup();
    let mut manager = U2FManager::new(ChannelConfig::default());
    let (status_tx, status_rx) = channel();
    let (tx, rx) = channel();
    let callback = StateCallback::new(Box::new(move |rv| {
        tx.send(rv).unwrap();
    }));

    manager.register(
        SoftToken::new(),
        APP_ID.to_string(),
        APP_ID.to_string(),
        10_000,
        status_tx,
        callback,
    );

    let registration = rx
        .recv_timeout(Duration::from_secs(10))
        .unwrap()
        .unwrap();
    assert_eq!(registration.counter(), 0);
    assert_eq!(status_rx.try_iter().last(), Some(StatusUpdate::Success));

    // A different token doesn't know the key handle.
    let (status_tx, _status_rx) = channel();
    let (tx, rx) = channel();
    let callback = StateCallback::new(Box::new(move |rv| {
        tx.send(rv).unwrap();
    }));
    manager.authenticate(
        SoftToken::new(),
        registration,
        APP_ID.to_string(),
        APP_ID.to_string(),
        true,
        10_000,
        status_tx,
        callback,
    );
    assert_matches!(
        rx.recv_timeout(Duration::from_secs(10)).unwrap(),
        Err(AuthenticatorError::Validation(ValidationError::UnknownKeyHandle))
    );
}

#[test]
fn test_manager_timeout() {
    setup();
    let mut manager = U2FManager::new(ChannelConfig::default());
    let (status_tx, _status_rx) = channel();
    let (tx, rx) = channel();
    let callback = StateCallback::new(Box::new(move |rv| {
        tx.send(rv).unwrap();
    }));

    manager.register(
        SoftToken::new().busy(usize::MAX),
        APP_ID.to_string(),
        APP_ID.to_string(),
        300,
        status_tx,
        callback,
    );

    assert_matches!(
        rx.recv_timeout(Duration::from_secs(10)),
        Ok(Err(AuthenticatorError::Cancelled))
    );
}

#[test]
fn test_manager_cancel() {
    setup();
    let mut manager = U2FManager::new(ChannelConfig::default());
    let (status_tx, status_rx) = channel();
    let (tx, rx) = channel();
    let callback = StateCallback::new(Box::new(move |rv| {
        tx.send(rv).unwrap();
    }));

    manager.register(
        SoftToken::new().busy(usize::MAX),
        APP_ID.to_string(),
        APP_ID.to_string(),
        0,
        status_tx,
        callback,
    );

    // Wait until the token asks for a touch, then give up.
    loop {
        match status_rx.recv_timeout(Duration::from_secs(10)) {
            Ok(StatusUpdate::PresenceRequired) => break,
            Ok(_) => continue,
            Err(e) => panic!("no touch request: {:?}", e),
        }
    }
    manager.cancel();

    assert_matches!(rx.try_recv(), Ok(Err(AuthenticatorError::Cancelled)));
    assert_matches!(
        rx.recv_timeout(Duration::from_millis(100)),
        Err(RecvTimeoutError::Disconnected)
    );
}

#[test]
fn test_state_callback_runs_once() {
    let (tx, rx) = channel();
    let callback = StateCallback::new(Box::new(move |rv: u8| {
        tx.send(rv).unwrap();
    }));
    let clone = callback.clone();

    callback.call(1);
    clone.call(2);
    assert_eq!(rx.try_iter().collect::<Vec<_>>(), vec![1]);
}
