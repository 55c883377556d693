//! Integration tests: transfer engine against a local range-capable server.

mod common;

use common::range_server::{self, RangeServerOptions};
use distrodl_core::control::TransferControl;
use distrodl_core::progress::TransferState;
use distrodl_core::storage;
use distrodl_core::transfer::{
    ErrorKind, TransferEngine, TransferError, TransferOptions, TransferOutcome,
};
use std::time::{Duration, Instant};
use tempfile::tempdir;

fn body_of(len: usize) -> Vec<u8> {
    (0u8..251).cycle().take(len).collect()
}

fn engine() -> TransferEngine {
    TransferEngine::new(TransferOptions::default())
}

fn assert_monotonic(events: &[TransferState]) {
    for pair in events.windows(2) {
        assert!(pair[0].bytes_transferred <= pair[1].bytes_transferred);
    }
    for e in events {
        if e.total_bytes > 0 {
            assert!(e.bytes_transferred <= e.total_bytes);
        }
    }
}

#[test]
fn ten_megabytes_in_8k_chunks() {
    let body = body_of(10_000_000);
    let server = range_server::start(body.clone());
    let dir = tempdir().unwrap();
    let dest = dir.path().join("image.iso");

    let mut events = Vec::new();
    let outcome = engine().transfer(
        &server.url,
        &dest,
        &mut |s: &TransferState| events.push(*s),
        &TransferControl::new(),
    );

    let state = match outcome {
        TransferOutcome::Success(state) => state,
        other => panic!("expected success, got {:?}", other),
    };
    assert_eq!(state.bytes_transferred, 10_000_000);
    assert_eq!(events.len(), (10_000_000usize).div_ceil(8192));
    let last = events.last().unwrap();
    assert_eq!(last.bytes_transferred, 10_000_000);
    assert_eq!(last.total_bytes, 10_000_000);
    assert_monotonic(&events);

    assert!(!storage::temp_path(&dest).exists());
    assert_eq!(std::fs::read(&dest).unwrap(), body);
    assert_eq!(server.requested_ranges(), vec![None]);
}

#[test]
fn resume_requests_only_remaining_bytes() {
    let body = body_of(100_000);
    let server = range_server::start(body.clone());
    let dir = tempdir().unwrap();
    let dest = dir.path().join("image.iso");
    std::fs::write(storage::temp_path(&dest), &body[..30_000]).unwrap();

    let mut events = Vec::new();
    let outcome = engine().transfer(
        &server.url,
        &dest,
        &mut |s: &TransferState| events.push(*s),
        &TransferControl::new(),
    );

    assert!(outcome.is_success(), "{:?}", outcome);
    assert_eq!(server.requested_ranges(), vec![Some(30_000)]);
    assert_eq!(events.first().unwrap().bytes_transferred, 30_000 + 8192);
    assert_eq!(events.first().unwrap().total_bytes, 100_000);
    assert_eq!(events.len(), (70_000usize).div_ceil(8192));
    assert_monotonic(&events);
    assert_eq!(std::fs::read(&dest).unwrap(), body);
}

#[test]
fn server_ignoring_range_restarts_from_zero() {
    let body = body_of(50_000);
    let server = range_server::start_with_options(
        body.clone(),
        RangeServerOptions {
            support_ranges: false,
            ..Default::default()
        },
    );
    let dir = tempdir().unwrap();
    let dest = dir.path().join("image.iso");
    std::fs::write(storage::temp_path(&dest), vec![0xAAu8; 5_000]).unwrap();

    let outcome = engine().transfer(&server.url, &dest, &mut |_: &TransferState| {}, &TransferControl::new());

    assert!(outcome.is_success(), "{:?}", outcome);
    assert_eq!(server.requested_ranges(), vec![Some(5_000)]);
    assert_eq!(std::fs::read(&dest).unwrap(), body);
}

#[test]
fn http_error_fails_and_keeps_partial() {
    let server = range_server::start_with_options(
        Vec::new(),
        RangeServerOptions {
            status: Some(404),
            ..Default::default()
        },
    );
    let dir = tempdir().unwrap();
    let dest = dir.path().join("image.iso");
    std::fs::write(storage::temp_path(&dest), b"abc").unwrap();

    let outcome = engine().transfer(&server.url, &dest, &mut |_: &TransferState| {}, &TransferControl::new());

    match outcome {
        TransferOutcome::Failed(TransferError::HttpStatus(404)) => {}
        other => panic!("expected HTTP 404 failure, got {:?}", other),
    }
    assert!(!dest.exists());
    assert_eq!(std::fs::read(storage::temp_path(&dest)).unwrap(), b"abc");
}

#[test]
fn connection_refused_is_network_failure() {
    let port = {
        let l = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        l.local_addr().unwrap().port()
    };
    let dir = tempdir().unwrap();
    let dest = dir.path().join("image.iso");

    let outcome = engine().transfer(
        &format!("http://127.0.0.1:{}/image.iso", port),
        &dest,
        &mut |_: &TransferState| {},
        &TransferControl::new(),
    );

    match outcome {
        TransferOutcome::Failed(err) => assert_eq!(err.kind(), ErrorKind::Network),
        other => panic!("expected failure, got {:?}", other),
    }
    assert!(!dest.exists());
}

#[test]
fn slow_response_headers_time_out() {
    let server = range_server::start_with_options(
        body_of(1000),
        RangeServerOptions {
            delay: Some(Duration::from_secs(6)),
            ..Default::default()
        },
    );
    let dir = tempdir().unwrap();
    let dest = dir.path().join("image.iso");
    let engine = TransferEngine::new(TransferOptions {
        response_timeout: Duration::from_secs(1),
        ..TransferOptions::default()
    });

    let started = Instant::now();
    let outcome = engine.transfer(&server.url, &dest, &mut |_: &TransferState| {}, &TransferControl::new());

    match outcome {
        TransferOutcome::Failed(TransferError::ResponseTimeout(d)) => {
            assert_eq!(d, Duration::from_secs(1))
        }
        other => panic!("expected response timeout, got {:?}", other),
    }
    assert!(started.elapsed() < Duration::from_secs(6));
}

#[test]
fn cancel_mid_transfer_leaves_partial_for_caller() {
    let body = body_of(1_000_000);
    let server = range_server::start(body);
    let dir = tempdir().unwrap();
    let dest = dir.path().join("image.iso");
    let control = TransferControl::new();

    let mut events = 0usize;
    let c = control.clone();
    let outcome = engine().transfer(
        &server.url,
        &dest,
        &mut |_: &TransferState| {
            events += 1;
            c.cancel();
        },
        &control,
    );

    assert!(matches!(outcome, TransferOutcome::Cancelled), "{:?}", outcome);
    assert_eq!(events, 1);
    assert!(!dest.exists());
    assert_eq!(storage::resume_offset(&dest), 8192);

    assert!(storage::discard_partial(&dest).unwrap());
    assert!(!dest.exists());
    assert!(!storage::temp_path(&dest).exists());
}

#[test]
fn pause_then_resume_produces_identical_file() {
    let body = body_of(500_000);
    let server = range_server::start(body.clone());
    let dir = tempdir().unwrap();
    let dest = dir.path().join("image.iso");
    let control = TransferControl::new();

    let mut events = Vec::new();
    let c = control.clone();
    let started = Instant::now();
    let outcome = engine().transfer(
        &server.url,
        &dest,
        &mut |s: &TransferState| {
            events.push(*s);
            if events.len() == 3 {
                c.pause();
                let resumer = c.clone();
                std::thread::spawn(move || {
                    std::thread::sleep(Duration::from_millis(300));
                    resumer.resume();
                });
            }
        },
        &control,
    );

    assert!(outcome.is_success(), "{:?}", outcome);
    assert!(started.elapsed() >= Duration::from_millis(300));
    assert_monotonic(&events);
    assert_eq!(std::fs::read(&dest).unwrap(), body);
}

#[test]
fn cancel_while_paused_stops_without_writing() {
    let server = range_server::start(body_of(200_000));
    let dir = tempdir().unwrap();
    let dest = dir.path().join("image.iso");
    let control = TransferControl::new();

    let c = control.clone();
    let outcome = engine().transfer(
        &server.url,
        &dest,
        &mut |_: &TransferState| {
            c.pause();
            let canceller = c.clone();
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(200));
                canceller.cancel();
            });
        },
        &control,
    );

    assert!(matches!(outcome, TransferOutcome::Cancelled), "{:?}", outcome);
    assert_eq!(storage::resume_offset(&dest), 8192);
}

#[test]
fn existing_destination_is_overwritten() {
    let body = body_of(20_000);
    let server = range_server::start(body.clone());
    let dir = tempdir().unwrap();
    let dest = dir.path().join("image.iso");
    std::fs::write(&dest, b"stale image").unwrap();

    let outcome = engine().transfer(&server.url, &dest, &mut |_: &TransferState| {}, &TransferControl::new());

    assert!(outcome.is_success(), "{:?}", outcome);
    assert_eq!(std::fs::read(&dest).unwrap(), body);
}

#[test]
fn empty_body_creates_empty_file() {
    let server = range_server::start(Vec::new());
    let dir = tempdir().unwrap();
    let dest = dir.path().join("empty.iso");

    let mut events = 0usize;
    let outcome = engine().transfer(
        &server.url,
        &dest,
        &mut |_: &TransferState| events += 1,
        &TransferControl::new(),
    );

    assert!(outcome.is_success(), "{:?}", outcome);
    assert_eq!(events, 0);
    assert_eq!(std::fs::read(&dest).unwrap().len(), 0);
}
