// Integration tests for the call recording lifecycle
//
// These tests drive the recorder controller through its handle, the same
// way bridge calls and telephony callbacks do, with fake platform seams.

mod common;

use anyhow::Result;
use call_recorder::permissions::{Permission, PermissionSet};
use call_recorder::recorder::StartOutcome;
use call_recorder::session::is_recording_name;
use call_recorder::{CallState, KeepAlive, RecorderError, RecorderEvent};
use common::{count_started, drain, spawn_recorder, WAKE_LOCK_TAG};
use std::sync::atomic::Ordering;
use tempfile::TempDir;

#[tokio::test]
async fn test_call_answer_and_hangup_records_one_file() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let mut h = spawn_recorder(temp_dir.path(), PermissionSet::all_granted());

    h.recorder.call_state_changed(CallState::Ringing).await?;
    h.recorder.call_state_changed(CallState::Offhook).await?;

    let status = h.recorder.status().await?;
    assert!(status.active, "Answered call should start a session");
    assert_eq!(status.call_state, CallState::Offhook);
    assert!(h.keep_alive.is_foreground(1));
    assert!(h.keep_alive.is_wake_lock_held(WAKE_LOCK_TAG));

    let session = status.session.expect("active session");
    let path = std::path::PathBuf::from(&session.output_path);
    assert_eq!(path.parent(), Some(h.output_dir.as_path()));
    let file_name = path.file_name().unwrap().to_str().unwrap();
    assert!(
        is_recording_name(file_name, "CALL_"),
        "Unexpected file name: {}",
        file_name
    );
    assert!(file_name.ends_with(".m4a"));

    h.recorder.call_state_changed(CallState::Idle).await?;
    let status = h.recorder.status().await?;
    assert!(!status.active, "Hangup should stop the session");
    assert!(!status.keep_alive_engaged);
    assert!(!h.keep_alive.is_foreground(1));
    assert_eq!(h.keep_alive.held_wake_locks(), 0);

    let events = drain(&mut h.events);
    assert_eq!(events.len(), 2, "Expected started + stopped, got {:?}", events);
    assert_eq!(
        events[0],
        RecorderEvent::Started {
            path: session.output_path.clone()
        }
    );
    match &events[1] {
        RecorderEvent::Stopped { path, duration_secs } => {
            assert_eq!(path, &session.output_path);
            assert!(*duration_secs >= 0.0);
        }
        other => panic!("Expected stopped event, got {:?}", other),
    }

    assert_eq!(h.capture.opens.load(Ordering::SeqCst), 1);
    assert_eq!(h.capture.finalizes.load(Ordering::SeqCst), 1);

    Ok(())
}

#[tokio::test]
async fn test_stop_is_idempotent() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let mut h = spawn_recorder(temp_dir.path(), PermissionSet::all_granted());

    let started = h.recorder.start().await?;
    let first = h.recorder.stop().await?;
    let second = h.recorder.stop().await?;

    assert_eq!(first.as_ref(), Some(started.path()));
    assert_eq!(second, None, "Second stop should be a no-op");

    let events = drain(&mut h.events);
    let stops = events
        .iter()
        .filter(|e| matches!(e, RecorderEvent::Stopped { .. }))
        .count();
    assert_eq!(stops, 1);
    assert_eq!(h.capture.finalizes.load(Ordering::SeqCst), 1);

    Ok(())
}

#[tokio::test]
async fn test_stop_without_session_resolves_none() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let mut h = spawn_recorder(temp_dir.path(), PermissionSet::all_granted());

    assert_eq!(h.recorder.stop().await?, None);
    assert!(drain(&mut h.events).is_empty(), "No-op stop emits nothing");

    Ok(())
}

#[tokio::test]
async fn test_double_start_allocates_one_handle() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let mut h = spawn_recorder(temp_dir.path(), PermissionSet::all_granted());

    let first = h.recorder.start().await?;
    let second = h.recorder.start().await?;

    assert!(matches!(first, StartOutcome::Started(_)));
    assert_eq!(second, StartOutcome::AlreadyActive(first.path().clone()));
    assert_eq!(h.capture.opens.load(Ordering::SeqCst), 1);

    let events = drain(&mut h.events);
    assert_eq!(count_started(&events), 1, "Exactly one started event");

    Ok(())
}

#[tokio::test]
async fn test_offhook_during_manual_session_is_ignored() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let h = spawn_recorder(temp_dir.path(), PermissionSet::all_granted());

    h.recorder.start().await?;
    h.recorder.call_state_changed(CallState::Offhook).await?;
    h.recorder.status().await?;

    assert_eq!(h.capture.opens.load(Ordering::SeqCst), 1);

    Ok(())
}

#[tokio::test]
async fn test_missing_permissions_never_open_device() -> Result<()> {
    for mask in 0u8..7 {
        let temp_dir = TempDir::new()?;
        let granted = PermissionSet {
            record_audio: mask & 1 != 0,
            read_phone_state: mask & 2 != 0,
            write_storage: mask & 4 != 0,
        };
        let mut h = spawn_recorder(temp_dir.path(), granted);

        let result = h.recorder.start().await;
        match result {
            Err(RecorderError::PermissionDenied(missing)) => {
                assert_eq!(missing, granted.missing());
            }
            other => panic!("mask {:03b}: expected PermissionDenied, got {:?}", mask, other),
        }

        assert_eq!(h.capture.opens.load(Ordering::SeqCst), 0);
        assert_eq!(h.permissions.request_count(), 1, "Start should request permissions");
        assert_eq!(h.keep_alive.held_wake_locks(), 0);

        let events = drain(&mut h.events);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], RecorderEvent::Error { .. }));
    }

    Ok(())
}

#[tokio::test]
async fn test_call_without_permissions_requests_them() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let h = spawn_recorder(temp_dir.path(), PermissionSet::default());

    h.recorder.call_state_changed(CallState::Offhook).await?;
    let status = h.recorder.status().await?;

    assert!(!status.active);
    assert!(!status.permissions_granted);
    assert_eq!(h.permissions.request_count(), 1);
    assert_eq!(
        *h.permissions.last_request.lock().unwrap(),
        Permission::REQUIRED.to_vec()
    );

    Ok(())
}

#[tokio::test]
async fn test_retry_after_grant_succeeds() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let mut h = spawn_recorder(temp_dir.path(), PermissionSet::default());

    assert!(h.recorder.start().await.is_err());

    h.permissions.set(PermissionSet::all_granted());
    h.recorder.permission_result(true).await?;
    let started = h.recorder.start().await?;
    assert!(matches!(started, StartOutcome::Started(_)));

    let events = drain(&mut h.events);
    assert!(events.contains(&RecorderEvent::PermissionResult { granted: true }));
    assert_eq!(count_started(&events), 1);

    Ok(())
}

#[tokio::test]
async fn test_permission_denied_result_emits_error() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let mut h = spawn_recorder(temp_dir.path(), PermissionSet::default());

    h.recorder.permission_result(false).await?;
    h.recorder.status().await?;

    let events = drain(&mut h.events);
    assert_eq!(
        events,
        vec![
            RecorderEvent::PermissionResult { granted: false },
            RecorderEvent::error("Permission denied"),
        ]
    );

    Ok(())
}

#[tokio::test]
async fn test_device_failure_leaves_nothing_held() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let mut h = spawn_recorder(temp_dir.path(), PermissionSet::all_granted());
    h.capture.fail_open.store(true, Ordering::SeqCst);

    let result = h.recorder.start().await;
    match result {
        Err(RecorderError::DeviceUnavailable(message)) => {
            assert!(message.contains("device busy"));
        }
        other => panic!("Expected DeviceUnavailable, got {:?}", other),
    }

    let status = h.recorder.status().await?;
    assert!(!status.active);
    assert!(!status.keep_alive_engaged);
    assert!(!h.keep_alive.is_foreground(1));
    assert_eq!(h.keep_alive.held_wake_locks(), 0);

    let events = drain(&mut h.events);
    assert_eq!(events.len(), 1);
    match &events[0] {
        RecorderEvent::Error { message } => assert!(message.contains("device busy")),
        other => panic!("Expected error event, got {:?}", other),
    }

    // The device recovers; the next start works
    h.capture.fail_open.store(false, Ordering::SeqCst);
    assert!(matches!(h.recorder.start().await?, StartOutcome::Started(_)));

    Ok(())
}

#[tokio::test]
async fn test_finalize_failure_still_releases_session() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let mut h = spawn_recorder(temp_dir.path(), PermissionSet::all_granted());

    h.recorder.start().await?;
    h.capture.fail_finalize.store(true, Ordering::SeqCst);

    let result = h.recorder.stop().await;
    assert!(matches!(result, Err(RecorderError::Finalize(_))));

    let status = h.recorder.status().await?;
    assert!(!status.active);
    assert_eq!(h.keep_alive.held_wake_locks(), 0);

    let events = drain(&mut h.events);
    assert!(matches!(events.last(), Some(RecorderEvent::Error { .. })));
    assert_eq!(h.recorder.stop().await?, None);

    Ok(())
}

#[tokio::test]
async fn test_shutdown_stops_active_session() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let mut h = spawn_recorder(temp_dir.path(), PermissionSet::all_granted());

    h.recorder.call_state_changed(CallState::Offhook).await?;
    h.recorder.shutdown().await?;
    (&mut h.task).await?;

    assert_eq!(h.capture.finalizes.load(Ordering::SeqCst), 1);
    assert_eq!(h.keep_alive.held_wake_locks(), 0);
    assert!(!h.keep_alive.is_foreground(1));

    let events = drain(&mut h.events);
    assert!(matches!(events.last(), Some(RecorderEvent::Stopped { .. })));

    assert!(matches!(
        h.recorder.start().await,
        Err(RecorderError::ControllerGone)
    ));

    Ok(())
}

#[tokio::test]
async fn test_dropping_every_handle_tears_down_session() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let h = spawn_recorder(temp_dir.path(), PermissionSet::all_granted());

    h.recorder.start().await?;
    assert!(h.keep_alive.is_wake_lock_held(WAKE_LOCK_TAG));

    let common::Harness {
        recorder,
        task,
        mut events,
        capture,
        keep_alive,
        ..
    } = h;
    drop(recorder);
    task.await?;

    assert_eq!(capture.finalizes.load(Ordering::SeqCst), 1);
    assert_eq!(keep_alive.held_wake_locks(), 0);
    assert!(!keep_alive.is_foreground(1));

    let events = drain(&mut events);
    assert!(matches!(events.last(), Some(RecorderEvent::Stopped { .. })));

    Ok(())
}

#[tokio::test]
async fn test_hangup_after_call_waiting_stops_recording() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let mut h = spawn_recorder(temp_dir.path(), PermissionSet::all_granted());

    h.recorder.call_state_changed(CallState::Offhook).await?;
    // A second call rings while the first is still in progress
    h.recorder.call_state_changed(CallState::Ringing).await?;
    assert!(h.recorder.status().await?.active);

    h.recorder.call_state_changed(CallState::Idle).await?;
    let status = h.recorder.status().await?;
    assert!(!status.active, "Hangup should stop the session");
    assert!(!status.keep_alive_engaged);
    assert!(!h.keep_alive.is_wake_lock_held(WAKE_LOCK_TAG));
    assert!(!h.keep_alive.is_foreground(1));

    let events = drain(&mut h.events);
    assert_eq!(count_started(&events), 1);
    assert!(matches!(events.last(), Some(RecorderEvent::Stopped { .. })));

    Ok(())
}

#[tokio::test]
async fn test_concurrent_callers_share_one_session() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let mut h = spawn_recorder(temp_dir.path(), PermissionSet::all_granted());

    let mut tasks = Vec::new();
    for i in 0..8 {
        let recorder = h.recorder.clone();
        tasks.push(tokio::spawn(async move {
            if i % 2 == 0 {
                recorder.call_state_changed(CallState::Offhook).await.map(|_| ())
            } else {
                recorder.start().await.map(|_| ())
            }
        }));
    }
    for task in tasks {
        task.await??;
    }

    h.recorder.status().await?;
    assert_eq!(h.capture.opens.load(Ordering::SeqCst), 1);
    assert_eq!(count_started(&drain(&mut h.events)), 1);

    Ok(())
}
