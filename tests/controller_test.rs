mod helpers;

use axum::http::StatusCode;
use helpers::{DWELL, FakeBackend, ScriptedBackend, controller, fill_form, screenshot};
use metric_intake::{
    IntakeError,
    models::{FileKey, FormSchema, SubmissionResult, SuccessPayload},
    services::{
        Controller, Effect, HttpSubmissionClient, ResultPresenter, WorkflowState,
        workflow::{EMPTY_QUEUE_NOTICE, INITIAL_TITLE, StatusMessage},
    },
};
use serde_json::json;
use std::{collections::BTreeMap, time::Duration};

fn success(metrics: &[(&str, Option<f64>)]) -> SubmissionResult {
    SubmissionResult::Success(SuccessPayload {
        metrics: metrics
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect::<BTreeMap<_, _>>(),
        storage_link: Some("https://x/y".into()),
    })
}

#[test]
fn prepare_requires_every_field() {
    let mut session = controller(ScriptedBackend::default());
    session.set_field("campaign_name", "Spring").unwrap();

    for _ in 0..2 {
        session.prepare().unwrap();
        assert_eq!(*session.state(), WorkflowState::Editing);
        assert_eq!(session.view().validation_errors.len(), 6);
        assert!(!session.view().locked);
    }

    fill_form(&mut session);
    session.prepare().unwrap();
    assert_eq!(*session.state(), WorkflowState::Staging);
    assert!(session.view().locked);
    assert!(session.view().staging_visible);
    assert_eq!(session.view().title, "Uploading for: Spring Launch");
}

#[test]
fn metadata_is_locked_after_prepare() {
    let mut session = controller(ScriptedBackend::default());
    fill_form(&mut session);
    session.prepare().unwrap();

    let err = session.set_field("platform", "tiktok").unwrap_err();
    assert!(matches!(err, IntakeError::MetadataLocked("staging")));
    assert_eq!(session.metadata().get("platform"), Some("instagram"));
}

#[test]
fn files_cannot_be_staged_before_prepare() {
    let mut session = controller(ScriptedBackend::default());
    let err = session.add_files(vec![screenshot("a.png", 1)]).unwrap_err();
    assert!(err.is_rejected_event());
    assert!(session.queue().is_empty());
}

#[test]
fn queue_mutations_rerender_and_toggle_submit() {
    let mut session = controller(ScriptedBackend::default());
    fill_form(&mut session);
    session.prepare().unwrap();
    assert!(!session.view().submit_visible);

    session
        .add_files(vec![screenshot("a.png", 1), screenshot("b.png", 2)])
        .unwrap();
    session.add_files(vec![screenshot("a.png", 1)]).unwrap();
    assert_eq!(
        session.view().files,
        vec![FileKey::new("a.png", 1), FileKey::new("b.png", 2)]
    );
    assert!(session.view().submit_visible);

    session.remove_file(FileKey::new("a.png", 1)).unwrap();
    session.remove_file(FileKey::new("missing.png", 9)).unwrap();
    assert_eq!(session.view().files, vec![FileKey::new("b.png", 2)]);

    session.remove_file(FileKey::new("b.png", 2)).unwrap();
    assert!(session.view().files.is_empty());
    assert!(!session.view().submit_visible);
}

#[tokio::test]
async fn empty_queue_submit_never_calls_backend() {
    let mut session = controller(ScriptedBackend::new([success(&[])]));
    fill_form(&mut session);
    session.prepare().unwrap();

    let effects = session.submit().await.unwrap();
    assert_eq!(effects, vec![Effect::Notice(EMPTY_QUEUE_NOTICE.into())]);
    assert_eq!(*session.state(), WorkflowState::Staging);
    assert_eq!(session.backend().calls(), 0);
    assert_eq!(session.view().notices, vec![EMPTY_QUEUE_NOTICE.to_string()]);
}

#[tokio::test]
async fn backend_error_keeps_queue_and_form_for_retry() {
    let backend = ScriptedBackend::new([
        SubmissionResult::failure("bad image"),
        success(&[("likes", Some(5.0))]),
    ]);
    let mut session = controller(backend);
    fill_form(&mut session);
    session.prepare().unwrap();
    session
        .add_files(vec![screenshot("a.png", 1), screenshot("b.png", 2)])
        .unwrap();

    session.submit().await.unwrap();
    assert_eq!(
        *session.state(),
        WorkflowState::Error {
            message: "bad image".into()
        }
    );
    assert_eq!(
        session.view().status,
        Some(StatusMessage::Error("bad image".into()))
    );
    assert!(session.view().submit_enabled);
    assert_eq!(session.queue().len(), 2);
    assert!(session.metadata().is_complete());
    assert!(session.view().locked);

    // Retry straight from the error state.
    session.submit().await.unwrap();
    assert!(matches!(session.state(), WorkflowState::Success { .. }));
    assert_eq!(session.backend().calls(), 2);
    assert_eq!(
        session.backend().seen_files(),
        vec![
            vec![FileKey::new("a.png", 1), FileKey::new("b.png", 2)],
            vec![FileKey::new("a.png", 1), FileKey::new("b.png", 2)],
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn success_shows_summary_then_auto_resets() {
    let backend = ScriptedBackend::new([success(&[("likes", Some(120.0)), ("comments", None)])]);
    let mut session = controller(backend);
    fill_form(&mut session);
    session.prepare().unwrap();
    session.add_files(vec![screenshot("a.png", 1)]).unwrap();

    session.submit().await.unwrap();
    assert!(matches!(session.state(), WorkflowState::Success { .. }));

    let summary = session.view().summary.clone().expect("summary shown");
    assert_eq!(summary.entry("likes").map(|e| e.value.as_str()), Some("120"));
    assert!(summary.entry("comments").is_none());
    assert_eq!(summary.storage_link.as_deref(), Some("https://x/y"));
    assert!(!session.view().staging_visible);
    assert_eq!(session.view().status, None);

    // Nothing happens before the dwell elapses.
    tokio::time::sleep(DWELL - Duration::from_secs(1)).await;
    assert!(!session.poll_auto_reset().unwrap());
    assert!(matches!(session.state(), WorkflowState::Success { .. }));

    assert!(session.wait_for_auto_reset().await.unwrap());
    assert_eq!(*session.state(), WorkflowState::Editing);
    assert!(session.queue().is_empty());
    assert_eq!(session.metadata().missing().len(), 7);
    assert_eq!(session.view().title, INITIAL_TITLE);
    assert!(session.view().summary.is_none());
    assert!(!session.view().locked);
    assert_eq!(session.view().form_clears, 1);
}

#[tokio::test(start_paused = true)]
async fn manual_reset_prevents_second_reset() {
    let mut session = controller(ScriptedBackend::new([success(&[("likes", Some(1.0))])]));
    fill_form(&mut session);
    session.prepare().unwrap();
    session.add_files(vec![screenshot("a.png", 1)]).unwrap();
    session.submit().await.unwrap();
    assert!(session.pending_auto_reset().is_some());

    session.reset().unwrap();
    assert_eq!(*session.state(), WorkflowState::Editing);
    assert_eq!(session.view().form_clears, 1);
    assert!(session.pending_auto_reset().is_none());

    // Start a new entry; the old timer must not wipe it.
    session.set_field("campaign_name", "Next").unwrap();
    tokio::time::sleep(DWELL * 2).await;

    assert!(!session.wait_for_auto_reset().await.unwrap());
    assert!(!session.poll_auto_reset().unwrap());
    assert_eq!(session.view().form_clears, 1);
    assert_eq!(session.metadata().get("campaign_name"), Some("Next"));

    // A repeated reset is harmless.
    assert!(session.reset().unwrap().is_empty());
}

#[tokio::test]
async fn submitting_through_http_client() {
    let body = json!({
        "status": "success",
        "processed_data": {
            "metrics": {"reach": 25000, "likes": 120, "comments": null, "saves": 0},
            "drive_folder_link": "https://drive/folder"
        }
    });
    let backend = FakeBackend::start(StatusCode::OK, body.to_string()).await;
    let client =
        HttpSubmissionClient::new(backend.url.clone(), "metric_images[]", Duration::from_secs(10))
            .unwrap();

    let mut session = Controller::new(
        client,
        helpers::RecordingView::default(),
        FormSchema::default(),
        ResultPresenter::default(),
        DWELL,
    );
    fill_form(&mut session);
    session.prepare().unwrap();
    session.add_files(vec![screenshot("a.png", 4)]).unwrap();
    session.submit().await.unwrap();

    let summary = session.view().summary.clone().expect("summary shown");
    let rendered: Vec<(&str, &str)> = summary
        .entries
        .iter()
        .map(|e| (e.name.as_str(), e.value.as_str()))
        .collect();
    assert_eq!(rendered, [("reach", "25.000"), ("likes", "120"), ("saves", "0")]);
    assert_eq!(backend.requests().len(), 1);

    session.reset().unwrap();
    assert_eq!(*session.state(), WorkflowState::Editing);
}
