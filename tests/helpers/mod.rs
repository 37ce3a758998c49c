#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Router,
    extract::{Multipart, State},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::post,
};
use metric_intake::{
    models::{FieldSpec, FileKey, FormMetadata, FormSchema, StagedFile, SubmissionResult},
    services::{
        Controller, FileQueue, ResultPresenter, Summary, UploadBackend, View,
        workflow::StatusMessage,
    },
};
use std::{
    collections::VecDeque,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};
use tokio::net::TcpListener;

pub const DWELL: Duration = Duration::from_secs(15);

/// One multipart part as received by the fake backend.
#[derive(Debug, Clone)]
pub struct ReceivedPart {
    pub name: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl ReceivedPart {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }
}

#[derive(Clone)]
struct FakeState {
    status: StatusCode,
    body: String,
    received: Arc<Mutex<Vec<Vec<ReceivedPart>>>>,
}

/// In-process `/upload` endpoint that records each request and replies with
/// a fixed status and body.
pub struct FakeBackend {
    pub url: String,
    received: Arc<Mutex<Vec<Vec<ReceivedPart>>>>,
}

impl FakeBackend {
    pub async fn start(status: StatusCode, body: impl Into<String>) -> Self {
        let received = Arc::new(Mutex::new(Vec::new()));
        let state = FakeState {
            status,
            body: body.into(),
            received: received.clone(),
        };
        let app = Router::new()
            .route("/upload", post(upload))
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            url: format!("http://{}/upload", addr),
            received,
        }
    }

    pub fn requests(&self) -> Vec<Vec<ReceivedPart>> {
        self.received.lock().unwrap().clone()
    }
}

async fn upload(State(state): State<FakeState>, mut multipart: Multipart) -> impl IntoResponse {
    let mut parts = Vec::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await.map(|b| b.to_vec()).unwrap_or_default();
        parts.push(ReceivedPart {
            name,
            file_name,
            content_type,
            data,
        });
    }
    state.received.lock().unwrap().push(parts);

    (
        state.status,
        [(header::CONTENT_TYPE, "application/json")],
        state.body.clone(),
    )
}

/// Backend double replying with scripted results, in order.
#[derive(Default)]
pub struct ScriptedBackend {
    results: Mutex<VecDeque<SubmissionResult>>,
    calls: AtomicUsize,
    seen_files: Mutex<Vec<Vec<FileKey>>>,
}

impl ScriptedBackend {
    pub fn new(results: impl IntoIterator<Item = SubmissionResult>) -> Self {
        Self {
            results: Mutex::new(results.into_iter().collect()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen_files(&self) -> Vec<Vec<FileKey>> {
        self.seen_files.lock().unwrap().clone()
    }
}

#[async_trait]
impl UploadBackend for ScriptedBackend {
    async fn submit(&self, _metadata: &FormMetadata, queue: &FileQueue) -> SubmissionResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen_files.lock().unwrap().push(queue.keys());
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| SubmissionResult::failure("no scripted result"))
    }
}

/// View that remembers what it was last told to show.
#[derive(Default, Debug)]
pub struct RecordingView {
    pub title: String,
    pub locked: bool,
    pub staging_visible: bool,
    pub submit_visible: bool,
    pub submit_enabled: bool,
    pub files: Vec<FileKey>,
    pub validation_errors: Vec<FieldSpec>,
    pub notices: Vec<String>,
    pub status: Option<StatusMessage>,
    pub summary: Option<Summary>,
    pub form_clears: usize,
}

impl View for RecordingView {
    fn set_metadata_locked(&mut self, locked: bool) {
        self.locked = locked;
    }
    fn clear_form(&mut self) {
        self.form_clears += 1;
    }
    fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
    }
    fn show_validation_errors(&mut self, missing: &[FieldSpec]) {
        self.validation_errors = missing.to_vec();
    }
    fn set_staging_visible(&mut self, visible: bool) {
        self.staging_visible = visible;
    }
    fn render_file_list(&mut self, files: &[FileKey]) {
        self.files = files.to_vec();
    }
    fn set_submit_visible(&mut self, visible: bool) {
        self.submit_visible = visible;
    }
    fn set_submit_enabled(&mut self, enabled: bool) {
        self.submit_enabled = enabled;
    }
    fn notice(&mut self, text: &str) {
        self.notices.push(text.to_string());
    }
    fn show_status(&mut self, status: &StatusMessage) {
        self.status = Some(status.clone());
    }
    fn hide_status(&mut self) {
        self.status = None;
    }
    fn show_summary(&mut self, summary: &Summary) {
        self.summary = Some(summary.clone());
    }
    fn hide_summary(&mut self) {
        self.summary = None;
    }
}

pub const FORM_VALUES: [(&str, &str); 7] = [
    ("client_name", "Acme"),
    ("campaign_name", "Spring Launch"),
    ("influencer_name", "@ana"),
    ("platform", "instagram"),
    ("format", "reel"),
    ("organic_paid", "paid"),
    ("content_id", "post-42"),
];

pub fn controller<B: UploadBackend>(backend: B) -> Controller<B, RecordingView> {
    Controller::new(
        backend,
        RecordingView::default(),
        FormSchema::default(),
        ResultPresenter::default(),
        DWELL,
    )
}

pub fn fill_form<B: UploadBackend>(session: &mut Controller<B, RecordingView>) {
    for (name, value) in FORM_VALUES {
        session.set_field(name, value).unwrap();
    }
}

pub fn screenshot(name: &str, size: usize) -> StagedFile {
    StagedFile::new(name, "image/png", vec![1u8; size])
}
