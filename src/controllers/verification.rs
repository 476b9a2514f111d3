//! Agent-based document verification workflow.
//!
//! Drives one document through `POST /agent/verify`, then polls
//! `GET /agent/verify/{id}` on a fixed period until the job reaches a terminal status.
//! While the job reports `needs_info` polling continues and the caller may send
//! supplementary text with [`VerificationController::submit_additional_info`].
//!
//! Ticks never overlap: a tick that finds a poll still in flight is skipped. Dropping the
//! controller cancels the timer, and any response that resolves afterwards is ignored.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use strum::Display;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::models::job::{JobStatus, VerificationJob};
use crate::models::verification::{
    AdditionalInfoRequest, StartVerificationRequest, StartVerificationResponse,
};
use crate::services::api::{ApiError, Backend, RequestOptions};
use crate::services::upload::UploadedImage;

const START_PATH: &str = "/agent/verify";

/// Prompt shown when the agent asks for input without a message.
pub const DEFAULT_NEEDS_INFO_MESSAGE: &str =
    "Please provide additional information to continue verification.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    Submitting,
    Polling,
    Completed,
    Failed,
}

/// Everything the verification screen renders. Published on every change.
#[derive(Debug, Clone, Default)]
pub struct VerificationView {
    pub phase: Phase,
    /// Selected image; cleared once a job exists for it.
    pub image: Option<UploadedImage>,
    /// Local preview kept after upload until the job carries its own `preview_url`.
    pub local_preview: Option<String>,
    pub job_id: Option<String>,
    /// Latest status snapshot, replaced wholesale by each poll.
    pub job: Option<VerificationJob>,
    /// Contents of the additional-information input.
    pub draft: String,
    pub last_error: Option<String>,
}

impl VerificationView {
    /// The additional-information request, when the agent is waiting for one.
    pub fn needs_info_prompt(&self) -> Option<&str> {
        let job = self.job.as_ref().filter(|j| j.status == JobStatus::NeedsInfo)?;
        Some(
            job.needs_info
                .as_ref()
                .and_then(|n| n.message.as_deref())
                .unwrap_or(DEFAULT_NEEDS_INFO_MESSAGE),
        )
    }

    pub fn preview(&self) -> Option<String> {
        self.job
            .as_ref()
            .and_then(|j| j.preview_url.clone())
            .or_else(|| self.local_preview.clone())
            .or_else(|| self.image.as_ref().map(UploadedImage::data_url))
    }
}

struct Shared {
    view: watch::Sender<VerificationView>,
    /// Held for the duration of each status fetch.
    poll_gate: Mutex<()>,
    discarded: AtomicBool,
}

pub struct VerificationController {
    backend: Arc<dyn Backend>,
    token: String,
    interval: Duration,
    shared: Arc<Shared>,
    poller: Option<JoinHandle<()>>,
}

impl VerificationController {
    pub fn new(backend: Arc<dyn Backend>, token: impl Into<String>, interval: Duration) -> Self {
        let (view, _) = watch::channel(VerificationView::default());
        Self {
            backend,
            token: token.into(),
            interval,
            shared: Arc::new(Shared {
                view,
                poll_gate: Mutex::new(()),
                discarded: AtomicBool::new(false),
            }),
            poller: None,
        }
    }

    /// Receive every published view change.
    pub fn subscribe(&self) -> watch::Receiver<VerificationView> {
        self.shared.view.subscribe()
    }

    pub fn view(&self) -> VerificationView {
        self.shared.view.borrow().clone()
    }

    pub fn phase(&self) -> Phase {
        self.shared.view.borrow().phase
    }

    pub fn job_id(&self) -> Option<String> {
        self.shared.view.borrow().job_id.clone()
    }

    /// True while the recurring status poll is scheduled.
    pub fn is_polling(&self) -> bool {
        self.phase() == Phase::Polling && self.poller.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Select an image for the next verification. Starting a new upload discards the
    /// current job and stops its polling.
    pub fn select_image(&mut self, image: UploadedImage) {
        self.cancel_polling();
        self.shared.view.send_modify(|view| {
            *view = VerificationView {
                image: Some(image),
                ..VerificationView::default()
            };
        });
    }

    pub fn set_draft(&self, text: impl Into<String>) {
        let text = text.into();
        self.shared.view.send_modify(|view| view.draft = text);
    }

    /// Submit the selected image and start polling the new job.
    pub async fn start_verification(&mut self) -> Result<String, ControllerError> {
        if self.shared.discarded.load(Ordering::Acquire) {
            return Err(ControllerError::Discarded);
        }
        let image = {
            let view = self.shared.view.borrow();
            if matches!(view.phase, Phase::Submitting | Phase::Polling) {
                return Err(ControllerError::JobInFlight);
            }
            view.image.clone().ok_or(ControllerError::NoImageSelected)?
        };

        self.shared.view.send_modify(|view| {
            view.phase = Phase::Submitting;
            view.last_error = None;
        });

        tracing::info!(file = %image.file_name, bytes = image.size, "Starting agent verification");
        let body = serde_json::to_value(StartVerificationRequest::new(image.base64.clone()))?;
        let started = match self
            .backend
            .post(START_PATH, Some(&self.token), RequestOptions::json(body))
            .await
        {
            Ok(value) => serde_json::from_value::<StartVerificationResponse>(value).map_err(ControllerError::from),
            Err(e) => Err(ControllerError::from(e)),
        };

        if self.shared.discarded.load(Ordering::Acquire) {
            return Err(ControllerError::Discarded);
        }

        let verification_id = match started {
            Ok(response) => response.verification_id,
            Err(e) => {
                tracing::error!(error = %e, "Error starting verification");
                let message = e.user_message();
                self.shared.view.send_modify(|view| {
                    view.phase = Phase::Idle;
                    view.last_error = Some(message);
                });
                return Err(e);
            }
        };

        tracing::info!(job_id = %verification_id, "Verification started, polling for status");
        let preview = image.data_url();
        self.shared.view.send_modify(|view| {
            view.phase = Phase::Polling;
            view.job_id = Some(verification_id.clone());
            view.job = None;
            view.image = None;
            view.local_preview = Some(preview);
        });

        self.poller = Some(tokio::spawn(run_poll_loop(
            self.shared.clone(),
            self.backend.clone(),
            self.token.clone(),
            verification_id.clone(),
            self.interval,
        )));
        Ok(verification_id)
    }

    /// Fetch the job status once, outside the timer. Waits for an in-flight tick instead
    /// of overlapping it. A job that already finished is not fetched again.
    pub async fn refresh(&mut self) -> Option<JobStatus> {
        if matches!(self.phase(), Phase::Completed | Phase::Failed) {
            return self.shared.view.borrow().job.as_ref().map(|job| job.status);
        }
        self.poll_now().await
    }

    async fn poll_now(&mut self) -> Option<JobStatus> {
        let job_id = self.job_id()?;
        let status = {
            let _gate = self.shared.poll_gate.lock().await;
            poll_once(&self.shared, self.backend.as_ref(), &self.token, &job_id).await
        };
        if status.is_some_and(JobStatus::is_terminal) {
            self.cancel_polling();
        }
        status
    }

    /// Send supplementary information for the current job, then refresh its status once
    /// and clear the input whether or not the submission succeeded.
    pub async fn submit_additional_info(&mut self, text: &str) -> Result<(), ControllerError> {
        if text.trim().is_empty() {
            return Err(ControllerError::EmptyInfo);
        }
        let job_id = self.job_id().ok_or(ControllerError::NoJob)?;

        let body = serde_json::to_value(AdditionalInfoRequest {
            additional_info: text.to_string(),
        })?;
        let outcome = self
            .backend
            .put(&status_path(&job_id), Some(&self.token), RequestOptions::json(body))
            .await;

        if let Err(e) = &outcome {
            tracing::error!(job_id = %job_id, error = %e, "Error providing additional info");
            let message = e.user_message();
            self.shared.view.send_modify(|view| view.last_error = Some(message));
        }

        self.poll_now().await;
        self.shared.view.send_modify(|view| view.draft.clear());

        outcome.map(|_| ()).map_err(ControllerError::from)
    }

    fn cancel_polling(&mut self) {
        if let Some(handle) = self.poller.take() {
            handle.abort();
        }
    }

    /// Tear down: stop the timer and ignore any response still in flight.
    pub fn shutdown(&mut self) {
        self.shared.discarded.store(true, Ordering::Release);
        self.cancel_polling();
    }
}

impl Drop for VerificationController {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn status_path(job_id: &str) -> String {
    format!("{START_PATH}/{job_id}")
}

async fn run_poll_loop(
    shared: Arc<Shared>,
    backend: Arc<dyn Backend>,
    token: String,
    job_id: String,
    period: Duration,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        if shared.discarded.load(Ordering::Acquire) {
            break;
        }

        let Ok(_gate) = shared.poll_gate.try_lock() else {
            tracing::debug!(job_id = %job_id, "Previous poll still in flight, skipping tick");
            continue;
        };

        if let Some(status) = poll_once(&shared, backend.as_ref(), &token, &job_id).await {
            if status.is_terminal() {
                tracing::info!(job_id = %job_id, status = %status, "Verification finished, polling stopped");
                break;
            }
        }
    }
}

/// Fetch and publish one status snapshot. Errors are logged and leave the previous
/// snapshot in place. Returns the status only if the snapshot was applied.
async fn poll_once(shared: &Shared, backend: &dyn Backend, token: &str, job_id: &str) -> Option<JobStatus> {
    if shared.discarded.load(Ordering::Acquire) {
        return None;
    }

    let job = match backend
        .get(&status_path(job_id), Some(token), RequestOptions::default())
        .await
        .map_err(ControllerError::from)
        .and_then(|value| serde_json::from_value::<VerificationJob>(value).map_err(ControllerError::from))
    {
        Ok(job) => job,
        Err(e) => {
            tracing::warn!(job_id = %job_id, error = %e, "Error fetching verification status");
            return None;
        }
    };

    if shared.discarded.load(Ordering::Acquire) {
        tracing::debug!(job_id = %job_id, "Controller discarded, dropping status response");
        return None;
    }

    let status = job.status;
    let applied = shared.view.send_if_modified(|view| {
        // A new upload may have replaced the job while the request was in flight.
        if view.job_id.as_deref() != Some(job_id) {
            return false;
        }
        match status {
            JobStatus::Completed => view.phase = Phase::Completed,
            JobStatus::Failed => view.phase = Phase::Failed,
            _ => {}
        }
        view.job = Some(job);
        true
    });

    tracing::debug!(job_id = %job_id, status = %status, applied, "Polled verification status");
    applied.then_some(status)
}

#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error("Select a document image first")]
    NoImageSelected,

    #[error("A verification is already in progress")]
    JobInFlight,

    #[error("No verification in progress")]
    NoJob,

    #[error("Additional information is empty")]
    EmptyInfo,

    #[error("Verification view was closed")]
    Discarded,

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Unexpected verification response: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ControllerError {
    pub fn user_message(&self) -> String {
        match self {
            ControllerError::Api(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::job::NeedsInfo;

    fn job(status: JobStatus) -> VerificationJob {
        VerificationJob {
            verification_id: Some("v1".to_string()),
            status,
            document_type: None,
            confidence: None,
            steps: Vec::new(),
            result_summary: None,
            needs_info: None,
            preview_url: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_needs_info_prompt_uses_server_message() {
        let mut j = job(JobStatus::NeedsInfo);
        j.needs_info = Some(NeedsInfo {
            message: Some("need SSN".to_string()),
            ..NeedsInfo::default()
        });
        let view = VerificationView {
            job: Some(j),
            ..VerificationView::default()
        };
        assert_eq!(view.needs_info_prompt(), Some("need SSN"));
    }

    #[test]
    fn test_needs_info_prompt_default() {
        let view = VerificationView {
            job: Some(job(JobStatus::NeedsInfo)),
            ..VerificationView::default()
        };
        assert_eq!(view.needs_info_prompt(), Some(DEFAULT_NEEDS_INFO_MESSAGE));
    }

    #[test]
    fn test_no_prompt_outside_needs_info() {
        let view = VerificationView {
            job: Some(job(JobStatus::InProgress)),
            ..VerificationView::default()
        };
        assert_eq!(view.needs_info_prompt(), None);
        assert_eq!(VerificationView::default().needs_info_prompt(), None);
    }

    #[test]
    fn test_preview_prefers_job_url() {
        let mut j = job(JobStatus::InProgress);
        j.preview_url = Some("https://cdn/doc.png".to_string());
        let view = VerificationView {
            local_preview: Some("data:image/png;base64,AA==".to_string()),
            job: Some(j),
            ..VerificationView::default()
        };
        assert_eq!(view.preview().as_deref(), Some("https://cdn/doc.png"));
    }
}
