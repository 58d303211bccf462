//! The quote form component: attachment staging, validation, single-flight
//! submission through one [`DeliveryTransport`], and the drafting/submitted
//! UI modes.
//!
//! All operations take `&self`. State lives behind one mutex that is never
//! held across an await, and an atomic in-flight flag guarantees at most one
//! submission per form instance. Every state change republishes a fresh
//! [`FormView`] on a watch channel.

pub mod view;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::audit::{AuditCategory, AuditEvent, AuditOutcome, AuditSink, TracingAuditSink};
use crate::config::{AppConfig, AttachmentMode};
use crate::domain::attachment::Attachment;
use crate::domain::quote::{QuoteRequest, RequiredField};
use crate::errors::{IntakeRejection, SUBMISSION_IN_FLIGHT_MESSAGE};
use crate::intake::{IntakePolicy, IntakeReport, SelectedFile, StagedAttachmentSet};
use crate::payload::QuotePayload;
use crate::transport::DeliveryTransport;

pub use view::{FormView, SubmissionSummary, UiMode};

pub const SUBMISSION_SENT_MESSAGE: &str = "Email sent successfully!";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DeliveryOutcome {
    pub success: bool,
    pub message: String,
}

impl DeliveryOutcome {
    pub fn success(message: impl Into<String>) -> Self {
        Self { success: true, message: message.into() }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self { success: false, message: message.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuoteFormSettings {
    pub recipient: String,
    pub attachment_mode: AttachmentMode,
    pub intake: IntakePolicy,
}

impl QuoteFormSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            recipient: config.delivery.recipient.clone(),
            attachment_mode: config.delivery.attachment_mode,
            intake: IntakePolicy { max_attachment_bytes: config.intake.max_attachment_bytes },
        }
    }
}

#[derive(Clone, Debug, Default)]
pub(crate) struct FormState {
    pub(crate) staged: StagedAttachmentSet,
    pub(crate) error: Option<String>,
    pub(crate) mode: UiMode,
    pub(crate) submitting: bool,
    pub(crate) summary: Option<SubmissionSummary>,
}

pub struct QuoteForm {
    settings: QuoteFormSettings,
    transport: Arc<dyn DeliveryTransport>,
    audit: Arc<dyn AuditSink>,
    state: Mutex<FormState>,
    in_flight: AtomicBool,
    views: watch::Sender<FormView>,
}

/// Releases the in-flight flag and re-enables the submit control, also when
/// the submission future is dropped before completing.
struct InFlightGuard<'a> {
    form: &'a QuoteForm,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.form.update(|state| state.submitting = false);
        self.form.in_flight.store(false, Ordering::Release);
    }
}

impl QuoteForm {
    pub fn new(settings: QuoteFormSettings, transport: Arc<dyn DeliveryTransport>) -> Self {
        let (views, _) = watch::channel(FormView::default());
        Self {
            settings,
            transport,
            audit: Arc::new(TracingAuditSink),
            state: Mutex::new(FormState::default()),
            in_flight: AtomicBool::new(false),
            views,
        }
    }

    pub fn with_audit_sink(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    pub fn settings(&self) -> &QuoteFormSettings {
        &self.settings
    }

    pub fn transport_name(&self) -> &'static str {
        self.transport.name()
    }

    pub fn subscribe(&self) -> watch::Receiver<FormView> {
        self.views.subscribe()
    }

    pub fn view(&self) -> FormView {
        view::render(&self.lock())
    }

    pub fn mode(&self) -> UiMode {
        self.lock().mode
    }

    pub fn is_submitting(&self) -> bool {
        self.lock().submitting
    }

    pub fn staged(&self) -> Vec<Attachment> {
        self.lock().staged.as_slice().to_vec()
    }

    /// Stage newly selected files. Duplicates are skipped silently; oversized
    /// and unreadable files come back as rejections and never abort the batch.
    pub async fn add_files(&self, selected: Vec<SelectedFile>) -> IntakeReport {
        let policy = self.settings.intake;
        let screening = {
            let state = self.lock();
            state.staged.screen(selected, policy)
        };

        let mut report = IntakeReport {
            duplicates: screening.duplicates,
            rejections: screening.rejections,
            ..IntakeReport::default()
        };

        let mut loaded = Vec::with_capacity(screening.accepted.len());
        for file in screening.accepted {
            match file.read().await {
                Ok(attachment) if attachment.size_bytes > policy.max_attachment_bytes => {
                    report.rejections.push(IntakeRejection::Oversized {
                        name: attachment.name,
                        size_bytes: attachment.size_bytes,
                        limit_bytes: policy.max_attachment_bytes,
                    });
                }
                Ok(attachment) => loaded.push(attachment),
                Err(rejection) => report.rejections.push(rejection),
            }
        }

        self.update(|state| {
            for attachment in loaded {
                let name = attachment.name.clone();
                if state.staged.push(attachment) {
                    report.added.push(name);
                } else {
                    report.duplicates.push(name);
                }
            }
            state.error = report.banner();
        });

        info!(
            event_name = "intake.files_added",
            added = report.added.len(),
            duplicates = report.duplicates.len(),
            rejected = report.rejections.len(),
            "attachment intake processed"
        );
        if !report.rejections.is_empty() {
            let names: Vec<&str> = report.rejections.iter().map(|r| r.file_name()).collect();
            self.audit.emit(
                AuditEvent::new(
                    "intake",
                    "intake.files_rejected",
                    AuditCategory::Intake,
                    AuditOutcome::Rejected,
                )
                .with_metadata("files", names.join(", ")),
            );
        }

        report
    }

    /// Remove the staged attachment at `index` of the current render.
    pub fn remove_at(&self, index: usize) {
        self.update(|state| {
            if let Some(removed) = state.staged.remove_at(index) {
                debug!(
                    event_name = "intake.file_removed",
                    name = %removed.name,
                    index,
                    "attachment removed"
                );
            }
        });
    }

    pub async fn submit(&self, request: &QuoteRequest) -> DeliveryOutcome {
        let submission_id = Uuid::new_v4().to_string();

        if let Err(error) = request.validate() {
            let message = error.user_message();
            self.update(|state| state.error = Some(message.to_string()));
            let missing: Vec<&str> =
                request.missing_fields().into_iter().map(RequiredField::label).collect();
            info!(
                event_name = "submission.validation_failed",
                correlation_id = %submission_id,
                missing = %missing.join(", "),
                "quote request is missing required fields"
            );
            self.audit.emit(
                AuditEvent::new(
                    submission_id,
                    "submission.validation_failed",
                    AuditCategory::Validation,
                    AuditOutcome::Rejected,
                )
                .with_metadata("missing", missing.join(", ")),
            );
            return DeliveryOutcome::failure(message);
        }

        let Some(_guard) = self.begin_submission() else {
            warn!(
                event_name = "submission.rejected_in_flight",
                correlation_id = %submission_id,
                "submission ignored while another is in flight"
            );
            self.audit.emit(AuditEvent::new(
                submission_id,
                "submission.rejected_in_flight",
                AuditCategory::Delivery,
                AuditOutcome::Rejected,
            ));
            return DeliveryOutcome::failure(SUBMISSION_IN_FLIGHT_MESSAGE);
        };

        let attachments = self.update(|state| {
            state.error = None;
            state.submitting = true;
            state.staged.as_slice().to_vec()
        });

        let payload = QuotePayload::assemble(
            submission_id.clone(),
            request,
            &attachments,
            self.settings.recipient.clone(),
            self.settings.attachment_mode,
        );
        info!(
            event_name = "submission.started",
            correlation_id = %submission_id,
            transport = self.transport.name(),
            attachments = payload.attachments.len(),
            "delivering quote request"
        );

        match self.transport.send(&payload).await {
            Ok(()) => {
                let summary = SubmissionSummary::from_payload(&payload);
                self.update(|state| {
                    state.staged.remove_sent(&attachments);
                    state.error = None;
                    state.summary = Some(summary);
                    state.mode = UiMode::Submitted;
                });
                info!(
                    event_name = "submission.delivered",
                    correlation_id = %submission_id,
                    transport = self.transport.name(),
                    "quote request delivered"
                );
                self.audit.emit(
                    AuditEvent::new(
                        submission_id,
                        "submission.delivered",
                        AuditCategory::Delivery,
                        AuditOutcome::Success,
                    )
                    .with_metadata("transport", self.transport.name())
                    .with_metadata("attachments", payload.attachments.len().to_string()),
                );
                DeliveryOutcome::success(SUBMISSION_SENT_MESSAGE)
            }
            Err(error) => {
                let message = error.user_message();
                self.update(|state| state.error = Some(message.to_string()));
                warn!(
                    event_name = "submission.failed",
                    correlation_id = %submission_id,
                    transport = self.transport.name(),
                    error_class = error.class(),
                    error = %error,
                    "quote request delivery failed"
                );
                self.audit.emit(
                    AuditEvent::new(
                        submission_id,
                        "submission.failed",
                        AuditCategory::Delivery,
                        AuditOutcome::Failed,
                    )
                    .with_metadata("transport", self.transport.name())
                    .with_metadata("error", error.to_string()),
                );
                DeliveryOutcome::failure(message)
            }
        }
    }

    /// Back to an empty drafting form. Safe to call repeatedly.
    pub fn reset(&self) {
        self.update(|state| {
            state.staged.clear();
            state.error = None;
            state.summary = None;
            state.mode = UiMode::Drafting;
        });
    }

    fn begin_submission(&self) -> Option<InFlightGuard<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard { form: self })
    }

    fn lock(&self) -> MutexGuard<'_, FormState> {
        match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn update<R>(&self, change: impl FnOnce(&mut FormState) -> R) -> R {
        let (result, rendered) = {
            let mut state = self.lock();
            let result = change(&mut state);
            (result, view::render(&state))
        };
        self.views.send_replace(rendered);
        result
    }
}
