use std::fmt;

use serde::Serialize;

use super::FormState;
use crate::payload::QuotePayload;

pub const SUBMIT_LABEL: &str = "Get My Quote";
pub const SUBMITTING_LABEL: &str = "Sending...";
pub const UPLOAD_LABEL: &str = "Upload files";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UiMode {
    #[default]
    Drafting,
    Submitted,
}

/// What the customer sees after a successful submission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SubmissionSummary {
    pub name: String,
    pub postcode: String,
    pub contact: String,
    pub details: String,
    pub attachment_count: usize,
}

impl SubmissionSummary {
    pub fn from_payload(payload: &QuotePayload) -> Self {
        let request = &payload.request;
        Self {
            name: request.name.clone(),
            postcode: request.postcode.clone(),
            contact: request.contact.clone(),
            details: request.details.clone(),
            attachment_count: payload.attachments.len(),
        }
    }

    pub fn lines(&self) -> Vec<String> {
        let name = if self.name.is_empty() { "N/A" } else { self.name.as_str() };
        vec![
            "Your Submitted Details:".to_string(),
            format!("Name: {name}"),
            format!("Postcode: {}", self.postcode),
            format!("Contact: {}", self.contact),
            format!("Details: {}", self.details),
            format!("Images Uploaded: {}", self.attachment_count),
        ]
    }
}

impl fmt::Display for SubmissionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lines().join("\n"))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AttachmentRow {
    /// Position in the current render; pass back to `remove_at`.
    pub index: usize,
    pub name: String,
    pub size_label: String,
    pub remove_label: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SubmitControl {
    pub enabled: bool,
    pub label: &'static str,
}

/// Rendered form state. Rebuilt from scratch after every change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FormView {
    pub mode: UiMode,
    pub upload_label: String,
    pub attachments: Vec<AttachmentRow>,
    pub error: Option<String>,
    pub submit: SubmitControl,
    pub summary: Option<SubmissionSummary>,
}

impl FormView {
    pub fn shows_form(&self) -> bool {
        self.mode == UiMode::Drafting
    }

    pub fn shows_result(&self) -> bool {
        self.mode == UiMode::Submitted
    }
}

impl Default for FormView {
    fn default() -> Self {
        render(&FormState::default())
    }
}

pub fn upload_label(count: usize) -> String {
    match count {
        0 => UPLOAD_LABEL.to_string(),
        1 => "1 file selected".to_string(),
        n => format!("{n} files selected"),
    }
}

pub(crate) fn render(state: &FormState) -> FormView {
    let attachments = state
        .staged
        .iter()
        .enumerate()
        .map(|(index, attachment)| AttachmentRow {
            index,
            name: attachment.name.clone(),
            size_label: format!("{}KB", attachment.estimated_kb()),
            remove_label: format!("Remove {}", attachment.name),
        })
        .collect();

    FormView {
        mode: state.mode,
        upload_label: upload_label(state.staged.len()),
        attachments,
        error: state.error.clone(),
        submit: SubmitControl {
            enabled: !state.submitting,
            label: if state.submitting { SUBMITTING_LABEL } else { SUBMIT_LABEL },
        },
        summary: match state.mode {
            UiMode::Submitted => state.summary.clone(),
            UiMode::Drafting => None,
        },
    }
}
