use thiserror::Error;

use crate::domain::quote::RequiredField;

pub const MISSING_FIELDS_MESSAGE: &str =
    "Please fill in all required fields (Name, Postcode, Contact, and Details).";
pub const DELIVERY_FAILED_MESSAGE: &str = "Failed to send email. Please try again.";
pub const SUBMISSION_IN_FLIGHT_MESSAGE: &str =
    "Your quote request is already being sent. Please wait.";

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("missing required fields: {}", field_list(fields))]
    MissingFields { fields: Vec<RequiredField> },
}

impl ValidationError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::MissingFields { .. } => MISSING_FIELDS_MESSAGE,
        }
    }
}

fn field_list(fields: &[RequiredField]) -> String {
    fields.iter().map(|field| field.label()).collect::<Vec<_>>().join(", ")
}

/// Whole MiB limits read `10MB`; anything else falls back to whole KB.
fn size_limit_label(limit_bytes: u64) -> String {
    const MIB: u64 = 1024 * 1024;
    if limit_bytes >= MIB && limit_bytes % MIB == 0 {
        format!("{}MB", limit_bytes / MIB)
    } else {
        format!("{}KB", limit_bytes / 1024)
    }
}

/// Per-file intake rejection. `Display` is the user-facing message.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum IntakeRejection {
    #[error("'{name}' is too large (max {}).", size_limit_label(*limit_bytes))]
    Oversized { name: String, size_bytes: u64, limit_bytes: u64 },
    #[error("Failed to read file: {name}")]
    Unreadable { name: String, reason: String },
}

impl IntakeRejection {
    pub fn file_name(&self) -> &str {
        match self {
            Self::Oversized { name, .. } | Self::Unreadable { name, .. } => name,
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("transport request failed: {0}")]
    Network(String),
    #[error("transport returned unexpected status {status}")]
    UnexpectedStatus { status: u16 },
    #[error("transport rejected the request: {0}")]
    Rejected(String),
    #[error("payload could not be encoded: {0}")]
    Payload(String),
    #[error("transport is misconfigured: {0}")]
    Configuration(String),
}

impl DeliveryError {
    pub fn user_message(&self) -> &'static str {
        DELIVERY_FAILED_MESSAGE
    }

    pub fn class(&self) -> &'static str {
        match self {
            Self::Network(_) => "network",
            Self::UnexpectedStatus { .. } => "status",
            Self::Rejected(_) => "rejected",
            Self::Payload(_) => "payload",
            Self::Configuration(_) => "configuration",
        }
    }
}
