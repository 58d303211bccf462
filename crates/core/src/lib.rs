pub mod audit;
pub mod config;
pub mod domain;
pub mod errors;
pub mod form;
pub mod intake;
pub mod mailto;
pub mod payload;
pub mod site;
pub mod transport;

pub use audit::{AuditCategory, AuditEvent, AuditOutcome, AuditSink, InMemoryAuditSink};
pub use config::{
    AppConfig, AttachmentMode, ConfigError, ConfigOverrides, LoadOptions, TransportKind,
};
pub use domain::attachment::Attachment;
pub use domain::quote::{QuoteRequest, RequiredField};
pub use errors::{DeliveryError, IntakeRejection, ValidationError};
pub use form::{DeliveryOutcome, FormView, QuoteForm, QuoteFormSettings, SubmissionSummary, UiMode};
pub use intake::{IntakePolicy, IntakeReport, SelectedFile, StagedAttachmentSet};
pub use mailto::compose_mailto;
pub use payload::{PayloadAttachment, QuotePayload};
pub use site::{MobileMenu, Page, ServiceAreaDirectory, SiteNavigator};
pub use transport::DeliveryTransport;
