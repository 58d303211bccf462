//! HTTP delivery transports for quote requests.
//!
//! Each transport makes one request per submission and maps the response to
//! `Ok(())` or a [`DeliveryError`]. Which one runs is decided by
//! `delivery.transport` in [`AppConfig`].

pub mod email_api;
pub mod form_relay;
pub mod form_upload;
pub mod mail_endpoint;

use std::sync::Arc;

use clearaway_core::config::{AppConfig, TransportKind};
use clearaway_core::errors::DeliveryError;
use clearaway_core::payload::QuotePayload;
use clearaway_core::transport::DeliveryTransport;
use reqwest::multipart::Form;
use reqwest::{Client, Response};
use tracing::debug;

pub use email_api::EmailApiTransport;
pub use form_relay::FormRelayTransport;
pub use form_upload::FormUploadTransport;
pub use mail_endpoint::MailEndpointTransport;

pub fn build_transport(config: &AppConfig) -> Result<Arc<dyn DeliveryTransport>, DeliveryError> {
    build_transport_with_client(config, Client::new())
}

pub fn build_transport_with_client(
    config: &AppConfig,
    client: Client,
) -> Result<Arc<dyn DeliveryTransport>, DeliveryError> {
    let url = config.transport_url();
    if url.trim().is_empty() {
        return Err(DeliveryError::Configuration(format!(
            "no url configured for transport `{}`",
            config.delivery.transport.as_str()
        )));
    }

    let transport: Arc<dyn DeliveryTransport> = match config.delivery.transport {
        TransportKind::EmailApi => Arc::new(EmailApiTransport::new(client, &config.email_api)),
        TransportKind::FormRelay => Arc::new(FormRelayTransport::new(client, &config.form_relay)),
        TransportKind::FormUpload => {
            Arc::new(FormUploadTransport::new(client, &config.form_upload))
        }
        TransportKind::MailEndpoint => {
            Arc::new(MailEndpointTransport::new(client, &config.mail_endpoint))
        }
    };
    debug!(
        event_name = "delivery.transport_selected",
        transport = transport.name(),
        url = %url,
        "delivery transport ready"
    );
    Ok(transport)
}

/// Text fields shared by the two multipart relays.
pub(crate) fn base_form(payload: &QuotePayload) -> Form {
    let request = &payload.request;
    Form::new()
        .text("name", request.name.clone())
        .text("postcode", request.postcode.clone())
        .text("contact", request.contact.clone())
        .text("details", request.details.clone())
        .text("_subject", payload.subject.clone())
        .text("_replyto", payload.reply_to.clone())
}

pub(crate) fn network_error(error: reqwest::Error) -> DeliveryError {
    DeliveryError::Network(error.to_string())
}

/// Accepts any 2xx status.
pub(crate) fn require_success(response: &Response) -> Result<(), DeliveryError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    Err(DeliveryError::UnexpectedStatus { status: status.as_u16() })
}

#[cfg(test)]
mod tests {
    use clearaway_core::config::{AppConfig, TransportKind};
    use clearaway_core::errors::DeliveryError;

    use super::build_transport;

    #[test]
    fn selects_transport_by_kind() {
        let mut config = AppConfig::default();
        config.form_relay.url = "https://relay.example/quotes".to_string();

        for (kind, expected) in [
            (TransportKind::MailEndpoint, "mail_endpoint"),
            (TransportKind::EmailApi, "email_api"),
            (TransportKind::FormRelay, "form_relay"),
        ] {
            config.delivery.transport = kind;
            let transport = build_transport(&config).map_err(|error| error.to_string());
            assert_eq!(transport.map(|transport| transport.name()), Ok(expected));
        }
    }

    #[test]
    fn missing_url_is_a_configuration_error() {
        let mut config = AppConfig::default();
        config.delivery.transport = TransportKind::FormUpload;

        let error = build_transport(&config).err();
        assert!(matches!(error, Some(DeliveryError::Configuration(_))));
    }
}
