use async_trait::async_trait;
use clearaway_core::config::FormRelayConfig;
use clearaway_core::errors::DeliveryError;
use clearaway_core::payload::QuotePayload;
use clearaway_core::transport::DeliveryTransport;
use reqwest::multipart::Form;
use reqwest::Client;
use tracing::debug;

use crate::{base_form, network_error, require_success};

/// Hosted form relay taking a multipart body of text fields. Images travel as
/// `data:` URIs, or as a size label in metadata-only mode.
pub struct FormRelayTransport {
    client: Client,
    url: String,
    redirect_url: Option<String>,
}

impl FormRelayTransport {
    pub fn new(client: Client, config: &FormRelayConfig) -> Self {
        Self { client, url: config.url.clone(), redirect_url: config.redirect_url.clone() }
    }

    fn form(&self, payload: &QuotePayload) -> Form {
        let mut form = base_form(payload);
        if let Some(redirect) = &self.redirect_url {
            form = form.text("_next", redirect.clone());
        }

        for attachment in &payload.attachments {
            let n = attachment.position;
            form = form.text(format!("image_{n}_name"), attachment.name.clone());
            form = match attachment.data_uri() {
                Some(uri) => form.text(format!("image_{n}_data"), uri),
                None => form.text(format!("image_{n}_size"), attachment.size_label()),
            };
        }
        form.text("images_summary", payload.images_summary())
    }
}

#[async_trait]
impl DeliveryTransport for FormRelayTransport {
    fn name(&self) -> &'static str {
        "form_relay"
    }

    async fn send(&self, payload: &QuotePayload) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(&self.url)
            .multipart(self.form(payload))
            .send()
            .await
            .map_err(network_error)?;
        debug!(
            event_name = "delivery.form_relay.response",
            correlation_id = %payload.submission_id,
            status = response.status().as_u16(),
            "form relay responded"
        );
        require_success(&response)
    }
}
