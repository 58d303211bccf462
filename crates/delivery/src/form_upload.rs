use async_trait::async_trait;
use clearaway_core::config::FormUploadConfig;
use clearaway_core::errors::DeliveryError;
use clearaway_core::payload::QuotePayload;
use clearaway_core::transport::DeliveryTransport;
use reqwest::header::ACCEPT;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use tracing::debug;

use crate::{base_form, network_error, require_success};

/// Hosted form endpoint accepting file uploads. Attachment metadata is always
/// sent as text; the raw files follow as `attachment_N` parts in full mode.
pub struct FormUploadTransport {
    client: Client,
    url: String,
}

impl FormUploadTransport {
    pub fn new(client: Client, config: &FormUploadConfig) -> Self {
        Self { client, url: config.url.clone() }
    }

    fn form(payload: &QuotePayload) -> Result<Form, DeliveryError> {
        let mut form = base_form(payload);
        for attachment in &payload.attachments {
            let n = attachment.position;
            form = form
                .text(format!("image_{n}_name"), attachment.name.clone())
                .text(format!("image_{n}_size"), attachment.size_label());
        }
        form = form.text("images_summary", payload.images_summary());
        if let Some(details) = payload.image_details() {
            form = form.text("image_details", details);
        }

        for attachment in &payload.attachments {
            let Some(bytes) = attachment.bytes() else {
                continue;
            };
            let part = Part::bytes(bytes.to_vec())
                .file_name(attachment.name.clone())
                .mime_str(&attachment.mime_type)
                .map_err(|error| {
                    DeliveryError::Payload(format!("attachment `{}`: {error}", attachment.name))
                })?;
            form = form.part(format!("attachment_{}", attachment.position), part);
        }
        Ok(form)
    }
}

#[async_trait]
impl DeliveryTransport for FormUploadTransport {
    fn name(&self) -> &'static str {
        "form_upload"
    }

    async fn send(&self, payload: &QuotePayload) -> Result<(), DeliveryError> {
        let form = Self::form(payload)?;
        let response = self
            .client
            .post(&self.url)
            .header(ACCEPT, "application/json")
            .multipart(form)
            .send()
            .await
            .map_err(network_error)?;
        debug!(
            event_name = "delivery.form_upload.response",
            correlation_id = %payload.submission_id,
            status = response.status().as_u16(),
            "form upload responded"
        );
        require_success(&response)
    }
}
