use async_trait::async_trait;
use clearaway_core::config::MailEndpointConfig;
use clearaway_core::errors::DeliveryError;
use clearaway_core::payload::QuotePayload;
use clearaway_core::transport::DeliveryTransport;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{network_error, require_success};

/// JSON body accepted by the self-hosted `/send-email` endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailEndpointRequest {
    pub name: String,
    pub postcode: String,
    pub contact: String,
    pub details: String,
    #[serde(default)]
    pub images: Vec<MailEndpointImage>,
}

/// Every field is optional on the wire; incomplete records are skipped when
/// the email is built.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailEndpointImage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base64: Option<String>,
    #[serde(default, rename = "mimeType", skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailEndpointResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
}

impl MailEndpointRequest {
    pub fn from_payload(payload: &QuotePayload) -> Self {
        let request = &payload.request;
        Self {
            name: request.name.clone(),
            postcode: request.postcode.clone(),
            contact: request.contact.clone(),
            details: request.details.clone(),
            images: payload
                .attachments
                .iter()
                .map(|attachment| MailEndpointImage {
                    base64: attachment.base64().map(str::to_owned),
                    mime_type: Some(attachment.mime_type.clone()),
                    name: Some(attachment.name.clone()),
                })
                .collect(),
        }
    }
}

pub struct MailEndpointTransport {
    client: Client,
    url: String,
}

impl MailEndpointTransport {
    pub fn new(client: Client, config: &MailEndpointConfig) -> Self {
        Self { client, url: config.url.clone() }
    }
}

#[async_trait]
impl DeliveryTransport for MailEndpointTransport {
    fn name(&self) -> &'static str {
        "mail_endpoint"
    }

    async fn send(&self, payload: &QuotePayload) -> Result<(), DeliveryError> {
        let body = MailEndpointRequest::from_payload(payload);
        let response =
            self.client.post(&self.url).json(&body).send().await.map_err(network_error)?;
        debug!(
            event_name = "delivery.mail_endpoint.response",
            correlation_id = %payload.submission_id,
            status = response.status().as_u16(),
            "mail endpoint responded"
        );
        require_success(&response)?;

        let reply: MailEndpointResponse = response.json().await.map_err(|error| {
            DeliveryError::Rejected(format!("unreadable mail endpoint response: {error}"))
        })?;
        if !reply.success {
            return Err(DeliveryError::Rejected(reply.message));
        }
        Ok(())
    }
}
