use async_trait::async_trait;
use clearaway_core::config::EmailApiConfig;
use clearaway_core::errors::DeliveryError;
use clearaway_core::payload::QuotePayload;
use clearaway_core::transport::DeliveryTransport;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::network_error;

/// EmailJS REST send endpoint. Only an exact 200 counts as delivered.
pub struct EmailApiTransport {
    client: Client,
    endpoint: String,
    service_id: String,
    template_id: String,
    public_key: SecretString,
    private_key: Option<SecretString>,
}

#[derive(Serialize)]
struct SendRequest<'a> {
    service_id: &'a str,
    template_id: &'a str,
    user_id: &'a str,
    #[serde(rename = "accessToken", skip_serializing_if = "Option::is_none")]
    access_token: Option<&'a str>,
    template_params: Map<String, Value>,
}

impl EmailApiTransport {
    pub fn new(client: Client, config: &EmailApiConfig) -> Self {
        Self {
            client,
            endpoint: config.endpoint.clone(),
            service_id: config.service_id.clone(),
            template_id: config.template_id.clone(),
            public_key: config.public_key.clone(),
            private_key: config.private_key.clone(),
        }
    }
}

/// Template parameters the EmailJS template expects.
pub fn template_params(payload: &QuotePayload) -> Map<String, Value> {
    let request = &payload.request;
    let mut params = Map::new();
    params.insert("from_name".into(), request.name.clone().into());
    params.insert("from_postcode".into(), request.postcode.clone().into());
    params.insert("from_contact".into(), request.contact.clone().into());
    params.insert("from_details".into(), request.details.clone().into());
    params.insert("to_email".into(), payload.recipient.clone().into());
    params.insert("reply_to".into(), payload.reply_to.clone().into());
    params.insert("subject".into(), payload.subject.clone().into());
    params.insert("images_count".into(), payload.attachments.len().into());
    params.insert("images_summary".into(), payload.images_summary().into());

    for attachment in &payload.attachments {
        let n = attachment.position;
        params.insert(format!("image_{n}_name"), attachment.name.clone().into());
        params.insert(format!("image_{n}_size"), attachment.size_label().into());
        if let Some(encoded) = attachment.base64() {
            params.insert(format!("image_{n}_data"), encoded.into());
        }
    }
    params
}

#[async_trait]
impl DeliveryTransport for EmailApiTransport {
    fn name(&self) -> &'static str {
        "email_api"
    }

    async fn send(&self, payload: &QuotePayload) -> Result<(), DeliveryError> {
        let body = SendRequest {
            service_id: &self.service_id,
            template_id: &self.template_id,
            user_id: self.public_key.expose_secret(),
            access_token: self.private_key.as_ref().map(|key| key.expose_secret()),
            template_params: template_params(payload),
        };

        let response =
            self.client.post(&self.endpoint).json(&body).send().await.map_err(network_error)?;
        let status = response.status();
        debug!(
            event_name = "delivery.email_api.response",
            correlation_id = %payload.submission_id,
            status = status.as_u16(),
            "email api responded"
        );

        if status != StatusCode::OK {
            return Err(DeliveryError::UnexpectedStatus { status: status.as_u16() });
        }
        Ok(())
    }
}
