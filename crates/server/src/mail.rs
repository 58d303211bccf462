//! `POST /send-email`: validates a quote request, renders it as HTML and hands
//! it to the configured mail relay.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use clearaway_core::domain::quote::QuoteRequest;
use clearaway_core::errors::DELIVERY_FAILED_MESSAGE;
use clearaway_delivery::mail_endpoint::{
    MailEndpointImage, MailEndpointRequest, MailEndpointResponse,
};
use lettre::message::header::ContentType;
use tera::{Context, Tera};
use tracing::{info, warn};

use crate::relay::{MailAttachment, MailRelay, QuoteEmail};

pub const SENT_MESSAGE: &str = "Quote request sent successfully!";
pub const MISSING_FIELDS_MESSAGE: &str = "Please fill in all required fields";
pub const INVALID_BODY_MESSAGE: &str = "Invalid request body";
pub const METHOD_NOT_ALLOWED_MESSAGE: &str = "Method not allowed";

const TEMPLATE_NAME: &str = "quote_email.html";

#[derive(Clone, Debug)]
pub struct MailSettings {
    pub from: String,
    pub to: String,
    pub subject: String,
}

#[derive(Clone)]
pub struct MailState {
    relay: Arc<dyn MailRelay>,
    templates: Arc<Tera>,
    settings: Arc<MailSettings>,
}

impl MailState {
    pub fn new(relay: Arc<dyn MailRelay>, settings: MailSettings) -> Result<Self, tera::Error> {
        Ok(Self { relay, templates: Arc::new(init_templates()?), settings: Arc::new(settings) })
    }
}

pub fn init_templates() -> Result<Tera, tera::Error> {
    let mut tera = Tera::default();
    tera.add_raw_template(TEMPLATE_NAME, include_str!("../templates/quote_email.html.tera"))?;
    Ok(tera)
}

pub fn router(state: MailState) -> Router {
    Router::new()
        .route("/send-email", post(send_email).fallback(method_not_allowed))
        .with_state(state)
}

type MailResponse = (StatusCode, Json<MailEndpointResponse>);

fn reply(status: StatusCode, success: bool, message: &str) -> MailResponse {
    (status, Json(MailEndpointResponse { success, message: message.to_string() }))
}

pub async fn method_not_allowed() -> MailResponse {
    reply(StatusCode::METHOD_NOT_ALLOWED, false, METHOD_NOT_ALLOWED_MESSAGE)
}

pub async fn send_email(
    State(state): State<MailState>,
    body: Result<Json<MailEndpointRequest>, JsonRejection>,
) -> MailResponse {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => {
            warn!(event_name = "mail.invalid_body", error = %rejection, "rejected malformed body");
            return reply(StatusCode::BAD_REQUEST, false, INVALID_BODY_MESSAGE);
        }
    };

    let request =
        QuoteRequest::new(&body.name, &body.postcode, &body.contact, &body.details).trimmed();
    if request.validate().is_err() {
        info!(
            event_name = "mail.validation_failed",
            missing = request.missing_fields().len(),
            "quote request missing required fields"
        );
        return reply(StatusCode::BAD_REQUEST, false, MISSING_FIELDS_MESSAGE);
    }

    let attachments = decode_images(&body.images);
    let html = match render_html(&state.templates, &request, body.images.len(), &attachments) {
        Ok(html) => html,
        Err(error) => {
            warn!(event_name = "mail.render_failed", error = %error, "email template failed");
            return reply(StatusCode::INTERNAL_SERVER_ERROR, false, DELIVERY_FAILED_MESSAGE);
        }
    };

    let email = QuoteEmail {
        from: state.settings.from.clone(),
        to: state.settings.to.clone(),
        subject: state.settings.subject.clone(),
        reply_to: Some(request.contact.clone()),
        html,
        attachments,
    };

    match state.relay.send(&email).await {
        Ok(()) => {
            info!(
                event_name = "mail.sent",
                relay = state.relay.name(),
                attachments = email.attachments.len(),
                "quote email relayed"
            );
            reply(StatusCode::OK, true, SENT_MESSAGE)
        }
        Err(error) => {
            warn!(
                event_name = "mail.relay_failed",
                relay = state.relay.name(),
                error = %error,
                "quote email relay failed"
            );
            reply(StatusCode::BAD_GATEWAY, false, DELIVERY_FAILED_MESSAGE)
        }
    }
}

/// Decode well-formed image records. Records missing a field, with an
/// unparseable mime type or with invalid base64 are skipped.
pub fn decode_images(images: &[MailEndpointImage]) -> Vec<MailAttachment> {
    images
        .iter()
        .enumerate()
        .filter_map(|(index, image)| {
            let (Some(encoded), Some(mime_type), Some(name)) =
                (&image.base64, &image.mime_type, &image.name)
            else {
                warn!(
                    event_name = "mail.image_skipped",
                    index,
                    reason = "incomplete",
                    "image skipped"
                );
                return None;
            };
            let Ok(content_type) = ContentType::parse(mime_type) else {
                warn!(
                    event_name = "mail.image_skipped",
                    index,
                    reason = "mime_type",
                    mime_type = %mime_type,
                    "image skipped"
                );
                return None;
            };
            match STANDARD.decode(encoded.trim()) {
                Ok(content) => Some(MailAttachment { name: name.clone(), content_type, content }),
                Err(error) => {
                    warn!(
                        event_name = "mail.image_skipped",
                        index,
                        reason = %error,
                        "image skipped"
                    );
                    None
                }
            }
        })
        .collect()
}

pub fn render_html(
    templates: &Tera,
    request: &QuoteRequest,
    image_count: usize,
    attachments: &[MailAttachment],
) -> Result<String, tera::Error> {
    let mut context = Context::new();
    context.insert("name", &request.name);
    context.insert("postcode", &request.postcode);
    context.insert("contact", &request.contact);
    context.insert("details", &request.details);
    context.insert("image_count", &image_count);
    let attached: Vec<&str> =
        attachments.iter().map(|attachment| attachment.name.as_str()).collect();
    context.insert("attached", &attached);
    templates.render(TEMPLATE_NAME, &context)
}
