use clearaway_core::config::{AppConfig, AttachmentMode};
use clearaway_core::errors::DeliveryError;
use clearaway_core::{Attachment, DeliveryTransport, QuotePayload, QuoteRequest};
use clearaway_delivery::mail_endpoint::MailEndpointRequest;
use clearaway_delivery::{
    EmailApiTransport, FormRelayTransport, FormUploadTransport, MailEndpointTransport,
};
use reqwest::Client;
use serde_json::json;
use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn payload(mode: AttachmentMode) -> QuotePayload {
    let request = QuoteRequest::new("A Smith", "SW1A 1AA", "a@x.com", "Old sofa, 2 chairs");
    let photos = vec![Attachment::new("sofa.jpg", "image/jpeg", vec![0xFF, 0xD8, 0xFF])];
    QuotePayload::assemble("sub-1", &request, &photos, "quotes@clear-away.co.uk", mode)
}

fn empty_payload() -> QuotePayload {
    let request = QuoteRequest::new("A Smith", "SW1A 1AA", "a@x.com", "Old sofa, 2 chairs");
    QuotePayload::assemble("sub-2", &request, &[], "quotes@clear-away.co.uk", AttachmentMode::Full)
}

fn config_for(server: &MockServer) -> AppConfig {
    let mut config = AppConfig::default();
    config.email_api.endpoint = format!("{}/api/v1.0/email/send", server.uri());
    config.email_api.service_id = "service_1".to_string();
    config.email_api.template_id = "template_1".to_string();
    config.email_api.public_key = "public-key".to_string().into();
    config.form_relay.url = format!("{}/relay", server.uri());
    config.form_relay.redirect_url = Some("https://clear-away.co.uk/thanks".to_string());
    config.form_upload.url = format!("{}/upload", server.uri());
    config.mail_endpoint.url = format!("{}/send-email", server.uri());
    config
}

#[tokio::test]
async fn email_api_posts_template_params() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1.0/email/send"))
        .and(body_partial_json(json!({
            "service_id": "service_1",
            "template_id": "template_1",
            "user_id": "public-key",
            "template_params": {
                "from_name": "A Smith",
                "to_email": "quotes@clear-away.co.uk",
                "reply_to": "a@x.com",
                "subject": "New Waste Removal Quote Request - A Smith (SW1A 1AA)",
                "images_count": 1,
                "images_summary": "Images uploaded: sofa.jpg",
                "image_1_name": "sofa.jpg",
                "image_1_data": "/9j/"
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
        .expect(1)
        .mount(&server)
        .await;

    let transport = EmailApiTransport::new(Client::new(), &config_for(&server).email_api);
    let result = transport.send(&payload(AttachmentMode::Full)).await;

    assert_eq!(result, Ok(()));
}

#[tokio::test]
async fn email_api_treats_other_2xx_as_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(202))
        .mount(&server)
        .await;

    let transport = EmailApiTransport::new(Client::new(), &config_for(&server).email_api);
    let result = transport.send(&empty_payload()).await;

    assert_eq!(result, Err(DeliveryError::UnexpectedStatus { status: 202 }));
}

#[tokio::test]
async fn form_relay_sends_data_uri_and_redirect() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/relay"))
        .and(body_string_contains("name=\"_next\""))
        .and(body_string_contains("https://clear-away.co.uk/thanks"))
        .and(body_string_contains("name=\"image_1_data\""))
        .and(body_string_contains("data:image/jpeg;base64,/9j/"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let transport = FormRelayTransport::new(Client::new(), &config_for(&server).form_relay);
    let result = transport.send(&payload(AttachmentMode::Full)).await;

    assert_eq!(result, Ok(()));
}

#[tokio::test]
async fn form_relay_metadata_mode_sends_size_only() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/relay"))
        .and(body_string_contains("name=\"image_1_size\""))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let transport = FormRelayTransport::new(Client::new(), &config_for(&server).form_relay);
    let result = transport.send(&payload(AttachmentMode::MetadataOnly)).await;

    assert_eq!(result, Ok(()));
}

#[tokio::test]
async fn form_relay_maps_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let transport = FormRelayTransport::new(Client::new(), &config_for(&server).form_relay);
    let result = transport.send(&empty_payload()).await;

    assert_eq!(result, Err(DeliveryError::UnexpectedStatus { status: 500 }));
}

#[tokio::test]
async fn form_upload_attaches_files_and_details() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .and(header("accept", "application/json"))
        .and(body_string_contains("name=\"image_details\""))
        .and(body_string_contains("=== UPLOADED IMAGES ==="))
        .and(body_string_contains("name=\"attachment_1\"; filename=\"sofa.jpg\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&server)
        .await;

    let transport = FormUploadTransport::new(Client::new(), &config_for(&server).form_upload);
    let result = transport.send(&payload(AttachmentMode::Full)).await;

    assert_eq!(result, Ok(()));
}

#[tokio::test]
async fn mail_endpoint_requires_success_flag() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/send-email"))
        .and(body_partial_json(json!({
            "name": "A Smith",
            "images": [{ "mimeType": "image/jpeg", "name": "sofa.jpg", "base64": "/9j/" }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "Failed to send email. Please try again."
        })))
        .mount(&server)
        .await;

    let transport = MailEndpointTransport::new(Client::new(), &config_for(&server).mail_endpoint);
    let result = transport.send(&payload(AttachmentMode::Full)).await;

    assert!(matches!(result, Err(DeliveryError::Rejected(_))));
}

#[tokio::test]
async fn mail_endpoint_delivers_on_success_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/send-email"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "Quote request sent successfully!"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let transport = MailEndpointTransport::new(Client::new(), &config_for(&server).mail_endpoint);
    let result = transport.send(&empty_payload()).await;

    assert_eq!(result, Ok(()));
}

#[tokio::test]
async fn unreachable_endpoint_is_a_network_error() {
    let mut config = AppConfig::default();
    config.mail_endpoint.url = "http://127.0.0.1:1/send-email".to_string();

    let transport = MailEndpointTransport::new(Client::new(), &config.mail_endpoint);
    let result = transport.send(&empty_payload()).await;

    assert!(matches!(result, Err(DeliveryError::Network(_))));
}

#[test]
fn metadata_mode_request_omits_image_content() {
    let request = MailEndpointRequest::from_payload(&payload(AttachmentMode::MetadataOnly));
    let encoded = serde_json::to_value(&request).map_err(|error| error.to_string());

    assert_eq!(
        encoded,
        Ok(json!({
            "name": "A Smith",
            "postcode": "SW1A 1AA",
            "contact": "a@x.com",
            "details": "Old sofa, 2 chairs",
            "images": [{ "mimeType": "image/jpeg", "name": "sofa.jpg" }]
        }))
    );
}
