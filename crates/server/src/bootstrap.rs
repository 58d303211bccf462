use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{header::CONTENT_TYPE, HeaderValue, Method};
use axum::Router;
use clearaway_core::config::AppConfig;
use thiserror::Error;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::info;

use crate::health;
use crate::mail::{self, MailSettings, MailState};
use crate::relay::{build_relay, MailRelay, RelayError};

pub struct Application {
    pub config: AppConfig,
    pub relay: Arc<dyn MailRelay>,
    pub router: Router,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Relay(#[from] RelayError),
    #[error("email template failed to load: {0}")]
    Template(#[source] tera::Error),
    #[error("server.allowed_origin `{0}` is not a valid header value")]
    AllowedOrigin(String),
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting mail endpoint bootstrap"
    );

    let relay = build_relay(&config.mail)?;
    info!(
        event_name = "system.bootstrap.relay_ready",
        correlation_id = "bootstrap",
        relay = relay.name(),
        "mail relay configured"
    );

    let settings = MailSettings {
        from: config.mail.from.clone(),
        to: config.delivery.recipient.clone(),
        subject: config.mail.subject.clone(),
    };
    let state = MailState::new(relay.clone(), settings).map_err(BootstrapError::Template)?;

    let router = mail::router(state)
        .merge(health::router(relay.clone()))
        .layer(DefaultBodyLimit::max(config.server.max_body_bytes))
        .layer(cors_layer(&config.server.allowed_origin)?);

    Ok(Application { config, relay, router })
}

pub fn cors_layer(allowed_origin: &str) -> Result<CorsLayer, BootstrapError> {
    let origin = match allowed_origin.trim() {
        "*" => AllowOrigin::from(Any),
        exact => HeaderValue::from_str(exact)
            .map(AllowOrigin::exact)
            .map_err(|_| BootstrapError::AllowedOrigin(exact.to_string()))?,
    };

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::POST])
        .allow_headers([CONTENT_TYPE]))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use clearaway_core::config::{AppConfig, MailRelayKind};
    use tower::ServiceExt;

    use crate::bootstrap::{bootstrap_with_config, cors_layer, BootstrapError};

    #[test]
    fn smtp_relay_without_host_fails_fast() {
        let mut config = AppConfig::default();
        config.mail.relay = MailRelayKind::Smtp;

        let result = bootstrap_with_config(config);

        let error = result.err();
        assert!(matches!(error, Some(BootstrapError::Relay(_))));
        let message = error.map(|error| error.to_string()).unwrap_or_default();
        assert!(message.contains("mail.smtp_host"), "unexpected: {message}");
    }

    #[test]
    fn rejects_unusable_origin() {
        assert!(cors_layer("https://clear-away.co.uk").is_ok());
        assert!(cors_layer("bad\norigin").is_err());
    }

    #[tokio::test]
    async fn preflight_allows_configured_origin() {
        let mut config = AppConfig::default();
        config.server.allowed_origin = "https://clear-away.co.uk".to_string();
        let app = bootstrap_with_config(config).expect("bootstrap with defaults");

        let response = app
            .router
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/send-email")
                    .header("origin", "https://clear-away.co.uk")
                    .header("access-control-request-method", "POST")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get("access-control-allow-origin")
                .and_then(|value| value.to_str().ok()),
            Some("https://clear-away.co.uk")
        );
    }
}
