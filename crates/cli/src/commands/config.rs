use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use clearaway_core::config::{AppConfig, LoadOptions};
use secrecy::{ExposeSecret, SecretString};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_keys: &[&str]| {
        field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(render_line(
        "delivery.transport",
        config.delivery.transport.as_str(),
        source("delivery.transport", &["CLEARAWAY_DELIVERY_TRANSPORT"]),
    ));
    lines.push(render_line(
        "delivery.recipient",
        &config.delivery.recipient,
        source("delivery.recipient", &["CLEARAWAY_DELIVERY_RECIPIENT"]),
    ));
    lines.push(render_line(
        "delivery.attachment_mode",
        &format!("{:?}", config.delivery.attachment_mode),
        source("delivery.attachment_mode", &["CLEARAWAY_DELIVERY_ATTACHMENT_MODE"]),
    ));

    lines.push(render_line(
        "email_api.endpoint",
        &config.email_api.endpoint,
        source("email_api.endpoint", &["CLEARAWAY_EMAIL_API_ENDPOINT"]),
    ));
    lines.push(render_line(
        "email_api.service_id",
        or_unset(&config.email_api.service_id),
        source("email_api.service_id", &["CLEARAWAY_EMAIL_API_SERVICE_ID"]),
    ));
    lines.push(render_line(
        "email_api.template_id",
        or_unset(&config.email_api.template_id),
        source("email_api.template_id", &["CLEARAWAY_EMAIL_API_TEMPLATE_ID"]),
    ));
    lines.push(render_line(
        "email_api.public_key",
        &redact_token(config.email_api.public_key.expose_secret()),
        source("email_api.public_key", &["CLEARAWAY_EMAIL_API_PUBLIC_KEY"]),
    ));
    lines.push(render_line(
        "email_api.private_key",
        redact_optional(config.email_api.private_key.as_ref()),
        source("email_api.private_key", &["CLEARAWAY_EMAIL_API_PRIVATE_KEY"]),
    ));

    lines.push(render_line(
        "form_relay.url",
        or_unset(&config.form_relay.url),
        source("form_relay.url", &["CLEARAWAY_FORM_RELAY_URL"]),
    ));
    lines.push(render_line(
        "form_relay.redirect_url",
        config.form_relay.redirect_url.as_deref().unwrap_or("<unset>"),
        source("form_relay.redirect_url", &["CLEARAWAY_FORM_RELAY_REDIRECT_URL"]),
    ));
    lines.push(render_line(
        "form_upload.url",
        or_unset(&config.form_upload.url),
        source("form_upload.url", &["CLEARAWAY_FORM_UPLOAD_URL"]),
    ));
    lines.push(render_line(
        "mail_endpoint.url",
        or_unset(&config.mail_endpoint.url),
        source("mail_endpoint.url", &["CLEARAWAY_MAIL_ENDPOINT_URL"]),
    ));
    lines.push(render_line(
        "intake.max_attachment_bytes",
        &config.intake.max_attachment_bytes.to_string(),
        source("intake.max_attachment_bytes", &["CLEARAWAY_INTAKE_MAX_ATTACHMENT_BYTES"]),
    ));

    lines.push(render_line(
        "mail.from",
        &config.mail.from,
        source("mail.from", &["CLEARAWAY_MAIL_FROM"]),
    ));
    lines.push(render_line(
        "mail.relay",
        &format!("{:?}", config.mail.relay),
        source("mail.relay", &["CLEARAWAY_MAIL_RELAY"]),
    ));
    lines.push(render_line(
        "mail.smtp_host",
        config.mail.smtp_host.as_deref().unwrap_or("<unset>"),
        source("mail.smtp_host", &["CLEARAWAY_MAIL_SMTP_HOST"]),
    ));
    lines.push(render_line(
        "mail.smtp_password",
        redact_optional(config.mail.smtp_password.as_ref()),
        source("mail.smtp_password", &["CLEARAWAY_MAIL_SMTP_PASSWORD"]),
    ));

    lines.push(render_line(
        "server.bind_address",
        &config.server.bind_address,
        source("server.bind_address", &["CLEARAWAY_SERVER_BIND_ADDRESS"]),
    ));
    lines.push(render_line(
        "server.port",
        &config.server.port.to_string(),
        source("server.port", &["CLEARAWAY_SERVER_PORT"]),
    ));
    lines.push(render_line(
        "server.allowed_origin",
        &config.server.allowed_origin,
        source("server.allowed_origin", &["CLEARAWAY_SERVER_ALLOWED_ORIGIN"]),
    ));

    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        source("logging.level", &["CLEARAWAY_LOGGING_LEVEL", "CLEARAWAY_LOG_LEVEL"]),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format),
        source("logging.format", &["CLEARAWAY_LOGGING_FORMAT", "CLEARAWAY_LOG_FORMAT"]),
    ));

    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("clearaway.toml"), PathBuf::from("config/clearaway.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn or_unset(value: &str) -> &str {
    if value.trim().is_empty() {
        "<unset>"
    } else {
        value
    }
}

fn redact_optional(secret: Option<&SecretString>) -> &'static str {
    if secret.is_some() {
        "<redacted>"
    } else {
        "<unset>"
    }
}

/// Keeps the first four characters of public keys so operators can tell them apart.
fn redact_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    match trimmed.char_indices().nth(4) {
        Some((cut, _)) => format!("{}***", &trimmed[..cut]),
        None => "<redacted>".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{contains_path, redact_token};

    #[test]
    fn redacts_all_but_key_prefix() {
        assert_eq!(redact_token("  "), "<empty>");
        assert_eq!(redact_token("abc"), "<redacted>");
        assert_eq!(redact_token("user_9f8e7d6c"), "user***");
    }

    #[test]
    fn finds_nested_toml_keys() {
        let doc: toml::Value = "[delivery]\ntransport = \"email_api\"\n".parse().expect("toml");
        assert!(contains_path(&doc, "delivery.transport"));
        assert!(!contains_path(&doc, "delivery.recipient"));
        assert!(!contains_path(&doc, "mail.from"));
    }
}
