use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_MAX_ATTACHMENT_BYTES: u64 = 10 * 1024 * 1024;
pub const DEFAULT_EMAIL_API_ENDPOINT: &str = "https://api.emailjs.com/api/v1.0/email/send";

/// Every environment variable read by [`AppConfig::load`].
pub const ENV_KEYS: &[&str] = &[
    "CLEARAWAY_DELIVERY_TRANSPORT",
    "CLEARAWAY_DELIVERY_RECIPIENT",
    "CLEARAWAY_DELIVERY_ATTACHMENT_MODE",
    "CLEARAWAY_EMAIL_API_ENDPOINT",
    "CLEARAWAY_EMAIL_API_SERVICE_ID",
    "CLEARAWAY_EMAIL_API_TEMPLATE_ID",
    "CLEARAWAY_EMAIL_API_PUBLIC_KEY",
    "CLEARAWAY_EMAIL_API_PRIVATE_KEY",
    "CLEARAWAY_FORM_RELAY_URL",
    "CLEARAWAY_FORM_RELAY_REDIRECT_URL",
    "CLEARAWAY_FORM_UPLOAD_URL",
    "CLEARAWAY_MAIL_ENDPOINT_URL",
    "CLEARAWAY_INTAKE_MAX_ATTACHMENT_BYTES",
    "CLEARAWAY_MAIL_FROM",
    "CLEARAWAY_MAIL_SUBJECT",
    "CLEARAWAY_MAIL_RELAY",
    "CLEARAWAY_MAIL_SENDMAIL_COMMAND",
    "CLEARAWAY_MAIL_SMTP_HOST",
    "CLEARAWAY_MAIL_SMTP_PORT",
    "CLEARAWAY_MAIL_SMTP_USERNAME",
    "CLEARAWAY_MAIL_SMTP_PASSWORD",
    "CLEARAWAY_SERVER_BIND_ADDRESS",
    "CLEARAWAY_SERVER_PORT",
    "CLEARAWAY_SERVER_MAX_BODY_BYTES",
    "CLEARAWAY_SERVER_ALLOWED_ORIGIN",
    "CLEARAWAY_SERVER_GRACEFUL_SHUTDOWN_SECS",
    "CLEARAWAY_LOGGING_LEVEL",
    "CLEARAWAY_LOGGING_FORMAT",
    "CLEARAWAY_LOG_LEVEL",
    "CLEARAWAY_LOG_FORMAT",
];

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub delivery: DeliveryConfig,
    pub email_api: EmailApiConfig,
    pub form_relay: FormRelayConfig,
    pub form_upload: FormUploadConfig,
    pub mail_endpoint: MailEndpointConfig,
    pub intake: IntakeConfig,
    pub mail: MailConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DeliveryConfig {
    pub transport: TransportKind,
    pub recipient: String,
    pub attachment_mode: AttachmentMode,
}

#[derive(Clone, Debug)]
pub struct EmailApiConfig {
    pub endpoint: String,
    pub service_id: String,
    pub template_id: String,
    pub public_key: SecretString,
    pub private_key: Option<SecretString>,
}

#[derive(Clone, Debug)]
pub struct FormRelayConfig {
    pub url: String,
    pub redirect_url: Option<String>,
}

#[derive(Clone, Debug)]
pub struct FormUploadConfig {
    pub url: String,
}

#[derive(Clone, Debug)]
pub struct MailEndpointConfig {
    pub url: String,
}

#[derive(Clone, Debug)]
pub struct IntakeConfig {
    pub max_attachment_bytes: u64,
}

#[derive(Clone, Debug)]
pub struct MailConfig {
    pub from: String,
    pub subject: String,
    pub relay: MailRelayKind,
    pub sendmail_command: Option<String>,
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<SecretString>,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub max_body_bytes: usize,
    pub allowed_origin: String,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    EmailApi,
    FormRelay,
    FormUpload,
    MailEndpoint,
}

impl TransportKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EmailApi => "email_api",
            Self::FormRelay => "form_relay",
            Self::FormUpload => "form_upload",
            Self::MailEndpoint => "mail_endpoint",
        }
    }
}

/// Whether transports receive attachment content or only metadata.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentMode {
    Full,
    MetadataOnly,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MailRelayKind {
    Sendmail,
    Smtp,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub transport: Option<TransportKind>,
    pub recipient: Option<String>,
    pub attachment_mode: Option<AttachmentMode>,
    pub email_api_endpoint: Option<String>,
    pub form_relay_url: Option<String>,
    pub form_upload_url: Option<String>,
    pub mail_endpoint_url: Option<String>,
    pub max_attachment_bytes: Option<u64>,
    pub server_port: Option<u16>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            delivery: DeliveryConfig {
                transport: TransportKind::MailEndpoint,
                recipient: "quotes@clear-away.co.uk".to_string(),
                attachment_mode: AttachmentMode::Full,
            },
            email_api: EmailApiConfig {
                endpoint: DEFAULT_EMAIL_API_ENDPOINT.to_string(),
                service_id: String::new(),
                template_id: String::new(),
                public_key: String::new().into(),
                private_key: None,
            },
            form_relay: FormRelayConfig { url: String::new(), redirect_url: None },
            form_upload: FormUploadConfig { url: String::new() },
            mail_endpoint: MailEndpointConfig {
                url: "http://127.0.0.1:8080/send-email".to_string(),
            },
            intake: IntakeConfig { max_attachment_bytes: DEFAULT_MAX_ATTACHMENT_BYTES },
            mail: MailConfig {
                from: "noreply@clear-away.co.uk".to_string(),
                subject: "New Waste Removal Quote Request - ClearAway UK".to_string(),
                relay: MailRelayKind::Sendmail,
                sendmail_command: None,
                smtp_host: None,
                smtp_port: 587,
                smtp_username: None,
                smtp_password: None,
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8080,
                max_body_bytes: 64 * 1024 * 1024,
                allowed_origin: "*".to_string(),
                graceful_shutdown_secs: 15,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

fn normalized(value: &str) -> String {
    value.trim().to_ascii_lowercase().replace('-', "_")
}

impl std::str::FromStr for TransportKind {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match normalized(value).as_str() {
            "email_api" | "emailjs" => Ok(Self::EmailApi),
            "form_relay" | "formsubmit" => Ok(Self::FormRelay),
            "form_upload" | "formspree" => Ok(Self::FormUpload),
            "mail_endpoint" => Ok(Self::MailEndpoint),
            other => Err(ConfigError::Validation(format!(
                "unsupported delivery transport `{other}` (expected email_api|form_relay|form_upload|mail_endpoint)"
            ))),
        }
    }
}

impl std::str::FromStr for AttachmentMode {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match normalized(value).as_str() {
            "full" => Ok(Self::Full),
            "metadata_only" | "metadata" => Ok(Self::MetadataOnly),
            other => Err(ConfigError::Validation(format!(
                "unsupported attachment mode `{other}` (expected full|metadata_only)"
            ))),
        }
    }
}

impl std::str::FromStr for MailRelayKind {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match normalized(value).as_str() {
            "sendmail" => Ok(Self::Sendmail),
            "smtp" => Ok(Self::Smtp),
            other => Err(ConfigError::Validation(format!(
                "unsupported mail relay `{other}` (expected sendmail|smtp)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("clearaway.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    /// URL the selected transport posts to.
    pub fn transport_url(&self) -> &str {
        match self.delivery.transport {
            TransportKind::EmailApi => &self.email_api.endpoint,
            TransportKind::FormRelay => &self.form_relay.url,
            TransportKind::FormUpload => &self.form_upload.url,
            TransportKind::MailEndpoint => &self.mail_endpoint.url,
        }
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(delivery) = patch.delivery {
            if let Some(transport) = delivery.transport {
                self.delivery.transport = transport;
            }
            if let Some(recipient) = delivery.recipient {
                self.delivery.recipient = recipient;
            }
            if let Some(attachment_mode) = delivery.attachment_mode {
                self.delivery.attachment_mode = attachment_mode;
            }
        }

        if let Some(email_api) = patch.email_api {
            if let Some(endpoint) = email_api.endpoint {
                self.email_api.endpoint = endpoint;
            }
            if let Some(service_id) = email_api.service_id {
                self.email_api.service_id = service_id;
            }
            if let Some(template_id) = email_api.template_id {
                self.email_api.template_id = template_id;
            }
            if let Some(public_key) = email_api.public_key {
                self.email_api.public_key = secret_value(public_key);
            }
            if let Some(private_key) = email_api.private_key {
                self.email_api.private_key = Some(secret_value(private_key));
            }
        }

        if let Some(form_relay) = patch.form_relay {
            if let Some(url) = form_relay.url {
                self.form_relay.url = url;
            }
            if let Some(redirect_url) = form_relay.redirect_url {
                self.form_relay.redirect_url = Some(redirect_url);
            }
        }

        if let Some(url) = patch.form_upload.and_then(|form_upload| form_upload.url) {
            self.form_upload.url = url;
        }

        if let Some(url) = patch.mail_endpoint.and_then(|mail_endpoint| mail_endpoint.url) {
            self.mail_endpoint.url = url;
        }

        if let Some(max) = patch.intake.and_then(|intake| intake.max_attachment_bytes) {
            self.intake.max_attachment_bytes = max;
        }

        if let Some(mail) = patch.mail {
            if let Some(from) = mail.from {
                self.mail.from = from;
            }
            if let Some(subject) = mail.subject {
                self.mail.subject = subject;
            }
            if let Some(relay) = mail.relay {
                self.mail.relay = relay;
            }
            if let Some(sendmail_command) = mail.sendmail_command {
                self.mail.sendmail_command = Some(sendmail_command);
            }
            if let Some(smtp_host) = mail.smtp_host {
                self.mail.smtp_host = Some(smtp_host);
            }
            if let Some(smtp_port) = mail.smtp_port {
                self.mail.smtp_port = smtp_port;
            }
            if let Some(smtp_username) = mail.smtp_username {
                self.mail.smtp_username = Some(smtp_username);
            }
            if let Some(smtp_password) = mail.smtp_password {
                self.mail.smtp_password = Some(secret_value(smtp_password));
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(max_body_bytes) = server.max_body_bytes {
                self.server.max_body_bytes = max_body_bytes;
            }
            if let Some(allowed_origin) = server.allowed_origin {
                self.server.allowed_origin = allowed_origin;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("CLEARAWAY_DELIVERY_TRANSPORT") {
            self.delivery.transport = value.parse()?;
        }
        if let Some(value) = read_env("CLEARAWAY_DELIVERY_RECIPIENT") {
            self.delivery.recipient = value;
        }
        if let Some(value) = read_env("CLEARAWAY_DELIVERY_ATTACHMENT_MODE") {
            self.delivery.attachment_mode = value.parse()?;
        }

        if let Some(value) = read_env("CLEARAWAY_EMAIL_API_ENDPOINT") {
            self.email_api.endpoint = value;
        }
        if let Some(value) = read_env("CLEARAWAY_EMAIL_API_SERVICE_ID") {
            self.email_api.service_id = value;
        }
        if let Some(value) = read_env("CLEARAWAY_EMAIL_API_TEMPLATE_ID") {
            self.email_api.template_id = value;
        }
        if let Some(value) = read_env("CLEARAWAY_EMAIL_API_PUBLIC_KEY") {
            self.email_api.public_key = secret_value(value);
        }
        if let Some(value) = read_env("CLEARAWAY_EMAIL_API_PRIVATE_KEY") {
            self.email_api.private_key = Some(secret_value(value));
        }

        if let Some(value) = read_env("CLEARAWAY_FORM_RELAY_URL") {
            self.form_relay.url = value;
        }
        if let Some(value) = read_env("CLEARAWAY_FORM_RELAY_REDIRECT_URL") {
            self.form_relay.redirect_url = Some(value);
        }
        if let Some(value) = read_env("CLEARAWAY_FORM_UPLOAD_URL") {
            self.form_upload.url = value;
        }
        if let Some(value) = read_env("CLEARAWAY_MAIL_ENDPOINT_URL") {
            self.mail_endpoint.url = value;
        }

        if let Some(value) = read_env("CLEARAWAY_INTAKE_MAX_ATTACHMENT_BYTES") {
            self.intake.max_attachment_bytes =
                parse_u64("CLEARAWAY_INTAKE_MAX_ATTACHMENT_BYTES", &value)?;
        }

        if let Some(value) = read_env("CLEARAWAY_MAIL_FROM") {
            self.mail.from = value;
        }
        if let Some(value) = read_env("CLEARAWAY_MAIL_SUBJECT") {
            self.mail.subject = value;
        }
        if let Some(value) = read_env("CLEARAWAY_MAIL_RELAY") {
            self.mail.relay = value.parse()?;
        }
        if let Some(value) = read_env("CLEARAWAY_MAIL_SENDMAIL_COMMAND") {
            self.mail.sendmail_command = Some(value);
        }
        if let Some(value) = read_env("CLEARAWAY_MAIL_SMTP_HOST") {
            self.mail.smtp_host = Some(value);
        }
        if let Some(value) = read_env("CLEARAWAY_MAIL_SMTP_PORT") {
            self.mail.smtp_port = parse_u16("CLEARAWAY_MAIL_SMTP_PORT", &value)?;
        }
        if let Some(value) = read_env("CLEARAWAY_MAIL_SMTP_USERNAME") {
            self.mail.smtp_username = Some(value);
        }
        if let Some(value) = read_env("CLEARAWAY_MAIL_SMTP_PASSWORD") {
            self.mail.smtp_password = Some(secret_value(value));
        }

        if let Some(value) = read_env("CLEARAWAY_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("CLEARAWAY_SERVER_PORT") {
            self.server.port = parse_u16("CLEARAWAY_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("CLEARAWAY_SERVER_MAX_BODY_BYTES") {
            self.server.max_body_bytes = parse_usize("CLEARAWAY_SERVER_MAX_BODY_BYTES", &value)?;
        }
        if let Some(value) = read_env("CLEARAWAY_SERVER_ALLOWED_ORIGIN") {
            self.server.allowed_origin = value;
        }
        if let Some(value) = read_env("CLEARAWAY_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("CLEARAWAY_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        let log_level =
            read_env("CLEARAWAY_LOGGING_LEVEL").or_else(|| read_env("CLEARAWAY_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("CLEARAWAY_LOGGING_FORMAT").or_else(|| read_env("CLEARAWAY_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(transport) = overrides.transport {
            self.delivery.transport = transport;
        }
        if let Some(recipient) = overrides.recipient {
            self.delivery.recipient = recipient;
        }
        if let Some(attachment_mode) = overrides.attachment_mode {
            self.delivery.attachment_mode = attachment_mode;
        }
        if let Some(endpoint) = overrides.email_api_endpoint {
            self.email_api.endpoint = endpoint;
        }
        if let Some(url) = overrides.form_relay_url {
            self.form_relay.url = url;
        }
        if let Some(url) = overrides.form_upload_url {
            self.form_upload.url = url;
        }
        if let Some(url) = overrides.mail_endpoint_url {
            self.mail_endpoint.url = url;
        }
        if let Some(max) = overrides.max_attachment_bytes {
            self.intake.max_attachment_bytes = max;
        }
        if let Some(port) = overrides.server_port {
            self.server.port = port;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_delivery(self)?;
        validate_intake(&self.intake)?;
        validate_mail(&self.mail)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("clearaway.toml"), PathBuf::from("config/clearaway.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_delivery(config: &AppConfig) -> Result<(), ConfigError> {
    let recipient = config.delivery.recipient.trim();
    if recipient.is_empty() || !recipient.contains('@') {
        return Err(ConfigError::Validation(
            "delivery.recipient must be an email address".to_string(),
        ));
    }

    let (key, url) = match config.delivery.transport {
        TransportKind::EmailApi => ("email_api.endpoint", config.email_api.endpoint.as_str()),
        TransportKind::FormRelay => ("form_relay.url", config.form_relay.url.as_str()),
        TransportKind::FormUpload => ("form_upload.url", config.form_upload.url.as_str()),
        TransportKind::MailEndpoint => ("mail_endpoint.url", config.mail_endpoint.url.as_str()),
    };
    validate_http_url(key, url, config.delivery.transport)?;

    if config.delivery.transport == TransportKind::EmailApi {
        if config.email_api.service_id.trim().is_empty() {
            return Err(ConfigError::Validation(
                "email_api.service_id is required for the email_api transport".to_string(),
            ));
        }
        if config.email_api.template_id.trim().is_empty() {
            return Err(ConfigError::Validation(
                "email_api.template_id is required for the email_api transport".to_string(),
            ));
        }
        if config.email_api.public_key.expose_secret().trim().is_empty() {
            return Err(ConfigError::Validation(
                "email_api.public_key is required for the email_api transport".to_string(),
            ));
        }
    }

    if let Some(redirect_url) = &config.form_relay.redirect_url {
        if !is_http_url(redirect_url) {
            return Err(ConfigError::Validation(
                "form_relay.redirect_url must start with http:// or https://".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_http_url(key: &str, url: &str, transport: TransportKind) -> Result<(), ConfigError> {
    if url.trim().is_empty() {
        return Err(ConfigError::Validation(format!(
            "{key} is required for the {} transport",
            transport.as_str()
        )));
    }
    if !is_http_url(url) {
        return Err(ConfigError::Validation(format!(
            "{key} must start with http:// or https://"
        )));
    }
    Ok(())
}

fn is_http_url(url: &str) -> bool {
    let url = url.trim();
    url.starts_with("http://") || url.starts_with("https://")
}

fn validate_intake(intake: &IntakeConfig) -> Result<(), ConfigError> {
    if intake.max_attachment_bytes == 0 {
        return Err(ConfigError::Validation(
            "intake.max_attachment_bytes must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

fn validate_mail(mail: &MailConfig) -> Result<(), ConfigError> {
    if !mail.from.contains('@') {
        return Err(ConfigError::Validation("mail.from must be an email address".to_string()));
    }

    if mail.relay == MailRelayKind::Smtp {
        let missing = mail.smtp_host.as_ref().map(|host| host.trim().is_empty()).unwrap_or(true);
        if missing {
            return Err(ConfigError::Validation(
                "mail.smtp_host is required for the smtp relay".to_string(),
            ));
        }
        if mail.smtp_port == 0 {
            return Err(ConfigError::Validation(
                "mail.smtp_port must be greater than zero".to_string(),
            ));
        }
        if mail.smtp_username.is_some() != mail.smtp_password.is_some() {
            return Err(ConfigError::Validation(
                "mail.smtp_username and mail.smtp_password must be set together".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.max_body_bytes == 0 {
        return Err(ConfigError::Validation(
            "server.max_body_bytes must be greater than zero".to_string(),
        ));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.parse::<usize>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    delivery: Option<DeliveryPatch>,
    email_api: Option<EmailApiPatch>,
    form_relay: Option<FormRelayPatch>,
    form_upload: Option<UrlPatch>,
    mail_endpoint: Option<UrlPatch>,
    intake: Option<IntakePatch>,
    mail: Option<MailPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DeliveryPatch {
    transport: Option<TransportKind>,
    recipient: Option<String>,
    attachment_mode: Option<AttachmentMode>,
}

#[derive(Debug, Default, Deserialize)]
struct EmailApiPatch {
    endpoint: Option<String>,
    service_id: Option<String>,
    template_id: Option<String>,
    public_key: Option<String>,
    private_key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct FormRelayPatch {
    url: Option<String>,
    redirect_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct UrlPatch {
    url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct IntakePatch {
    max_attachment_bytes: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct MailPatch {
    from: Option<String>,
    subject: Option<String>,
    relay: Option<MailRelayKind>,
    sendmail_command: Option<String>,
    smtp_host: Option<String>,
    smtp_port: Option<u16>,
    smtp_username: Option<String>,
    smtp_password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    max_body_bytes: Option<usize>,
    allowed_origin: Option<String>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
