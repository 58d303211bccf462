use std::path::PathBuf;

use clearaway_core::config::{
    AppConfig, AttachmentMode, ConfigOverrides, LoadOptions, TransportKind,
};
use clearaway_core::errors::IntakeRejection;
use clearaway_core::intake::SelectedFile;
use clearaway_core::{QuoteForm, QuoteFormSettings, QuoteRequest};
use clearaway_delivery::build_transport;
use serde_json::json;

use crate::commands::{init_logging, CommandResult};
use crate::QuoteArgs;

const COMMAND: &str = "submit";

pub fn run(
    quote: &QuoteArgs,
    transport: Option<&str>,
    attachment_mode: Option<&str>,
) -> CommandResult {
    let overrides = match parse_overrides(transport, attachment_mode) {
        Ok(overrides) => overrides,
        Err(message) => return CommandResult::failure(COMMAND, "config", message, 2),
    };

    let config = match AppConfig::load(LoadOptions { overrides, ..LoadOptions::default() }) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "config",
                format!("config validation failed: {error}"),
                2,
            )
        }
    };
    init_logging(&config);

    let request = QuoteRequest::new(
        quote.name.as_str(),
        quote.postcode.as_str(),
        quote.contact.as_str(),
        quote.details.as_str(),
    );
    if let Err(error) = request.validate() {
        return CommandResult::failure_with(
            COMMAND,
            "validation",
            error.user_message(),
            3,
            Some(json!({ "missing": request.missing_fields() })),
        );
    }

    let transport = match build_transport(&config) {
        Ok(transport) => transport,
        Err(error) => return CommandResult::failure(COMMAND, error.class(), error.to_string(), 2),
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "runtime",
                format!("failed to start async runtime: {error}"),
                1,
            )
        }
    };

    let form = QuoteForm::new(QuoteFormSettings::from_config(&config), transport);
    runtime.block_on(async {
        let (selected, mut rejections) = select_files(&quote.files).await;
        let report = form.add_files(selected).await;
        rejections.extend(report.rejections.iter().cloned());

        let outcome = form.submit(&request).await;
        let view = form.view();
        let details = json!({
            "transport": form.transport_name(),
            "attached": report.added,
            "duplicates": report.duplicates,
            "rejected": rejections.iter().map(ToString::to_string).collect::<Vec<_>>(),
            "summary": view.summary,
        });

        if outcome.success {
            CommandResult::success_with(COMMAND, outcome.message, Some(details))
        } else {
            CommandResult::failure_with(COMMAND, "delivery", outcome.message, 4, Some(details))
        }
    })
}

fn parse_overrides(
    transport: Option<&str>,
    attachment_mode: Option<&str>,
) -> Result<ConfigOverrides, String> {
    let mut overrides = ConfigOverrides::default();
    if let Some(transport) = transport {
        let kind = transport.parse::<TransportKind>().map_err(|error| error.to_string())?;
        overrides.transport = Some(kind);
    }
    if let Some(mode) = attachment_mode {
        let mode = mode.parse::<AttachmentMode>().map_err(|error| error.to_string())?;
        overrides.attachment_mode = Some(mode);
    }
    Ok(overrides)
}

/// Paths that cannot be inspected become rejections rather than aborting the batch.
async fn select_files(paths: &[PathBuf]) -> (Vec<SelectedFile>, Vec<IntakeRejection>) {
    let mut selected = Vec::with_capacity(paths.len());
    let mut rejections = Vec::new();
    for path in paths {
        match SelectedFile::from_path(path).await {
            Ok(file) => selected.push(file),
            Err(error) => rejections.push(IntakeRejection::Unreadable {
                name: path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string()),
                reason: error.to_string(),
            }),
        }
    }
    (selected, rejections)
}
