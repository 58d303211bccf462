use clearaway_core::config::{AppConfig, LoadOptions};
use clearaway_core::intake::{IntakePolicy, SelectedFile, StagedAttachmentSet};
use clearaway_core::mailto::{compose_mailto, MAILTO_OPENED_MESSAGE};
use clearaway_core::QuoteRequest;
use serde_json::json;

use crate::commands::{init_logging, CommandResult};
use crate::QuoteArgs;

const COMMAND: &str = "mailto";

pub fn run(quote: &QuoteArgs) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
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

    let policy = IntakePolicy { max_attachment_bytes: config.intake.max_attachment_bytes };
    let (staged, rejected) = runtime.block_on(async {
        let mut selected = Vec::with_capacity(quote.files.len());
        let mut rejected = Vec::new();
        for path in &quote.files {
            match SelectedFile::from_path(path).await {
                Ok(file) => selected.push(file),
                Err(error) => rejected.push(format!("{}: {error}", path.display())),
            }
        }

        let mut staged = StagedAttachmentSet::default();
        let screening = staged.screen(selected, policy);
        rejected.extend(screening.rejections.iter().map(ToString::to_string));
        for file in screening.accepted {
            match file.read().await {
                Ok(attachment) => {
                    staged.push(attachment);
                }
                Err(rejection) => rejected.push(rejection.to_string()),
            }
        }
        (staged, rejected)
    });

    let link = compose_mailto(&request, staged.as_slice(), &config.delivery.recipient);
    CommandResult::success_with(
        COMMAND,
        MAILTO_OPENED_MESSAGE,
        Some(json!({ "mailto": link, "rejected": rejected })),
    )
}
