use clearaway_core::ServiceAreaDirectory;
use serde_json::json;

use crate::commands::CommandResult;

const COMMAND: &str = "areas";

pub fn run(county: Option<&str>) -> CommandResult {
    let mut directory = ServiceAreaDirectory::default();

    if let Some(name) = county {
        if ServiceAreaDirectory::find(name).is_none() {
            let known: Vec<&str> = directory.counties().iter().map(|county| county.name).collect();
            return CommandResult::failure(
                COMMAND,
                "unknown_county",
                format!("`{name}` is not a served county (expected one of: {})", known.join(", ")),
                3,
            );
        }
        directory.toggle(name);
    }

    let counties = directory.view();
    let message = match directory.expanded() {
        Some(name) => format!("{name} expanded"),
        None => format!("{} counties served", counties.len()),
    };
    CommandResult::success_with(COMMAND, message, Some(json!({ "counties": counties })))
}
