use std::process::ExitCode;

fn main() -> ExitCode {
    clearaway_cli::run()
}
