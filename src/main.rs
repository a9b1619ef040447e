//! pagewright binary entry point.

use std::process::ExitCode;

fn main() -> ExitCode {
    match pagewright::cli::run() {
        Ok(code) => code,
        Err(e) => {
            pagewright::ui::output::error(format!("error: {e:#}"));
            ExitCode::FAILURE
        }
    }
}
