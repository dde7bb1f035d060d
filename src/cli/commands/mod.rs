//! CLI command implementations.

mod ask;
mod config;
mod doctor;
mod index;
mod list;
mod search;
mod serve;

pub use ask::run_ask;
pub use config::run_config;
pub use doctor::run_doctor;
pub use index::run_index;
pub use list::run_list;
pub use search::run_search;
pub use serve::run_serve;

use crate::cli::preflight::{self, Operation};
use crate::cli::{Output, NO_CAPTIONS_MESSAGE};
use crate::config::Settings;
use crate::error::{ErrorKind, TubeQaError};
use thiserror::Error;

/// Exit status for errors the user can fix by changing their input.
pub const EXIT_USER_ERROR: u8 = 2;
/// Exit status for failures of yt-dlp, the model endpoints or local storage.
pub const EXIT_FAILURE: u8 = 1;

/// An error that has already been printed to the terminal.
///
/// `main` maps it to an exit status without printing it again.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ReportedError(TubeQaError);

impl ReportedError {
    pub fn exit_code(&self) -> u8 {
        if self.0.is_user_correctable() {
            EXIT_USER_ERROR
        } else {
            EXIT_FAILURE
        }
    }
}

/// Print a pipeline error the way its kind calls for.
///
/// Missing captions is a warning with a fixed message; bad input is shown
/// verbatim; anything else is prefixed with what was being attempted.
fn report_error(action: &str, e: TubeQaError) -> anyhow::Error {
    match e.kind() {
        ErrorKind::NoCaptions => Output::warning(NO_CAPTIONS_MESSAGE),
        ErrorKind::MalformedUrl | ErrorKind::InvalidInput => Output::error(&e.to_string()),
        ErrorKind::Collaborator => Output::error(&format!("{}: {}", action, e)),
    }
    ReportedError(e).into()
}

/// Run pre-flight checks, pointing at `doctor` on failure.
fn run_preflight(operation: Operation, settings: &Settings) -> anyhow::Result<()> {
    if let Err(e) = preflight::check(operation, settings) {
        Output::error(&e.to_string());
        Output::info("Run 'tubeqa doctor' for detailed diagnostics.");
        return Err(ReportedError(e).into());
    }
    Ok(())
}
