pub mod auth;
pub mod dashboard;
pub mod pets;
pub mod plans;
pub mod travel;

use std::fmt;

use pettravel_client::PetTravelClient;
use pettravel_client::validation::FieldErrors;

use crate::cli::OutputFormat;

/// Shared state handed to every command.
pub struct Context {
    pub client: PetTravelClient,
    pub format: OutputFormat,
}

/// Input rejected locally, before any request was sent.
#[derive(Debug)]
pub struct InvalidInput {
    pub fields: FieldErrors,
}

impl fmt::Display for InvalidInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Please fix the following and try again:")
    }
}

impl std::error::Error for InvalidInput {}

/// Turns a local validation result into a command error.
pub fn check(result: Result<(), FieldErrors>) -> anyhow::Result<()> {
    result.map_err(|fields| InvalidInput { fields }.into())
}
