use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use pettravel_client::models::{PetKind, RequirementStatus, TravelPlanStatus, parse_date};
use time::Date;

#[derive(Parser)]
#[command(name = "pettravel")]
#[command(about = "PetTravel CLI: plan trips with your pet from the terminal")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// API base URL (overrides config and API_BASE_URL env var)
    #[arg(long, global = true, env = "API_BASE_URL")]
    pub api_url: Option<String>,

    /// Config profile name
    #[arg(short, long, global = true, env = "PETTRAVEL_PROFILE", default_value = "default")]
    pub profile: String,

    /// Output format
    #[arg(short, long, global = true)]
    pub format: Option<OutputFormat>,

    /// Request timeout in seconds
    #[arg(long, global = true, env = "PETTRAVEL_TIMEOUT")]
    pub timeout: Option<u64>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
    Table,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::Table => "table",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in with email and password
    Login(LoginArgs),
    /// Create an account and sign in
    Register(RegisterArgs),
    /// Sign out (remove the stored session)
    Logout,
    /// Show the signed-in user and token status
    Whoami,
    /// Show or update your profile
    Profile(ProfileArgs),
    /// Change or reset your password
    Password(PasswordArgs),
    /// Confirm an email address with the token from the verification mail
    VerifyEmail(VerifyEmailArgs),
    /// Manage pets
    Pets(PetsArgs),
    /// Manage travel plans
    Plans(PlansArgs),
    /// List countries
    Countries,
    /// List pet types
    PetTypes,
    /// Browse the entry requirement catalogue
    Requirements(RequirementsArgs),
    /// Ask the travel assistant and rate its answers
    Queries(QueriesArgs),
    /// Overview of pets, plans and upcoming departures
    Dashboard,
    /// Manage CLI configuration
    Config(ConfigArgs),
}

// --- auth ---

#[derive(clap::Args)]
pub struct LoginArgs {
    /// Account email
    #[arg(short, long)]
    pub email: String,
    /// Password
    #[arg(long, env = "PETTRAVEL_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(clap::Args)]
pub struct RegisterArgs {
    #[arg(short, long)]
    pub username: String,
    #[arg(short, long)]
    pub email: String,
    #[arg(long, env = "PETTRAVEL_PASSWORD", hide_env_values = true)]
    pub password: String,
    /// Password confirmation (defaults to --password)
    #[arg(long)]
    pub password_confirm: Option<String>,
    #[arg(long)]
    pub first_name: Option<String>,
    #[arg(long)]
    pub last_name: Option<String>,
}

#[derive(clap::Args)]
pub struct ProfileArgs {
    #[command(subcommand)]
    pub command: ProfileCommands,
}

#[derive(Subcommand)]
pub enum ProfileCommands {
    /// Show your profile
    Show,
    /// Update profile fields
    Update(UpdateProfileArgs),
}

#[derive(clap::Args)]
pub struct UpdateProfileArgs {
    #[arg(long)]
    pub first_name: Option<String>,
    #[arg(long)]
    pub last_name: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
}

#[derive(clap::Args)]
pub struct PasswordArgs {
    #[command(subcommand)]
    pub command: PasswordCommands,
}

#[derive(Subcommand)]
pub enum PasswordCommands {
    /// Change the password of the signed-in account
    Change {
        #[arg(long)]
        old: String,
        #[arg(long)]
        new: String,
        /// Confirmation (defaults to --new)
        #[arg(long)]
        confirm: Option<String>,
    },
    /// Request a password reset email
    Reset {
        #[arg(short, long)]
        email: String,
    },
    /// Set a new password with a reset token
    Confirm {
        #[arg(long)]
        token: String,
        #[arg(long)]
        password: String,
        /// Confirmation (defaults to --password)
        #[arg(long)]
        confirm: Option<String>,
    },
}

#[derive(clap::Args)]
pub struct VerifyEmailArgs {
    /// Verification token
    pub token: String,
}

// --- pets ---

#[derive(clap::Args)]
pub struct PetsArgs {
    #[command(subcommand)]
    pub command: PetsCommands,
}

#[derive(Subcommand)]
pub enum PetsCommands {
    /// List your pets
    List,
    /// Show one pet
    Get { id: u64 },
    /// Add a pet
    Create(PetFields),
    /// Update a pet
    Update {
        id: u64,
        #[command(flatten)]
        fields: PetUpdateFields,
    },
    /// Remove a pet
    Delete { id: u64 },
}

#[derive(clap::Args)]
pub struct PetFields {
    #[arg(long)]
    pub name: String,
    /// dog, cat, ferret, bird or other
    #[arg(long = "type", value_parser = parse_pet_kind)]
    pub kind: PetKind,
    #[arg(long)]
    pub breed: Option<String>,
    /// Age in years
    #[arg(long)]
    pub age: Option<u32>,
    /// Weight in kg
    #[arg(long)]
    pub weight: Option<f64>,
    #[arg(long)]
    pub microchip: Option<String>,
    #[arg(long)]
    pub vaccination_status: Option<String>,
}

#[derive(clap::Args)]
pub struct PetUpdateFields {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long = "type", value_parser = parse_pet_kind)]
    pub kind: Option<PetKind>,
    #[arg(long)]
    pub breed: Option<String>,
    #[arg(long)]
    pub age: Option<u32>,
    #[arg(long)]
    pub weight: Option<f64>,
    #[arg(long)]
    pub microchip: Option<String>,
    #[arg(long)]
    pub vaccination_status: Option<String>,
}

// --- plans ---

#[derive(clap::Args)]
pub struct PlansArgs {
    #[command(subcommand)]
    pub command: PlansCommands,
}

#[derive(Subcommand)]
pub enum PlansCommands {
    /// List travel plans
    List {
        #[arg(long, value_parser = parse_plan_status)]
        status: Option<TravelPlanStatus>,
        /// Only plans that have not departed yet
        #[arg(long)]
        upcoming: bool,
    },
    /// Show one plan
    Get { id: u64 },
    /// Create a plan
    Create(PlanFields),
    /// Update a plan
    Update {
        id: u64,
        #[command(flatten)]
        fields: PlanUpdateFields,
    },
    /// Delete a plan
    Delete { id: u64 },
    /// Show the requirements of a plan with their urgency
    Requirements { id: u64 },
    /// Set the status of one requirement of a plan
    UpdateRequirement {
        /// Plan id
        plan_id: u64,
        /// Requirement id
        requirement_id: u64,
        /// not_started, in_progress, completed or not_applicable
        #[arg(long, value_parser = parse_requirement_status)]
        status: RequirementStatus,
        #[arg(long)]
        notes: Option<String>,
        /// Completion date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date_arg)]
        completed_on: Option<Date>,
    },
    /// Upload a proof document for one requirement of a plan
    UploadProof {
        plan_id: u64,
        requirement_id: u64,
        /// File to upload
        file: PathBuf,
        /// MIME type (guessed from the extension when omitted)
        #[arg(long)]
        content_type: Option<String>,
    },
}

#[derive(clap::Args)]
pub struct PlanFields {
    #[arg(long)]
    pub name: String,
    /// Pet id
    #[arg(long)]
    pub pet: u64,
    /// Origin country id
    #[arg(long)]
    pub from: u64,
    /// Destination country id
    #[arg(long)]
    pub to: u64,
    /// Departure date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date_arg)]
    pub departure: Date,
    /// Return date (YYYY-MM-DD)
    #[arg(long = "return", value_parser = parse_date_arg)]
    pub return_date: Option<Date>,
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(clap::Args)]
pub struct PlanUpdateFields {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub pet: Option<u64>,
    #[arg(long)]
    pub from: Option<u64>,
    #[arg(long)]
    pub to: Option<u64>,
    #[arg(long, value_parser = parse_date_arg)]
    pub departure: Option<Date>,
    #[arg(long = "return", value_parser = parse_date_arg)]
    pub return_date: Option<Date>,
    #[arg(long, value_parser = parse_plan_status)]
    pub status: Option<TravelPlanStatus>,
    #[arg(long)]
    pub notes: Option<String>,
}

// --- catalogue ---

#[derive(clap::Args)]
pub struct RequirementsArgs {
    #[command(subcommand)]
    pub command: RequirementsCommands,
}

#[derive(Subcommand)]
pub enum RequirementsCommands {
    /// List requirements, optionally filtered
    List {
        /// Country id
        #[arg(long)]
        country: Option<u64>,
        /// Pet type id
        #[arg(long)]
        pet_type: Option<u64>,
        /// Only mandatory (true) or optional (false) requirements
        #[arg(long)]
        mandatory: Option<bool>,
    },
    /// Show one requirement
    Get { id: u64 },
}

#[derive(clap::Args)]
pub struct QueriesArgs {
    #[command(subcommand)]
    pub command: QueriesCommands,
}

#[derive(Subcommand)]
pub enum QueriesCommands {
    /// List your previous questions
    List,
    /// Ask a question
    Ask {
        /// Origin country id
        #[arg(long)]
        from: u64,
        /// Destination country id
        #[arg(long)]
        to: u64,
        /// Pet type id
        #[arg(long)]
        pet_type: u64,
        /// The question
        question: String,
        /// Continue an earlier conversation
        #[arg(long)]
        conversation: Option<String>,
    },
    /// Rate an answer from 1 to 5
    Feedback {
        id: u64,
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
        rating: u8,
        #[arg(long)]
        comments: Option<String>,
    },
}

// --- config ---

#[derive(clap::Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current config
    Show,
    /// Set config value
    Set(ConfigSetArgs),
}

#[derive(clap::Args)]
pub struct ConfigSetArgs {
    /// Key to set (api_url, format, timeout)
    pub key: String,
    /// Value
    pub value: String,
}

fn parse_pet_kind(s: &str) -> Result<PetKind, String> {
    s.parse()
}

fn parse_plan_status(s: &str) -> Result<TravelPlanStatus, String> {
    s.parse()
}

fn parse_requirement_status(s: &str) -> Result<RequirementStatus, String> {
    s.parse()
}

fn parse_date_arg(s: &str) -> Result<Date, String> {
    parse_date(s).map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_plan_create() {
        let cli = Cli::try_parse_from([
            "pettravel",
            "plans",
            "create",
            "--name",
            "Lisbon",
            "--pet",
            "1",
            "--from",
            "10",
            "--to",
            "20",
            "--departure",
            "2030-07-01",
        ])
        .unwrap();
        let Commands::Plans(PlansArgs {
            command: PlansCommands::Create(fields),
        }) = cli.command
        else {
            panic!("expected plans create");
        };
        assert_eq!(fields.departure, time::macros::date!(2030 - 07 - 01));
        assert_eq!(fields.return_date, None);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(Cli::try_parse_from(["pettravel", "pets", "create", "--name", "X", "--type", "dragon"]).is_err());
        assert!(Cli::try_parse_from(["pettravel", "queries", "feedback", "1", "--rating", "6"]).is_err());
    }
}
