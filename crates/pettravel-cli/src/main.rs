mod cli;
mod commands;
mod config;
mod observability;
mod output;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use pettravel_client::{ApiError, FileStorage, PetTravelClient, TokenStore};

use cli::{Cli, Commands};
use commands::{Context, InvalidInput};
use output::{print_error, print_field_errors, print_hint};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    observability::init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        report(&e);
        std::process::exit(1);
    }
}

fn report(e: &anyhow::Error) {
    if let Some(api) = e.downcast_ref::<ApiError>() {
        print_error(&api.user_message());
        if let ApiError::Validation { fields, .. } = api {
            print_field_errors(fields);
        }
        if api.requires_login() {
            print_hint(&format!("Run {} to sign in again.", "pettravel login".cyan()));
        }
        tracing::debug!(error = %api, "command failed");
        return;
    }
    if let Some(invalid) = e.downcast_ref::<InvalidInput>() {
        print_error(&invalid.to_string());
        print_field_errors(&invalid.fields);
        return;
    }
    print_error(&format!("{e:#}"));
}

async fn run(cli: Cli) -> Result<()> {
    let profile_cfg = config::load_profile(&cli.profile)?;
    let format = config::resolve_format(&cli, &profile_cfg);

    if let Commands::Config(args) = &cli.command {
        return match &args.command {
            cli::ConfigCommands::Show => {
                let client_cfg = config::resolve_client_config(&cli, &profile_cfg)?;
                println!("{}: {}", "Profile".cyan(), cli.profile);
                println!("{}: {}", "API URL".cyan(), client_cfg.base_url);
                println!("{}: {}", "Format".cyan(), format.as_str());
                println!(
                    "{}: {}s",
                    "Timeout".cyan(),
                    client_cfg.request_timeout.as_secs()
                );
                Ok(())
            }
            cli::ConfigCommands::Set(set_args) => {
                let mut cfg = profile_cfg;
                config::set_value(&mut cfg, &set_args.key, &set_args.value)?;
                config::save_profile(&cli.profile, &cfg)?;
                output::print_success(&format!("Set {} = {}", set_args.key, set_args.value));
                Ok(())
            }
        };
    }

    let client = make_client(&cli, &profile_cfg)?;
    let ctx = Context { client, format };

    match cli.command {
        Commands::Login(args) => commands::auth::login(&ctx, &args).await,
        Commands::Register(args) => commands::auth::register(&ctx, &args).await,
        Commands::Logout => commands::auth::logout(&ctx),
        Commands::Whoami => commands::auth::whoami(&ctx),
        Commands::Profile(args) => commands::auth::profile(&ctx, args.command).await,
        Commands::Password(args) => commands::auth::password(&ctx, args.command).await,
        Commands::VerifyEmail(args) => commands::auth::verify_email(&ctx, &args.token).await,
        Commands::Pets(args) => commands::pets::run(&ctx, args.command).await,
        Commands::Plans(args) => commands::plans::run(&ctx, args.command).await,
        Commands::Countries => commands::travel::countries(&ctx).await,
        Commands::PetTypes => commands::travel::pet_types(&ctx).await,
        Commands::Requirements(args) => commands::travel::requirements(&ctx, args.command).await,
        Commands::Queries(args) => commands::travel::queries(&ctx, args.command).await,
        Commands::Dashboard => commands::dashboard::show(&ctx).await,
        Commands::Config(_) => Ok(()),
    }
}

fn make_client(cli: &Cli, profile_cfg: &config::ProfileConfig) -> Result<PetTravelClient> {
    let client_cfg = config::resolve_client_config(cli, profile_cfg)?;
    let storage = Arc::new(FileStorage::new(config::session_dir(&cli.profile)?)?);
    let store = Arc::new(TokenStore::load(storage));
    Ok(PetTravelClient::new(client_cfg, store)?)
}
