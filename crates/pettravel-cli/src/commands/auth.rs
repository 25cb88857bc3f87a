use anyhow::Result;
use colored::Colorize;
use pettravel_client::models::{
    ChangePasswordRequest, PasswordResetConfirmRequest, RegisterRequest, UpdateProfileRequest,
};
use pettravel_client::session::jwt;
use pettravel_client::validation::{
    PasswordStrength, validate_login, validate_password_change, validate_password_reset,
    validate_registration,
};
use time::OffsetDateTime;

use super::{Context, check};
use crate::cli::{LoginArgs, PasswordCommands, ProfileCommands, RegisterArgs, UpdateProfileArgs};
use crate::output::{Column, print_data, print_error, print_success};

const USER_COLUMNS: &[Column] = &[
    ("ID", "id"),
    ("Username", "username"),
    ("Email", "email"),
    ("First name", "first_name"),
    ("Last name", "last_name"),
];

pub async fn login(ctx: &Context, args: &LoginArgs) -> Result<()> {
    check(validate_login(&args.email, &args.password))?;
    let user = ctx.client.login(&args.email, &args.password).await?;
    print_success(&format!(
        "Logged in as {} ({})",
        user.display_name().cyan(),
        user.email
    ));
    Ok(())
}

pub async fn register(ctx: &Context, args: &RegisterArgs) -> Result<()> {
    let request = RegisterRequest {
        username: args.username.trim().to_string(),
        email: args.email.trim().to_string(),
        password: args.password.clone(),
        password_confirm: args
            .password_confirm
            .clone()
            .unwrap_or_else(|| args.password.clone()),
        first_name: args.first_name.clone(),
        last_name: args.last_name.clone(),
    };
    if let Err(fields) = validate_registration(&request) {
        print_strength(&request.password);
        return Err(super::InvalidInput { fields }.into());
    }

    let user = ctx.client.register(&request).await?;
    print_success(&format!("Account created. Logged in as {}", user.username.cyan()));
    Ok(())
}

pub fn logout(ctx: &Context) -> Result<()> {
    if !ctx.client.is_authenticated() {
        println!("Not logged in.");
        return Ok(());
    }
    ctx.client.logout();
    print_success("Logged out");
    Ok(())
}

pub fn whoami(ctx: &Context) -> Result<()> {
    let session = ctx.client.store().session();
    let tokens = session.tokens();
    let (Some(user), Some(tokens)) = (session.user, tokens) else {
        println!("Not logged in. Run {} to sign in.", "pettravel login".cyan());
        return Ok(());
    };

    println!("{}: {}", "User".cyan(), user.display_name());
    println!("{}: {}", "Username".cyan(), user.username);
    println!("{}: {}", "Email".cyan(), user.email);
    match jwt::expires_at(&tokens.access) {
        Some(exp) => {
            let left = exp - OffsetDateTime::now_utc().unix_timestamp();
            if left > 0 {
                println!("{}: valid for {}m {}s", "Access token".cyan(), left / 60, left % 60);
            } else {
                println!(
                    "{}: {} (renewed on next request)",
                    "Access token".cyan(),
                    "expired".yellow()
                );
            }
        }
        None => println!("{}: {}", "Access token".cyan(), "unreadable".yellow()),
    }
    Ok(())
}

pub async fn profile(ctx: &Context, command: ProfileCommands) -> Result<()> {
    match command {
        ProfileCommands::Show => {
            let user = ctx.client.profile().await?;
            print_data(&user, ctx.format, USER_COLUMNS)
        }
        ProfileCommands::Update(args) => update_profile(ctx, args).await,
    }
}

async fn update_profile(ctx: &Context, args: UpdateProfileArgs) -> Result<()> {
    let request = UpdateProfileRequest {
        first_name: args.first_name,
        last_name: args.last_name,
        email: args.email,
    };
    if request.is_empty() {
        anyhow::bail!("Nothing to update. Pass --first-name, --last-name or --email");
    }
    let user = ctx.client.update_profile(&request).await?;
    print_success("Profile updated");
    print_data(&user, ctx.format, USER_COLUMNS)
}

pub async fn password(ctx: &Context, command: PasswordCommands) -> Result<()> {
    match command {
        PasswordCommands::Change { old, new, confirm } => {
            let request = ChangePasswordRequest {
                old_password: old,
                new_password_confirm: confirm.unwrap_or_else(|| new.clone()),
                new_password: new,
            };
            if let Err(fields) = validate_password_change(&request) {
                print_strength(&request.new_password);
                return Err(super::InvalidInput { fields }.into());
            }
            let response = ctx.client.change_password(&request).await?;
            print_success(or_default(&response.message, "Password changed"));
        }
        PasswordCommands::Reset { email } => {
            let response = ctx.client.request_password_reset(&email).await?;
            print_success(or_default(
                &response.message,
                "If the address is registered, a reset link is on its way",
            ));
        }
        PasswordCommands::Confirm {
            token,
            password,
            confirm,
        } => {
            let request = PasswordResetConfirmRequest {
                token,
                password_confirm: confirm.unwrap_or_else(|| password.clone()),
                password,
            };
            check(validate_password_reset(&request))?;
            let response = ctx.client.confirm_password_reset(&request).await?;
            print_success(or_default(&response.message, "Password reset. You can log in now"));
        }
    }
    Ok(())
}

pub async fn verify_email(ctx: &Context, token: &str) -> Result<()> {
    let response = ctx.client.verify_email(token).await?;
    print_success(or_default(&response.message, "Email verified"));
    Ok(())
}

fn or_default<'a>(message: &'a str, fallback: &'a str) -> &'a str {
    if message.trim().is_empty() { fallback } else { message }
}

fn print_strength(password: &str) {
    let strength = PasswordStrength::evaluate(password);
    if strength.is_acceptable() {
        return;
    }
    print_error(&format!(
        "Password strength: {} ({}%)",
        strength.level.as_str(),
        strength.percentage
    ));
    for rule in strength.unmet() {
        eprintln!("  {} {}", "·".yellow(), rule.label());
    }
}
