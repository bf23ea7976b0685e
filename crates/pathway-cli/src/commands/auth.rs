//! Authentication commands.

use super::Pathway;
use crate::output::{self, OutputFormat, SessionReport};
use anyhow::{bail, Context, Result};
use pathway_auth::{AuthError, Role, SignUpOutcome, SignUpProfile};
use std::io::{self, Write};

fn prompt_line(label: &str) -> Result<String> {
    print!("{}: ", label);
    io::stdout().flush()?;
    let mut value = String::new();
    io::stdin().read_line(&mut value)?;
    Ok(value.trim().to_string())
}

fn email_or_prompt(email: Option<String>) -> Result<String> {
    let email = match email {
        Some(email) => email.trim().to_string(),
        None => prompt_line("Email")?,
    };
    if email.is_empty() {
        bail!("Email is required");
    }
    Ok(email)
}

fn prompt_password(label: &str) -> Result<String> {
    let password = rpassword::prompt_password(format!("{}: ", label))?;
    if password.is_empty() {
        bail!("Password is required");
    }
    Ok(password)
}

/// Login with email and password.
pub async fn login(pathway: &Pathway, email: Option<String>, format: &OutputFormat) -> Result<()> {
    let state = pathway.resolver.initialize().await;
    if let Some(identity) = state.identity() {
        let who = identity.email.as_deref().unwrap_or(&identity.id);
        output::print_success(&format!("Already logged in as {}", who), format);
        return Ok(());
    }

    let email = email_or_prompt(email)?;
    let password = prompt_password("Password")?;

    if let OutputFormat::Text = format {
        println!("Logging in...");
    }

    let state = match pathway.resolver.sign_in_with_password(&email, &password).await {
        Ok(state) => state,
        Err(AuthError::InvalidCredentials(message)) => bail!("Login failed: {}", message),
        Err(e) => return Err(e).context("Login failed"),
    };
    output::print(&SessionReport::from(&state), format);
    Ok(())
}

/// Create an account.
pub async fn signup(
    pathway: &Pathway,
    email: &str,
    username: &str,
    role: Role,
    format: &OutputFormat,
) -> Result<()> {
    let password = prompt_password("Password")?;
    let confirm = prompt_password("Confirm password")?;
    if password != confirm {
        bail!("Passwords do not match");
    }

    pathway.resolver.initialize().await;
    let outcome = pathway
        .resolver
        .sign_up(email, &password, &SignUpProfile::new(username, role))
        .await
        .context("Sign-up failed")?;

    match outcome {
        SignUpOutcome::ConfirmationRequired { email } => output::print_success(
            &format!("Check {} for a confirmation link, then run 'pathway login'", email),
            format,
        ),
        SignUpOutcome::SignedIn(_) => {
            output::print(&SessionReport::from(&pathway.resolver.state()), format)
        }
    }
    Ok(())
}

/// Logout and clear the stored session.
pub async fn logout(pathway: &Pathway, format: &OutputFormat) -> Result<()> {
    pathway.resolver.initialize().await;
    match pathway.resolver.sign_out().await {
        Ok(_) => output::print_success("Logged out successfully", format),
        Err(e) => output::print_error(
            &format!("Signed out locally, but the server reported: {}", e),
            format,
        ),
    }
    Ok(())
}
