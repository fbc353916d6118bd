//! Interactive sign-in helper.
//!
//! Walks through the phone / code / optional 2FA flow, saves the session
//! file, and prints the base64 session string for headless deployments.

use std::io::{BufRead, Write};

use anyhow::{bail, Context, Result};

use tgmcp_core::config::Config;
use tgmcp_telegram::{encode_session, save_session, SignInError};

fn prompt(msg: &str) -> Result<String> {
    print!("{msg}");
    std::io::stdout().flush()?;
    let line = std::io::stdin()
        .lock()
        .lines()
        .next()
        .context("stdin closed")??;
    Ok(line.trim().to_string())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let config = Config::load().context("loading configuration")?;
    let client = tgmcp_telegram::connect(&config)
        .await
        .context("connecting to Telegram")?;

    if client.is_authorized().await? {
        println!("Session is already authorized.");
    } else {
        let phone = prompt("Phone number (international format): ")?;
        let token = client.request_login_code(&phone).await?;
        let code = prompt("Enter the code Telegram sent you: ")?;

        match client.sign_in(&token, &code).await {
            Ok(user) => {
                println!("Signed in as {}.", user.full_name());
            }
            Err(SignInError::PasswordRequired(password_token)) => {
                let hint = password_token.hint().unwrap_or("no hint");
                let password = prompt(&format!("2FA password (hint: {hint}): "))?;
                let user = client.check_password(password_token, password).await?;
                println!("Signed in as {}.", user.full_name());
            }
            Err(SignInError::InvalidCode) => bail!("invalid code, run again to retry"),
            Err(err) => bail!("sign in failed: {err}"),
        }

        save_session(&client, &config).context("saving session")?;
    }

    println!();
    println!("Session string (set TELEGRAM_SESSION_STRING to run without a session file):");
    println!("{}", encode_session(&client));
    Ok(())
}
