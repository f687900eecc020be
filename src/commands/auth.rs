//! Account commands: register, login, logout, status.

use pantry::{Session, SessionContext};
use std::path::Path;

use crate::config::SavedSession;

type CommandResult = Result<(), Box<dyn std::error::Error>>;

pub async fn register(ctx: &SessionContext) -> CommandResult {
    let session = ctx.register().await?;

    if let Session::SignedIn { token, .. } = session {
        println!("Registered. Your access code is:");
        println!();
        println!("  {}", token);
        println!();
        println!("Keep it somewhere safe. It is the only way back to your data.");
    }
    Ok(())
}

pub async fn login(ctx: &SessionContext, token: &str) -> CommandResult {
    let session = ctx.sign_in(token).await?;

    if let Session::SignedIn { token, created_at } = session {
        println!("Signed in as {}", token);
        println!("  Account created: {}", created_at.format("%Y-%m-%d %H:%M UTC"));
    }
    Ok(())
}

/// Forgets the saved token without asking the server.
pub async fn logout(ctx: &SessionContext, session_path: &Path) -> CommandResult {
    ctx.sign_out().await;
    SavedSession::default().save(session_path)?;
    println!("Signed out.");
    Ok(())
}

pub async fn status(ctx: &SessionContext, server_url: &str) -> CommandResult {
    println!("Server: {}", server_url);

    match ctx.current().await {
        Session::SignedIn { token, created_at } => {
            println!("Status: Signed in as {}", token);
            println!("  Account created: {}", created_at.format("%Y-%m-%d %H:%M UTC"));
        }
        Session::SignedOut => {
            println!("Status: Signed out");
            println!();
            println!("Run `pantry register` for a new access code,");
            println!("or `pantry login <token>` to use an existing one.");
        }
    }
    Ok(())
}
