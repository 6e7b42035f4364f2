//! Print the owner token a member would present right now

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use member_profiles::{issue_token, TokenIdentity};

#[derive(Parser, Debug)]
#[command(name = "issue-token")]
#[command(about = "Compute the current owner token for a member record")]
struct Args {
    #[arg(long)]
    email: String,

    #[arg(long)]
    first_name: String,

    #[arg(long)]
    last_name: String,

    /// Internal member id
    #[arg(long)]
    id: String,

    #[arg(long)]
    membership_id: String,

    /// Last login timestamp exactly as exported
    #[arg(long)]
    last_login: String,

    /// Minute of the hour to issue for instead of the current one
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..60))]
    minute: Option<u32>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let identity = TokenIdentity {
        email: args.email,
        first_name: args.first_name,
        last_name: args.last_name,
        id: args.id,
        membership_id: args.membership_id,
        last_login: args.last_login,
    };

    let token = match args.minute {
        Some(minute) => identity.token_for_minute(minute),
        None => issue_token(&identity, Utc::now()),
    }
    .context("Failed to key the token MAC")?;
    println!("{token}");
    Ok(())
}
