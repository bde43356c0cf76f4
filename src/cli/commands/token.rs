use clap::Args;
use serde_json::json;

use crate::auth::{generate_jwt, Claims};
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config;
use crate::types::AccessLevel;

#[derive(Args, Debug)]
pub struct TokenArgs {
    #[arg(long, help = "User name recorded in the token")]
    pub user: String,
    #[arg(long, default_value = "read", help = "Access level: read, edit, full or root")]
    pub access: AccessLevel,
    #[arg(long, help = "Lifetime in hours (defaults to SECURITY_JWT_EXPIRY_HOURS)")]
    pub hours: Option<u64>,
}

pub fn handle(args: TokenArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let security = &config::config().security;
    let hours = args.hours.unwrap_or(security.jwt_expiry_hours);
    let claims = Claims::new(&args.user, args.access, hours);
    let token = generate_jwt(&security.jwt_secret, &claims)?;

    match output_format {
        OutputFormat::Json => output_success(
            output_format,
            "Token generated",
            Some(json!({ "token": token, "user": args.user, "access": args.access, "expires_at": claims.exp })),
        ),
        OutputFormat::Text => {
            println!("{}", token);
            Ok(())
        }
    }
}
