use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::json;

use crate::auth::{generate_jwt, Claims};
use crate::config::{self, DEVELOPMENT_JWT_SECRET};
use crate::database::DatabaseManager;
use crate::permission::Role;
use crate::server::{app, AppState};

#[derive(Parser)]
#[command(name = "awards-market")]
#[command(about = "Marketplace and awards resource API")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP API")]
    Serve {
        #[arg(long, help = "Port to listen on (defaults to PORT / API_PORT)")]
        port: Option<u16>,
    },

    #[command(about = "Mint a bearer token for local testing")]
    Token {
        #[arg(long, help = "admin, supplier or public")]
        role: Role,
        #[arg(long, help = "User id placed in the sub claim")]
        id: i64,
        #[arg(long, help = "Supplier id for supplier tokens")]
        supplier_id: Option<i64>,
        #[arg(long, help = "Lifetime in hours (defaults to SECURITY_JWT_EXPIRY_HOURS)")]
        hours: Option<u64>,
    },
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Serve { port } => serve(port).await,
        Commands::Token { role, id, supplier_id, hours } => token(role, id, supplier_id, hours, cli.json),
    }
}

async fn serve(port: Option<u16>) -> anyhow::Result<()> {
    let config = config::config();
    tracing::info!("Starting API in {:?} mode", config.environment);

    if config.security.jwt_secret.is_empty() {
        anyhow::bail!("JWT_SECRET must be set");
    }
    if crate::is_production!() && config.security.jwt_secret == DEVELOPMENT_JWT_SECRET {
        anyhow::bail!("Refusing to run in production with the development JWT secret");
    }

    let pool = DatabaseManager::pool()?;
    let router = app(AppState::new(pool, config), config);

    let bind_addr = format!("0.0.0.0:{}", port.unwrap_or(config.api.port));
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Listening on http://{}", bind_addr);
    axum::serve(listener, router).await?;
    Ok(())
}

fn token(role: Role, id: i64, supplier_id: Option<i64>, hours: Option<u64>, as_json: bool) -> anyhow::Result<()> {
    let config = config::config();

    if role == Role::Supplier && supplier_id.is_none() {
        tracing::warn!("Supplier token without --supplier-id will own no rows");
    }

    let hours = hours.unwrap_or(config.security.jwt_expiry_hours);
    let claims = Claims::new(id, role, supplier_id, hours);
    let token = generate_jwt(&claims, &config.security.jwt_secret)?;

    if as_json {
        println!(
            "{}",
            json!({ "token": token, "role": role, "sub": id, "supplier_id": supplier_id, "exp": claims.exp })
        );
    } else {
        println!("{}", token);
    }
    Ok(())
}
