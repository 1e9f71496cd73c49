use clap::{Parser, Subcommand};
use lineage_core::{IssuedToken, RefreshTokenConfig, RefreshTokenService};
use lineage_db::sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "lineage-admin", version, about = "Maintenance commands for refresh token chains")]
struct Cli {
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply pending schema migrations and exit.
    Migrate,
    /// Rotate a refresh token and print its replacement.
    Exchange { token: String },
    /// Revoke every token issued after the given one in its chain.
    RevokeFamily { token: String },
    /// Delete all refresh tokens of a user.
    Logout { instance_id: Uuid, user_id: Uuid },
}

async fn connect_and_migrate(database_url: &str) -> anyhow::Result<DatabaseConnection> {
    let db = lineage_db::connect(database_url).await?;

    // Apply migrations on boot (idempotent).
    lineage_migration::Migrator::up(&db, None).await?;
    Ok(db)
}

fn refresh_token_service() -> RefreshTokenService {
    let service = RefreshTokenService::new(RefreshTokenConfig::from_env());
    let config = service.config();
    tracing::debug!(
        rotation_enabled = config.rotation_enabled,
        token_bytes = config.token_bytes,
        "refresh token service configured"
    );
    service
}

async fn exchange(
    db: &DatabaseConnection,
    service: &RefreshTokenService,
    token: &str,
) -> anyhow::Result<IssuedToken> {
    let issued = service.exchange_refresh_token(db, token).await?;
    tracing::info!(
        token_id = issued.token.id,
        user_id = %issued.token.user_id,
        "refresh token rotated"
    );
    Ok(issued)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let db = connect_and_migrate(&cli.database_url).await?;

    match cli.command {
        Command::Migrate => {
            tracing::info!("migrations applied");
        }
        Command::Exchange { token } => {
            let issued = exchange(&db, &refresh_token_service(), &token).await?;
            println!("{}", issued.token.token);
        }
        Command::RevokeFamily { token } => {
            let token = lineage_core::find_refresh_token(&db, &token).await?;
            lineage_core::revoke_token_family(&db, &token).await?;
            tracing::info!(token_id = token.id, user_id = %token.user_id, "token family revoked");
        }
        Command::Logout {
            instance_id,
            user_id,
        } => {
            lineage_core::logout(&db, instance_id, user_id).await?;
        }
    }

    Ok(())
}
