//! Schema migrations for the fleet inventory database.
//!
//! Configuration is layered the same way the library loads it: built-in
//! defaults, then the optional YAML file, then `FLEET_DB__*` environment
//! variables, then `--dsn`.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use fleet_db::{DbHandle, FleetDbConfig};
use fleet_inventory::Migrator;
use sea_orm_migration::MigratorTrait;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Fleet inventory schema migrations
#[derive(Debug, Parser)]
#[command(name = "fleet-migrate")]
#[command(about = "Apply, roll back or inspect fleet inventory schema migrations")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Database DSN (overrides config)
    #[arg(long)]
    dsn: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand, PartialEq, Eq)]
enum Commands {
    /// Apply pending migrations
    Up {
        /// Apply at most this many
        #[arg(long)]
        steps: Option<u32>,
    },
    /// Roll back applied migrations
    Down {
        #[arg(long, default_value_t = 1)]
        steps: u32,
    },
    /// List applied and pending migrations
    Status,
    /// Drop all tables and re-apply every migration
    Fresh,
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .init();
    }
}

fn load_config(path: Option<&Path>, dsn: Option<String>) -> Result<FleetDbConfig> {
    if let Some(path) = path
        && !path.is_file()
    {
        anyhow::bail!("config file does not exist: {}", path.display());
    }
    let mut cfg = FleetDbConfig::load(path)?;
    if let Some(dsn) = dsn {
        cfg.dsn = dsn;
    }
    Ok(cfg)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_json);

    let cfg = load_config(cli.config.as_deref(), cli.dsn)?;
    let db = DbHandle::from_config(&cfg).await?;
    tracing::info!(engine = ?db.engine(), command = ?cli.command, "connected");

    let conn = db.conn();
    match cli.command {
        Commands::Up { steps } => {
            Migrator::up(conn, steps).await?;
            tracing::info!("migrations applied");
        }
        Commands::Down { steps } => {
            Migrator::down(conn, Some(steps)).await?;
            tracing::info!(steps, "migrations rolled back");
        }
        Commands::Status => {
            for m in Migrator::get_applied_migrations(conn).await? {
                println!("applied  {}", m.name());
            }
            for m in Migrator::get_pending_migrations(conn).await? {
                println!("pending  {}", m.name());
            }
        }
        Commands::Fresh => {
            Migrator::fresh(conn).await?;
            tracing::info!("schema recreated");
        }
    }

    db.close().await?;
    Ok(())
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn down_defaults_to_one_step() {
        let cli = Cli::try_parse_from(["fleet-migrate", "down"]).unwrap();
        assert_eq!(cli.command, Commands::Down { steps: 1 });
        assert!(!cli.log_json);
    }

    #[test]
    fn global_flags_and_steps_parse() {
        let cli = Cli::try_parse_from([
            "fleet-migrate",
            "--dsn",
            "sqlite::memory:",
            "--log-json",
            "up",
            "--steps",
            "2",
        ])
        .unwrap();
        assert_eq!(cli.command, Commands::Up { steps: Some(2) });
        assert_eq!(cli.dsn.as_deref(), Some("sqlite::memory:"));
        assert!(cli.log_json);
    }

    #[test]
    fn missing_config_file_is_rejected() {
        let err = load_config(Some(Path::new("/definitely/not/here.yaml")), None).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn dsn_flag_overrides_config() {
        let cfg = load_config(None, Some("sqlite::memory:".to_owned())).unwrap();
        assert_eq!(cfg.dsn, "sqlite::memory:");
    }
}
