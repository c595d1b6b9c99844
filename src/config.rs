//! Configuration: typed settings with layered precedence (defaults → file → env),
//! plus the command line of the `yatube` binary.

use std::{path::PathBuf, time::Duration};

use clap::{Args, Parser, Subcommand};
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

const LOCAL_CONFIG_BASENAME: &str = "yatube";
const ENV_PREFIX: &str = "YATUBE";

/// Command-line arguments for the Yatube binary.
#[derive(Debug, Parser)]
#[command(name = "yatube", version, about = "Yatube blogging server")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "YATUBE_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the HTTP server (default).
    Serve,
    /// Manage post groups.
    #[command(subcommand)]
    Group(GroupCommand),
}

#[derive(Debug, Subcommand, Clone)]
pub enum GroupCommand {
    /// Create a group.
    Create(GroupCreateArgs),
    /// Change the title or description of a group.
    Update(GroupUpdateArgs),
    /// Delete a group; its posts are kept without a group.
    Delete {
        /// Slug of the group.
        slug: String,
    },
}

#[derive(Debug, Args, Clone)]
pub struct GroupCreateArgs {
    #[arg(long)]
    pub slug: String,
    #[arg(long)]
    pub title: String,
    #[arg(long, default_value = "")]
    pub description: String,
}

#[derive(Debug, Args, Clone)]
pub struct GroupUpdateArgs {
    /// Slug of the group.
    pub slug: String,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub auth: AuthSettings,
    pub cache: CacheSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    /// Required to serve; group management works without it.
    pub jwt_secret: Option<String>,
    pub token_ttl_days: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    pub index_ttl_secs: u64,
    /// Most index pages held at once.
    pub index_max_entries: usize,
}

impl CacheSettings {
    pub fn index_ttl(&self) -> Duration {
        Duration::from_secs(self.index_ttl_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Compact,
    Json,
}

impl Settings {
    /// Loads settings; `DATABASE_URL` and `JWT_SECRET` override everything else.
    pub fn load(config_file: Option<&std::path::Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3001)?
            .set_default("database.url", "sqlite://yatube.db")?
            .set_default("database.max_connections", 5)?
            .set_default("auth.token_ttl_days", 90)?
            .set_default("cache.index_ttl_secs", 20)?
            .set_default("cache.index_max_entries", 256)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "compact")?
            .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

        if let Some(path) = config_file {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
            .set_override_option("auth.jwt_secret", std::env::var("JWT_SECRET").ok())?
            .build()?
            .try_deserialize()
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
