use std::collections::BTreeSet;

use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::model::{catalog::Catalog, models::RegistrationField};

/**
 * Command-line arguments for the application.
 */
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct ApplicationArguments {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /**
     * Run the registration server.
     */
    Serve {
        /**
         * Path to the configuration file.
         */
        #[arg(short, long)]
        config_file: String,
    },
    /**
     * Submit a registration to a running server, the way the registration form does.
     */
    Submit(SubmitArguments),
}

/**
 * Form values for the `submit` command.
 */
#[derive(Args, Debug)]
pub struct SubmitArguments {
    /**
     * Base url of the registration server.
     */
    #[arg(long, default_value = "http://localhost:3000")]
    pub server_url: String,
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub gender: String,
    #[arg(long)]
    pub address: String,
    #[arg(long)]
    pub phone: String,
    #[arg(long)]
    pub birthdate: String,
    #[arg(long)]
    pub living_type: String,
    #[arg(long)]
    pub program: String,
    /**
     * Agree to the collection and use of personal information.
     */
    #[arg(long)]
    pub privacy_agreement: bool,
}

/**
 * Represents the configuration for the application.
 */
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /**
     * Logging configuration for the application.
     */
    pub logging: LoggingConfig,
    /**
     * Security configuration for the application.
     */
    #[serde(default)]
    pub security: AppSecurity,
    /**
     * Server configuration for the application.
     */
    pub server: Server,
    /**
     * Database configuration for the application.
     */
    pub database: Database,
    /**
     * Registration rules.
     */
    #[serde(default)]
    pub registration: RegistrationConfig,
    /**
     * Spreadsheet export settings.
     */
    #[serde(default)]
    pub export: ExportConfig,
    /**
     * Code to label lookup tables.
     */
    #[serde(default)]
    pub catalog: Catalog,
}

#[allow(clippy::struct_excessive_bools)]
#[derive(Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /**
     * Whether to log the target of the log message.
     */
    pub target: bool,
    /**
     * Whether to log thread IDs .
     */
    pub thread_ids: bool,
    /**
     * Whether to log thread names.
     */
    pub thread_names: bool,
    /**
     * Whether to log line numbers.
     */
    pub line_number: bool,
    /**
     * Whether to log the log level.
     */
    pub level: bool,
    /**
     * Whether to use ANSI colors in logs.
     */
    pub ansi: bool,
    /**
     * Whether to log the source file.
     */
    pub file: bool,
    /**
     * Additional filter directives, e.g. `sqlx=warn`.
     */
    #[serde(default)]
    pub directives: Vec<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig { target: true, thread_ids: false, thread_names: false, line_number: false, level: true, ansi: true, file: false, directives: vec![] }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Database {
    /**
     * Type of the database.
     */
    pub db_type: DatabaseType,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DatabaseType {
    /**
     * `SQLite` database file. Timeouts and delays are in milliseconds.
     */
    #[serde(rename_all = "camelCase")]
    Sqlite {
        connection_string: String,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: u64,
        idle_timeout: u64,
        max_lifetime: u64,
        connect_retries: u32,
        connect_retry_delay: u64,
    },
}

/**
 * Admin access settings. Without admin credentials every endpoint is open.
 */
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSecurity {
    pub admin: Option<AdminCredentials>,
}

/**
 * Basic auth credentials for the admin endpoints.
 */
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminCredentials {
    pub username: String,
    pub password: String,
}

/**
 * Represents the server configuration for the application.
 */
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Server {
    /**
     * Number of worker threads for the server.
     */
    pub workers: usize,
    /**
     * Interface to bind to.
     */
    #[serde(default = "default_host")]
    pub host: String,
    /**
     * HTTP port for the server.
     */
    pub http_port: u16,
    /**
     * Environment name reported by the health endpoint.
     */
    #[serde(default = "default_environment")]
    pub environment: String,
    /**
     * Origins allowed to call the API from a browser. Empty allows any origin.
     */
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_environment() -> String {
    "development".to_string()
}

/**
 * Registration rules.
 */
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationConfig {
    /**
     * Fields a submission must contain.
     */
    pub required_fields: BTreeSet<RegistrationField>,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        RegistrationConfig { required_fields: RegistrationField::defaults() }
    }
}

/**
 * Spreadsheet export settings.
 */
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportConfig {
    /**
     * Directory receiving a copy of every generated spreadsheet.
     */
    pub directory: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        ExportConfig { directory: "./exports".to_string() }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_config_serialization() {
        let config = Config {
            logging: LoggingConfig::default(),
            database: Database {
                db_type: DatabaseType::Sqlite {
                    connection_string: "sqlite://data/registrations.db".to_string(),
                    max_connections: 1,
                    min_connections: 1,
                    acquire_timeout: 30,
                    idle_timeout: 300,
                    max_lifetime: 3600,
                    connect_retries: 5,
                    connect_retry_delay: 2000,
                },
            },
            security: AppSecurity { admin: Some(AdminCredentials { username: "admin".to_string(), password: "secret".to_string() }) },
            server: Server { workers: 4, host: "0.0.0.0".to_string(), http_port: 3000, environment: "production".to_string(), allowed_origins: vec!["https://example.org".to_string()] },
            registration: RegistrationConfig::default(),
            export: ExportConfig::default(),
            catalog: Catalog::default(),
        };
        let serialized = toml::to_string(&config).unwrap();
        let deserialized: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(config.logging.target, deserialized.logging.target);
        assert_eq!(config.logging.ansi, deserialized.logging.ansi);
        assert_eq!(config.server.workers, deserialized.server.workers);
        assert_eq!(config.server.http_port, deserialized.server.http_port);
        assert_eq!(config.server.environment, deserialized.server.environment);
        assert_eq!(config.server.allowed_origins, deserialized.server.allowed_origins);
        assert_eq!(deserialized.security.admin, Some(AdminCredentials { username: "admin".to_string(), password: "secret".to_string() }));
        assert_eq!(deserialized.registration.required_fields, RegistrationField::defaults());
        assert_eq!(deserialized.export.directory, "./exports");
        assert_eq!(deserialized.catalog, Catalog::default());
        let DatabaseType::Sqlite { connect_retries, connect_retry_delay, .. } = deserialized.database.db_type;
        assert_eq!(connect_retries, 5);
        assert_eq!(connect_retry_delay, 2000);
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [logging]
            target = true
            thread_ids = false
            thread_names = false
            line_number = false
            level = true
            ansi = false
            file = false

            [server]
            workers = 1
            httpPort = 3000

            [database.dbType.sqlite]
            connectionString = "sqlite::memory:"
            maxConnections = 1
            minConnections = 1
            acquireTimeout = 1000
            idleTimeout = 1000
            maxLifetime = 1000
            connectRetries = 1
            connectRetryDelay = 0
            "#,
        )
        .unwrap();
        assert!(config.security.admin.is_none());
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.environment, "development");
        assert!(config.server.allowed_origins.is_empty());
        assert!(!config.registration.required_fields.contains(&RegistrationField::PrivacyAgreement));
        assert_eq!(config.catalog.program_label("ballet"), "유아발레교실");
    }

    #[test]
    fn test_required_fields_configurable() {
        let registration: RegistrationConfig = toml::from_str(r#"requiredFields = ["name", "phone", "privacyAgreement"]"#).unwrap();
        assert_eq!(registration.required_fields, BTreeSet::from([RegistrationField::Name, RegistrationField::Phone, RegistrationField::PrivacyAgreement]));
    }

    #[test]
    fn test_sample_config_parses() {
        let config: Config = toml::from_str(include_str!("../../config/default.toml")).unwrap();
        assert_eq!(config.server.http_port, 3000);
        assert_eq!(config.logging.directives, vec!["sqlx=warn".to_string(), "actix_web=info".to_string()]);
        assert_eq!(config.security.admin.map(|admin| admin.username), Some("admin".to_string()));
        assert_eq!(config.registration.required_fields, RegistrationField::defaults());
        assert_eq!(config.catalog, Catalog::default());
    }
}
