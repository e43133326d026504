// mongobackup/src/config/mod.rs
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use crate::backup::db_dump::ConnectionTarget;

const DEFAULT_REGION: &str = "eu-north-1";
const DEFAULT_ADMIN_ROLE: &str = "portfolio_admin";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 9000;
// Every Sunday 3AM GMT
pub const DEFAULT_SCHEDULE: &str = "0 3 * * Sunday";
const DEFAULT_TOKEN_TTL_DAYS: i64 = 7;

/// Snapshot of the environment the configuration is read from.
///
/// Parsing goes through this instead of `std::env` directly so tests can feed
/// their own variables without touching the process environment.
#[derive(Clone, Default)]
pub struct EnvVars(HashMap<String, String>);

impl EnvVars {
    pub fn from_process() -> Self {
        EnvVars(std::env::vars().collect())
    }

    #[cfg(test)]
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        EnvVars(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    /// Returns the variable if it is set and not blank.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    fn require(&self, key: &str) -> Result<String> {
        self.get(key)
            .map(str::to_string)
            .with_context(|| format!("{} must be set", key))
    }
}

/// Database connection components.
#[derive(Clone)]
pub struct MongoConfig {
    pub username: String,
    pub password: String,
    pub cluster: String,
    /// `APP_ENV=production` selects the `mongodb+srv://` scheme.
    pub production: bool,
}

impl MongoConfig {
    pub fn from_env(env: &EnvVars) -> Result<Self> {
        Ok(MongoConfig {
            username: env.require("MONGO_USERNAME")?,
            password: env.require("MONGO_PASSWORD")?,
            cluster: env.require("MONGO_CLUSTER")?,
            production: env
                .get("APP_ENV")
                .is_some_and(|v| v.eq_ignore_ascii_case("production")),
        })
    }

    pub fn connection_target(&self) -> Result<ConnectionTarget> {
        ConnectionTarget::from_parts(&self.username, &self.password, &self.cluster, self.production)
            .context("MONGO_* variables do not form a valid connection string")
    }
}

impl fmt::Debug for MongoConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MongoConfig")
            .field("username", &self.username)
            .field("password", &"****")
            .field("cluster", &self.cluster)
            .field("production", &self.production)
            .finish()
    }
}

/// Object store location and credentials.
#[derive(Clone)]
pub struct S3Config {
    pub region: String,
    pub bucket_name: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub endpoint_url: Option<String>,
}

impl S3Config {
    pub fn from_env(env: &EnvVars) -> Result<Self> {
        let access_key_id = env
            .require("AWS_ACCESS_KEY_ID")
            .context("AWS credentials not defined")?;
        let secret_access_key = env
            .require("AWS_SECRET_ACCESS_KEY")
            .context("AWS credentials not defined")?;

        Ok(S3Config {
            region: env.get("AWS_REGION").unwrap_or(DEFAULT_REGION).to_string(),
            bucket_name: env.require("S3_BACKUP_BUCKET_NAME")?,
            access_key_id,
            secret_access_key,
            endpoint_url: env.get("S3_ENDPOINT_URL").map(parse_endpoint).transpose()?,
        })
    }
}

fn parse_endpoint(raw: &str) -> Result<String> {
    let url = url::Url::parse(raw)
        .with_context(|| format!("S3_ENDPOINT_URL is not a valid URL: '{}'", raw))?;
    if !matches!(url.scheme(), "http" | "https") {
        anyhow::bail!("S3_ENDPOINT_URL must use http or https, got '{}'", url.scheme());
    }
    Ok(raw.trim_end_matches('/').to_string())
}

impl fmt::Debug for S3Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Config")
            .field("region", &self.region)
            .field("bucket_name", &self.bucket_name)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"****")
            .field("endpoint_url", &self.endpoint_url)
            .finish()
    }
}

/// Token signing settings for the on-demand trigger.
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub admin_role: String,
    pub token_ttl_days: i64,
}

impl AuthConfig {
    pub fn from_env(env: &EnvVars) -> Result<Self> {
        Ok(AuthConfig {
            jwt_secret: env.require("JWT_SECRET_OR_KEY")?,
            admin_role: env
                .get("ADMIN_ROLE")
                .unwrap_or(DEFAULT_ADMIN_ROLE)
                .to_string(),
            token_ttl_days: DEFAULT_TOKEN_TTL_DAYS,
        })
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"****")
            .field("admin_role", &self.admin_role)
            .field("token_ttl_days", &self.token_ttl_days)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn from_env(env: &EnvVars) -> Result<Self> {
        let port = match env.get("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .with_context(|| format!("PORT must be a valid port number, got '{}'", raw))?,
            None => DEFAULT_PORT,
        };
        Ok(ServerConfig {
            host: env.get("HOST").unwrap_or(DEFAULT_HOST).to_string(),
            port,
        })
    }
}

/// Settings for the dump/restore tools and the backup cadence.
#[derive(Debug, Clone)]
pub struct BackupSettings {
    pub schedule: String,
    pub work_dir: PathBuf,
    pub mongodump_path: Option<PathBuf>,
    pub mongorestore_path: Option<PathBuf>,
}

impl BackupSettings {
    pub fn from_env(env: &EnvVars) -> Result<Self> {
        let work_dir = env
            .get("BACKUP_WORK_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir);

        if work_dir.exists() && !work_dir.is_dir() {
            anyhow::bail!(
                "BACKUP_WORK_DIR exists but is not a directory: {}",
                work_dir.display()
            );
        }

        Ok(BackupSettings {
            schedule: env.get("BACKUP_SCHEDULE").unwrap_or(DEFAULT_SCHEDULE).to_string(),
            work_dir,
            mongodump_path: env.get("MONGODUMP_PATH").map(PathBuf::from),
            mongorestore_path: env.get("MONGORESTORE_PATH").map(PathBuf::from),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_env() -> EnvVars {
        EnvVars::from_pairs(&[
            ("MONGO_USERNAME", "portfolio"),
            ("MONGO_PASSWORD", "p@ss word"),
            ("MONGO_CLUSTER", "cluster0.abcde.mongodb.net"),
            ("AWS_ACCESS_KEY_ID", "AKIAEXAMPLE"),
            ("AWS_SECRET_ACCESS_KEY", "very-secret"),
            ("S3_BACKUP_BUCKET_NAME", "portfolio-backups"),
            ("JWT_SECRET_OR_KEY", "signing-secret"),
        ])
    }

    #[test]
    fn test_mongo_config_selects_scheme_from_app_env() -> anyhow::Result<()> {
        let dev = MongoConfig::from_env(&full_env())?;
        assert!(!dev.production);
        assert!(dev.connection_target()?.uri().starts_with("mongodb://"));

        let mut env = full_env();
        env.0.insert("APP_ENV".into(), "production".into());
        let prod = MongoConfig::from_env(&env)?;
        assert!(prod.production);
        assert!(prod.connection_target()?.uri().starts_with("mongodb+srv://"));
        Ok(())
    }

    #[test]
    fn test_missing_credentials_are_fatal() {
        let env = EnvVars::from_pairs(&[("S3_BACKUP_BUCKET_NAME", "bucket")]);
        let err = S3Config::from_env(&env).unwrap_err();
        assert!(format!("{:#}", err).contains("AWS credentials not defined"));

        let env = EnvVars::from_pairs(&[("MONGO_USERNAME", "u"), ("MONGO_PASSWORD", "p")]);
        let err = MongoConfig::from_env(&env).unwrap_err();
        assert!(err.to_string().contains("MONGO_CLUSTER"));
    }

    #[test]
    fn test_blank_values_count_as_missing() {
        let env = EnvVars::from_pairs(&[("JWT_SECRET_OR_KEY", "   ")]);
        assert!(AuthConfig::from_env(&env).is_err());
    }

    #[test]
    fn test_defaults_applied() -> anyhow::Result<()> {
        let env = full_env();
        let s3 = S3Config::from_env(&env)?;
        assert_eq!(s3.region, "eu-north-1");
        assert_eq!(s3.endpoint_url, None);

        let auth = AuthConfig::from_env(&env)?;
        assert_eq!(auth.admin_role, "portfolio_admin");
        assert_eq!(auth.token_ttl_days, 7);

        let server = ServerConfig::from_env(&env)?;
        assert_eq!(server.port, 9000);

        let settings = BackupSettings::from_env(&env)?;
        assert_eq!(settings.schedule, DEFAULT_SCHEDULE);
        assert!(settings.mongodump_path.is_none());
        Ok(())
    }

    #[test]
    fn test_endpoint_url_validated() -> anyhow::Result<()> {
        let mut env = full_env();
        env.0.insert("S3_ENDPOINT_URL".into(), "http://localhost:9100/".into());
        assert_eq!(
            S3Config::from_env(&env)?.endpoint_url.as_deref(),
            Some("http://localhost:9100")
        );

        env.0.insert("S3_ENDPOINT_URL".into(), "localhost:9100".into());
        assert!(S3Config::from_env(&env).is_err());

        env.0.insert("S3_ENDPOINT_URL".into(), "ftp://minio.internal".into());
        assert!(S3Config::from_env(&env).is_err());
        Ok(())
    }

    #[test]
    fn test_invalid_port_rejected() {
        let env = EnvVars::from_pairs(&[("PORT", "ninety")]);
        assert!(ServerConfig::from_env(&env).is_err());
    }

    #[test]
    fn test_debug_output_redacts_secrets() -> anyhow::Result<()> {
        let env = full_env();
        let rendered = format!(
            "{:?} {:?} {:?}",
            MongoConfig::from_env(&env)?,
            S3Config::from_env(&env)?,
            AuthConfig::from_env(&env)?
        );
        assert!(!rendered.contains("p@ss word"));
        assert!(!rendered.contains("very-secret"));
        assert!(!rendered.contains("signing-secret"));
        Ok(())
    }
}
