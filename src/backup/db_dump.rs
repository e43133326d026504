// mongobackup/src/backup/db_dump.rs
use async_trait::async_trait;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use std::fmt;
use std::path::PathBuf;
use tempfile::TempPath;
use tokio::process::Command;

use super::archive::ArchivePayload;
use crate::errors::ProducerError;
use crate::utils::find_tool;

/// Characters left unescaped in user info, same set as JavaScript's `encodeURIComponent`.
const USERINFO: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Connection string handed to the dump/restore tools.
///
/// Formatting never reveals the password.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionTarget {
    uri: String,
    redacted: String,
}

impl ConnectionTarget {
    /// Builds `mongodb[+srv]://user:password@cluster`, escaping the credentials.
    pub fn from_parts(
        username: &str,
        password: &str,
        cluster: &str,
        srv: bool,
    ) -> Result<Self, ProducerError> {
        validate_cluster(cluster)?;
        let scheme = if srv { "mongodb+srv" } else { "mongodb" };
        let user = utf8_percent_encode(username, USERINFO).to_string();
        let pass = utf8_percent_encode(password, USERINFO).to_string();

        Ok(ConnectionTarget {
            uri: format!("{}://{}:{}@{}", scheme, user, pass, cluster),
            redacted: format!("{}://{}:****@{}", scheme, user, cluster),
        })
    }

    /// Accepts a complete `mongodb://` or `mongodb+srv://` connection string.
    pub fn parse(uri: &str) -> Result<Self, ProducerError> {
        let uri = uri.trim();
        let (scheme, rest) = ["mongodb+srv://", "mongodb://"]
            .iter()
            .find_map(|scheme| uri.strip_prefix(scheme).map(|rest| (*scheme, rest)))
            .ok_or_else(|| {
                ProducerError::InvalidTarget(
                    "connection string must start with mongodb:// or mongodb+srv://".to_string(),
                )
            })?;

        // user info ends at the last '@' of the authority section
        let authority_end = rest.find(['/', '?']).unwrap_or(rest.len());
        let (userinfo, hosts) = match rest[..authority_end].rfind('@') {
            Some(at) => (Some(&rest[..at]), &rest[at + 1..]),
            None => (None, rest),
        };
        validate_cluster(hosts)?;

        let redacted = match userinfo {
            Some(info) => {
                let user = info.split(':').next().unwrap_or_default();
                format!("{}{}:****@{}", scheme, user, hosts)
            }
            None => format!("{}{}", scheme, hosts),
        };

        Ok(ConnectionTarget {
            uri: uri.to_string(),
            redacted,
        })
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }
}

impl fmt::Display for ConnectionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted)
    }
}

impl fmt::Debug for ConnectionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ConnectionTarget").field(&self.redacted).finish()
    }
}

fn validate_cluster(cluster: &str) -> Result<(), ProducerError> {
    let host = cluster.split(['/', '?']).next().unwrap_or_default();
    if host.is_empty() {
        return Err(ProducerError::InvalidTarget("cluster host is empty".to_string()));
    }
    if cluster.contains(char::is_whitespace) || cluster.contains('@') {
        return Err(ProducerError::InvalidTarget(format!(
            "cluster contains invalid characters: {}",
            cluster
        )));
    }
    Ok(())
}

/// Produces a compressed snapshot of the database.
#[async_trait]
pub trait ArchiveProducer: Send + Sync {
    async fn produce(&self, target: &ConnectionTarget) -> Result<ArchivePayload, ProducerError>;

    /// Releases whatever local storage `produce` allocated for the payload.
    async fn discard(&self, payload: ArchivePayload) -> Result<(), ProducerError>;
}

/// Shells out to `mongodump --archive=<file> --gzip --uri=<uri>`.
#[derive(Debug, Clone)]
pub struct MongoDumpProducer {
    binary: Option<PathBuf>,
    work_dir: PathBuf,
}

impl MongoDumpProducer {
    pub fn new(binary: Option<PathBuf>, work_dir: PathBuf) -> Self {
        MongoDumpProducer { binary, work_dir }
    }

    fn resolve_binary(&self) -> Result<PathBuf, ProducerError> {
        find_tool(self.binary.as_deref(), "mongodump").ok_or_else(|| {
            ProducerError::DumpFailed(
                "mongodump executable not found in PATH. Please ensure MongoDB database tools are installed and in your PATH.".to_string(),
            )
        })
    }

    async fn allocate_archive_path(&self) -> Result<TempPath, ProducerError> {
        tokio::fs::create_dir_all(&self.work_dir).await?;
        let path = tempfile::Builder::new()
            .prefix("mongodb-backup-")
            .suffix(".gzip")
            .tempfile_in(&self.work_dir)?
            .into_temp_path();
        Ok(path)
    }
}

#[async_trait]
impl ArchiveProducer for MongoDumpProducer {
    async fn produce(&self, target: &ConnectionTarget) -> Result<ArchivePayload, ProducerError> {
        let binary = self.resolve_binary()?;
        let archive_path = self.allocate_archive_path().await?;

        tracing::info!(
            binary = %binary.display(),
            archive = %archive_path.display(),
            target = %target,
            "Creating dump"
        );

        // a dropped future kills the dump and deletes `archive_path`
        let output = Command::new(&binary)
            .arg(format!("--archive={}", archive_path.display()))
            .arg("--gzip")
            .arg(format!("--uri={}", target.uri()))
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                ProducerError::DumpFailed(format!("Failed to execute {}: {}", binary.display(), e))
            })?;

        if !output.status.success() {
            return Err(ProducerError::DumpFailed(format!(
                "mongodump failed with status: {}\nStderr: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(ArchivePayload::File(archive_path))
    }

    async fn discard(&self, payload: ArchivePayload) -> Result<(), ProducerError> {
        if let ArchivePayload::File(path) = payload {
            let shown = path.display().to_string();
            match tokio::task::spawn_blocking(move || path.close()).await {
                Ok(Ok(())) => tracing::debug!(archive = %shown, "Deleted local archive"),
                Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {}
                Ok(Err(e)) => return Err(ProducerError::Io(e)),
                Err(e) => return Err(ProducerError::Io(std::io::Error::other(e))),
            }
        }
        Ok(())
    }
}
