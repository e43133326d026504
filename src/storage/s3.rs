// mongobackup/src/storage/s3.rs
use async_trait::async_trait;
use aws_sdk_s3 as s3;
use s3::config::Region;
use s3::config::http::HttpResponse;
use s3::error::{DisplayErrorContext, SdkError};
use s3::primitives::ByteStream;
use std::time::Instant;

use super::ObjectStore;
use crate::backup::archive::ArchivePayload;
use crate::config::S3Config;
use crate::errors::GatewayError;

/// S3 (or S3-compatible) bucket holding the archives.
#[derive(Clone)]
pub struct S3Gateway {
    client: s3::Client,
    bucket: String,
}

impl S3Gateway {
    /// Builds the client once from explicit configuration.
    pub async fn connect(config: &S3Config) -> Self {
        let mut loader = aws_config::defaults(s3::config::BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(s3::config::Credentials::new(
                &config.access_key_id,
                &config.secret_access_key,
                None,     // session_token
                None,     // expiry
                "Static", // provider_name
            ));
        if let Some(endpoint) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }
        let sdk_config = loader.load().await;

        // custom endpoints (MinIO, Spaces) generally want path-style addressing
        let s3_config = s3::config::Builder::from(&sdk_config)
            .force_path_style(config.endpoint_url.is_some())
            .build();

        S3Gateway {
            client: s3::Client::from_conf(s3_config),
            bucket: config.bucket_name.clone(),
        }
    }
}

fn status_of<E>(err: &SdkError<E, HttpResponse>) -> Option<u16> {
    err.raw_response().map(|response| response.status().as_u16())
}

#[async_trait]
impl ObjectStore for S3Gateway {
    async fn exists(&self, key: &str) -> Result<bool, GatewayError> {
        let result = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(err) => {
                let not_found = err.as_service_error().is_some_and(|e| e.is_not_found())
                    || status_of(&err) == Some(404);
                if not_found {
                    return Ok(false);
                }
                tracing::error!(
                    error = %DisplayErrorContext(&err),
                    bucket = %self.bucket,
                    key = %key,
                    "S3 existence check failed"
                );
                Err(GatewayError::Unavailable(DisplayErrorContext(&err).to_string()))
            }
        }
    }

    async fn put(&self, key: &str, payload: &ArchivePayload) -> Result<(), GatewayError> {
        let start = Instant::now();
        let body = match payload {
            ArchivePayload::File(path) => ByteStream::from_path(path).await.map_err(|e| {
                GatewayError::UploadFailed(format!(
                    "Failed to create ByteStream from file {}: {}",
                    path.display(),
                    e
                ))
            })?,
            ArchivePayload::Memory(bytes) => ByteStream::from(bytes.clone()),
        };

        let result = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .if_none_match("*")
            .send()
            .await;

        if let Err(err) = result {
            // 412 when the key exists; 409 when a concurrent conditional write won
            if matches!(status_of(&err), Some(412 | 409)) {
                tracing::warn!(bucket = %self.bucket, key = %key, "S3 object already present, upload skipped");
                return Err(GatewayError::AlreadyExists(key.to_string()));
            }
            tracing::error!(
                error = %DisplayErrorContext(&err),
                bucket = %self.bucket,
                key = %key,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 upload failed"
            );
            return Err(GatewayError::UploadFailed(DisplayErrorContext(&err).to_string()));
        }

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<ArchivePayload, GatewayError> {
        let start = Instant::now();
        let object = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| {
                if err.as_service_error().is_some_and(|e| e.is_no_such_key())
                    || status_of(&err) == Some(404)
                {
                    GatewayError::NotFound(key.to_string())
                } else {
                    GatewayError::Unavailable(DisplayErrorContext(&err).to_string())
                }
            })?;

        let bytes = object
            .body
            .collect()
            .await
            .map_err(|e| GatewayError::Unavailable(format!("Failed to read object body: {}", e)))?
            .into_bytes();

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            size_bytes = bytes.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 download successful"
        );
        Ok(ArchivePayload::Memory(bytes.to_vec()))
    }
}
