//! Storage backend configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Storage backend selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageConfig {
    /// Local filesystem storage.
    Filesystem {
        /// Root directory for stored objects.
        path: PathBuf,
    },
    /// S3-compatible object storage.
    S3 {
        bucket: String,
        /// Custom endpoint for S3-compatible services (e.g. MinIO).
        #[serde(default)]
        endpoint: Option<String>,
        #[serde(default)]
        region: Option<String>,
        /// Key prefix inside the bucket.
        #[serde(default)]
        prefix: Option<String>,
        #[serde(default)]
        access_key_id: Option<String>,
        #[serde(default)]
        secret_access_key: Option<String>,
        /// Path-style URLs, required for MinIO.
        #[serde(default)]
        force_path_style: bool,
    },
    /// In-memory storage. Nothing persists past the process; intended for
    /// tests and demos.
    Memory,
}

impl StorageConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            StorageConfig::Filesystem { path } => {
                if path.as_os_str().is_empty() {
                    return Err("filesystem storage requires a non-empty path".to_string());
                }
                Ok(())
            }
            StorageConfig::S3 {
                bucket,
                access_key_id,
                secret_access_key,
                ..
            } => {
                if bucket.is_empty() {
                    return Err("s3 storage requires a bucket name".to_string());
                }
                if access_key_id.is_some() != secret_access_key.is_some() {
                    return Err(
                        "s3 storage requires both access_key_id and secret_access_key when either is set"
                            .to_string(),
                    );
                }
                Ok(())
            }
            StorageConfig::Memory => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_tagged_backends() {
        let config: StorageConfig =
            serde_json::from_str(r#"{"backend": "filesystem", "path": "/var/wiki"}"#).unwrap();
        assert!(matches!(config, StorageConfig::Filesystem { .. }));

        let config: StorageConfig =
            serde_json::from_str(r#"{"backend": "s3", "bucket": "wiki", "force_path_style": true}"#)
                .unwrap();
        assert!(matches!(config, StorageConfig::S3 { .. }));

        let config: StorageConfig = serde_json::from_str(r#"{"backend": "memory"}"#).unwrap();
        assert!(matches!(config, StorageConfig::Memory));
    }

    #[test]
    fn validate_rejects_partial_credentials() {
        let config = StorageConfig::S3 {
            bucket: "wiki".to_string(),
            endpoint: None,
            region: None,
            prefix: None,
            access_key_id: Some("access".to_string()),
            secret_access_key: None,
            force_path_style: false,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_bucket() {
        let config = StorageConfig::S3 {
            bucket: String::new(),
            endpoint: None,
            region: None,
            prefix: None,
            access_key_id: None,
            secret_access_key: None,
            force_path_style: false,
        };
        assert!(config.validate().is_err());
    }
}
