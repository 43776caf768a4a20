use serde::Deserialize;
use std::path::PathBuf;

/// Allow-listed media types for uploads
pub const ALLOWED_MEDIA_TYPES: [&str; 3] = ["image/jpeg", "image/jpg", "image/png"];

/// File extensions the blob store may have persisted under
pub const KNOWN_EXTENSIONS: [&str; 2] = ["jpg", "png"];

/// Map an allow-listed media type to its storage extension
pub fn extension_for_media_type(media_type: &str) -> Option<&'static str> {
    match media_type.to_ascii_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        _ => None,
    }
}

/// Main configuration for the analysis service
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Service configuration
    #[serde(default)]
    pub service: ServiceConfig,
    /// Storage configuration
    #[serde(default)]
    pub storage: StorageConfig,
    /// Upload validation configuration
    #[serde(default)]
    pub upload: UploadConfig,
    /// API configuration
    #[serde(default)]
    pub api: ApiConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Service name for logging/metrics
    #[serde(default = "default_service_name")]
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Metrics port
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
}

/// Filesystem storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Base directory for all persisted state
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl StorageConfig {
    /// Directory holding raw image blobs
    pub fn images_dir(&self) -> PathBuf {
        self.data_dir.join("images")
    }

    /// Directory holding analysis result records
    pub fn analysis_dir(&self) -> PathBuf {
        self.data_dir.join("analysis")
    }
}

/// Upload validation configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    /// Maximum upload size in bytes (5MiB default)
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

/// API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// API listen address
    #[serde(default = "default_api_host")]
    pub host: String,
    /// API listen port
    #[serde(default = "default_api_port")]
    pub port: u16,
    /// Enable CORS
    #[serde(default = "default_true")]
    pub cors_enabled: bool,
    /// Allowed CORS origins (empty = any)
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

// Default value functions
fn default_service_name() -> String {
    "image-analysis-service".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_metrics_port() -> u16 {
    9090
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_max_upload_bytes() -> usize {
    5 * 1024 * 1024 // 5MiB
}

fn default_api_host() -> String {
    "0.0.0.0".to_string()
}

fn default_api_port() -> u16 {
    8080
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from environment and config files
    pub fn load() -> anyhow::Result<Self> {
        let config = config::Config::builder()
            // Add config file if present
            .add_source(config::File::with_name("config/analysis").required(false))
            .add_source(config::File::with_name("/etc/image-analysis/analysis").required(false))
            // Override with environment variables
            // ANALYSIS__UPLOAD__MAX_UPLOAD_BYTES -> upload.max_upload_bytes
            .add_source(
                config::Environment::with_prefix("ANALYSIS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize().map_err(Into::into)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: ServiceConfig::default(),
            storage: StorageConfig::default(),
            upload: UploadConfig::default(),
            api: ApiConfig::default(),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
            metrics_port: default_metrics_port(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_api_host(),
            port: default_api_port(),
            cors_enabled: default_true(),
            cors_origins: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        assert_eq!(default_max_upload_bytes(), 5 * 1024 * 1024);
        assert_eq!(default_api_port(), 8080);
        assert_eq!(default_metrics_port(), 9090);
    }

    #[test]
    fn test_storage_dirs_derive_from_data_dir() {
        let storage = StorageConfig {
            data_dir: PathBuf::from("/var/lib/analysis"),
        };
        assert_eq!(storage.images_dir(), PathBuf::from("/var/lib/analysis/images"));
        assert_eq!(
            storage.analysis_dir(),
            PathBuf::from("/var/lib/analysis/analysis")
        );
    }

    #[test]
    fn test_extension_for_media_type() {
        assert_eq!(extension_for_media_type("image/jpeg"), Some("jpg"));
        assert_eq!(extension_for_media_type("image/jpg"), Some("jpg"));
        assert_eq!(extension_for_media_type("IMAGE/PNG"), Some("png"));
        assert_eq!(extension_for_media_type("text/plain"), None);
    }
}
