use crate::adapters::barcode::DEFAULT_BAR_HEIGHT;
use crate::core::{ConfigProvider, LicensePlate};
use crate::utils::error::{CarwashError, Result};
use crate::utils::validation::{
    validate_bind_address, validate_path, validate_range, validate_url_prefix, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub barcode: BarcodeConfig,
    pub capture: CaptureConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:5000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("carwash.db"),
            busy_timeout_ms: 5_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BarcodeConfig {
    pub directory: PathBuf,
    pub url_prefix: String,
    pub height: u32,
}

impl Default for BarcodeConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("static/barcodes"),
            url_prefix: "/static/barcodes".to_string(),
            height: DEFAULT_BAR_HEIGHT,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub placeholder_plate: String,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            placeholder_plate: "ABC123".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub verbose: bool,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(CarwashError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| CarwashError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${CARWASH_DB})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| CarwashError::ConfigValidationError {
            field: "environment".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validate_bind_address("server.bind", &self.server.bind)?;

        validate_path("database.path", &self.database.path.to_string_lossy())?;
        validate_range("database.busy_timeout_ms", self.database.busy_timeout_ms, 0, 600_000)?;

        validate_path("barcode.directory", &self.barcode.directory.to_string_lossy())?;
        validate_url_prefix("barcode.url_prefix", &self.barcode.url_prefix)?;
        validate_range("barcode.height", self.barcode.height, 10, 1_000)?;

        LicensePlate::parse(&self.capture.placeholder_plate).map_err(|e| {
            CarwashError::InvalidConfigValueError {
                field: "capture.placeholder_plate".to_string(),
                value: self.capture.placeholder_plate.clone(),
                reason: e.user_friendly_message(),
            }
        })?;

        Ok(())
    }
}

impl ConfigProvider for TomlConfig {
    fn bind_address(&self) -> &str {
        &self.server.bind
    }

    fn database_path(&self) -> &Path {
        &self.database.path
    }

    fn busy_timeout_ms(&self) -> u64 {
        self.database.busy_timeout_ms
    }

    fn barcode_dir(&self) -> &Path {
        &self.barcode.directory
    }

    fn barcode_url_prefix(&self) -> &str {
        &self.barcode.url_prefix
    }

    fn barcode_height(&self) -> u32 {
        self.barcode.height
    }

    fn placeholder_plate(&self) -> &str {
        &self.capture.placeholder_plate
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
