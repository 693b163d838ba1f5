use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CarwashError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Barcode generation failed for plate {plate}: {message}")]
    BarcodeError { plate: String, message: String },

    #[error("Background task failed: {0}")]
    TaskError(#[from] tokio::task::JoinError),

    #[error("Internal error: {message}")]
    InternalError { message: String },

    #[error("Vehicle not found: {plate}")]
    VehicleNotFound { plate: String },

    #[error("Customer not found for vehicle {plate}")]
    CustomerNotFound { plate: String },

    #[error("Invalid {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid configuration value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

pub type Result<T> = std::result::Result<T, CarwashError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Persistence,
    NotFound,
    Input,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl CarwashError {
    pub fn invalid_input(field: &str, reason: impl Into<String>) -> Self {
        CarwashError::InvalidInput {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        CarwashError::InternalError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            CarwashError::DatabaseError(_)
            | CarwashError::IoError(_)
            | CarwashError::BarcodeError { .. } => ErrorCategory::Persistence,
            CarwashError::TaskError(_) | CarwashError::InternalError { .. } => {
                ErrorCategory::System
            }
            CarwashError::VehicleNotFound { .. } | CarwashError::CustomerNotFound { .. } => {
                ErrorCategory::NotFound
            }
            CarwashError::InvalidInput { .. } => ErrorCategory::Input,
            CarwashError::ConfigValidationError { .. }
            | CarwashError::InvalidConfigValueError { .. }
            | CarwashError::MissingConfigError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::NotFound | ErrorCategory::Input => ErrorSeverity::Low,
            ErrorCategory::Persistence => ErrorSeverity::Medium,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self.category() {
            ErrorCategory::NotFound => StatusCode::NOT_FOUND,
            ErrorCategory::Input => StatusCode::BAD_REQUEST,
            ErrorCategory::Persistence
            | ErrorCategory::Configuration
            | ErrorCategory::System => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 給使用者看的訊息，不含 SQL、檔案路徑等內部細節
    pub fn user_friendly_message(&self) -> String {
        match self {
            CarwashError::DatabaseError(_) => {
                "The request could not be completed. Nothing was changed.".to_string()
            }
            CarwashError::IoError(_) | CarwashError::BarcodeError { .. } => {
                "The receipt barcode could not be generated.".to_string()
            }
            CarwashError::TaskError(_) | CarwashError::InternalError { .. } => {
                "An unexpected error occurred.".to_string()
            }
            CarwashError::VehicleNotFound { .. } => "Vehicle not found".to_string(),
            CarwashError::CustomerNotFound { .. } => "Customer not found".to_string(),
            CarwashError::InvalidInput { field, reason } => format!("Invalid {field}: {reason}"),
            CarwashError::ConfigValidationError { field, message } => {
                format!("Configuration problem in {field}: {message}")
            }
            CarwashError::InvalidConfigValueError { field, reason, .. } => {
                format!("Configuration value for {field} is invalid: {reason}")
            }
            CarwashError::MissingConfigError { field } => {
                format!("Configuration value {field} is required")
            }
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Persistence => "Submit the form again; check disk space and database permissions if it keeps failing",
            ErrorCategory::NotFound => "Enter the customer information for this plate first",
            ErrorCategory::Input => "Correct the highlighted field and submit again",
            ErrorCategory::Configuration => "Check the configuration file and command line flags",
            ErrorCategory::System => "Check the server logs for details",
        }
    }
}

impl IntoResponse for CarwashError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // 完整錯誤只寫進 log
        match self.severity() {
            ErrorSeverity::Low => tracing::debug!("Request rejected: {}", self),
            _ => tracing::error!(
                "❌ Request failed: {} (Category: {:?}, Severity: {:?})",
                self,
                self.category(),
                self.severity()
            ),
        }

        (status, self.user_friendly_message()).into_response()
    }
}
