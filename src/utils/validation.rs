use crate::utils::error::{CarwashError, Result};
use std::net::SocketAddr;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_bind_address(field_name: &str, address: &str) -> Result<SocketAddr> {
    address
        .parse::<SocketAddr>()
        .map_err(|e| CarwashError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: address.to_string(),
            reason: format!("Invalid socket address: {}", e),
        })
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(CarwashError::MissingConfigError {
            field: field_name.to_string(),
        });
    }

    if path.contains('\0') {
        return Err(CarwashError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_url_prefix(field_name: &str, prefix: &str) -> Result<()> {
    if !prefix.starts_with('/') || prefix.len() < 2 {
        return Err(CarwashError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: prefix.to_string(),
            reason: "Prefix must start with '/' and name a sub path".to_string(),
        });
    }
    if prefix.ends_with('/') {
        return Err(CarwashError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: prefix.to_string(),
            reason: "Prefix must not end with '/'".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(CarwashError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

// 以下為表單欄位檢查，錯誤回 400

pub fn validate_required_text(field_name: &str, value: &str, max_len: usize) -> Result<()> {
    if value.trim().is_empty() {
        return Err(CarwashError::invalid_input(field_name, "cannot be empty"));
    }
    validate_max_len(field_name, value, max_len)
}

pub fn validate_max_len(field_name: &str, value: &str, max_len: usize) -> Result<()> {
    if value.chars().count() > max_len {
        return Err(CarwashError::invalid_input(
            field_name,
            format!("must be at most {} characters", max_len),
        ));
    }
    Ok(())
}

pub fn validate_email(field_name: &str, value: &str) -> Result<()> {
    validate_required_text(field_name, value, 128)?;

    let mut parts = value.splitn(2, '@');
    let local = parts.next().unwrap_or_default();
    let domain = parts.next().unwrap_or_default();
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(CarwashError::invalid_input(
            field_name,
            "must look like name@example.com",
        ));
    }
    if value.chars().any(char::is_whitespace) {
        return Err(CarwashError::invalid_input(
            field_name,
            "must not contain spaces",
        ));
    }
    Ok(())
}

pub fn validate_model_year(field_name: &str, value: &str) -> Result<()> {
    if value.len() != 4 || !value.chars().all(|c| c.is_ascii_digit()) {
        return Err(CarwashError::invalid_input(
            field_name,
            "must be a four digit year",
        ));
    }
    Ok(())
}
