use crate::utils::error::{CarwashError, Result};
use crate::utils::validation::{
    validate_email, validate_max_len, validate_model_year, validate_required_text, Validate,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const MAX_PLATE_LEN: usize = 16;

/// 車牌：正規化後的車輛外部識別鍵，也用來命名條碼檔
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct LicensePlate(String);

impl LicensePlate {
    pub fn parse(raw: &str) -> Result<Self> {
        let plate = raw.trim().to_ascii_uppercase();

        if plate.is_empty() {
            return Err(CarwashError::invalid_input("license plate", "cannot be empty"));
        }
        if plate.len() > MAX_PLATE_LEN {
            return Err(CarwashError::invalid_input(
                "license plate",
                format!("must be at most {} characters", MAX_PLATE_LEN),
            ));
        }
        if !plate.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(CarwashError::invalid_input(
                "license plate",
                "may only contain letters, digits and '-'",
            ));
        }

        Ok(Self(plate))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LicensePlate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: i64,
    pub year: String,
    pub make: String,
    pub model: String,
    pub license_plate: String,
    pub customer_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_receipt_at: Option<DateTime<Utc>>,
}

impl Vehicle {
    /// 例如 "2020 Honda Civic"
    pub fn description(&self) -> String {
        format!("{} {} {}", self.year, self.make, self.model)
    }
}

/// 客戶資料表單送出的欄位；缺欄位交給 validate 回報
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomerInfo {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub year: String,
    pub make: String,
    pub model: String,
}

impl CustomerInfo {
    /// 去除前後空白，email 轉小寫
    pub fn normalized(&self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            phone: self.phone.trim().to_string(),
            email: self.email.trim().to_lowercase(),
            year: self.year.trim().to_string(),
            make: self.make.trim().to_string(),
            model: self.model.trim().to_string(),
        }
    }

    pub fn prefilled(customer: &Customer, vehicle: &Vehicle) -> Self {
        Self {
            name: customer.name.clone(),
            phone: customer.phone.clone(),
            email: customer.email.clone(),
            year: vehicle.year.clone(),
            make: vehicle.make.clone(),
            model: vehicle.model.clone(),
        }
    }
}

impl Validate for CustomerInfo {
    fn validate(&self) -> Result<()> {
        validate_required_text("name", &self.name, 128)?;
        validate_max_len("phone", &self.phone, 64)?;
        validate_email("email", &self.email)?;
        validate_model_year("year", &self.year)?;
        validate_required_text("make", &self.make, 128)?;
        validate_required_text("model", &self.model, 128)?;
        Ok(())
    }
}

/// 一次客戶資料送出（upsert）的結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisitOutcome {
    pub customer_id: i64,
    pub vehicle_id: i64,
    pub customer_created: bool,
    pub vehicle_created: bool,
    /// 車輛換手前的車主；新車或車主不變時為 None
    pub previous_owner: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlateState {
    Unknown,
    Recorded,
    Receipted,
}

impl PlateState {
    pub fn of(vehicle: Option<&Vehicle>) -> Self {
        match vehicle {
            None => PlateState::Unknown,
            Some(v) if v.last_receipt_at.is_some() => PlateState::Receipted,
            Some(_) => PlateState::Recorded,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Receipt {
    pub customer: Customer,
    pub vehicle: Vehicle,
    /// 同一客戶名下的其他車輛
    pub other_vehicles: Vec<Vehicle>,
    pub barcode_file: String,
    pub barcode_url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlateStatus {
    pub plate: LicensePlate,
    pub state: PlateState,
    pub vehicle: Option<Vehicle>,
    pub customer: Option<Customer>,
}
