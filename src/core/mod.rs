pub mod front_desk;

pub use crate::domain::model::{
    Customer, CustomerInfo, LicensePlate, PlateState, PlateStatus, Receipt, Vehicle, VisitOutcome,
};
pub use crate::domain::ports::{BarcodeRenderer, ConfigProvider, CustomerStore};
pub use crate::utils::error::Result;
