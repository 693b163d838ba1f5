use crate::domain::model::{Customer, CustomerInfo, LicensePlate, Vehicle, VisitOutcome};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::Path;

/// 客戶與車輛的持久化邊界；每個寫入操作都是獨立的交易
#[async_trait]
pub trait CustomerStore: Send + Sync {
    async fn find_customer_by_email(&self, email: &str) -> Result<Option<Customer>>;
    async fn find_customer(&self, id: i64) -> Result<Option<Customer>>;
    async fn find_vehicle_by_plate(&self, plate: &LicensePlate) -> Result<Option<Vehicle>>;
    async fn vehicles_for_customer(&self, customer_id: i64) -> Result<Vec<Vehicle>>;

    /// 以 email 找出或建立客戶，再以車牌新增或覆寫車輛並指向該客戶。
    /// 全部成功才 commit，失敗則整筆 rollback。
    async fn record_visit(&self, plate: &LicensePlate, info: &CustomerInfo)
        -> Result<VisitOutcome>;

    /// 記錄開出收據的時間並回傳該時間
    async fn mark_receipted(&self, plate: &LicensePlate) -> Result<DateTime<Utc>>;
}

#[async_trait]
pub trait BarcodeRenderer: Send + Sync {
    /// 產生車牌條碼圖檔，回傳檔名
    async fn render(&self, plate: &LicensePlate) -> Result<String>;
    fn public_url(&self, filename: &str) -> String;
}

pub trait ConfigProvider: Send + Sync {
    fn bind_address(&self) -> &str;
    fn database_path(&self) -> &Path;
    fn busy_timeout_ms(&self) -> u64;
    fn barcode_dir(&self) -> &Path;
    fn barcode_url_prefix(&self) -> &str;
    fn barcode_height(&self) -> u32;
    fn placeholder_plate(&self) -> &str;
}
