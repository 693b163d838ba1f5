use crate::core::{BarcodeRenderer, CustomerStore};
use crate::domain::model::{
    CustomerInfo, LicensePlate, PlateState, PlateStatus, Receipt, VisitOutcome,
};
use crate::utils::error::{CarwashError, Result};
use crate::utils::validation::Validate;

/// 客戶資料表單：車牌已知時帶入既有資料
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerForm {
    pub plate: LicensePlate,
    pub info: Option<CustomerInfo>,
}

pub struct FrontDesk<S: CustomerStore, B: BarcodeRenderer> {
    store: S,
    barcodes: B,
    placeholder_plate: LicensePlate,
}

impl<S: CustomerStore, B: BarcodeRenderer> FrontDesk<S, B> {
    pub fn new(store: S, barcodes: B, placeholder_plate: LicensePlate) -> Self {
        Self {
            store,
            barcodes,
            placeholder_plate,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// 車牌辨識尚未實作，永遠回傳設定中的預設車牌
    pub fn capture(&self) -> LicensePlate {
        tracing::debug!("Plate capture stub returning {}", self.placeholder_plate);
        self.placeholder_plate.clone()
    }

    pub async fn customer_form(&self, plate: &LicensePlate) -> Result<CustomerForm> {
        let info = match self.store.find_vehicle_by_plate(plate).await? {
            Some(vehicle) => self
                .store
                .find_customer(vehicle.customer_id)
                .await?
                .map(|customer| CustomerInfo::prefilled(&customer, &vehicle)),
            None => None,
        };

        Ok(CustomerForm {
            plate: plate.clone(),
            info,
        })
    }

    pub async fn submit_customer_info(
        &self,
        plate: &LicensePlate,
        info: &CustomerInfo,
    ) -> Result<VisitOutcome> {
        let info = info.normalized();
        info.validate()?;

        let outcome = self.store.record_visit(plate, &info).await?;

        if let Some(previous_owner) = outcome.previous_owner {
            tracing::info!(
                "🔁 Vehicle {} reassigned from customer {} to {}",
                plate,
                previous_owner,
                outcome.customer_id
            );
        } else if outcome.vehicle_created {
            tracing::info!(
                "🚗 Vehicle {} recorded for customer {}",
                plate,
                outcome.customer_id
            );
        } else {
            tracing::info!("🚗 Vehicle {} updated", plate);
        }

        Ok(outcome)
    }

    pub async fn receipt(&self, plate: &LicensePlate) -> Result<Receipt> {
        let mut vehicle = self
            .store
            .find_vehicle_by_plate(plate)
            .await?
            .ok_or_else(|| CarwashError::VehicleNotFound {
                plate: plate.to_string(),
            })?;

        let customer = self
            .store
            .find_customer(vehicle.customer_id)
            .await?
            .ok_or_else(|| CarwashError::CustomerNotFound {
                plate: plate.to_string(),
            })?;

        let barcode_file = self.barcodes.render(plate).await?;
        let barcode_url = self.barcodes.public_url(&barcode_file);
        vehicle.last_receipt_at = Some(self.store.mark_receipted(plate).await?);

        let other_vehicles = self
            .store
            .vehicles_for_customer(customer.id)
            .await?
            .into_iter()
            .filter(|v| v.id != vehicle.id)
            .collect();

        tracing::info!("🧾 Receipt rendered for {}", plate);

        Ok(Receipt {
            customer,
            vehicle,
            other_vehicles,
            barcode_file,
            barcode_url,
        })
    }

    pub async fn plate_status(&self, plate: &LicensePlate) -> Result<PlateStatus> {
        let vehicle = self.store.find_vehicle_by_plate(plate).await?;
        let customer = match &vehicle {
            Some(v) => self.store.find_customer(v.customer_id).await?,
            None => None,
        };

        Ok(PlateStatus {
            plate: plate.clone(),
            state: PlateState::of(vehicle.as_ref()),
            vehicle,
            customer,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Customer, Vehicle};
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    /// 只記錄呼叫的假條碼產生器
    #[derive(Clone, Default)]
    struct MockBarcodes {
        rendered: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl BarcodeRenderer for MockBarcodes {
        async fn render(&self, plate: &LicensePlate) -> Result<String> {
            self.rendered.lock().await.push(plate.to_string());
            Ok(format!("{}.png", plate))
        }

        fn public_url(&self, filename: &str) -> String {
            format!("/static/barcodes/{}", filename)
        }
    }

    #[derive(Clone, Default)]
    struct MockStore {
        customers: Arc<Mutex<HashMap<i64, Customer>>>,
        vehicles: Arc<Mutex<HashMap<String, Vehicle>>>,
        fail_writes: bool,
    }

    impl MockStore {
        fn failing() -> Self {
            Self {
                fail_writes: true,
                ..Self::default()
            }
        }

        /// 模擬車主資料遺失的情況
        async fn insert_orphan_vehicle(&self, plate: &str) {
            let now = Utc::now();
            self.vehicles.lock().await.insert(
                plate.to_string(),
                Vehicle {
                    id: 99,
                    year: "2019".to_string(),
                    make: "Ford".to_string(),
                    model: "Focus".to_string(),
                    license_plate: plate.to_string(),
                    customer_id: 42,
                    created_at: now,
                    updated_at: now,
                    last_receipt_at: None,
                },
            );
        }
    }

    #[async_trait]
    impl CustomerStore for MockStore {
        async fn find_customer_by_email(&self, email: &str) -> Result<Option<Customer>> {
            let customers = self.customers.lock().await;
            Ok(customers.values().find(|c| c.email == email).cloned())
        }

        async fn find_customer(&self, id: i64) -> Result<Option<Customer>> {
            Ok(self.customers.lock().await.get(&id).cloned())
        }

        async fn find_vehicle_by_plate(&self, plate: &LicensePlate) -> Result<Option<Vehicle>> {
            Ok(self.vehicles.lock().await.get(plate.as_str()).cloned())
        }

        async fn vehicles_for_customer(&self, customer_id: i64) -> Result<Vec<Vehicle>> {
            let vehicles = self.vehicles.lock().await;
            Ok(vehicles
                .values()
                .filter(|v| v.customer_id == customer_id)
                .cloned()
                .collect())
        }

        async fn record_visit(
            &self,
            plate: &LicensePlate,
            info: &CustomerInfo,
        ) -> Result<VisitOutcome> {
            if self.fail_writes {
                return Err(CarwashError::DatabaseError(
                    rusqlite::Error::SqliteFailure(
                        rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_FULL),
                        Some("database or disk is full".to_string()),
                    ),
                ));
            }

            let now = Utc::now();
            let mut customers = self.customers.lock().await;
            let mut vehicles = self.vehicles.lock().await;

            let existing = customers.values().find(|c| c.email == info.email).cloned();
            let customer_created = existing.is_none();
            let customer = existing.unwrap_or_else(|| Customer {
                id: customers.len() as i64 + 1,
                name: info.name.clone(),
                phone: info.phone.clone(),
                email: info.email.clone(),
                created_at: now,
                updated_at: now,
            });
            customers.insert(customer.id, customer.clone());

            let previous = vehicles.get(plate.as_str()).cloned();
            let vehicle_id = previous
                .as_ref()
                .map(|v| v.id)
                .unwrap_or(vehicles.len() as i64 + 1);
            vehicles.insert(
                plate.to_string(),
                Vehicle {
                    id: vehicle_id,
                    year: info.year.clone(),
                    make: info.make.clone(),
                    model: info.model.clone(),
                    license_plate: plate.to_string(),
                    customer_id: customer.id,
                    created_at: now,
                    updated_at: now,
                    last_receipt_at: None,
                },
            );

            Ok(VisitOutcome {
                customer_id: customer.id,
                vehicle_id,
                customer_created,
                vehicle_created: previous.is_none(),
                previous_owner: previous
                    .map(|v| v.customer_id)
                    .filter(|owner| *owner != customer.id),
            })
        }

        async fn mark_receipted(&self, plate: &LicensePlate) -> Result<DateTime<Utc>> {
            let mut vehicles = self.vehicles.lock().await;
            let vehicle = vehicles
                .get_mut(plate.as_str())
                .ok_or_else(|| CarwashError::VehicleNotFound {
                    plate: plate.to_string(),
                })?;
            let now = Utc::now();
            vehicle.last_receipt_at = Some(now);
            Ok(now)
        }
    }

    fn plate(raw: &str) -> LicensePlate {
        LicensePlate::parse(raw).unwrap()
    }

    fn jane() -> CustomerInfo {
        CustomerInfo {
            name: "Jane Doe".to_string(),
            phone: "555-0100".to_string(),
            email: "Jane@Example.com".to_string(),
            year: "2020".to_string(),
            make: "Honda".to_string(),
            model: "Civic".to_string(),
        }
    }

    fn desk(store: MockStore) -> (FrontDesk<MockStore, MockBarcodes>, MockBarcodes) {
        let barcodes = MockBarcodes::default();
        let desk = FrontDesk::new(store, barcodes.clone(), plate("ABC123"));
        (desk, barcodes)
    }

    #[tokio::test]
    async fn test_capture_returns_placeholder_plate() {
        let (desk, _) = desk(MockStore::default());
        assert_eq!(desk.capture().as_str(), "ABC123");
    }

    #[tokio::test]
    async fn test_submit_then_receipt() {
        let (desk, barcodes) = desk(MockStore::default());
        let abc = plate("ABC123");

        let outcome = desk.submit_customer_info(&abc, &jane()).await.unwrap();
        assert!(outcome.customer_created);
        assert!(outcome.vehicle_created);

        let receipt = desk.receipt(&abc).await.unwrap();
        assert_eq!(receipt.customer.name, "Jane Doe");
        assert_eq!(receipt.customer.email, "jane@example.com");
        assert_eq!(receipt.vehicle.description(), "2020 Honda Civic");
        assert_eq!(receipt.barcode_file, "ABC123.png");
        assert_eq!(receipt.barcode_url, "/static/barcodes/ABC123.png");
        assert!(receipt.other_vehicles.is_empty());
        assert_eq!(*barcodes.rendered.lock().await, vec!["ABC123".to_string()]);
    }

    #[tokio::test]
    async fn test_receipt_carries_receipt_time() {
        let store = MockStore::default();
        let (desk, _) = desk(store.clone());
        let abc = plate("ABC123");
        desk.submit_customer_info(&abc, &jane()).await.unwrap();

        let receipt = desk.receipt(&abc).await.unwrap();

        let stored = store.vehicles.lock().await.get("ABC123").cloned().unwrap();
        assert!(receipt.vehicle.last_receipt_at.is_some());
        assert_eq!(receipt.vehicle.last_receipt_at, stored.last_receipt_at);
    }

    #[tokio::test]
    async fn test_receipt_for_unknown_plate_is_not_found() {
        let (desk, barcodes) = desk(MockStore::default());

        let result = desk.receipt(&plate("NOPE1")).await;

        assert!(matches!(result, Err(CarwashError::VehicleNotFound { .. })));
        assert!(barcodes.rendered.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_receipt_for_orphan_vehicle_is_customer_not_found() {
        let store = MockStore::default();
        store.insert_orphan_vehicle("ORPHAN1").await;
        let (desk, _) = desk(store);

        let result = desk.receipt(&plate("ORPHAN1")).await;

        assert!(matches!(result, Err(CarwashError::CustomerNotFound { .. })));
    }

    #[tokio::test]
    async fn test_invalid_info_never_reaches_store() {
        let store = MockStore::default();
        let (desk, _) = desk(store.clone());
        let mut info = jane();
        info.email = "not-an-email".to_string();

        let result = desk.submit_customer_info(&plate("ABC123"), &info).await;

        assert!(matches!(result, Err(CarwashError::InvalidInput { .. })));
        assert!(store.vehicles.lock().await.is_empty());
        assert!(store.customers.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_is_surfaced() {
        let (desk, _) = desk(MockStore::failing());

        let err = desk
            .submit_customer_info(&plate("ABC123"), &jane())
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.user_friendly_message().contains("disk is full"));
    }

    #[tokio::test]
    async fn test_customer_form_prefills_known_plate() {
        let (desk, _) = desk(MockStore::default());
        let abc = plate("ABC123");

        assert_eq!(desk.customer_form(&abc).await.unwrap().info, None);

        desk.submit_customer_info(&abc, &jane()).await.unwrap();
        let form = desk.customer_form(&abc).await.unwrap();
        let info = form.info.unwrap();
        assert_eq!(info.name, "Jane Doe");
        assert_eq!(info.model, "Civic");
    }

    #[tokio::test]
    async fn test_plate_state_transitions() {
        let (desk, _) = desk(MockStore::default());
        let abc = plate("ABC123");

        assert_eq!(desk.plate_status(&abc).await.unwrap().state, PlateState::Unknown);

        desk.submit_customer_info(&abc, &jane()).await.unwrap();
        assert_eq!(desk.plate_status(&abc).await.unwrap().state, PlateState::Recorded);

        desk.receipt(&abc).await.unwrap();
        assert_eq!(desk.plate_status(&abc).await.unwrap().state, PlateState::Receipted);

        desk.submit_customer_info(&abc, &jane()).await.unwrap();
        assert_eq!(desk.plate_status(&abc).await.unwrap().state, PlateState::Recorded);
    }
}
