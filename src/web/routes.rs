use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form, Json,
};

use crate::core::front_desk::CustomerForm;
use crate::core::{CustomerInfo, LicensePlate, PlateStatus};
use crate::utils::error::{CarwashError, Result};

use super::{views, AppState};

pub async fn capture_form() -> Html<String> {
    Html(views::capture_page())
}

pub async fn capture_submit(State(state): State<Arc<AppState>>) -> Redirect {
    let plate = state.desk.capture();
    Redirect::to(&format!("/customer/{plate}"))
}

pub async fn customer_form(
    State(state): State<Arc<AppState>>,
    Path(plate): Path<String>,
) -> Result<Html<String>> {
    let plate = LicensePlate::parse(&plate)?;
    let form = state.desk.customer_form(&plate).await?;
    Ok(Html(views::customer_page(&form, None)))
}

pub async fn submit_customer_info(
    State(state): State<Arc<AppState>>,
    Path(plate): Path<String>,
    Form(info): Form<CustomerInfo>,
) -> Result<Response> {
    let plate = LicensePlate::parse(&plate)?;

    match state.desk.submit_customer_info(&plate, &info).await {
        Ok(_) => Ok(Redirect::to(&format!("/receipt/{plate}")).into_response()),
        // 表單錯誤：帶著原本輸入的值重新顯示表單
        Err(e @ CarwashError::InvalidInput { .. }) => {
            tracing::debug!("Rejected customer info for {}: {}", plate, e);
            let form = CustomerForm {
                plate,
                info: Some(info),
            };
            let page = views::customer_page(&form, Some(&e.user_friendly_message()));
            Ok((StatusCode::BAD_REQUEST, Html(page)).into_response())
        }
        Err(e) => Err(e),
    }
}

pub async fn receipt(
    State(state): State<Arc<AppState>>,
    Path(plate): Path<String>,
) -> Result<Html<String>> {
    let plate = LicensePlate::parse(&plate)?;
    let receipt = state.desk.receipt(&plate).await?;
    Ok(Html(views::receipt_page(&receipt)))
}

pub async fn plate_status(
    State(state): State<Arc<AppState>>,
    Path(plate): Path<String>,
) -> Result<Json<PlateStatus>> {
    let plate = LicensePlate::parse(&plate)?;
    Ok(Json(state.desk.plate_status(&plate).await?))
}
