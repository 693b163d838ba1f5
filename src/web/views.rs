//! 伺服器端產生的 HTML 頁面。所有使用者資料都經過 [`escape`]。

use crate::core::front_desk::CustomerForm;
use crate::core::Receipt;

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        escape(title),
        body
    )
}

pub fn capture_page() -> String {
    layout(
        "Capture Plate",
        "<h1>Capture License Plate</h1>\n\
         <form method=\"post\" action=\"/\">\n\
         <button type=\"submit\">Capture</button>\n\
         </form>",
    )
}

pub fn customer_page(form: &CustomerForm, error: Option<&str>) -> String {
    let plate = escape(form.plate.as_str());
    let info = form.info.clone().unwrap_or_default();

    let mut body = format!("<h1>Customer Information for {plate}</h1>\n");
    if let Some(message) = error {
        body.push_str(&format!("<p class=\"error\">{}</p>\n", escape(message)));
    }
    body.push_str(&format!("<form method=\"post\" action=\"/customer/{plate}\">\n"));
    for (field, label, value) in [
        ("name", "Name", &info.name),
        ("phone", "Phone", &info.phone),
        ("email", "Email", &info.email),
        ("year", "Year", &info.year),
        ("make", "Make", &info.make),
        ("model", "Model", &info.model),
    ] {
        body.push_str(&format!(
            "<label>{label} <input name=\"{field}\" value=\"{}\"></label><br>\n",
            escape(value)
        ));
    }
    body.push_str("<button type=\"submit\">Save</button>\n</form>");

    layout("Customer Information", &body)
}

pub fn receipt_page(receipt: &Receipt) -> String {
    let customer = &receipt.customer;
    let vehicle = &receipt.vehicle;
    let plate = escape(&vehicle.license_plate);

    let mut body = format!(
        "<h1>Receipt</h1>\n\
         <p>Customer: {} ({}, {})</p>\n\
         <p>Vehicle: {} ({plate})</p>\n\
         <img src=\"{}\" alt=\"Barcode for {plate}\">\n",
        escape(&customer.name),
        escape(&customer.phone),
        escape(&customer.email),
        escape(&vehicle.description()),
        escape(&receipt.barcode_url),
    );

    if !receipt.other_vehicles.is_empty() {
        body.push_str("<h2>Other vehicles on file</h2>\n<ul>\n");
        for other in &receipt.other_vehicles {
            body.push_str(&format!(
                "<li>{} ({})</li>\n",
                escape(&other.description()),
                escape(&other.license_plate)
            ));
        }
        body.push_str("</ul>\n");
    }

    layout("Receipt", &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Customer, CustomerInfo, LicensePlate, Vehicle};
    use chrono::Utc;

    #[test]
    fn test_escape() {
        assert_eq!(
            escape("<b>\"Tom & Jerry's\"</b>"),
            "&lt;b&gt;&quot;Tom &amp; Jerry&#39;s&quot;&lt;/b&gt;"
        );
    }

    #[test]
    fn test_customer_page_prefills_and_escapes() {
        let form = CustomerForm {
            plate: LicensePlate::parse("ABC123").unwrap(),
            info: Some(CustomerInfo {
                name: "<script>".to_string(),
                ..CustomerInfo::default()
            }),
        };

        let html = customer_page(&form, Some("Invalid email: cannot be empty"));

        assert!(html.contains("action=\"/customer/ABC123\""));
        assert!(html.contains("value=\"&lt;script&gt;\""));
        assert!(!html.contains("<script>"));
        assert!(html.contains("Invalid email: cannot be empty"));
    }

    #[test]
    fn test_receipt_page_lists_vehicle_and_other_vehicles() {
        let now = Utc::now();
        let vehicle = |id: i64, plate: &str, make: &str| Vehicle {
            id,
            year: "2020".to_string(),
            make: make.to_string(),
            model: "Civic".to_string(),
            license_plate: plate.to_string(),
            customer_id: 1,
            created_at: now,
            updated_at: now,
            last_receipt_at: None,
        };
        let receipt = Receipt {
            customer: Customer {
                id: 1,
                name: "Tom & Jerry".to_string(),
                phone: "555-0100".to_string(),
                email: "tom@example.com".to_string(),
                created_at: now,
                updated_at: now,
            },
            vehicle: vehicle(1, "ABC123", "Honda"),
            other_vehicles: vec![vehicle(2, "XYZ789", "<Ford>")],
            barcode_file: "ABC123.png".to_string(),
            barcode_url: "/static/barcodes/ABC123.png".to_string(),
        };

        let html = receipt_page(&receipt);

        assert!(html.contains("<p>Customer: Tom &amp; Jerry (555-0100, tom@example.com)</p>"));
        assert!(html.contains("<p>Vehicle: 2020 Honda Civic (ABC123)</p>"));
        assert!(html.contains("<img src=\"/static/barcodes/ABC123.png\" alt=\"Barcode for ABC123\">"));
        assert!(html.contains("<li>2020 &lt;Ford&gt; Civic (XYZ789)</li>"));
    }
}
