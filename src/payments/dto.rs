use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

/// Request body for creating a payment. `user_id` is the owner the payment
/// is recorded for, which is not necessarily the caller.
#[derive(Debug, Deserialize)]
pub struct CreatePaymentRequest {
    #[serde(with = "iso_date")]
    pub paid_on: Date,
    pub amount: Decimal,
    pub method: String,
    pub description: Option<String>,
    pub location: String,
    pub user_id: i64,
}

/// Partial update. Absent fields keep their current value; ownership and the
/// active flag are not editable through this path.
#[derive(Debug, Deserialize)]
pub struct UpdatePaymentRequest {
    #[serde(with = "iso_date::option", default)]
    pub paid_on: Option<Date>,
    pub amount: Option<Decimal>,
    pub method: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
}

/// Query parameters for listing payments.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub user_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct Confirmation {
    pub message: &'static str,
}
