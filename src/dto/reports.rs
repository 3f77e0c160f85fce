use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct AccountOrderSummary {
    pub account_id: i64,
    pub orders: i64,
    pub total_amount: i64,
    pub average_amount: f64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderRangeSummary {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub orders: i64,
    pub total_amount: i64,
}
