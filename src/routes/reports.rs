use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};

use crate::{
    dto::{
        orders::OrderList,
        reports::{AccountOrderSummary, OrderRangeSummary},
    },
    error::AppResult,
    middleware::auth::{AuthUser, ensure_staff},
    response::ApiResponse,
    routes::params::{RangeQuery, TopOrdersQuery},
    services::order_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/accounts/{id}/summary", get(account_summary))
        .route("/orders/summary", get(range_summary))
        .route("/orders/top", get(top_orders))
}

#[utoipa::path(
    get,
    path = "/api/reports/accounts/{id}/summary",
    params(
        ("id" = i64, Path, description = "Account ID")
    ),
    responses(
        (status = 200, description = "Order count/sum/average for an account", body = ApiResponse<AccountOrderSummary>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn account_summary(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<AccountOrderSummary>>> {
    // Accounts may read their own summary; anything else is staff-only.
    if user.account_id != id {
        ensure_staff(&user)?;
    }
    let resp = order_service::account_summary(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/reports/orders/summary",
    params(
        ("from" = String, Query, description = "Range start (RFC 3339)"),
        ("to" = String, Query, description = "Range end (RFC 3339)")
    ),
    responses(
        (status = 200, description = "Order count/sum over a date range", body = ApiResponse<OrderRangeSummary>),
        (status = 400, description = "Invalid range"),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn range_summary(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<RangeQuery>,
) -> AppResult<Json<ApiResponse<OrderRangeSummary>>> {
    ensure_staff(&user)?;
    let resp = order_service::range_summary(&state, query.from, query.to).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/reports/orders/top",
    params(
        ("limit" = Option<u64>, Query, description = "Number of orders, default 10, max 100")
    ),
    responses(
        (status = 200, description = "Top orders by total amount", body = ApiResponse<OrderList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn top_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<TopOrdersQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    ensure_staff(&user)?;
    let resp = order_service::top_orders(&state, query.limit).await?;
    Ok(Json(resp))
}
