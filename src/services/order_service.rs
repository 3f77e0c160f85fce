use chrono::{DateTime, Utc};
use sea_orm::TransactionTrait;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::{
        orders::{CreateOrderRequest, OrderList, OrderWithLines},
        reports::{AccountOrderSummary, OrderRangeSummary},
    },
    entity::{order_lines::Model as OrderLineModel, orders::Model as OrderModel},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Order, OrderLine, Role},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    state::AppState,
    store,
};

/// Create an order for `account_id` from the submitted lines, inside one
/// transaction: validate, lock and decrement stock per line, snapshot the
/// unit price, persist order and lines, commit. Any failure before the
/// commit drops the transaction and rolls everything back, including stock
/// decrements already applied for earlier lines.
pub async fn create_order(
    state: &AppState,
    account_id: i64,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<OrderWithLines>> {
    if payload.lines.is_empty() {
        return Err(AppError::Validation(
            "order must contain at least one line".into(),
        ));
    }
    for line in &payload.lines {
        if line.quantity <= 0 {
            return Err(AppError::Validation(format!(
                "quantity must be positive for product {}",
                line.product_id
            )));
        }
    }

    let txn = state.orm.begin().await?;

    let account = store::accounts::find_by_id(&txn, account_id)
        .await?
        .ok_or(AppError::NotFound("account"))?;
    if !account.enabled {
        return Err(AppError::BusinessRule(format!(
            "account {} is disabled",
            account.username
        )));
    }

    let mut total_amount: i64 = 0;
    let mut new_lines = Vec::with_capacity(payload.lines.len());

    for line in &payload.lines {
        // The row lock is held until commit, so the price read here cannot
        // change for the rest of the request, and a later line for the same
        // product sees the stock this one already took.
        let product = store::catalog::find_for_update(&txn, line.product_id)
            .await?
            .ok_or(AppError::NotFound("product"))?;

        if line.quantity > product.stock {
            return Err(AppError::InsufficientStock {
                product: product.name,
                requested: line.quantity,
                available: product.stock,
            });
        }

        store::catalog::adjust_stock(&txn, product.id, -line.quantity).await?;

        total_amount += product.price * line.quantity as i64;
        new_lines.push(store::orders::NewOrderLine {
            product_id: product.id,
            quantity: line.quantity,
            unit_price: product.price,
        });
    }

    let (order, lines) = store::orders::save_with_lines(
        &txn,
        account.id,
        build_reference(),
        total_amount,
        new_lines,
    )
    .await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(account.id),
        "order_create",
        Some("orders"),
        Some(serde_json::json!({
            "order_id": order.id,
            "total_amount": order.total_amount,
        })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Order created",
        OrderWithLines {
            order: order_from_entity(order),
            lines: lines.into_iter().map(line_from_entity).collect(),
        },
        Some(Meta::empty()),
    ))
}

/// Exact inverse of creation: restore stock for every line, then delete the
/// order together with its lines. There is no soft-cancel state.
pub async fn cancel_order(
    state: &AppState,
    user: &AuthUser,
    order_id: i64,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let txn = state.orm.begin().await?;

    let order = store::orders::find_for_update(&txn, order_id)
        .await?
        .ok_or(AppError::NotFound("order"))?;
    if user.role == Role::User && order.user_id != user.account_id {
        return Err(AppError::Forbidden);
    }

    let lines = store::orders::lines_for_order(&txn, order.id).await?;
    for line in &lines {
        // A line whose product no longer resolves is a data integrity
        // defect, not a caller error.
        let product = store::catalog::find_for_update(&txn, line.product_id)
            .await?
            .ok_or_else(|| {
                AppError::BusinessRule(format!(
                    "order line {} references a missing product",
                    line.id
                ))
            })?;
        store::catalog::adjust_stock(&txn, product.id, line.quantity).await?;
    }

    store::orders::delete_with_lines(&txn, order.id).await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.account_id),
        "order_cancel",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Order cancelled",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination.normalize();
    let newest_first = !matches!(query.sort_order, Some(SortOrder::Asc));

    let (items, total) = store::orders::page_for_account(
        &state.orm,
        user.account_id,
        limit as u64,
        offset as u64,
        newest_first,
    )
    .await?;

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Ok",
        OrderList {
            items: items.into_iter().map(order_from_entity).collect(),
        },
        Some(meta),
    ))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: i64,
) -> AppResult<ApiResponse<OrderWithLines>> {
    let order = store::orders::find_by_id(&state.orm, id)
        .await?
        .ok_or(AppError::NotFound("order"))?;
    if user.role == Role::User && order.user_id != user.account_id {
        return Err(AppError::Forbidden);
    }

    let lines = store::orders::lines_for_order(&state.orm, order.id).await?;

    Ok(ApiResponse::success(
        "OK",
        OrderWithLines {
            order: order_from_entity(order),
            lines: lines.into_iter().map(line_from_entity).collect(),
        },
        Some(Meta::empty()),
    ))
}

pub async fn account_summary(
    state: &AppState,
    account_id: i64,
) -> AppResult<ApiResponse<AccountOrderSummary>> {
    let totals = store::orders::totals_for_account(&state.orm, account_id).await?;

    let total_amount = totals.total.unwrap_or(0);
    let average_amount = if totals.orders == 0 {
        0.0
    } else {
        total_amount as f64 / totals.orders as f64
    };

    Ok(ApiResponse::success(
        "Account summary",
        AccountOrderSummary {
            account_id,
            orders: totals.orders,
            total_amount,
            average_amount,
        },
        Some(Meta::empty()),
    ))
}

pub async fn range_summary(
    state: &AppState,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> AppResult<ApiResponse<OrderRangeSummary>> {
    if to < from {
        return Err(AppError::Validation(
            "invalid date range: to precedes from".into(),
        ));
    }

    let totals = store::orders::totals_in_range(&state.orm, from, to).await?;

    Ok(ApiResponse::success(
        "Range summary",
        OrderRangeSummary {
            from,
            to,
            orders: totals.orders,
            total_amount: totals.total.unwrap_or(0),
        },
        Some(Meta::empty()),
    ))
}

pub async fn top_orders(
    state: &AppState,
    limit: Option<u64>,
) -> AppResult<ApiResponse<OrderList>> {
    let limit = limit.unwrap_or(10).clamp(1, 100);
    let items = store::orders::top_by_total(&state.orm, limit).await?;

    Ok(ApiResponse::success(
        "Top orders",
        OrderList {
            items: items.into_iter().map(order_from_entity).collect(),
        },
        Some(Meta::empty()),
    ))
}

fn order_from_entity(model: OrderModel) -> Order {
    Order {
        id: model.id,
        user_id: model.user_id,
        reference: model.reference,
        total_amount: model.total_amount,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

fn line_from_entity(model: OrderLineModel) -> OrderLine {
    OrderLine {
        id: model.id,
        order_id: model.order_id,
        product_id: model.product_id,
        quantity: model.quantity,
        unit_price: model.unit_price,
        subtotal: model.unit_price * model.quantity as i64,
    }
}

fn build_reference() -> String {
    let date = Utc::now().format("%Y%m%d");
    let suffix = Uuid::new_v4().to_string();
    let short = &suffix[..8];
    format!("ORD-{}-{}", date, short)
}
