use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Alias, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, FromQueryResult,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

use crate::entity::{
    order_lines::{
        ActiveModel as OrderLineActive, Column as OrderLineCol, Entity as OrderLines,
        Model as OrderLineModel,
    },
    orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
};

/// Line data handed to the store by the fulfillment engine. `unit_price` is
/// the snapshot observed at validation time, not a live product read.
#[derive(Debug)]
pub struct NewOrderLine {
    pub product_id: i64,
    pub quantity: i32,
    pub unit_price: i64,
}

/// Count/sum aggregate over a set of orders. `total` is `None` when no rows
/// matched; callers treat that as zero.
#[derive(Debug, FromQueryResult)]
pub struct OrderTotals {
    pub orders: i64,
    pub total: Option<i64>,
}

pub async fn save_with_lines<C: ConnectionTrait>(
    conn: &C,
    user_id: i64,
    reference: String,
    total_amount: i64,
    lines: Vec<NewOrderLine>,
) -> Result<(OrderModel, Vec<OrderLineModel>), DbErr> {
    let order = OrderActive {
        id: NotSet,
        user_id: Set(user_id),
        reference: Set(reference),
        total_amount: Set(total_amount),
        created_at: NotSet,
    }
    .insert(conn)
    .await?;

    let mut saved = Vec::with_capacity(lines.len());
    for line in lines {
        let model = OrderLineActive {
            id: NotSet,
            order_id: Set(order.id),
            product_id: Set(line.product_id),
            quantity: Set(line.quantity),
            unit_price: Set(line.unit_price),
            created_at: NotSet,
        }
        .insert(conn)
        .await?;
        saved.push(model);
    }

    Ok((order, saved))
}

pub async fn find_by_id<C: ConnectionTrait>(
    conn: &C,
    id: i64,
) -> Result<Option<OrderModel>, DbErr> {
    Orders::find_by_id(id).one(conn).await
}

pub async fn find_for_update<C: ConnectionTrait>(
    conn: &C,
    id: i64,
) -> Result<Option<OrderModel>, DbErr> {
    Orders::find_by_id(id).lock(LockType::Update).one(conn).await
}

pub async fn lines_for_order<C: ConnectionTrait>(
    conn: &C,
    order_id: i64,
) -> Result<Vec<OrderLineModel>, DbErr> {
    OrderLines::find()
        .filter(OrderLineCol::OrderId.eq(order_id))
        .order_by_asc(OrderLineCol::Id)
        .all(conn)
        .await
}

/// Lines have no lifecycle of their own; deleting an order deletes them in
/// the same unit of work.
pub async fn delete_with_lines<C: ConnectionTrait>(conn: &C, order_id: i64) -> Result<(), DbErr> {
    OrderLines::delete_many()
        .filter(OrderLineCol::OrderId.eq(order_id))
        .exec(conn)
        .await?;
    Orders::delete_by_id(order_id).exec(conn).await?;
    Ok(())
}

pub async fn page_for_account<C: ConnectionTrait>(
    conn: &C,
    user_id: i64,
    limit: u64,
    offset: u64,
    newest_first: bool,
) -> Result<(Vec<OrderModel>, i64), DbErr> {
    let mut finder = Orders::find().filter(OrderCol::UserId.eq(user_id));
    finder = if newest_first {
        finder.order_by_desc(OrderCol::CreatedAt)
    } else {
        finder.order_by_asc(OrderCol::CreatedAt)
    };

    let total = finder.clone().count(conn).await? as i64;
    let items = finder.limit(limit).offset(offset).all(conn).await?;
    Ok((items, total))
}

pub async fn totals_for_account<C: ConnectionTrait>(
    conn: &C,
    user_id: i64,
) -> Result<OrderTotals, DbErr> {
    let row = Orders::find()
        .select_only()
        .column_as(OrderCol::Id.count(), "orders")
        // SUM over BIGINT yields NUMERIC in Postgres; cast back so it decodes
        // as i64.
        .column_as(
            OrderCol::TotalAmount.sum().cast_as(Alias::new("BIGINT")),
            "total",
        )
        .filter(OrderCol::UserId.eq(user_id))
        .into_model::<OrderTotals>()
        .one(conn)
        .await?;

    Ok(row.unwrap_or(OrderTotals {
        orders: 0,
        total: None,
    }))
}

pub async fn totals_in_range<C: ConnectionTrait>(
    conn: &C,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<OrderTotals, DbErr> {
    let row = Orders::find()
        .select_only()
        .column_as(OrderCol::Id.count(), "orders")
        .column_as(
            OrderCol::TotalAmount.sum().cast_as(Alias::new("BIGINT")),
            "total",
        )
        .filter(OrderCol::CreatedAt.between(from, to))
        .into_model::<OrderTotals>()
        .one(conn)
        .await?;

    Ok(row.unwrap_or(OrderTotals {
        orders: 0,
        total: None,
    }))
}

pub async fn top_by_total<C: ConnectionTrait>(
    conn: &C,
    limit: u64,
) -> Result<Vec<OrderModel>, DbErr> {
    Orders::find()
        .order_by_desc(OrderCol::TotalAmount)
        .order_by_asc(OrderCol::Id)
        .limit(limit)
        .all(conn)
        .await
}
