use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QuerySelect,
};

use crate::entity::{
    categories::{Column as CategoryCol, Entity as Categories, Model as CategoryModel},
    order_lines::{Column as OrderLineCol, Entity as OrderLines},
    products::{Column as ProdCol, Entity as Products, Model as ProductModel},
};

pub async fn find_by_id<C: ConnectionTrait>(
    conn: &C,
    id: i64,
) -> Result<Option<ProductModel>, DbErr> {
    Products::find_by_id(id).one(conn).await
}

/// Resolve a product holding a row lock until the surrounding transaction
/// ends. The fulfillment engine locks before the stock check so concurrent
/// orders for the same product serialize instead of both reading the same
/// stock value.
pub async fn find_for_update<C: ConnectionTrait>(
    conn: &C,
    id: i64,
) -> Result<Option<ProductModel>, DbErr> {
    Products::find_by_id(id)
        .lock(LockType::Update)
        .one(conn)
        .await
}

/// Relative stock update, `stock = stock + delta`. The store applies whatever
/// delta it is given; non-negativity is the caller's validation.
pub async fn adjust_stock<C: ConnectionTrait>(conn: &C, id: i64, delta: i32) -> Result<(), DbErr> {
    Products::update_many()
        .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).add(delta))
        .filter(ProdCol::Id.eq(id))
        .exec(conn)
        .await?;
    Ok(())
}

pub async fn count_in_category<C: ConnectionTrait>(
    conn: &C,
    category_id: i64,
) -> Result<u64, DbErr> {
    Products::find()
        .filter(ProdCol::CategoryId.eq(category_id))
        .count(conn)
        .await
}

pub async fn count_lines_for_product<C: ConnectionTrait>(
    conn: &C,
    product_id: i64,
) -> Result<u64, DbErr> {
    OrderLines::find()
        .filter(OrderLineCol::ProductId.eq(product_id))
        .count(conn)
        .await
}

pub async fn find_category_by_id<C: ConnectionTrait>(
    conn: &C,
    id: i64,
) -> Result<Option<CategoryModel>, DbErr> {
    Categories::find_by_id(id).one(conn).await
}

pub async fn find_category_by_name<C: ConnectionTrait>(
    conn: &C,
    name: &str,
) -> Result<Option<CategoryModel>, DbErr> {
    Categories::find()
        .filter(CategoryCol::Name.eq(name))
        .one(conn)
        .await
}
