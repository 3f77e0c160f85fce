use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QueryOrder, QuerySelect,
};

use crate::entity::users::{ActiveModel, Column, Entity as Users, Model as UserModel};

pub async fn find_by_id<C: ConnectionTrait>(conn: &C, id: i64) -> Result<Option<UserModel>, DbErr> {
    Users::find_by_id(id).one(conn).await
}

pub async fn page<C: ConnectionTrait>(
    conn: &C,
    limit: u64,
    offset: u64,
) -> Result<(Vec<UserModel>, i64), DbErr> {
    let finder = Users::find().order_by_asc(Column::Id);
    let total = finder.clone().count(conn).await? as i64;
    let items = finder.limit(limit).offset(offset).all(conn).await?;
    Ok((items, total))
}

pub async fn update<C: ConnectionTrait>(
    conn: &C,
    active: ActiveModel,
) -> Result<UserModel, DbErr> {
    active.update(conn).await
}
