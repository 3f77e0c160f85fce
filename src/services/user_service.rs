use chrono::Utc;
use sea_orm::Set;

use crate::{
    audit::log_audit,
    dto::users::{UpdateUserRequest, UserList},
    entity::users::{ActiveModel, Model as UserModel},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::User,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
    store,
};

pub async fn list_users(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<UserList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = pagination.normalize();

    let (items, total) = store::accounts::page(&state.orm, limit as u64, offset as u64).await?;

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Users",
        UserList {
            items: items.into_iter().map(user_from_entity).collect(),
        },
        Some(meta),
    ))
}

pub async fn get_user(state: &AppState, user: &AuthUser, id: i64) -> AppResult<ApiResponse<User>> {
    ensure_admin(user)?;
    let account = store::accounts::find_by_id(&state.orm, id)
        .await?
        .ok_or(AppError::NotFound("account"))?;
    Ok(ApiResponse::success(
        "User",
        user_from_entity(account),
        None,
    ))
}

/// Enable/disable an account or change its role. Disabled accounts keep
/// their orders; they just cannot place new ones.
pub async fn update_user(
    state: &AppState,
    user: &AuthUser,
    id: i64,
    payload: UpdateUserRequest,
) -> AppResult<ApiResponse<User>> {
    ensure_admin(user)?;

    let existing = store::accounts::find_by_id(&state.orm, id)
        .await?
        .ok_or(AppError::NotFound("account"))?;

    let mut active: ActiveModel = existing.into();
    if let Some(enabled) = payload.enabled {
        active.enabled = Set(enabled);
    }
    if let Some(role) = payload.role {
        active.role = Set(role.as_str().to_string());
    }

    let updated = store::accounts::update(&state.orm, active).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.account_id),
        "user_update",
        Some("users"),
        Some(serde_json::json!({ "target_user_id": updated.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Updated",
        user_from_entity(updated),
        Some(Meta::empty()),
    ))
}

fn user_from_entity(model: UserModel) -> User {
    User {
        id: model.id,
        username: model.username,
        email: model.email,
        enabled: model.enabled,
        role: model.role,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
