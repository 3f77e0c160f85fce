use retail_order_api::{
    db::{create_orm_conn, create_pool, run_migrations},
    dto::{
        categories::CreateCategoryRequest,
        orders::{CreateOrderRequest, OrderLineRequest},
        products::{CreateProductRequest, RestockRequest},
    },
    error::AppError,
    middleware::auth::AuthUser,
    models::Role,
    services::{category_service, order_service, product_service},
    state::AppState,
};
use retail_order_api::entity::users::ActiveModel as UserActive;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, Set};
use uuid::Uuid;

#[tokio::test]
async fn category_with_products_cannot_be_deleted() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let admin = admin_caller(&state).await?;
    let tag = Uuid::new_v4().simple().to_string();

    let category = category_service::create_category(
        &state,
        &admin,
        CreateCategoryRequest {
            name: format!("cat-{tag}"),
        },
    )
    .await?
    .data
    .expect("category");

    let product = product_service::create_product(
        &state,
        &admin,
        CreateProductRequest {
            name: format!("prod-{tag}"),
            description: None,
            price: 1000,
            stock: 5,
            category_id: Some(category.id),
        },
    )
    .await?
    .data
    .expect("product");

    let result = category_service::delete_category(&state, &admin, category.id).await;
    assert!(matches!(result, Err(AppError::BusinessRule(_))));

    // Once the product is gone the category can be removed.
    product_service::delete_product(&state, &admin, product.id).await?;
    category_service::delete_category(&state, &admin, category.id).await?;

    let lookup = category_service::get_category(&state, category.id).await;
    assert!(matches!(lookup, Err(AppError::NotFound("category"))));
    Ok(())
}

#[tokio::test]
async fn duplicate_category_names_are_rejected() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let admin = admin_caller(&state).await?;
    let name = format!("cat-{}", Uuid::new_v4().simple());

    category_service::create_category(&state, &admin, CreateCategoryRequest { name: name.clone() })
        .await?;
    let result =
        category_service::create_category(&state, &admin, CreateCategoryRequest { name }).await;
    assert!(matches!(result, Err(AppError::BusinessRule(_))));
    Ok(())
}

#[tokio::test]
async fn product_with_unknown_category_is_rejected() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let admin = admin_caller(&state).await?;

    let result = product_service::create_product(
        &state,
        &admin,
        CreateProductRequest {
            name: format!("orphan-{}", Uuid::new_v4().simple()),
            description: None,
            price: 1000,
            stock: 1,
            category_id: Some(i64::MAX),
        },
    )
    .await;
    assert!(matches!(result, Err(AppError::NotFound("category"))));
    Ok(())
}

#[tokio::test]
async fn restock_adjusts_and_guards_stock() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let admin = admin_caller(&state).await?;
    let product = product_service::create_product(
        &state,
        &admin,
        CreateProductRequest {
            name: format!("restock-{}", Uuid::new_v4().simple()),
            description: None,
            price: 1000,
            stock: 5,
            category_id: None,
        },
    )
    .await?
    .data
    .expect("product");

    let resp =
        product_service::restock(&state, &admin, product.id, RestockRequest { delta: 10 }).await?;
    assert_eq!(resp.data.expect("product").stock, 15);

    let zero = product_service::restock(&state, &admin, product.id, RestockRequest { delta: 0 }).await;
    assert!(matches!(zero, Err(AppError::Validation(_))));

    let negative =
        product_service::restock(&state, &admin, product.id, RestockRequest { delta: -20 }).await;
    assert!(matches!(negative, Err(AppError::BusinessRule(_))));

    let plain_user = AuthUser {
        account_id: admin.account_id,
        role: Role::User,
    };
    let forbidden =
        product_service::restock(&state, &plain_user, product.id, RestockRequest { delta: 1 }).await;
    assert!(matches!(forbidden, Err(AppError::Forbidden)));
    Ok(())
}

#[tokio::test]
async fn product_referenced_by_orders_cannot_be_deleted() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let admin = admin_caller(&state).await?;
    let product = product_service::create_product(
        &state,
        &admin,
        CreateProductRequest {
            name: format!("held-{}", Uuid::new_v4().simple()),
            description: None,
            price: 1000,
            stock: 5,
            category_id: None,
        },
    )
    .await?
    .data
    .expect("product");

    order_service::create_order(
        &state,
        admin.account_id,
        CreateOrderRequest {
            lines: vec![OrderLineRequest {
                product_id: product.id,
                quantity: 1,
            }],
        },
    )
    .await?;

    let result = product_service::delete_product(&state, &admin, product.id).await;
    assert!(matches!(result, Err(AppError::BusinessRule(_))));
    Ok(())
}

async fn setup_state() -> anyhow::Result<Option<AppState>> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run catalog tests."
            );
            return Ok(None);
        }
    };

    let pool = create_pool(&database_url).await?;
    run_migrations(&pool).await?;
    let orm = create_orm_conn(&database_url).await?;

    Ok(Some(AppState { pool, orm }))
}

async fn admin_caller(state: &AppState) -> anyhow::Result<AuthUser> {
    let tag = Uuid::new_v4().simple().to_string();
    let user = UserActive {
        id: NotSet,
        username: Set(format!("admin-{tag}")),
        email: Set(format!("{tag}@example.com")),
        password_hash: Set("dummy".into()),
        enabled: Set(true),
        role: Set("ADMIN".into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(AuthUser {
        account_id: user.id,
        role: Role::Admin,
    })
}
