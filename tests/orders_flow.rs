use retail_order_api::{
    db::{create_orm_conn, create_pool, run_migrations},
    dto::orders::{CreateOrderRequest, OrderLineRequest},
    entity::{
        order_lines::{Column as OrderLineCol, Entity as OrderLines},
        products::{ActiveModel as ProductActive, Entity as Products},
        users::ActiveModel as UserActive,
    },
    error::AppError,
    middleware::auth::AuthUser,
    models::Role,
    routes::params::{OrderListQuery, Pagination},
    services::order_service,
    state::AppState,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};
use uuid::Uuid;

// Each test seeds its own uniquely named account/products so the suite can
// run against a shared database without cross-test interference.

#[tokio::test]
async fn scenario_a_create_order_decrements_stock_and_totals() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let account_id = create_account(&state, "USER", true).await?;
    let product_id = create_product(&state, 5000, 10).await?;

    let resp = order_service::create_order(
        &state,
        account_id,
        CreateOrderRequest {
            lines: vec![OrderLineRequest {
                product_id,
                quantity: 3,
            }],
        },
    )
    .await?;

    let data = resp.data.expect("order data");
    assert_eq!(data.order.total_amount, 15000);
    assert!(data.order.id > 0);
    assert_eq!(data.lines.len(), 1);
    assert!(data.lines[0].id > 0);
    assert_eq!(data.lines[0].quantity, 3);
    assert_eq!(data.lines[0].unit_price, 5000);
    assert_eq!(data.lines[0].subtotal, 15000);

    assert_eq!(product_stock(&state, product_id).await?, 7);
    Ok(())
}

#[tokio::test]
async fn scenario_b_insufficient_stock_leaves_stock_untouched() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let account_id = create_account(&state, "USER", true).await?;
    let product_id = create_product(&state, 5000, 7).await?;

    let result = order_service::create_order(
        &state,
        account_id,
        CreateOrderRequest {
            lines: vec![OrderLineRequest {
                product_id,
                quantity: 9999,
            }],
        },
    )
    .await;

    match result {
        Err(AppError::InsufficientStock {
            requested,
            available,
            ..
        }) => {
            assert_eq!(requested, 9999);
            assert_eq!(available, 7);
        }
        other => panic!("expected insufficient stock, got {other:?}"),
    }

    assert_eq!(product_stock(&state, product_id).await?, 7);
    Ok(())
}

#[tokio::test]
async fn scenario_c_cancel_restores_stock_and_removes_order() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let account_id = create_account(&state, "USER", true).await?;
    let product_id = create_product(&state, 5000, 10).await?;
    let caller = AuthUser {
        account_id,
        role: Role::User,
    };

    let resp = order_service::create_order(
        &state,
        account_id,
        CreateOrderRequest {
            lines: vec![OrderLineRequest {
                product_id,
                quantity: 3,
            }],
        },
    )
    .await?;
    let order = resp.data.expect("order data").order;
    assert_eq!(product_stock(&state, product_id).await?, 7);

    order_service::cancel_order(&state, &caller, order.id).await?;

    assert_eq!(product_stock(&state, product_id).await?, 10);

    let lookup = order_service::get_order(&state, &caller, order.id).await;
    assert!(matches!(lookup, Err(AppError::NotFound("order"))));

    let remaining = OrderLines::find()
        .filter(OrderLineCol::OrderId.eq(order.id))
        .count(&state.orm)
        .await?;
    assert_eq!(remaining, 0);
    Ok(())
}

#[tokio::test]
async fn scenario_d_empty_order_is_rejected_up_front() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let account_id = create_account(&state, "USER", true).await?;

    let result =
        order_service::create_order(&state, account_id, CreateOrderRequest { lines: vec![] }).await;
    assert!(matches!(result, Err(AppError::Validation(_))));
    Ok(())
}

#[tokio::test]
async fn scenario_e_disabled_account_cannot_order() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let account_id = create_account(&state, "USER", false).await?;
    let product_id = create_product(&state, 5000, 10).await?;

    let result = order_service::create_order(
        &state,
        account_id,
        CreateOrderRequest {
            lines: vec![OrderLineRequest {
                product_id,
                quantity: 1,
            }],
        },
    )
    .await;

    assert!(matches!(result, Err(AppError::BusinessRule(_))));
    assert_eq!(product_stock(&state, product_id).await?, 10);
    Ok(())
}

#[tokio::test]
async fn non_positive_quantity_is_rejected_up_front() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let account_id = create_account(&state, "USER", true).await?;
    let product_id = create_product(&state, 5000, 10).await?;

    let result = order_service::create_order(
        &state,
        account_id,
        CreateOrderRequest {
            lines: vec![OrderLineRequest {
                product_id,
                quantity: 0,
            }],
        },
    )
    .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
    assert_eq!(product_stock(&state, product_id).await?, 10);
    Ok(())
}

#[tokio::test]
async fn failure_on_later_line_rolls_back_earlier_lines() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let account_id = create_account(&state, "USER", true).await?;
    let first = create_product(&state, 1000, 10).await?;
    let second = create_product(&state, 2000, 1).await?;
    let caller = AuthUser {
        account_id,
        role: Role::User,
    };

    let result = order_service::create_order(
        &state,
        account_id,
        CreateOrderRequest {
            lines: vec![
                OrderLineRequest {
                    product_id: first,
                    quantity: 2,
                },
                OrderLineRequest {
                    product_id: second,
                    quantity: 5,
                },
            ],
        },
    )
    .await;

    assert!(matches!(result, Err(AppError::InsufficientStock { .. })));

    // The first line's decrement must have been rolled back with the rest.
    assert_eq!(product_stock(&state, first).await?, 10);
    assert_eq!(product_stock(&state, second).await?, 1);

    let list = order_service::list_orders(
        &state,
        &caller,
        OrderListQuery {
            pagination: Pagination {
                page: None,
                per_page: None,
            },
            sort_order: None,
        },
    )
    .await?;
    assert!(list.data.expect("order list").items.is_empty());
    Ok(())
}

#[tokio::test]
async fn duplicate_product_lines_share_the_same_stock() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let account_id = create_account(&state, "USER", true).await?;
    let product_id = create_product(&state, 1000, 5).await?;

    let result = order_service::create_order(
        &state,
        account_id,
        CreateOrderRequest {
            lines: vec![
                OrderLineRequest {
                    product_id,
                    quantity: 3,
                },
                OrderLineRequest {
                    product_id,
                    quantity: 3,
                },
            ],
        },
    )
    .await;

    match result {
        Err(AppError::InsufficientStock { available, .. }) => {
            // The second line sees what the first line left over.
            assert_eq!(available, 2);
        }
        other => panic!("expected insufficient stock, got {other:?}"),
    }

    assert_eq!(product_stock(&state, product_id).await?, 5);
    Ok(())
}

#[tokio::test]
async fn price_change_after_creation_does_not_touch_the_order() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let account_id = create_account(&state, "USER", true).await?;
    let product_id = create_product(&state, 5000, 10).await?;
    let caller = AuthUser {
        account_id,
        role: Role::User,
    };

    let resp = order_service::create_order(
        &state,
        account_id,
        CreateOrderRequest {
            lines: vec![OrderLineRequest {
                product_id,
                quantity: 2,
            }],
        },
    )
    .await?;
    let order = resp.data.expect("order data").order;

    let product = Products::find_by_id(product_id)
        .one(&state.orm)
        .await?
        .expect("product exists");
    let mut active: ProductActive = product.into();
    active.price = Set(9999);
    active.update(&state.orm).await?;

    let reread = order_service::get_order(&state, &caller, order.id).await?;
    let data = reread.data.expect("order data");
    assert_eq!(data.order.total_amount, 10000);
    assert_eq!(data.lines[0].unit_price, 5000);
    assert_eq!(data.lines[0].subtotal, 10000);
    Ok(())
}

#[tokio::test]
async fn users_cannot_cancel_other_accounts_orders() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let owner_id = create_account(&state, "USER", true).await?;
    let other_id = create_account(&state, "USER", true).await?;
    let product_id = create_product(&state, 5000, 10).await?;

    let resp = order_service::create_order(
        &state,
        owner_id,
        CreateOrderRequest {
            lines: vec![OrderLineRequest {
                product_id,
                quantity: 1,
            }],
        },
    )
    .await?;
    let order = resp.data.expect("order data").order;

    let intruder = AuthUser {
        account_id: other_id,
        role: Role::User,
    };
    let result = order_service::cancel_order(&state, &intruder, order.id).await;
    assert!(matches!(result, Err(AppError::Forbidden)));

    // Still there, stock still decremented.
    assert_eq!(product_stock(&state, product_id).await?, 9);
    Ok(())
}

#[tokio::test]
async fn cancelling_unknown_order_is_not_found() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let account_id = create_account(&state, "ADMIN", true).await?;
    let caller = AuthUser {
        account_id,
        role: Role::Admin,
    };

    let result = order_service::cancel_order(&state, &caller, i64::MAX).await;
    assert!(matches!(result, Err(AppError::NotFound("order"))));
    Ok(())
}

async fn setup_state() -> anyhow::Result<Option<AppState>> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(None);
        }
    };

    let pool = create_pool(&database_url).await?;
    run_migrations(&pool).await?;
    let orm = create_orm_conn(&database_url).await?;

    Ok(Some(AppState { pool, orm }))
}

async fn create_account(state: &AppState, role: &str, enabled: bool) -> anyhow::Result<i64> {
    let tag = Uuid::new_v4().simple().to_string();
    let user = UserActive {
        id: NotSet,
        username: Set(format!("user-{tag}")),
        email: Set(format!("{tag}@example.com")),
        password_hash: Set("dummy".into()),
        enabled: Set(enabled),
        role: Set(role.into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(user.id)
}

async fn create_product(state: &AppState, price: i64, stock: i32) -> anyhow::Result<i64> {
    let tag = Uuid::new_v4().simple().to_string();
    let product = ProductActive {
        id: NotSet,
        name: Set(format!("widget-{tag}")),
        description: Set(Some("A product for testing".into())),
        price: Set(price),
        stock: Set(stock),
        category_id: Set(None),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(product.id)
}

async fn product_stock(state: &AppState, id: i64) -> anyhow::Result<i32> {
    let product = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .expect("product exists");
    Ok(product.stock)
}
