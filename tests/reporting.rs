use chrono::{Duration, TimeZone, Utc};
use retail_order_api::{
    db::{create_orm_conn, create_pool, run_migrations},
    dto::orders::{CreateOrderRequest, OrderLineRequest},
    entity::{
        orders::ActiveModel as OrderActive, products::ActiveModel as ProductActive,
        users::ActiveModel as UserActive,
    },
    error::AppError,
    services::order_service,
    state::AppState,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, Set};
use uuid::Uuid;

#[tokio::test]
async fn account_with_no_orders_reports_zeros() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let account_id = create_account(&state).await?;

    let resp = order_service::account_summary(&state, account_id).await?;
    let summary = resp.data.expect("summary");
    assert_eq!(summary.orders, 0);
    assert_eq!(summary.total_amount, 0);
    assert_eq!(summary.average_amount, 0.0);
    Ok(())
}

#[tokio::test]
async fn account_summary_counts_sums_and_averages() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let account_id = create_account(&state).await?;
    let product_id = create_product(&state, 500, 100).await?;

    order_service::create_order(
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
    order_service::create_order(
        &state,
        account_id,
        CreateOrderRequest {
            lines: vec![OrderLineRequest {
                product_id,
                quantity: 6,
            }],
        },
    )
    .await?;

    let resp = order_service::account_summary(&state, account_id).await?;
    let summary = resp.data.expect("summary");
    assert_eq!(summary.orders, 2);
    assert_eq!(summary.total_amount, 4000);
    assert_eq!(summary.average_amount, 2000.0);
    Ok(())
}

#[tokio::test]
async fn range_summary_counts_orders_inside_the_window() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let account_id = create_account(&state).await?;

    // Fixture orders are written with explicit timestamps inside a window
    // derived from the account id, so concurrent test runs against the same
    // database do not see each other's rows.
    let epoch = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).single().unwrap();
    let base = epoch + Duration::days(account_id % 9000);

    insert_order_at(&state, account_id, 111, base + Duration::hours(1)).await?;
    insert_order_at(&state, account_id, 222, base + Duration::hours(2)).await?;
    insert_order_at(&state, account_id, 999, base + Duration::days(2)).await?;

    let resp = order_service::range_summary(&state, base, base + Duration::days(1)).await?;
    let summary = resp.data.expect("summary");
    assert_eq!(summary.orders, 2);
    assert_eq!(summary.total_amount, 333);
    Ok(())
}

#[tokio::test]
async fn inverted_range_is_rejected() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let now = Utc::now();
    let result = order_service::range_summary(&state, now, now - Duration::hours(1)).await;
    assert!(matches!(result, Err(AppError::Validation(_))));
    Ok(())
}

#[tokio::test]
async fn top_orders_come_back_largest_first() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let account_id = create_account(&state).await?;
    let small = insert_order_at(&state, account_id, 10, Utc::now()).await?;
    let large = insert_order_at(&state, account_id, 30_000, Utc::now()).await?;
    let medium = insert_order_at(&state, account_id, 20_000, Utc::now()).await?;

    let resp = order_service::top_orders(&state, Some(100)).await?;
    let items = resp.data.expect("orders").items;

    for pair in items.windows(2) {
        assert!(pair[0].total_amount >= pair[1].total_amount);
    }

    let position = |id: i64| items.iter().position(|o| o.id == id);
    let (large_pos, medium_pos, small_pos) = (
        position(large).expect("large order listed"),
        position(medium).expect("medium order listed"),
        position(small).expect("small order listed"),
    );
    assert!(large_pos < medium_pos);
    assert!(medium_pos < small_pos);
    Ok(())
}

async fn setup_state() -> anyhow::Result<Option<AppState>> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run reporting tests."
            );
            return Ok(None);
        }
    };

    let pool = create_pool(&database_url).await?;
    run_migrations(&pool).await?;
    let orm = create_orm_conn(&database_url).await?;

    Ok(Some(AppState { pool, orm }))
}

async fn create_account(state: &AppState) -> anyhow::Result<i64> {
    let tag = Uuid::new_v4().simple().to_string();
    let user = UserActive {
        id: NotSet,
        username: Set(format!("report-{tag}")),
        email: Set(format!("{tag}@example.com")),
        password_hash: Set("dummy".into()),
        enabled: Set(true),
        role: Set("USER".into()),
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
        name: Set(format!("report-widget-{tag}")),
        description: Set(None),
        price: Set(price),
        stock: Set(stock),
        category_id: Set(None),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(product.id)
}

async fn insert_order_at(
    state: &AppState,
    account_id: i64,
    total_amount: i64,
    created_at: chrono::DateTime<Utc>,
) -> anyhow::Result<i64> {
    let tag = Uuid::new_v4().simple().to_string();
    let order = OrderActive {
        id: NotSet,
        user_id: Set(account_id),
        reference: Set(format!("TEST-{tag}")),
        total_amount: Set(total_amount),
        created_at: Set(created_at.into()),
    }
    .insert(&state.orm)
    .await?;

    Ok(order.id)
}
