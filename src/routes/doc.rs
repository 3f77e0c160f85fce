use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        categories::{CategoryList, CreateCategoryRequest, UpdateCategoryRequest},
        orders::{CreateOrderRequest, OrderLineRequest, OrderList, OrderWithLines},
        products::{CreateProductRequest, ProductList, RestockRequest, UpdateProductRequest},
        reports::{AccountOrderSummary, OrderRangeSummary},
        users::{UpdateUserRequest, UserList},
    },
    models::{Category, Order, OrderLine, Product, Role, User},
    response::{ApiResponse, Meta},
    routes::{categories, health, orders, params, products, reports, users},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        products::list_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        products::restock,
        categories::list_categories,
        categories::get_category,
        categories::create_category,
        categories::update_category,
        categories::delete_category,
        users::list_users,
        users::get_user,
        users::update_user,
        orders::list_orders,
        orders::create_order,
        orders::get_order,
        orders::cancel_order,
        reports::account_summary,
        reports::range_summary,
        reports::top_orders
    ),
    components(
        schemas(
            User,
            Role,
            Category,
            Product,
            Order,
            OrderLine,
            UserList,
            UpdateUserRequest,
            CategoryList,
            CreateCategoryRequest,
            UpdateCategoryRequest,
            ProductList,
            CreateProductRequest,
            UpdateProductRequest,
            RestockRequest,
            OrderList,
            OrderWithLines,
            CreateOrderRequest,
            OrderLineRequest,
            AccountOrderSummary,
            OrderRangeSummary,
            params::Pagination,
            params::ProductQuery,
            params::OrderListQuery,
            params::RangeQuery,
            params::TopOrdersQuery,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<OrderWithLines>,
            ApiResponse<OrderList>,
            ApiResponse<AccountOrderSummary>,
            ApiResponse<OrderRangeSummary>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Products", description = "Product catalog endpoints"),
        (name = "Categories", description = "Category endpoints"),
        (name = "Users", description = "Account administration endpoints"),
        (name = "Orders", description = "Order fulfillment endpoints"),
        (name = "Reports", description = "Order reporting endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
