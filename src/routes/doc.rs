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
        analytics::SalesReport,
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        farmers::{CreateFarmerRequest, FarmerList},
        messages::{MessageList, PostMessageRequest},
        orders::{OrderList, PlaceOrderRequest, UpdateOrderStatusRequest},
        products::{CreateProductRequest, ProductList},
    },
    models::{Farmer, Message, Order, OrderStatus, Product, ProductListing, ProductSales, Role, User},
    response::{ApiResponse, Meta},
    routes::{analytics, auth, farmers, health, orders, params, products},
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
        auth::register,
        auth::login,
        auth::me,
        farmers::create_farmer,
        farmers::list_farmers,
        farmers::my_farmer,
        farmers::get_farmer,
        products::list_products,
        products::get_product,
        products::create_product,
        orders::place_order,
        orders::list_orders,
        orders::get_order,
        orders::update_order_status,
        orders::post_message,
        orders::list_messages,
        analytics::sales_by_product
    ),
    components(
        schemas(
            Role,
            OrderStatus,
            User,
            Farmer,
            Product,
            ProductListing,
            Order,
            Message,
            ProductSales,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            CreateFarmerRequest,
            FarmerList,
            CreateProductRequest,
            ProductList,
            PlaceOrderRequest,
            UpdateOrderStatusRequest,
            OrderList,
            PostMessageRequest,
            MessageList,
            SalesReport,
            params::Pagination,
            params::SortOrder,
            params::ProductSortBy,
            Meta,
            ApiResponse<User>,
            ApiResponse<Farmer>,
            ApiResponse<ProductList>,
            ApiResponse<Order>,
            ApiResponse<OrderList>,
            ApiResponse<SalesReport>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Registration, login and session"),
        (name = "Farmers", description = "Farmer profiles"),
        (name = "Products", description = "Produce listings"),
        (name = "Orders", description = "Buyer orders and status changes"),
        (name = "Messages", description = "Conversation attached to an order"),
        (name = "Analytics", description = "Sales aggregates"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
