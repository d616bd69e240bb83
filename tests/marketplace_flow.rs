mod common;

use farmdirect::{
    dto::{
        farmers::CreateFarmerRequest,
        messages::{MESSAGE_MAX_LEN, PostMessageRequest},
        orders::{PlaceOrderRequest, UpdateOrderStatusRequest},
        products::CreateProductRequest,
    },
    error::AppError,
    middleware::auth::AuthUser,
    models::{Order, OrderStatus, Role},
    routes::params::{OrderListQuery, ProductQuery, ProductSortBy, SortOrder},
    services::{
        analytics_service, farmer_service, message_service, order_service, product_service,
    },
    state::AppState,
};

async fn place(
    state: &AppState,
    buyer: &AuthUser,
    product_id: i64,
    quantity: f64,
) -> anyhow::Result<Order> {
    let order = order_service::place_order(
        state,
        buyer,
        PlaceOrderRequest {
            product_id,
            quantity,
        },
    )
    .await?
    .data
    .expect("order");
    Ok(order)
}

async fn set_status(
    state: &AppState,
    user: &AuthUser,
    order_id: i64,
    status: OrderStatus,
) -> Result<Order, AppError> {
    let resp = order_service::update_order_status(
        state,
        user,
        order_id,
        UpdateOrderStatusRequest { status },
    )
    .await?;
    Ok(resp.data.expect("order"))
}

#[tokio::test]
async fn farmer_profile_is_found_by_its_user() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let (user, created) = common::farmer_with_profile(&state, "farmer_a", "A").await?;

    let farmer = farmer_service::get_farmer_by_user(&state, user.user_id)
        .await?
        .data
        .expect("farmer");
    assert_eq!(farmer.id, created.id);
    assert_eq!(farmer.user_id, user.user_id);
    assert_eq!(farmer.name, "A");
    assert_eq!(farmer.phone, "555");
    assert_eq!(farmer.location, "X");
    assert_eq!(farmer.description, "Y");

    let all = farmer_service::list_farmers(&state, Default::default())
        .await?
        .data
        .expect("farmers");
    assert_eq!(all.items.len(), 1);
    Ok(())
}

#[tokio::test]
async fn farmer_profile_rules() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let (farmer, _) = common::farmer_with_profile(&state, "farmer_a", "A").await?;
    let buyer = common::register(&state, "buyer_b", Role::Buyer).await?;

    let request = || CreateFarmerRequest {
        name: "Second".into(),
        phone: "1".into(),
        location: "Y".into(),
        description: String::new(),
    };

    let twice = farmer_service::add_farmer(&state, &farmer, request())
        .await
        .unwrap_err();
    assert!(matches!(twice, AppError::Conflict(_)));

    let not_farmer = farmer_service::add_farmer(&state, &buyer, request())
        .await
        .unwrap_err();
    assert!(matches!(not_farmer, AppError::Forbidden(_)));

    let other = common::register(&state, "farmer_c", Role::Farmer).await?;
    let blank = farmer_service::add_farmer(
        &state,
        &other,
        CreateFarmerRequest {
            name: "   ".into(),
            ..request()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(blank, AppError::Validation(_)));

    let missing = farmer_service::get_farmer_by_user(&state, other.user_id)
        .await
        .unwrap_err();
    assert!(matches!(missing, AppError::NotFound));
    Ok(())
}

#[tokio::test]
async fn listed_product_appears_with_farmer_name() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let (farmer, profile) = common::farmer_with_profile(&state, "farmer_a", "A").await?;

    let product = common::list_product(&state, &farmer, "Corn", 10.0, 2.5).await?;
    assert_eq!(product.farmer_id, profile.id);

    let list = product_service::list_products(&state, ProductQuery::default())
        .await?;
    let meta = list.meta.expect("meta");
    assert_eq!(meta.total, Some(1));
    let items = list.data.expect("products").items;
    assert_eq!(items.len(), 1);
    let row = &items[0];
    assert_eq!(row.id, product.id);
    assert_eq!(row.farmer_name, "A");
    assert_eq!(row.name, "Corn");
    assert_eq!(row.quantity, 10.0);
    assert_eq!(row.price, 2.5);

    let single = product_service::get_product(&state, product.id)
        .await?
        .data
        .expect("product");
    assert_eq!(single.farmer_name, "A");
    Ok(())
}

#[tokio::test]
async fn product_listing_filters_and_sorts() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let (farmer, _) = common::farmer_with_profile(&state, "farmer_a", "A").await?;
    common::list_product(&state, &farmer, "Sweet Corn", 10.0, 2.5).await?;
    common::list_product(&state, &farmer, "Potatoes", 50.0, 1.0).await?;
    common::list_product(&state, &farmer, "Popcorn", 5.0, 6.0).await?;

    let corn = product_service::list_products(
        &state,
        ProductQuery {
            q: Some("corn".into()),
            sort_by: Some(ProductSortBy::Price),
            sort_order: Some(SortOrder::Asc),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("products")
    .items;
    let names: Vec<_> = corn.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["Sweet Corn", "Popcorn"]);

    let cheap = product_service::list_products(
        &state,
        ProductQuery {
            max_price: Some(2.5),
            sort_by: Some(ProductSortBy::Name),
            sort_order: Some(SortOrder::Asc),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("products")
    .items;
    let names: Vec<_> = cheap.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["Potatoes", "Sweet Corn"]);

    let paged = product_service::list_products(
        &state,
        ProductQuery {
            page: Some(2),
            per_page: Some(2),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(paged.data.expect("products").items.len(), 1);
    assert_eq!(paged.meta.expect("meta").total, Some(3));
    Ok(())
}

#[tokio::test]
async fn product_search_matches_wildcards_literally() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let (farmer, _) = common::farmer_with_profile(&state, "farmer_a", "A").await?;
    common::list_product(&state, &farmer, "Corn", 10.0, 2.5).await?;
    common::list_product(&state, &farmer, "Rye_50%", 5.0, 3.0).await?;

    let search = |q: &str| ProductQuery {
        q: Some(q.into()),
        ..Default::default()
    };

    let percent = product_service::list_products(&state, search("%"))
        .await?
        .data
        .expect("products")
        .items;
    let names: Vec<_> = percent.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["Rye_50%"]);

    let underscore = product_service::list_products(&state, search("_"))
        .await?
        .data
        .expect("products")
        .items;
    assert_eq!(underscore.len(), 1);

    for q in ["C_rn", "!"] {
        let none = product_service::list_products(&state, search(q))
            .await?
            .data
            .expect("products")
            .items;
        assert!(none.is_empty(), "{q} matched {none:?}");
    }
    Ok(())
}

#[tokio::test]
async fn product_rules() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let buyer = common::register(&state, "buyer_b", Role::Buyer).await?;
    let no_profile = common::register(&state, "farmer_x", Role::Farmer).await?;
    let (farmer, _) = common::farmer_with_profile(&state, "farmer_a", "A").await?;

    let request = |quantity: f64, price: f64| CreateProductRequest {
        name: "Beans".into(),
        quantity,
        price,
    };

    let err = product_service::add_product(&state, &buyer, request(1.0, 1.0))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let err = product_service::add_product(&state, &no_profile, request(1.0, 1.0))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    for (quantity, price) in [(-1.0, 1.0), (1.0, -2.0), (0.0, 1.0), (f64::NAN, 1.0)] {
        let err = product_service::add_product(&state, &farmer, request(quantity, price))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    let list = product_service::list_products(&state, ProductQuery::default())
        .await?
        .data
        .expect("products");
    assert!(list.items.is_empty());
    Ok(())
}

#[tokio::test]
async fn sales_by_product_is_empty_without_orders() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let report = analytics_service::sales_by_product(&state)
        .await?
        .data
        .expect("report");
    assert!(report.items.is_empty());
    Ok(())
}

#[tokio::test]
async fn sales_by_product_sums_quantity_per_name() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let (farmer, _) = common::farmer_with_profile(&state, "farmer_a", "A").await?;
    let buyer = common::register(&state, "buyer_b", Role::Buyer).await?;
    let corn = common::list_product(&state, &farmer, "Corn", 10.0, 2.5).await?;
    let beans = common::list_product(&state, &farmer, "Beans", 20.0, 1.5).await?;

    place(&state, &buyer, corn.id, 3.0).await?;
    place(&state, &buyer, corn.id, 4.5).await?;
    place(&state, &buyer, beans.id, 2.0).await?;

    let items = analytics_service::sales_by_product(&state)
        .await?
        .data
        .expect("report")
        .items;
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].product_name, "Beans");
    assert_eq!(items[0].total_quantity, 2.0);
    assert_eq!(items[1].product_name, "Corn");
    assert_eq!(items[1].total_quantity, 7.5);

    // Ordering does not touch the listed quantity.
    let corn_now = product_service::get_product(&state, corn.id)
        .await?
        .data
        .expect("product");
    assert_eq!(corn_now.quantity, 10.0);
    Ok(())
}

#[tokio::test]
async fn orders_are_placed_by_buyers_only() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let (farmer, _) = common::farmer_with_profile(&state, "farmer_a", "A").await?;
    let buyer = common::register(&state, "buyer_b", Role::Buyer).await?;
    let corn = common::list_product(&state, &farmer, "Corn", 10.0, 2.5).await?;

    let order = place(&state, &buyer, corn.id, 2.0).await?;
    assert_eq!(order.status, OrderStatus::Placed);
    assert_eq!(order.buyer_id, buyer.user_id);
    assert!(order.reference.starts_with("ORD-"));

    let err = order_service::place_order(
        &state,
        &farmer,
        PlaceOrderRequest {
            product_id: corn.id,
            quantity: 1.0,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let err = order_service::place_order(
        &state,
        &buyer,
        PlaceOrderRequest {
            product_id: 9999,
            quantity: 1.0,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    let err = order_service::place_order(
        &state,
        &buyer,
        PlaceOrderRequest {
            product_id: corn.id,
            quantity: -1.0,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let all = order_service::list_orders(&state, OrderListQuery::default())
        .await?
        .data
        .expect("orders");
    assert_eq!(all.items.len(), 1);
    assert_eq!(all.items[0].id, order.id);
    Ok(())
}

#[tokio::test]
async fn order_status_follows_the_state_machine() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let (farmer, _) = common::farmer_with_profile(&state, "farmer_a", "A").await?;
    let (other_farmer, _) = common::farmer_with_profile(&state, "farmer_c", "C").await?;
    let buyer = common::register(&state, "buyer_b", Role::Buyer).await?;
    let corn = common::list_product(&state, &farmer, "Corn", 10.0, 2.5).await?;
    let order = place(&state, &buyer, corn.id, 2.0).await?;

    let err = set_status(&state, &buyer, order.id, OrderStatus::Confirmed)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let err = set_status(&state, &other_farmer, order.id, OrderStatus::Confirmed)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let err = set_status(&state, &farmer, order.id, OrderStatus::Fulfilled)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let confirmed = set_status(&state, &farmer, order.id, OrderStatus::Confirmed).await?;
    assert_eq!(confirmed.status, OrderStatus::Confirmed);
    let fulfilled = set_status(&state, &farmer, order.id, OrderStatus::Fulfilled).await?;
    assert_eq!(fulfilled.status, OrderStatus::Fulfilled);

    let err = set_status(&state, &buyer, order.id, OrderStatus::Cancelled)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
    let err = set_status(&state, &farmer, order.id, OrderStatus::Cancelled)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
    let unchanged = order_service::get_order(&state, order.id)
        .await?
        .data
        .expect("order");
    assert_eq!(unchanged.status, OrderStatus::Fulfilled);

    let second = place(&state, &buyer, corn.id, 1.0).await?;
    let cancelled = set_status(&state, &buyer, second.id, OrderStatus::Cancelled).await?;
    assert_eq!(cancelled.status, OrderStatus::Cancelled);

    let only_cancelled = order_service::list_orders(
        &state,
        OrderListQuery {
            status: Some(OrderStatus::Cancelled),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("orders");
    assert_eq!(only_cancelled.items.len(), 1);
    assert_eq!(only_cancelled.items[0].id, second.id);

    let err = set_status(&state, &farmer, 9999, OrderStatus::Confirmed)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));
    Ok(())
}

#[tokio::test]
async fn only_order_parties_exchange_messages() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let (farmer, _) = common::farmer_with_profile(&state, "farmer_a", "A").await?;
    let buyer = common::register(&state, "buyer_b", Role::Buyer).await?;
    let outsider = common::register(&state, "buyer_z", Role::Buyer).await?;
    let corn = common::list_product(&state, &farmer, "Corn", 10.0, 2.5).await?;
    let order = place(&state, &buyer, corn.id, 2.0).await?;

    let say = |body: &str| PostMessageRequest { body: body.into() };

    message_service::post_message(&state, &buyer, order.id, say("Can you do 2.00?")).await?;
    message_service::post_message(&state, &farmer, order.id, say("2.25 and it's yours")).await?;

    let err = message_service::post_message(&state, &outsider, order.id, say("hi"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let err = message_service::list_messages(&state, &outsider, order.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let err = message_service::post_message(&state, &buyer, order.id, say("  "))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let thread = message_service::list_messages(&state, &farmer, order.id)
        .await?
        .data
        .expect("messages")
        .items;
    assert_eq!(thread.len(), 2);
    assert_eq!(thread[0].sender_id, buyer.user_id);
    assert_eq!(thread[0].body, "Can you do 2.00?");
    assert_eq!(thread[1].sender_id, farmer.user_id);
    Ok(())
}

#[tokio::test]
async fn message_body_length_is_capped_after_trimming() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let (farmer, _) = common::farmer_with_profile(&state, "farmer_a", "A").await?;
    let buyer = common::register(&state, "buyer_b", Role::Buyer).await?;
    let corn = common::list_product(&state, &farmer, "Corn", 10.0, 2.5).await?;
    let order = place(&state, &buyer, corn.id, 2.0).await?;

    let too_long = PostMessageRequest {
        body: "a".repeat(MESSAGE_MAX_LEN + 1),
    };
    let err = message_service::post_message(&state, &buyer, order.id, too_long)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let at_limit = PostMessageRequest {
        body: "b".repeat(MESSAGE_MAX_LEN),
    };
    message_service::post_message(&state, &buyer, order.id, at_limit).await?;

    let padded = PostMessageRequest {
        body: format!("{:^2010}", "c".repeat(1990)),
    };
    let sent = message_service::post_message(&state, &farmer, order.id, padded)
        .await?
        .data
        .expect("message");
    assert_eq!(sent.body.chars().count(), 1990);

    let thread = message_service::list_messages(&state, &buyer, order.id)
        .await?
        .data
        .expect("messages")
        .items;
    assert_eq!(thread.len(), 2);
    assert_eq!(thread[0].body.chars().count(), MESSAGE_MAX_LEN);
    Ok(())
}

#[test]
fn status_transitions() {
    use OrderStatus::*;

    assert!(Placed.can_transition_to(Confirmed));
    assert!(Placed.can_transition_to(Cancelled));
    assert!(Confirmed.can_transition_to(Fulfilled));
    assert!(Confirmed.can_transition_to(Cancelled));

    assert!(!Placed.can_transition_to(Fulfilled));
    assert!(!Placed.can_transition_to(Placed));
    assert!(!Fulfilled.can_transition_to(Cancelled));
    assert!(!Cancelled.can_transition_to(Placed));
    assert!(Fulfilled.is_terminal() && Cancelled.is_terminal());
    assert_eq!("confirmed".parse::<OrderStatus>(), Ok(Confirmed));
    assert!("shipped".parse::<OrderStatus>().is_err());
}
