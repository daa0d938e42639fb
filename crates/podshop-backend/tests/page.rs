//! Integration tests for the product page loader and image resolution.

use podshop_backend::{
    load_product_page, resolve_public_url, BackendClient, PageRequest, ReviewsPanel,
};
use podshop_core::{FavoriteState, Quantity, StockLevel, StockPolicy};
use rust_decimal::Decimal;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const USER: &str = "9a3b5c7d-1e2f-4a6b-8c0d-2e4f6a8b0c1d";

fn test_client(base_url: &str) -> BackendClient {
    BackendClient::new(base_url, "anon-key", 30).expect("client construction should not fail")
}

fn buckets() -> Vec<String> {
    vec!["product-images".to_string(), "images".to_string()]
}

async fn mount_cap_product(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/products"))
        .and(query_param("route", "eq.trucker-cap"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{
            "id": 1,
            "name": "Trucker Cap",
            "starting_price": 150,
            "image_url": "caps/trucker.png",
            "route": "trucker-cap",
            "slug": null
        }])))
        .mount(server)
        .await;
}

async fn mount_cap_catalog(server: &MockServer) {
    mount_cap_product(server).await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/product_variant_values"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "id": 10, "price": 0, "is_default": true,
              "variant_values": { "id": 1, "value_name": "Black",
                  "variant_groups": { "id": 1, "name": "COLOR", "input_type": "color" } } },
            { "id": 20, "price": 0, "is_default": true,
              "variant_values": { "id": 3, "value_name": "M",
                  "variant_groups": { "id": 2, "name": "SIZE", "input_type": "radio" } } },
            { "id": 21, "price": 20, "is_default": false,
              "variant_values": { "id": 4, "value_name": "L",
                  "variant_groups": { "id": 2, "name": "SIZE", "input_type": "radio" } } }
        ])))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/product_variant_combinations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "id": 7, "product_id": 1, "variants": [10, 20] },
            { "id": 8, "product_id": 1, "variants": [10, 21] }
        ])))
        .mount(server)
        .await;
}

#[tokio::test]
async fn page_loads_defaults_price_stock_and_degrades_reviews() {
    let server = MockServer::start().await;
    mount_cap_catalog(&server).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/inventory"))
        .and(query_param("combination_id", "in.(7)"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "quantity": 12, "low_stock_limit": 5, "status": "in_stock", "combination_id": 7 }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/favorites"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "user_id": USER, "product_id": 1 }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/user_reviews"))
        .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
            "code": "XX000", "message": "reviews down"
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let image_buckets = buckets();
    let request = PageRequest {
        slug: "trucker-cap",
        user_id: Some(Uuid::parse_str(USER).expect("valid uuid")),
        edit_cart_id: None,
        stock_policy: StockPolicy::Exact,
        image_buckets: &image_buckets,
        verify_images: false,
    };

    let page = load_product_page(&client, &request).await;

    assert_eq!(page.product.as_ref().map(|p| p.id), Some(1));
    assert_eq!(page.selection.variant_ids(), vec![10, 20]);
    assert_eq!(page.unit_price, Decimal::new(150, 0));
    assert_eq!(page.total_price, Decimal::new(150, 0));
    assert_eq!(
        page.stock,
        Some(StockLevel {
            quantity: 12,
            low_stock_limit: Some(5)
        })
    );
    assert_eq!(page.favorite, FavoriteState::Settled(true));
    assert_eq!(page.reviews, ReviewsPanel::Unavailable);
    assert_eq!(
        page.image_url.as_deref(),
        Some(
            format!(
                "{}/storage/v1/object/public/product-images/caps/trucker.png",
                server.uri()
            )
            .as_str()
        )
    );
}

#[tokio::test]
async fn edit_mode_restores_line_selection_and_quantity() {
    let server = MockServer::start().await;
    mount_cap_catalog(&server).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/cart"))
        .and(query_param("cart_id", "eq.5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{
            "cart_id": 5,
            "user_id": USER,
            "product_id": 1,
            "quantity": 2,
            "base_price": 170,
            "total_price": 340,
            "route": "trucker-cap",
            "slug": null
        }])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/cart_variants"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "cart_id": 5, "user_id": USER, "cartvariant_id": 21, "price": 20 }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/inventory"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/favorites"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/user_reviews"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let image_buckets = buckets();
    let request = PageRequest {
        slug: "trucker-cap",
        user_id: Some(Uuid::parse_str(USER).expect("valid uuid")),
        edit_cart_id: Some(5),
        stock_policy: StockPolicy::Exact,
        image_buckets: &image_buckets,
        verify_images: false,
    };

    let page = load_product_page(&client, &request).await;

    assert_eq!(page.edit_cart_id, Some(5));
    assert_eq!(page.quantity, Quantity::new(2));
    // Size restored to L; colour filled from the default.
    assert_eq!(page.selection.variant_ids(), vec![10, 21]);
    assert_eq!(page.unit_price, Decimal::new(170, 0));
    assert_eq!(page.total_price, Decimal::new(340, 0));
    assert_eq!(page.stock, Some(StockLevel::zero()));
    assert_eq!(page.favorite, FavoriteState::Settled(false));
    assert!(matches!(
        page.reviews,
        ReviewsPanel::Loaded { ref reviews, .. } if reviews.is_empty()
    ));
}

#[tokio::test]
async fn edit_line_of_another_product_opens_as_new_add() {
    let server = MockServer::start().await;
    mount_cap_catalog(&server).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/cart"))
        .and(query_param("cart_id", "eq.9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{
            "cart_id": 9,
            "user_id": USER,
            "product_id": 42,
            "quantity": 3,
            "base_price": 90,
            "total_price": 270,
            "route": "vinyl-sticker",
            "slug": null
        }])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/cart_variants"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "cart_id": 9, "user_id": USER, "cartvariant_id": 77, "price": 0 }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/inventory"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/favorites"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/user_reviews"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let image_buckets = buckets();
    let request = PageRequest {
        slug: "trucker-cap",
        user_id: Some(Uuid::parse_str(USER).expect("valid uuid")),
        edit_cart_id: Some(9),
        stock_policy: StockPolicy::Exact,
        image_buckets: &image_buckets,
        verify_images: false,
    };

    let page = load_product_page(&client, &request).await;

    assert_eq!(page.product.as_ref().map(|p| p.id), Some(1));
    assert_eq!(page.edit_cart_id, None);
    assert_eq!(page.quantity, Quantity::ONE);
    assert_eq!(page.selection.variant_ids(), vec![10, 20]);
    let add = page.add_to_cart(&[]).expect("product loaded");
    assert_eq!(add.edit_cart_id, None);
}

#[tokio::test]
async fn variant_load_failure_leaves_stock_unknown_and_blocks_cart() {
    let server = MockServer::start().await;
    mount_cap_product(&server).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/product_variant_values"))
        .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
            "code": "XX000", "message": "variants down"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/product_variant_combinations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "id": 7, "product_id": 1, "variants": [10, 20] }
        ])))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/inventory"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/favorites"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/user_reviews"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let image_buckets = buckets();
    let request = PageRequest {
        slug: "trucker-cap",
        user_id: Some(Uuid::parse_str(USER).expect("valid uuid")),
        edit_cart_id: None,
        stock_policy: StockPolicy::Exact,
        image_buckets: &image_buckets,
        verify_images: false,
    };

    let mut page = load_product_page(&client, &request).await;

    assert_eq!(page.product.as_ref().map(|p| p.id), Some(1));
    assert!(page.variants_unavailable);
    assert!(page.groups.is_empty());
    assert_eq!(page.stock, None);
    assert!(page.add_to_cart(&[]).is_none());

    page.refresh_stock(&client, StockPolicy::Exact).await;
    assert_eq!(page.stock, None);
}

#[tokio::test]
async fn unknown_slug_renders_blank_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let request = PageRequest {
        slug: "nope",
        user_id: None,
        edit_cart_id: None,
        stock_policy: StockPolicy::Exact,
        image_buckets: &[],
        verify_images: false,
    };

    let page = load_product_page(&client, &request).await;

    assert!(page.product.is_none());
    assert!(page.groups.is_empty());
    assert_eq!(page.stock, None);
    assert_eq!(page.favorite, FavoriteState::Idle);
}

#[tokio::test]
async fn verified_image_falls_through_to_next_bucket() {
    let server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .and(path("/storage/v1/object/public/product-images/caps/a.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/storage/v1/object/public/images/caps/a.png"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let url = resolve_public_url(&client, "caps/a.png", &buckets(), true).await;

    assert_eq!(
        url,
        Some(format!(
            "{}/storage/v1/object/public/images/caps/a.png",
            server.uri()
        ))
    );
}

#[tokio::test]
async fn absolute_and_empty_image_keys_skip_storage() {
    let server = MockServer::start().await;
    let client = test_client(&server.uri());

    let absolute = resolve_public_url(&client, "https://cdn.example.com/a.png", &buckets(), true).await;
    assert_eq!(absolute.as_deref(), Some("https://cdn.example.com/a.png"));

    assert_eq!(resolve_public_url(&client, "  ", &buckets(), true).await, None);

    let received = server.received_requests().await.unwrap_or_default();
    assert!(received.is_empty());
}
