//! HTTP-level tests for the backend client against a mock server

#![allow(clippy::unwrap_used)]

use cyclecare_api::types::{CityId, Customer, OrderForm, OrderId, OrderUpdate, UserId};
use cyclecare_api::{ApiClient, ApiError};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn list_cities_unwraps_data_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cities"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [
                {"id": 3, "name": "Pune", "state": "Maharashtra", "country": "India",
                 "pincodes": ["411057"], "serviceable": true}
            ]
        })))
        .mount(&server)
        .await;

    let client = ApiClient::new(server.uri());
    let cities = client.list_cities().await.unwrap();

    assert_eq!(cities.len(), 1);
    assert_eq!(cities[0].id, CityId::new(3));
    assert_eq!(cities[0].state, "Maharashtra");
}

#[tokio::test]
async fn bearer_token_is_attached_when_present() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/u-1"))
        .and(header("authorization", "Bearer secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "u-1", "phone": "9876543210"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::new(server.uri());
    client.set_token(Some("secret".to_string()));

    let user = client.user_by_id(&UserId::new("u-1")).await.unwrap();
    assert_eq!(user.phone, "9876543210");
}

#[tokio::test]
async fn unauthorized_clears_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/orders/user/u-1"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let client = ApiClient::new(server.uri());
    client.set_token(Some("stale".to_string()));

    let result = client.orders_by_user(&UserId::new("u-1")).await;

    assert_eq!(result, Err(ApiError::Unauthorized));
    assert!(client.token().is_none());
}

#[tokio::test]
async fn error_message_is_taken_from_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/orders/ord-1/cancel"))
        .respond_with(
            ResponseTemplate::new(409)
                .set_body_json(serde_json::json!({"message": "Order already completed"})),
        )
        .mount(&server)
        .await;

    let client = ApiClient::new(server.uri());
    let result = client.cancel_order(&OrderId::new("ord-1")).await;

    assert_eq!(
        result,
        Err(ApiError::Api {
            status: 409,
            message: "Order already completed".to_string()
        })
    );
}

#[tokio::test]
async fn update_customer_sends_camel_case_body() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/users/u-1/customer"))
        .and(body_string_contains("\"addressLine1\":\"12 MG Road\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "u-1", "phone": "9876543210"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::new(server.uri());
    let customer = Customer {
        address_line1: "12 MG Road".to_string(),
        ..Customer::default()
    };

    client
        .update_customer(&UserId::new("u-1"), &customer)
        .await
        .unwrap();
}

#[tokio::test]
async fn create_order_posts_multipart_form() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/orders"))
        .and(body_string_contains("name=\"pincode\""))
        .and(body_string_contains("filename=\"0_hero-sprint.jpg\""))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "id": "ord-42", "status": "pending"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut form = OrderForm::default();
    form.text("pincode", "411057");
    form.files.push(cyclecare_api::FormFile {
        field: "images".to_string(),
        file_name: "0_hero-sprint.jpg".to_string(),
        content_type: "image/jpeg".to_string(),
        bytes: b"fake-jpeg-bytes".to_vec(),
    });

    let client = ApiClient::new(server.uri());
    let order = client.create_order(form).await.unwrap();

    assert_eq!(order.id, OrderId::new("ord-42"));
    assert_eq!(order.status.as_deref(), Some("pending"));
}

#[tokio::test]
async fn update_order_patches_only_set_fields() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/orders/ord-7"))
        .and(body_string_contains(r#""notes":"Rear tyre hisses""#))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "_id": "ord-7", "status": "accepted"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::new(server.uri());
    let update = OrderUpdate {
        notes: Some("Rear tyre hisses".to_string()),
        ..OrderUpdate::default()
    };
    let order = client.update_order(&OrderId::new("ord-7"), &update).await.unwrap();

    assert_eq!(order.id, OrderId::new("ord-7"));
    assert_eq!(order.status.as_deref(), Some("accepted"));
    assert_eq!(
        serde_json::to_value(&update).unwrap(),
        serde_json::json!({ "notes": "Rear tyre hisses" })
    );
}

#[tokio::test]
async fn unreachable_backend_is_a_request_error() {
    let client = ApiClient::new("http://127.0.0.1:9");
    let result = client.list_services().await;
    assert!(matches!(result, Err(ApiError::Request(_))));
}
