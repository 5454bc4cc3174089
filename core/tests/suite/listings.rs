#![allow(clippy::unwrap_used, clippy::expect_used)]

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use rentlens_core::ListingClient;
use rentlens_core::error::RentlensErr;
use rentlens_core::view::ListingFilters;
use rentlens_core::view::ListingView;
use rentlens_protocol::listing::ListingQuery;
use rentlens_test_support::config_for;
use serde_json::json;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;
use wiremock::matchers::method;
use wiremock::matchers::path;
use wiremock::matchers::query_param;
use wiremock::matchers::query_param_is_missing;

fn listing_json() -> serde_json::Value {
    json!({
        "properties": [
            {"_id": "p1", "address": "1 Main St", "price": "3,200", "beds": 2, "sqft": "N/A"},
            {"_id": "p2", "address": "9 Elm St", "price": 2100, "status": "N/A"}
        ]
    })
}

#[tokio::test]
async fn list_sends_camel_case_filters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/properties"))
        .and(query_param("skip", "20"))
        .and(query_param("limit", "20"))
        .and(query_param("minPrice", "2000"))
        .and(query_param("borough", "Brooklyn"))
        .and(query_param_is_missing("maxPrice"))
        .and(query_param_is_missing("beds"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing_json()))
        .expect(1)
        .mount(&server)
        .await;

    let client = ListingClient::new(&config_for(&server)).unwrap();
    let page = client
        .list(&ListingQuery {
            skip: 20,
            min_price: Some(2000),
            borough: Some("Brooklyn".into()),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(page.properties.len(), 2);
    let first = &page.properties[0];
    assert_eq!(first.id.as_deref(), Some("p1"));
    assert_eq!(first.price, Some(3200.0));
    assert_eq!(first.sqft, None);
    assert_eq!(page.properties[1].status, None);
}

#[tokio::test]
async fn view_loads_current_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/properties"))
        .and(query_param("skip", "2"))
        .and(query_param("limit", "2"))
        .and(query_param("beds", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing_json()))
        .mount(&server)
        .await;

    let client = ListingClient::new(&config_for(&server)).unwrap();
    let mut view = ListingView::new(2);
    view.set_filters(ListingFilters {
        beds: Some(2),
        ..Default::default()
    });
    view.next_page();
    let loaded = view.load(&client).await.unwrap();

    assert_eq!(loaded.len(), 2);
    assert!(view.has_next_page());
}

#[tokio::test]
async fn get_returns_single_property() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/properties/p1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_id": "p1",
            "address": "1 Main St",
            "building_name": "The Main"
        })))
        .mount(&server)
        .await;

    let client = ListingClient::new(&config_for(&server)).unwrap();
    let property = client.get("p1").await.unwrap();
    assert_eq!(property.address, "1 Main St");
    assert_eq!(property.building_name.as_deref(), Some("The Main"));
}

#[tokio::test]
async fn missing_property_is_unexpected_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/properties/nope"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(&server)
        .await;

    let client = ListingClient::new(&config_for(&server)).unwrap();
    let err = client.get("nope").await.unwrap_err();
    assert_matches!(err, RentlensErr::UnexpectedStatus { status, .. } if status.as_u16() == 404);
}

#[tokio::test]
async fn invalid_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/properties"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let client = ListingClient::new(&config_for(&server)).unwrap();
    let err = client.list(&ListingQuery::default()).await.unwrap_err();
    assert_matches!(err, RentlensErr::Decode { url, .. } if url.ends_with("/api/properties"));
}
