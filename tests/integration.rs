use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::Utc;
use courier_sim::api::rest::router;
use courier_sim::config::Config;
use courier_sim::engine::lifecycle::{generate_once, sweep_once};
use courier_sim::geo::{Point, Polygon, ZoneComposer};
use courier_sim::models::order::Order;
use courier_sim::state::AppState;
use courier_sim::storage::{MemoryStore, OrderStorage};
use serde_json::{json, Value};
use tower::ServiceExt;

struct Harness {
    state: Arc<AppState>,
    orders: OrderStorage,
}

impl Harness {
    fn app(&self) -> axum::Router {
        router(self.state.clone())
    }
}

fn test_zones() -> ZoneComposer {
    let area = Polygon::allowed(vec![
        Point::new(59.8, 30.1),
        Point::new(59.8, 30.5),
        Point::new(60.0, 30.5),
        Point::new(60.0, 30.1),
    ])
    .unwrap();
    ZoneComposer::from_polygons(area, vec![]).unwrap()
}

async fn setup() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let state = AppState::with_zones(&Config::default(), store.clone(), test_zones())
        .await
        .unwrap();

    Harness {
        state: Arc::new(state),
        orders: OrderStorage::new(store),
    }
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn post_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn health_returns_ok() {
    let h = setup().await;
    let response = h.app().oneshot(get_request("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["orders"], 0);
    assert_eq!(body["courier_score"], 0);
}

#[tokio::test]
async fn metrics_returns_prometheus_format() {
    let h = setup().await;
    sweep_once(&h.state).await.unwrap();
    let response = h.app().oneshot(get_request("/metrics")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.contains("text/plain"));

    let body = body_string(response).await;
    assert!(body.contains("orders_active"));
    assert!(body.contains("sweep_latency_seconds"));
}

#[tokio::test]
async fn status_returns_courier_inside_zone() {
    let h = setup().await;
    let response = h.app().oneshot(get_request("/api/status")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let lat = body["courier"]["location"]["lat"].as_f64().unwrap();
    let lng = body["courier"]["location"]["lng"].as_f64().unwrap();
    assert!((59.8..=60.0).contains(&lat));
    assert!((30.1..=30.5).contains(&lng));
    assert_eq!(body["courier"]["score"], 0);
    assert_eq!(body["orders"], json!([]));
}

#[tokio::test]
async fn generated_order_can_be_found_by_id_and_area() {
    let h = setup().await;

    let response = h.app().oneshot(post_request("/api/orders")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let order = body_json(response).await;
    let id = order["id"].as_i64().unwrap();
    let lat = order["lat"].as_f64().unwrap();
    let lng = order["lng"].as_f64().unwrap();
    assert!(id > 0);
    assert_eq!(h.state.metrics.orders_active.get(), 1);
    assert_eq!(
        h.state
            .metrics
            .orders_generated_total
            .with_label_values(&["success"])
            .get(),
        1
    );

    let response = h
        .app()
        .oneshot(get_request(&format!("/api/orders/{id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, order);

    let response = h
        .app()
        .oneshot(get_request(&format!(
            "/api/orders?lat={lat}&lng={lng}&radius=50"
        )))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!([order]));
}

#[tokio::test]
async fn unknown_order_returns_404() {
    let h = setup().await;
    let response = h.app().oneshot(get_request("/api/orders/9999")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("9999"));
}

#[tokio::test]
async fn negative_radius_is_rejected() {
    let h = setup().await;
    let response = h
        .app()
        .oneshot(get_request("/api/orders?lat=59.9&lng=30.3&radius=-1"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_direction_is_rejected() {
    let h = setup().await;
    let response = h
        .app()
        .oneshot(json_request(
            "POST",
            "/api/courier/move",
            json!({ "direction": 7, "zoom": 14 }),
        ))
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn move_collects_order_under_courier() {
    let h = setup().await;
    let courier = h.state.facade.couriers().get_courier().await.unwrap();
    h.orders
        .insert(
            Order::new(1_500.0, 200.0, courier.location, Utc::now()),
            Duration::from_secs(120),
        )
        .await
        .unwrap();

    let mut updates = h.state.status_tx.subscribe();

    let response = h
        .app()
        .oneshot(json_request(
            "POST",
            "/api/courier/move",
            json!({ "direction": 0, "zoom": 13 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["courier"]["score"], 1);
    assert_eq!(body["orders"], json!([]));

    let pushed = updates.recv().await.unwrap();
    assert_eq!(pushed.courier.score, 1);

    let response = h.app().oneshot(get_request("/health")).await.unwrap();
    let health = body_json(response).await;
    assert_eq!(health["orders"], 0);
    assert_eq!(health["courier_score"], 1);
}

#[tokio::test]
async fn generator_respects_active_limit() {
    let h = setup().await;

    assert!(generate_once(&h.state, 2).await.unwrap().is_some());
    assert!(generate_once(&h.state, 2).await.unwrap().is_some());
    assert!(generate_once(&h.state, 2).await.unwrap().is_none());
    assert_eq!(h.state.orders().count().await.unwrap(), 2);
    assert_eq!(h.state.metrics.orders_active.get(), 2);
}

#[tokio::test]
async fn sweep_removes_only_stale_orders() {
    let h = setup().await;
    let max_age = Duration::from_secs(120);
    let stale = Utc::now() - chrono::Duration::seconds(600);

    h.orders
        .insert(Order::new(1_000.0, 100.0, Point::new(59.9, 30.3), stale), max_age)
        .await
        .unwrap();
    let fresh = h
        .orders
        .insert(Order::new(1_000.0, 100.0, Point::new(59.91, 30.3), Utc::now()), max_age)
        .await
        .unwrap();

    assert_eq!(sweep_once(&h.state).await.unwrap(), 1);
    assert_eq!(sweep_once(&h.state).await.unwrap(), 0);
    assert_eq!(h.state.orders().count().await.unwrap(), 1);
    assert_eq!(h.state.orders().get_order(fresh.id).await.unwrap(), fresh);
    assert_eq!(h.state.metrics.orders_swept_total.get(), 1);
    assert_eq!(h.state.metrics.orders_active.get(), 1);
}

#[tokio::test]
async fn concurrent_generation_assigns_unique_ids() {
    let h = setup().await;

    let handles: Vec<_> = (0..32)
        .map(|_| {
            let state = h.state.clone();
            tokio::spawn(async move { state.orders().generate_order().await.unwrap() })
        })
        .collect();

    let mut ids = HashSet::new();
    for handle in handles {
        assert!(ids.insert(handle.await.unwrap().id));
    }

    assert_eq!(ids.len(), 32);
    assert_eq!(h.state.orders().count().await.unwrap(), 32);
}
