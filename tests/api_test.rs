use airpurifier::*;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use tower::ServiceExt;

mod common;
use common::test_config;

async fn get(state: &Arc<MyState>, uri: &str) -> (StatusCode, String) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = api_router(state.clone()).oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

fn state() -> Arc<MyState> {
    Arc::new(MyState::new(test_config()))
}

#[tokio::test]
async fn data_reports_snapshot() {
    let st = state();
    {
        let mut d = st.device.write().await;
        d.concentration = 312.5;
        d.fan_on = true;
    }

    let (status, body) = get(&st, "/data").await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["air_quality"], 312.5);
    assert_eq!(json["fan"], true);
    assert_eq!(json["auto_mode"], "ON");
    assert_eq!(json["threshold"], 300);
}

#[tokio::test]
async fn data_has_json_content_type() {
    let st = state();
    let request = Request::builder().uri("/data").body(Body::empty()).unwrap();
    let response = api_router(st).oneshot(request).await.unwrap();
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/json"
    );
}

#[tokio::test]
async fn control_fan_forces_manual() {
    let st = state();
    let (status, body) = get(&st, "/control?fan=on").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");

    let s = st.status().await;
    assert!(s.fan);
    assert_eq!(s.auto_mode, FanMode::Manual);

    let (status, _) = get(&st, "/control?fan=OFF").await;
    assert_eq!(status, StatusCode::OK);
    assert!(!st.status().await.fan);
}

#[tokio::test]
async fn control_mode_only() {
    let st = state();
    st.set_fan(true).await;

    let (status, _) = get(&st, "/control?auto=on").await;
    assert_eq!(status, StatusCode::OK);
    let s = st.status().await;
    assert_eq!(s.auto_mode, FanMode::Auto);
    assert!(s.fan);

    get(&st, "/control?auto=off").await;
    assert_eq!(st.status().await.auto_mode, FanMode::Manual);
}

#[tokio::test]
async fn control_rejects_garbage() {
    let st = state();
    let before = st.status().await;

    let (status, _) = get(&st, "/control?fan=toggle").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = get(&st, "/control?fan=on&auto=sometimes").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(st.status().await, before);
}

#[tokio::test]
async fn control_without_params_is_a_noop() {
    let st = state();
    let before = st.status().await;
    let (status, body) = get(&st, "/control").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
    assert_eq!(st.status().await, before);
}

#[tokio::test]
async fn settings_threshold() {
    let st = state();

    let (status, body) = get(&st, "/settings?threshold=450").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
    assert_eq!(st.status().await.threshold, 450);

    let (status, _) = get(&st, "/settings?threshold=abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = get(&st, "/settings?threshold=-5").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(st.status().await.threshold, 450);

    let (status, _) = get(&st, "/settings").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(st.status().await.threshold, 450);
}

#[tokio::test]
async fn index_page_renders() {
    let st = state();
    let (status, body) = get(&st, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("airpurifier-test"));
    assert!(body.contains(FW_VERSION));
}

#[tokio::test]
async fn uptime_endpoint() {
    let st = state();
    *st.uptime.write().await = 3723;
    let (status, body) = get(&st, "/uptime").await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["uptime"], 3723);
    assert_eq!(json["uptime_s"], "01:02:03");
}

#[tokio::test]
async fn requests_are_counted() {
    let st = state();
    get(&st, "/data").await;
    get(&st, "/uptime").await;
    assert_eq!(st.api_cnt.load(Ordering::Relaxed), 2);
}

// EOF
