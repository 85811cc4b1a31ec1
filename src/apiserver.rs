// apiserver.rs

use askama::Template;
use axum::{
    Json, Router,
    body::Body,
    extract::{Query, State},
    http::{Response, StatusCode},
    response::{Html, IntoResponse},
    routing::*,
};
pub use axum_macros::debug_handler;

use crate::*;

#[derive(Template)]
#[template(path = "index.html.ask", escape = "html")]
struct IndexPage {
    myid: String,
    version: &'static str,
    air_quality: String,
    fan: &'static str,
    mode: &'static str,
    threshold: u32,
    last_update: String,
    uptime: String,
}

#[derive(Debug, Deserialize)]
pub struct ControlQuery {
    pub fan: Option<String>,
    pub auto: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SettingsQuery {
    pub threshold: Option<String>,
}

pub fn api_router(state: Arc<MyState>) -> Router {
    Router::new()
        .route("/", get(get_index))
        .route("/data", get(get_data))
        .route("/control", get(get_control))
        .route("/settings", get(get_settings))
        .route("/uptime", get(get_uptime))
        .with_state(state)
}

pub async fn run_api_server(state: Arc<MyState>) -> anyhow::Result<()> {
    loop {
        if state.link_up().await {
            break;
        }
        sleep(Duration::from_secs(1)).await;
    }

    let listen = format!("0.0.0.0:{}", state.config.port);
    let addr = listen.parse::<net::SocketAddr>()?;
    let app = api_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("API server listening to {listen}");
    Ok(axum::serve(listener, app.into_make_service()).await?)
}

pub async fn get_index(State(state): State<Arc<MyState>>) -> Response<Body> {
    let cnt = state.api_cnt.fetch_add(1, Ordering::Relaxed);
    info!("#{cnt} get_index()");

    let status = state.status().await;
    let page = IndexPage {
        myid: state.myid.read().await.clone(),
        version: FW_VERSION,
        air_quality: format!("{:.0}", status.air_quality),
        fan: if status.fan { "ON" } else { "OFF" },
        mode: if status.auto_mode.is_auto() { "AUTO" } else { "MANUAL" },
        threshold: status.threshold,
        last_update: status.last_update,
        uptime: Uptime::from_secs(*state.uptime.read().await).uptime_s,
    };
    let index = match page.render() {
        Err(e) => {
            let err_msg = format!("Index template error: {e:?}\n");
            error!("{err_msg}");
            return (StatusCode::INTERNAL_SERVER_ERROR, err_msg).into_response();
        }
        Ok(s) => s,
    };
    (StatusCode::OK, Html(index)).into_response()
}

pub async fn get_data(State(state): State<Arc<MyState>>) -> (StatusCode, Json<AirStatus>) {
    let cnt = state.api_cnt.fetch_add(1, Ordering::Relaxed);
    info!("#{cnt} get_data()");

    (StatusCode::OK, Json(state.status().await))
}

#[debug_handler]
pub async fn get_control(
    State(state): State<Arc<MyState>>,
    Query(q): Query<ControlQuery>,
) -> (StatusCode, String) {
    let cnt = state.api_cnt.fetch_add(1, Ordering::Relaxed);
    info!("#{cnt} get_control() fan={:?} auto={:?}", q.fan, q.auto);

    match state.apply_control(q.fan.as_deref(), q.auto.as_deref()).await {
        Ok(()) => (StatusCode::OK, "OK".to_string()),
        Err(e) => {
            warn!("Control rejected: {e}");
            (StatusCode::BAD_REQUEST, e.to_string())
        }
    }
}

#[debug_handler]
pub async fn get_settings(
    State(state): State<Arc<MyState>>,
    Query(q): Query<SettingsQuery>,
) -> (StatusCode, String) {
    let cnt = state.api_cnt.fetch_add(1, Ordering::Relaxed);
    info!("#{cnt} get_settings() threshold={:?}", q.threshold);

    if let Some(value) = q.threshold.as_deref() {
        match parse_threshold(value) {
            Ok(threshold) => {
                info!("Threshold set to {threshold}");
                state.set_threshold(threshold).await;
            }
            Err(e) => {
                warn!("Settings rejected: {e}");
                return (StatusCode::BAD_REQUEST, e.to_string());
            }
        }
    }
    (StatusCode::OK, "OK".to_string())
}

pub async fn get_uptime(State(state): State<Arc<MyState>>) -> (StatusCode, Json<Uptime>) {
    let cnt = state.api_cnt.fetch_add(1, Ordering::Relaxed);
    info!("#{cnt} get_uptime()");

    let uptime = Uptime::from_secs(*state.uptime.read().await);
    (StatusCode::OK, Json(uptime))
}

// EOF
