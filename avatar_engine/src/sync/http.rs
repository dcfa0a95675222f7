//! 中继的 HTTP 入口
//!
//! - `GET /health` → `{"ok":true}`
//! - `POST /animate`（别名 `/api/animate`）：请求体为线格式，广播给全部 WebSocket 对端

use std::future::Future;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use crate::Result;

use super::{AnimateCommand, HubHandle, Origin, WireMessage};

pub fn router(hub: HubHandle) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/animate", post(animate))
        .route("/api/animate", post(animate))
        .with_state(hub)
}

/// 在已绑定的监听上提供 HTTP 入口，直到 `shutdown` 完成
pub async fn serve_http<F>(listener: TcpListener, hub: HubHandle, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    log::info!("relay http listening on http://{addr}");
    axum::serve(listener, router(hub))
        .with_graceful_shutdown(shutdown)
        .await?;
    log::info!("relay http shutdown");
    Ok(())
}

async fn health(State(hub): State<HubHandle>) -> Json<Value> {
    Json(hub.health())
}

async fn animate(
    State(hub): State<HubHandle>,
    Json(message): Json<WireMessage>,
) -> (StatusCode, Json<Value>) {
    let Some(command) = AnimateCommand::from_wire(message, Origin::Local) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "ok": false, "error": "unknown command type" })),
        );
    };

    match hub.trigger(&command.to_wire()) {
        Ok(peers) => {
            log::debug!("http {} {:?} → {peers} peers", command.kind.as_str(), command.name);
            (StatusCode::OK, Json(json!({ "ok": true })))
        }
        Err(e) => {
            log::warn!("http trigger failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "ok": false, "error": e.to_string() })),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::{connect, RelayHub};
    use std::time::Duration;
    use tokio::sync::oneshot;
    use tokio::time::timeout;

    struct Running {
        hub: HubHandle,
        ws_url: String,
        http_url: String,
        _stop_ws: oneshot::Sender<()>,
        _stop_http: oneshot::Sender<()>,
    }

    async fn start() -> Running {
        let relay = RelayHub::bind("127.0.0.1:0").await.unwrap();
        let ws_url = format!("ws://{}", relay.local_addr().unwrap());
        let hub = relay.handle();
        let (stop_ws, ws_rx) = oneshot::channel::<()>();
        tokio::spawn(relay.serve(async move {
            let _ = ws_rx.await;
        }));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let http_url = format!("http://{}", listener.local_addr().unwrap());
        let (stop_http, http_rx) = oneshot::channel::<()>();
        tokio::spawn(serve_http(listener, hub.clone(), async move {
            let _ = http_rx.await;
        }));

        Running {
            hub,
            ws_url,
            http_url,
            _stop_ws: stop_ws,
            _stop_http: stop_http,
        }
    }

    async fn wait_for_peers(hub: &HubHandle, count: usize) {
        for _ in 0..200 {
            if hub.peer_count() == count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("expected {count} peers, saw {}", hub.peer_count());
    }

    #[tokio::test]
    async fn test_post_animate_reaches_connected_peer() {
        let relay = start().await;
        let mut peer = connect(&relay.ws_url).await.unwrap();
        wait_for_peers(&relay.hub, 1).await;

        let response = reqwest::Client::new()
            .post(format!("{}/animate", relay.http_url))
            .json(&json!({ "type": "emotion", "name": "happy", "value": 0.5 }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body, json!({ "ok": true }));

        let text = timeout(Duration::from_millis(500), peer.incoming.recv())
            .await
            .unwrap()
            .unwrap();
        let received = WireMessage::from_json(&text).unwrap();
        assert_eq!(received.kind, "emotion");
        assert_eq!(received.name, "happy");
        assert_eq!(received.value, Some(0.5));
    }

    #[tokio::test]
    async fn test_api_animate_alias_and_health() {
        let relay = start().await;
        let client = reqwest::Client::new();

        let health: Value = client
            .get(format!("{}/health", relay.http_url))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(health, json!({ "ok": true }));

        // 没有对端时仍然成功
        let response = client
            .post(format!("{}/api/animate", relay.http_url))
            .json(&json!({ "type": "action", "name": "nod" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_type_is_rejected() {
        let relay = start().await;
        let mut peer = connect(&relay.ws_url).await.unwrap();
        wait_for_peers(&relay.hub, 1).await;

        let response = reqwest::Client::new()
            .post(format!("{}/animate", relay.http_url))
            .json(&json!({ "type": "dance", "name": "macarena" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);

        let nothing = timeout(Duration::from_millis(200), peer.incoming.recv()).await;
        assert!(nothing.is_err());
    }
}
