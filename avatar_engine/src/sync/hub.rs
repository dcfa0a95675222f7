//! 中继服务
//!
//! 每个对端发来的文本原样转发给其它所有对端（不回发给发送者）；
//! [`RelayHub::trigger`] 供非 socket 集成一次性推送，发给全部对端。

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio_tungstenite::tungstenite::Message;

use crate::Result;

use super::WireMessage;

/// 对端编号
pub type PeerId = u64;

/// 转发队列长度，慢对端超出后丢最旧的消息
const FEED_CAPACITY: usize = 256;

#[derive(Clone, Debug)]
struct Envelope {
    /// `None` 表示来自 trigger
    from: Option<PeerId>,
    text: Arc<str>,
}

#[derive(Debug)]
struct HubState {
    feed: broadcast::Sender<Envelope>,
    peers: AtomicUsize,
    next_peer: AtomicU64,
}

impl HubState {
    fn trigger(&self, message: &WireMessage) -> Result<usize> {
        let text = message.to_json()?;
        let envelope = Envelope {
            from: None,
            text: text.into(),
        };
        // 没有对端时 send 返回 Err，不算失败
        Ok(self.feed.send(envelope).unwrap_or(0))
    }
}

/// 可克隆的服务句柄，`serve` 运行期间仍可推送消息
#[derive(Clone, Debug)]
pub struct HubHandle {
    state: Arc<HubState>,
}

impl HubHandle {
    /// 广播给全部对端，返回收到消息的对端数
    pub fn trigger(&self, message: &WireMessage) -> Result<usize> {
        self.state.trigger(message)
    }

    pub fn peer_count(&self) -> usize {
        self.state.peers.load(Ordering::SeqCst)
    }

    pub fn health(&self) -> serde_json::Value {
        health()
    }
}

fn health() -> serde_json::Value {
    serde_json::json!({ "ok": true })
}

/// WebSocket 中继服务
pub struct RelayHub {
    listener: TcpListener,
    state: Arc<HubState>,
}

impl RelayHub {
    pub async fn bind(addr: impl ToSocketAddrs) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let (feed, _) = broadcast::channel(FEED_CAPACITY);
        Ok(Self {
            listener,
            state: Arc::new(HubState {
                feed,
                peers: AtomicUsize::new(0),
                next_peer: AtomicU64::new(1),
            }),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn handle(&self) -> HubHandle {
        HubHandle {
            state: Arc::clone(&self.state),
        }
    }

    pub fn trigger(&self, message: &WireMessage) -> Result<usize> {
        self.state.trigger(message)
    }

    /// 健康检查
    pub fn health(&self) -> serde_json::Value {
        health()
    }

    pub fn peer_count(&self) -> usize {
        self.state.peers.load(Ordering::SeqCst)
    }

    /// 接受连接直到 `shutdown` 完成，随后通知所有连接关闭
    pub async fn serve<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send,
    {
        let addr = self.local_addr()?;
        log::info!("relay listening on ws://{addr}");

        let (shutdown_tx, _) = broadcast::channel::<()>(1);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                accept_result = self.listener.accept() => {
                    match accept_result {
                        Ok((stream, peer_addr)) => {
                            let state = Arc::clone(&self.state);
                            let shutdown_rx = shutdown_tx.subscribe();
                            tokio::spawn(handle_connection(stream, peer_addr, state, shutdown_rx));
                        }
                        Err(e) => {
                            log::warn!("accept error: {e}");
                        }
                    }
                }
                _ = &mut shutdown => {
                    let _ = shutdown_tx.send(());
                    log::info!("relay shutdown");
                    break;
                }
            }
        }

        Ok(())
    }
}

async fn handle_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: Arc<HubState>,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    let ws_stream = match tokio_tungstenite::accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            log::warn!("WebSocket handshake failed for {peer_addr}: {e}");
            return;
        }
    };

    let id = state.next_peer.fetch_add(1, Ordering::Relaxed);
    // 先订阅再计数，计数可见时该对端一定能收到后续消息
    let mut feed = state.feed.subscribe();
    state.peers.fetch_add(1, Ordering::SeqCst);
    log::info!("peer {id} connected from {peer_addr}");

    let (mut write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            msg_opt = read.next() => {
                match msg_opt {
                    Some(Ok(Message::Text(text))) => {
                        log::trace!("peer {id}: {text}");
                        let _ = state.feed.send(Envelope {
                            from: Some(id),
                            text: text.into(),
                        });
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        log::warn!("receive error for peer {id}: {e}");
                        break;
                    }
                }
            }
            envelope = feed.recv() => {
                match envelope {
                    Ok(envelope) => {
                        if envelope.from == Some(id) {
                            continue;
                        }
                        if let Err(e) = write.send(Message::Text(envelope.text.to_string())).await {
                            log::warn!("send error for peer {id}: {e}");
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        log::warn!("peer {id} lagging, {skipped} messages dropped");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            _ = shutdown_rx.recv() => {
                let _ = write.send(Message::Close(None)).await;
                break;
            }
        }
    }

    state.peers.fetch_sub(1, Ordering::SeqCst);
    log::info!("peer {id} disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::{connect, RelayConnection, Transport};
    use std::time::Duration;
    use tokio::sync::oneshot;
    use tokio::time::timeout;

    async fn start_hub() -> (HubHandle, String, oneshot::Sender<()>) {
        let hub = RelayHub::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}", hub.local_addr().unwrap());
        let handle = hub.handle();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        tokio::spawn(hub.serve(async move {
            let _ = stop_rx.await;
        }));
        (handle, url, stop_tx)
    }

    async fn wait_for_peers(handle: &HubHandle, count: usize) {
        for _ in 0..200 {
            if handle.peer_count() == count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("expected {count} peers, saw {}", handle.peer_count());
    }

    async fn next_message(conn: &mut RelayConnection) -> Option<String> {
        timeout(Duration::from_millis(300), conn.incoming.recv())
            .await
            .ok()
            .flatten()
    }

    #[tokio::test]
    async fn test_sender_is_excluded_from_broadcast() {
        let (handle, url, _stop) = start_hub().await;
        let mut a = connect(&url).await.unwrap();
        let mut b = connect(&url).await.unwrap();
        let mut c = connect(&url).await.unwrap();
        wait_for_peers(&handle, 3).await;

        let payload = r#"{"type":"emotion","name":"happy","value":1.0}"#;
        a.transport.send(payload).unwrap();

        assert_eq!(next_message(&mut b).await.as_deref(), Some(payload));
        assert_eq!(next_message(&mut c).await.as_deref(), Some(payload));
        assert_eq!(next_message(&mut a).await, None);
    }

    #[tokio::test]
    async fn test_trigger_reaches_every_peer() {
        let (handle, url, _stop) = start_hub().await;
        let mut a = connect(&url).await.unwrap();
        let mut b = connect(&url).await.unwrap();
        wait_for_peers(&handle, 2).await;

        let message = WireMessage {
            kind: "action".into(),
            name: "nod".into(),
            value: None,
            duration: Some(0.5),
        };
        assert_eq!(handle.trigger(&message).unwrap(), 2);

        for conn in [&mut a, &mut b] {
            let text = next_message(conn).await.unwrap();
            assert_eq!(WireMessage::from_json(&text).unwrap(), message);
        }
    }

    #[tokio::test]
    async fn test_trigger_without_peers() {
        let hub = RelayHub::bind("127.0.0.1:0").await.unwrap();
        let message = WireMessage {
            kind: "clip".into(),
            name: "wave".into(),
            value: None,
            duration: None,
        };
        assert_eq!(hub.trigger(&message).unwrap(), 0);
        assert_eq!(hub.health(), serde_json::json!({ "ok": true }));
        assert_eq!(hub.peer_count(), 0);
    }

    #[tokio::test]
    async fn test_disconnect_decrements_peers() {
        let (handle, url, _stop) = start_hub().await;
        let a = connect(&url).await.unwrap();
        let _b = connect(&url).await.unwrap();
        wait_for_peers(&handle, 2).await;

        drop(a);
        wait_for_peers(&handle, 1).await;
    }
}
