//! 中继客户端

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

use crate::avatar::AvatarAnimationContext;
use crate::{AvatarError, Result};

use super::{AnimateCommand, Origin};

/// 出站通道，发送不得阻塞帧循环
pub trait Transport {
    fn send(&mut self, payload: &str) -> Result<()>;
}

/// 基于 mpsc 的出站通道，由后台任务负责真正的网络写入
#[derive(Clone, Debug)]
pub struct ChannelTransport {
    tx: mpsc::UnboundedSender<String>,
}

impl ChannelTransport {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Transport for ChannelTransport {
    fn send(&mut self, payload: &str) -> Result<()> {
        self.tx
            .send(payload.to_string())
            .map_err(|_| AvatarError::Transport("relay connection closed".into()))
    }
}

/// 一条到中继服务的连接
#[derive(Debug)]
pub struct RelayConnection {
    pub transport: ChannelTransport,
    /// 收到的原始文本，交给 [`RelayClient::on_remote`]
    pub incoming: mpsc::UnboundedReceiver<String>,
}

/// 连接中继服务
///
/// 读写各起一个后台任务；任一方向断开后通道随之关闭，不做重连。
pub async fn connect(url: &str) -> Result<RelayConnection> {
    let (ws_stream, _) = tokio_tungstenite::connect_async(url)
        .await
        .map_err(|e| AvatarError::Transport(format!("{url}: {e}")))?;
    log::info!("connected to relay {url}");

    let (mut write, mut read) = ws_stream.split();
    let (transport, mut outgoing) = ChannelTransport::new();
    let (incoming_tx, incoming) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Some(text) = outgoing.recv().await {
            if let Err(e) = write.send(Message::Text(text)).await {
                log::warn!("relay send failed: {e}");
                break;
            }
        }
        let _ = write.close().await;
    });

    let url = url.to_string();
    tokio::spawn(async move {
        while let Some(msg) = read.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    if incoming_tx.send(text).is_err() {
                        break;
                    }
                }
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    log::warn!("relay receive failed: {e}");
                    break;
                }
            }
        }
        log::info!("relay connection to {url} closed");
    });

    Ok(RelayConnection {
        transport,
        incoming,
    })
}

/// 中继客户端
///
/// 只有 `&mut self` 的方法能碰到出站通道；远端入口 [`on_remote`](Self::on_remote)
/// 只借用 `&self`，从类型上杜绝回声。
pub struct RelayClient<T> {
    transport: T,
    sent: usize,
}

impl<T: Transport> RelayClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport, sent: 0 }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// 已成功发出的指令数
    pub fn sent_count(&self) -> usize {
        self.sent
    }

    /// 序列化并发出一条本地指令
    ///
    /// 远端来源的指令拒绝发送。发送失败只记日志，指令在本地已经生效。
    pub fn send_local(&mut self, command: &AnimateCommand) -> bool {
        if command.origin != Origin::Local {
            log::warn!("refusing to relay {} {:?}: not local", command.kind, command.name);
            return false;
        }
        let payload = match command.to_wire().to_json() {
            Ok(payload) => payload,
            Err(e) => {
                log::warn!("failed to encode {} {:?}: {e}", command.kind, command.name);
                return false;
            }
        };
        match self.transport.send(&payload) {
            Ok(()) => {
                self.sent += 1;
                true
            }
            Err(e) => {
                log::warn!("dropping outbound {} {:?}: {e}", command.kind, command.name);
                false
            }
        }
    }

    /// 本地指令：先在本地生效，再发出
    pub fn dispatch_local(
        &mut self,
        ctx: &mut AvatarAnimationContext,
        command: &AnimateCommand,
        now: f64,
    ) -> bool {
        ctx.apply_command(command, now);
        self.send_local(command)
    }

    /// 远端文本：解析、打上远端标记并应用
    ///
    /// 不合法或类型未知的消息被丢弃，返回 `None`。
    pub fn on_remote(
        &self,
        ctx: &mut AvatarAnimationContext,
        payload: &str,
        now: f64,
    ) -> Option<AnimateCommand> {
        match AnimateCommand::parse(payload, Origin::Remote) {
            Ok(Some(command)) => {
                ctx.apply_command(&command, now);
                Some(command)
            }
            Ok(None) => {
                log::debug!("ignoring relay message with unknown type: {payload}");
                None
            }
            Err(e) => {
                log::warn!("dropping malformed relay message: {e}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rig::{JointRole, LoadedAsset, MorphMesh, SceneNode};
    use crate::sync::CommandKind;

    #[derive(Default)]
    struct RecordingTransport {
        sent: Vec<String>,
    }

    impl Transport for RecordingTransport {
        fn send(&mut self, payload: &str) -> Result<()> {
            self.sent.push(payload.to_string());
            Ok(())
        }
    }

    struct BrokenTransport;

    impl Transport for BrokenTransport {
        fn send(&mut self, _payload: &str) -> Result<()> {
            Err(AvatarError::Transport("offline".into()))
        }
    }

    fn context() -> AvatarAnimationContext {
        let mesh = MorphMesh::new([("mouthSmileLeft", 0), ("jawOpen", 1), ("mouthFunnel", 2)]);
        let scene = SceneNode::group("Scene")
            .with_child(SceneNode::mesh("Face", mesh))
            .with_child(SceneNode::joint("Head"));
        let mut ctx = AvatarAnimationContext::default();
        ctx.load_asset(LoadedAsset::new(scene));
        ctx
    }

    #[test]
    fn test_remote_commands_never_echo() {
        let mut ctx = context();
        let client = RelayClient::new(RecordingTransport::default());
        let payloads = [
            r#"{"type":"emotion","name":"happy","value":1.0}"#,
            r#"{"type":"action","name":"nod"}"#,
            r#"{"type":"viseme","name":"O","value":0.6}"#,
            r#"{"type":"clip","name":"wave"}"#,
            r#"{"type":"emotion","name":"happy","value":1.0}"#,
        ];
        for (i, payload) in payloads.iter().enumerate() {
            client.on_remote(&mut ctx, payload, i as f64 * 0.01);
        }
        assert!(client.transport().sent.is_empty());
        assert_eq!(client.sent_count(), 0);

        assert!(ctx.gestures().is_playing(JointRole::Head));
        assert!((ctx.weight("mouthFunnel") - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_send_local_refuses_remote_origin() {
        let mut client = RelayClient::new(RecordingTransport::default());
        let remote = AnimateCommand::new(CommandKind::Emotion, "sad", Origin::Remote);
        assert!(!client.send_local(&remote));
        assert!(client.transport().sent.is_empty());
    }

    #[test]
    fn test_dispatch_local_applies_and_sends() {
        let mut ctx = context();
        let mut client = RelayClient::new(RecordingTransport::default());
        let cmd = AnimateCommand::local(CommandKind::Viseme, "AA").with_value(0.9);
        assert!(client.dispatch_local(&mut ctx, &cmd, 0.0));

        assert!((ctx.weight("jawOpen") - 0.9).abs() < 1e-6);
        assert_eq!(client.sent_count(), 1);
        let wire: serde_json::Value = serde_json::from_str(&client.transport().sent[0]).unwrap();
        assert_eq!(wire["type"], "viseme");
        assert_eq!(wire["name"], "AA");
    }

    #[test]
    fn test_transport_failure_still_applies_locally() {
        let mut ctx = context();
        let mut client = RelayClient::new(BrokenTransport);
        let cmd = AnimateCommand::local(CommandKind::Action, "nod");
        assert!(!client.dispatch_local(&mut ctx, &cmd, 0.0));
        assert!(ctx.gestures().is_playing(JointRole::Head));
        assert_eq!(client.sent_count(), 0);
    }

    #[test]
    fn test_malformed_remote_is_dropped() {
        let mut ctx = context();
        let client = RelayClient::new(RecordingTransport::default());
        assert!(client.on_remote(&mut ctx, "not json", 0.0).is_none());
        assert!(client
            .on_remote(&mut ctx, r#"{"type":"teleport","name":"x"}"#, 0.0)
            .is_none());
        assert_eq!(ctx.blend().active_count(), 0);
    }

    #[test]
    fn test_channel_transport_closed() {
        let (mut transport, rx) = ChannelTransport::new();
        transport.send("{}").unwrap();
        drop(rx);
        assert!(matches!(transport.send("{}"), Err(AvatarError::Transport(_))));
    }
}
