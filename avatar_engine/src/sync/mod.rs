//! 多人同步：指令线格式、中继客户端、中继服务及其 HTTP 入口
//!
//! 线上只有四个字段 `{type, name, value?, duration?}`，来源（本地/远端）不上线，
//! 由收发两端各自打标。远端指令只走 [`RelayClient::on_remote`]，
//! 该方法拿不到发送端，因此不会回声。

mod client;
mod command;
mod http;
mod hub;

pub use client::{connect, ChannelTransport, RelayClient, RelayConnection, Transport};
pub use command::{AnimateCommand, CommandKind, Origin, WireMessage};
pub use http::{router, serve_http};
pub use hub::{HubHandle, PeerId, RelayHub};
