//! 动画指令与线格式

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{AvatarError, Result};

/// 指令类型
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandKind {
    Emotion,
    Action,
    Clip,
    Viseme,
}

impl CommandKind {
    pub const ALL: [CommandKind; 4] = [
        CommandKind::Emotion,
        CommandKind::Action,
        CommandKind::Clip,
        CommandKind::Viseme,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CommandKind::Emotion => "emotion",
            CommandKind::Action => "action",
            CommandKind::Clip => "clip",
            CommandKind::Viseme => "viseme",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandKind {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or(())
    }
}

/// 指令来源，不参与序列化
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Origin {
    Local,
    Remote,
}

/// 中继线格式
///
/// `type` 保留为字符串：未知类型需要能解析出来再被忽略，而不是报错。
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WireMessage {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f32>,
}

impl WireMessage {
    pub fn from_json(payload: &str) -> Result<Self> {
        serde_json::from_str(payload).map_err(|e| AvatarError::Wire(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| AvatarError::Wire(e.to_string()))
    }
}

/// 一条动画指令
#[derive(Clone, Debug, PartialEq)]
pub struct AnimateCommand {
    pub kind: CommandKind,
    pub name: String,
    /// 强度 / 幅度，缺省按 1 处理
    pub value: Option<f32>,
    /// 时长覆盖（秒）
    pub duration: Option<f32>,
    pub origin: Origin,
}

impl AnimateCommand {
    pub fn new(kind: CommandKind, name: impl Into<String>, origin: Origin) -> Self {
        Self {
            kind,
            name: name.into(),
            value: None,
            duration: None,
            origin,
        }
    }

    pub fn local(kind: CommandKind, name: impl Into<String>) -> Self {
        Self::new(kind, name, Origin::Local)
    }

    pub fn with_value(mut self, value: f32) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_duration(mut self, duration: f32) -> Self {
        self.duration = Some(duration);
        self
    }

    /// 线格式 → 指令；未知类型返回 `None`
    pub fn from_wire(message: WireMessage, origin: Origin) -> Option<Self> {
        let kind = message.kind.parse::<CommandKind>().ok()?;
        Some(Self {
            kind,
            name: message.name,
            value: message.value.filter(|v| v.is_finite()),
            duration: message.duration.filter(|d| d.is_finite()),
            origin,
        })
    }

    pub fn to_wire(&self) -> WireMessage {
        WireMessage {
            kind: self.kind.as_str().to_string(),
            name: self.name.clone(),
            value: self.value,
            duration: self.duration,
        }
    }

    /// 解析收到的文本
    ///
    /// JSON 不合法时返回 [`AvatarError::Wire`]；类型未知时返回 `Ok(None)`。
    pub fn parse(payload: &str, origin: Origin) -> Result<Option<Self>> {
        let message = WireMessage::from_json(payload)?;
        Ok(Self::from_wire(message, origin))
    }
}
