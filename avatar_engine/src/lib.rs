//! Avatar Engine - 头像表情驱动引擎
//!
//! 把情绪、口型和网络指令转换成对外部模型的 morph 权重与骨骼旋转：
//! - 模型索引与通道别名解析（ARKit / VRM / CC4 / RPM）
//! - 逐通道补间与缓动
//! - 情绪状态机与程序化动作回退
//! - 口型驱动
//! - 多人同步中继（无回声）

pub mod alias;
pub mod avatar;
pub mod blend;
pub mod clip;
pub mod config;
pub mod emotion;
pub mod gesture;
pub mod rig;
pub mod sync;
pub mod viseme;

pub use alias::{AliasResolver, AliasTable, CanonicalKey};
pub use avatar::AvatarAnimationContext;
pub use blend::{BlendController, Easing, Tween};
pub use clip::ClipLayerManager;
pub use config::AnimationConfig;
pub use emotion::{Emotion, EmotionOutcome, EmotionStateMachine};
pub use gesture::{GestureDriver, GestureKind};
pub use rig::{AssetLoader, LoadedAsset, RigIndex, SceneNode};
pub use sync::{AnimateCommand, CommandKind, Origin, RelayClient, RelayHub};
pub use viseme::{VisemeDriver, VisemeId};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AvatarError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to load {url}: {reason}")]
    Load { url: String, reason: String },

    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Malformed relay message: {0}")]
    Wire(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Classifier error: {0}")]
    Classifier(String),

    #[error("Classifier timed out")]
    ClassifierTimeout,
}

pub type Result<T> = std::result::Result<T, AvatarError>;
