//! 通道别名解析
//!
//! 不同管线（ARKit、VRM、CC4、Ready Player Me）对同一表情通道的命名各不相同，
//! 这里把"我们理解的语义"与"模型实际暴露的名字"分开。

mod resolver;
mod table;

pub use resolver::AliasResolver;
pub use table::AliasTable;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// 规范化能力键
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CanonicalKey {
    // 表情类别
    Smile,
    Frown,
    BrowUp,
    BrowDown,
    EyeWide,
    EyeBlink,
    JawOpen,
    MouthPucker,
    MouthSad,
    // 口型与眨眼
    MouthFunnel,
    MouthClose,
    MouthRollLower,
    MouthLowerDownLeft,
    MouthLowerDownRight,
    TongueOut,
    EyeBlinkLeft,
    EyeBlinkRight,
}

/// 情绪状态机管理的固定类别集合
pub const EXPRESSION_CATEGORIES: [CanonicalKey; 9] = [
    CanonicalKey::Smile,
    CanonicalKey::Frown,
    CanonicalKey::BrowUp,
    CanonicalKey::BrowDown,
    CanonicalKey::EyeWide,
    CanonicalKey::EyeBlink,
    CanonicalKey::JawOpen,
    CanonicalKey::MouthPucker,
    CanonicalKey::MouthSad,
];

impl CanonicalKey {
    pub const ALL: [CanonicalKey; 17] = [
        CanonicalKey::Smile,
        CanonicalKey::Frown,
        CanonicalKey::BrowUp,
        CanonicalKey::BrowDown,
        CanonicalKey::EyeWide,
        CanonicalKey::EyeBlink,
        CanonicalKey::JawOpen,
        CanonicalKey::MouthPucker,
        CanonicalKey::MouthSad,
        CanonicalKey::MouthFunnel,
        CanonicalKey::MouthClose,
        CanonicalKey::MouthRollLower,
        CanonicalKey::MouthLowerDownLeft,
        CanonicalKey::MouthLowerDownRight,
        CanonicalKey::TongueOut,
        CanonicalKey::EyeBlinkLeft,
        CanonicalKey::EyeBlinkRight,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalKey::Smile => "smile",
            CanonicalKey::Frown => "frown",
            CanonicalKey::BrowUp => "browUp",
            CanonicalKey::BrowDown => "browDown",
            CanonicalKey::EyeWide => "eyeWide",
            CanonicalKey::EyeBlink => "eyeBlink",
            CanonicalKey::JawOpen => "jawOpen",
            CanonicalKey::MouthPucker => "mouthPucker",
            CanonicalKey::MouthSad => "mouthSad",
            CanonicalKey::MouthFunnel => "mouthFunnel",
            CanonicalKey::MouthClose => "mouthClose",
            CanonicalKey::MouthRollLower => "mouthRollLower",
            CanonicalKey::MouthLowerDownLeft => "mouthLowerDownLeft",
            CanonicalKey::MouthLowerDownRight => "mouthLowerDownRight",
            CanonicalKey::TongueOut => "tongueOut",
            CanonicalKey::EyeBlinkLeft => "eyeBlinkLeft",
            CanonicalKey::EyeBlinkRight => "eyeBlinkRight",
        }
    }
}

impl fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CanonicalKey {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CanonicalKey::ALL
            .iter()
            .copied()
            .find(|k| k.as_str().eq_ignore_ascii_case(s))
            .ok_or(())
    }
}
