//! 情绪状态机
//!
//! 标签 + 强度 → 一批协调的补间：先把全部类别归零，再只抬起该情绪用到的类别。
//! 模型上一个表情通道都没有时退回到程序化动作。

mod classifier;
mod definition;
mod heuristic;
mod machine;

pub use classifier::{classify_or_guess, classify_within, EmotionClassifier, EmotionEstimate};
pub use definition::{CategoryTarget, EmotionDefinition, EmotionTable};
pub use heuristic::guess;
pub use machine::{EmotionOutcome, EmotionStateMachine};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// 规范情绪标签
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Neutral,
    Happy,
    Sad,
    Angry,
    Surprised,
    Fearful,
    Disgusted,
}

impl Emotion {
    pub const ALL: [Emotion; 7] = [
        Emotion::Neutral,
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Angry,
        Emotion::Surprised,
        Emotion::Fearful,
        Emotion::Disgusted,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Neutral => "neutral",
            Emotion::Happy => "happy",
            Emotion::Sad => "sad",
            Emotion::Angry => "angry",
            Emotion::Surprised => "surprised",
            Emotion::Fearful => "fearful",
            Emotion::Disgusted => "disgusted",
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Emotion {
    type Err = ();

    /// 只接受规范标签（忽略大小写与首尾空白），其他词交给启发式
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Emotion::ALL
            .iter()
            .copied()
            .find(|e| e.as_str().eq_ignore_ascii_case(s))
            .ok_or(())
    }
}
