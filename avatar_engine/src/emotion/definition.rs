//! 情绪定义表

use std::collections::HashMap;

use crate::alias::CanonicalKey;
use crate::gesture::GestureKind;

use super::Emotion;

/// 单个类别的目标：最终权重 = 强度 × factor
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CategoryTarget {
    pub category: CanonicalKey,
    pub factor: f32,
    /// 抬起时长（秒）
    pub duration: f32,
}

/// 情绪定义
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EmotionDefinition {
    pub targets: Vec<CategoryTarget>,
    /// 模型没有任何可用表情通道时播放的动作
    pub fallback_gesture: Option<GestureKind>,
}

impl EmotionDefinition {
    fn of(targets: &[(CanonicalKey, f32, f32)], fallback_gesture: Option<GestureKind>) -> Self {
        Self {
            targets: targets
                .iter()
                .map(|&(category, factor, duration)| CategoryTarget {
                    category,
                    factor,
                    duration,
                })
                .collect(),
            fallback_gesture,
        }
    }
}

/// 情绪 → 定义
#[derive(Clone, Debug, PartialEq)]
pub struct EmotionTable {
    definitions: HashMap<Emotion, EmotionDefinition>,
}

impl EmotionTable {
    /// 内置定义
    pub fn builtin() -> Self {
        use CanonicalKey::*;

        let mut definitions = HashMap::new();
        definitions.insert(Emotion::Neutral, EmotionDefinition::default());
        definitions.insert(
            Emotion::Happy,
            EmotionDefinition::of(
                &[(Smile, 1.0, 0.3), (JawOpen, 0.15, 0.3), (BrowUp, 0.2, 0.35)],
                Some(GestureKind::Nod),
            ),
        );
        definitions.insert(
            Emotion::Sad,
            EmotionDefinition::of(
                &[(Frown, 0.7, 0.5), (MouthSad, 0.9, 0.5), (BrowUp, 0.5, 0.6)],
                Some(GestureKind::Lean),
            ),
        );
        definitions.insert(
            Emotion::Angry,
            EmotionDefinition::of(
                &[(BrowDown, 1.0, 0.25), (Frown, 0.6, 0.25), (MouthPucker, 0.2, 0.3)],
                Some(GestureKind::Shake),
            ),
        );
        definitions.insert(
            Emotion::Surprised,
            EmotionDefinition::of(
                &[(EyeWide, 1.0, 0.15), (BrowUp, 1.0, 0.15), (JawOpen, 0.6, 0.2)],
                Some(GestureKind::Nod),
            ),
        );
        definitions.insert(
            Emotion::Fearful,
            EmotionDefinition::of(
                &[(EyeWide, 0.8, 0.2), (BrowUp, 0.7, 0.2), (MouthSad, 0.4, 0.3), (JawOpen, 0.2, 0.3)],
                Some(GestureKind::Lean),
            ),
        );
        definitions.insert(
            Emotion::Disgusted,
            EmotionDefinition::of(
                &[(BrowDown, 0.5, 0.3), (Frown, 0.6, 0.3), (MouthPucker, 0.4, 0.3), (EyeBlink, 0.3, 0.3)],
                Some(GestureKind::Shake),
            ),
        );
        Self { definitions }
    }

    pub fn get(&self, emotion: Emotion) -> Option<&EmotionDefinition> {
        self.definitions.get(&emotion)
    }

    pub fn insert(&mut self, emotion: Emotion, definition: EmotionDefinition) {
        self.definitions.insert(emotion, definition);
    }
}

impl Default for EmotionTable {
    fn default() -> Self {
        Self::builtin()
    }
}
