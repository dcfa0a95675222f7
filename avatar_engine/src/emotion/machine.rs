//! 情绪应用流程

use crate::alias::{AliasResolver, EXPRESSION_CATEGORIES};
use crate::blend::BlendController;
use crate::gesture::{GestureDriver, GestureKind};
use crate::rig::RigIndex;

use super::{guess, Emotion, EmotionTable};

/// 一次情绪应用的结果
#[derive(Clone, Debug, PartialEq)]
pub enum EmotionOutcome {
    /// 只执行了归零
    Neutral,
    /// 抬起了若干通道
    Expressed { emotion: Emotion, channels: usize },
    /// 模型上没有对应通道，改为播放动作；`played` 为假表示连骨骼也没有
    Gesture {
        emotion: Emotion,
        gesture: GestureKind,
        played: bool,
    },
    /// 没有通道也没有定义回退动作
    Unexpressed { emotion: Emotion },
}

/// 情绪状态机
#[derive(Clone, Debug)]
pub struct EmotionStateMachine {
    table: EmotionTable,
    reset_duration: f32,
}

fn clamp01(v: f32) -> f32 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}

impl EmotionStateMachine {
    pub fn new(table: EmotionTable, reset_duration: f32) -> Self {
        Self {
            table,
            reset_duration: reset_duration.max(0.0),
        }
    }

    pub fn table(&self) -> &EmotionTable {
        &self.table
    }

    /// 标签 → 已定义的情绪
    pub fn resolve_label(&self, label: &str) -> Emotion {
        self.interpret(label, 1.0).0
    }

    /// 标签与强度 → 实际应用的情绪与强度
    ///
    /// 已定义的标签沿用调用方强度。未知标签走一次关键词启发式，情绪和强度都取启发式结果；
    /// 启发式总是落在已定义情绪或 neutral 上，不会再递归。
    pub fn interpret(&self, label: &str, intensity: f32) -> (Emotion, f32) {
        if let Ok(emotion) = label.parse::<Emotion>() {
            if self.table.get(emotion).is_some() {
                return (emotion, intensity);
            }
        }
        let (emotion, guessed) = guess(label);
        if self.table.get(emotion).is_some() {
            log::debug!("unknown emotion label {label:?}, heuristic picked {emotion} at {guessed}");
            (emotion, guessed)
        } else {
            (Emotion::Neutral, 0.0)
        }
    }

    /// 应用情绪
    ///
    /// `duration` 覆盖定义里的抬起时长。
    #[allow(clippy::too_many_arguments)]
    pub fn apply(
        &self,
        rig: &RigIndex,
        resolver: &mut AliasResolver,
        blend: &mut BlendController,
        gestures: &mut GestureDriver,
        label: &str,
        intensity: f32,
        duration: Option<f32>,
        now: f64,
    ) -> EmotionOutcome {
        // 1. 所有类别先归零，避免上一个情绪残留
        for category in EXPRESSION_CATEGORIES {
            for channel in resolver.resolve_channels(rig, category) {
                blend.schedule_tween(rig, &channel, 0.0, self.reset_duration, None, now);
            }
        }

        // 2. 找定义
        let (emotion, intensity) = self.interpret(label, intensity);
        let Some(definition) = self.table.get(emotion) else {
            return EmotionOutcome::Neutral;
        };
        if emotion == Emotion::Neutral {
            return EmotionOutcome::Neutral;
        }

        // 3. 抬起用到的类别
        let intensity = clamp01(intensity);
        let mut resolved = 0;
        for target in &definition.targets {
            let channels = resolver.resolve_channels(rig, target.category);
            if channels.is_empty() {
                continue;
            }
            resolved += 1;
            let value = clamp01(intensity * target.factor);
            let raise = duration.unwrap_or(target.duration);
            for channel in &channels {
                blend.schedule_tween(rig, channel, value, raise, None, now);
            }
        }

        if resolved > 0 {
            return EmotionOutcome::Expressed {
                emotion,
                channels: resolved,
            };
        }

        // 4. 一个通道都没有：改用程序化动作
        match definition.fallback_gesture {
            Some(gesture) => {
                let played = gestures.play(rig, gesture, now);
                log::debug!("{emotion} has no morph channels on this rig, falling back to {gesture}");
                EmotionOutcome::Gesture {
                    emotion,
                    gesture,
                    played,
                }
            }
            None => EmotionOutcome::Unexpressed { emotion },
        }
    }
}

impl Default for EmotionStateMachine {
    fn default() -> Self {
        Self::new(EmotionTable::builtin(), 0.2)
    }
}
