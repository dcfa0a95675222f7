//! 外部情绪分类器契约与回退

use std::future::Future;
use std::time::Duration;

use crate::{AvatarError, Result};

use super::{guess, Emotion};

/// 分类结果
#[derive(Clone, Debug, PartialEq)]
pub struct EmotionEstimate {
    /// 原始标签，交给状态机解析
    pub emotion: String,
    pub intensity: f32,
}

impl EmotionEstimate {
    pub fn new(emotion: impl Into<String>, intensity: f32) -> Self {
        Self {
            emotion: emotion.into(),
            intensity,
        }
    }
}

impl From<(Emotion, f32)> for EmotionEstimate {
    fn from((emotion, intensity): (Emotion, f32)) -> Self {
        Self::new(emotion.as_str(), intensity)
    }
}

/// 外部分类器：文本 → 情绪，可能失败、返回空或超时
pub trait EmotionClassifier {
    fn classify(&self, text: &str) -> impl Future<Output = Result<Option<EmotionEstimate>>> + Send;
}

/// 带超时调用分类器，超时返回 [`AvatarError::ClassifierTimeout`]
pub async fn classify_within<C>(
    classifier: &C,
    text: &str,
    timeout: Duration,
) -> Result<Option<EmotionEstimate>>
where
    C: EmotionClassifier,
{
    tokio::time::timeout(timeout, classifier.classify(text))
        .await
        .map_err(|_| AvatarError::ClassifierTimeout)?
}

/// 调用分类器，失败、空结果或超时都回退到关键词启发式
///
/// 不在帧循环上等待：结果到达后由调用方当作普通的情绪指令应用。
pub async fn classify_or_guess<C>(classifier: &C, text: &str, timeout: Duration) -> EmotionEstimate
where
    C: EmotionClassifier,
{
    match classify_within(classifier, text, timeout).await {
        Ok(Some(estimate)) => estimate,
        Ok(None) => {
            log::debug!("classifier returned nothing, using heuristic");
            guess(text).into()
        }
        Err(AvatarError::ClassifierTimeout) => {
            log::warn!("classifier timed out after {timeout:?}, using heuristic");
            guess(text).into()
        }
        Err(e) => {
            log::warn!("classifier failed: {e}, using heuristic");
            guess(text).into()
        }
    }
}
