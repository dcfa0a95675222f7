//! 关键词启发式（分类器不可用时的回退）

use super::Emotion;

/// 固定词表，按顺序匹配，先命中者胜
const VOCABULARY: &[(Emotion, &[&str])] = &[
    (Emotion::Angry, &["angry", "anger", "mad", "furious", "hate", "annoy", "rage"]),
    (Emotion::Sad, &["sad", "sorrow", "cry", "unhappy", "depress", "miss you", "lonely", "sorry"]),
    (Emotion::Fearful, &["afraid", "fear", "scared", "terrified", "anxious", "nervous"]),
    (Emotion::Disgusted, &["disgust", "gross", "yuck", "eww"]),
    (Emotion::Surprised, &["surprise", "wow", "whoa", "unbelievable", "omg", "shock"]),
    (Emotion::Happy, &["happy", "joy", "glad", "great", "love", "awesome", "smile", "laugh", "thanks"]),
];

const BASE_INTENSITY: f32 = 0.7;

/// 从文本（或未知标签）猜测情绪与强度
///
/// 结果总是已定义的情绪；无命中时为 `(Neutral, 0.0)`。感叹号把强度提到 1.0。
pub fn guess(text: &str) -> (Emotion, f32) {
    let lower = text.to_lowercase();
    let hit = VOCABULARY
        .iter()
        .find(|(_, words)| words.iter().any(|w| lower.contains(w)))
        .map(|(emotion, _)| *emotion);

    match hit {
        Some(emotion) => {
            let intensity = if lower.contains('!') { 1.0 } else { BASE_INTENSITY };
            (emotion, intensity)
        }
        None => (Emotion::Neutral, 0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_keywords() {
        assert_eq!(guess("I am so glad to see you").0, Emotion::Happy);
        assert_eq!(guess("joyful").0, Emotion::Happy);
        assert_eq!(guess("that makes me furious").0, Emotion::Angry);
        assert_eq!(guess("Wow").0, Emotion::Surprised);
    }

    #[test]
    fn test_exclamation_raises_intensity() {
        assert_eq!(guess("great!"), (Emotion::Happy, 1.0));
        assert_eq!(guess("great"), (Emotion::Happy, BASE_INTENSITY));
    }

    #[test]
    fn test_no_match_is_neutral() {
        assert_eq!(guess("the weather report"), (Emotion::Neutral, 0.0));
        assert_eq!(guess(""), (Emotion::Neutral, 0.0));
    }
}
