//! 别名表

use std::collections::HashMap;

use once_cell::sync::Lazy;

use super::CanonicalKey;

/// 规范键 → 候选通道名（优先级从高到低）
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AliasTable {
    entries: HashMap<CanonicalKey, Vec<String>>,
}

/// 内置别名：ARKit / Ready Player Me 在前，其次 VRM 1.0、VRM 0.x、CC4，最后是常见手工命名
static BUILTIN: Lazy<AliasTable> = Lazy::new(|| {
    let raw: &[(CanonicalKey, &[&str])] = &[
        (
            CanonicalKey::Smile,
            &[
                "mouthSmile",
                "mouthSmileLeft",
                "happy",
                "Joy",
                "Fcl_MTH_Joy",
                "Mouth_Smile",
                "Mouth_Smile_L",
                "smile",
                "Smile",
            ],
        ),
        (
            CanonicalKey::Frown,
            &["mouthFrownLeft", "mouthFrown", "Mouth_Frown_L", "Mouth_Frown", "frown", "Frown"],
        ),
        (
            CanonicalKey::BrowUp,
            &[
                "browInnerUp",
                "browOuterUpLeft",
                "Fcl_BRW_Surprised",
                "Brow_Raise_Inner_L",
                "Brow_Raise_Inner",
                "browUp",
                "BrowUp",
            ],
        ),
        (
            CanonicalKey::BrowDown,
            &[
                "browDownLeft",
                "browDown",
                "Fcl_BRW_Angry",
                "Brow_Drop_L",
                "Brow_Drop",
                "BrowDown",
            ],
        ),
        (
            CanonicalKey::EyeWide,
            &["eyeWideLeft", "eyeWide", "Fcl_EYE_Surprised", "Eye_Wide_L", "EyeWide"],
        ),
        (
            CanonicalKey::EyeBlink,
            &[
                "eyesClosed",
                "blink",
                "Blink",
                "Fcl_EYE_Close",
                "Eye_Blink",
                "eyeBlink",
                "EyeBlink",
                "eyeBlinkLeft",
                "Eye_Blink_L",
            ],
        ),
        (
            CanonicalKey::JawOpen,
            &["jawOpen", "aa", "A", "Fcl_MTH_A", "Jaw_Open", "Mouth_Open", "JawOpen", "MouthOpen"],
        ),
        (
            CanonicalKey::MouthPucker,
            &["mouthPucker", "ou", "U", "Fcl_MTH_U", "Mouth_Pucker", "MouthPucker"],
        ),
        (
            CanonicalKey::MouthSad,
            &["mouthShrugLower", "sad", "Sorrow", "Fcl_MTH_Sorrow", "Mouth_Down", "MouthSad"],
        ),
        (
            CanonicalKey::MouthFunnel,
            &["mouthFunnel", "oh", "O", "Fcl_MTH_O", "Mouth_Funnel", "MouthFunnel"],
        ),
        (
            CanonicalKey::MouthClose,
            &["mouthClose", "Fcl_MTH_Close", "Mouth_Close", "MouthClose"],
        ),
        (
            CanonicalKey::MouthRollLower,
            &["mouthRollLower", "viseme_FF", "Mouth_Roll_In_Lower", "MouthF"],
        ),
        (
            CanonicalKey::MouthLowerDownLeft,
            &["mouthLowerDownLeft", "Mouth_Lower_Down_L", "MouthLowerDownLeft"],
        ),
        (
            CanonicalKey::MouthLowerDownRight,
            &["mouthLowerDownRight", "Mouth_Lower_Down_R", "MouthLowerDownRight"],
        ),
        (
            CanonicalKey::TongueOut,
            &["tongueOut", "Tongue_Out", "TongueOut"],
        ),
        (
            CanonicalKey::EyeBlinkLeft,
            &["eyeBlinkLeft", "blinkLeft", "Blink_L", "Fcl_EYE_Close_L", "Eye_Blink_L", "EyeBlinkLeft"],
        ),
        (
            CanonicalKey::EyeBlinkRight,
            &["eyeBlinkRight", "blinkRight", "Blink_R", "Fcl_EYE_Close_R", "Eye_Blink_R", "EyeBlinkRight"],
        ),
    ];

    let mut table = AliasTable::new();
    for (key, names) in raw {
        table.set(*key, names.iter().map(|s| s.to_string()).collect());
    }
    table
});

impl AliasTable {
    /// 空表
    pub fn new() -> Self {
        Self::default()
    }

    /// 内置别名表的拷贝
    pub fn builtin() -> Self {
        BUILTIN.clone()
    }

    /// 整体替换某个键的候选列表
    pub fn set(&mut self, key: CanonicalKey, candidates: Vec<String>) {
        self.entries.insert(key, candidates);
    }

    pub fn with(mut self, key: CanonicalKey, candidates: &[&str]) -> Self {
        self.set(key, candidates.iter().map(|s| s.to_string()).collect());
        self
    }

    /// 把额外候选插到已有列表前面（重复项只保留靠前的一个）
    pub fn prepend(&mut self, key: CanonicalKey, extra: &[String]) {
        let existing = self.entries.remove(&key).unwrap_or_default();
        let mut merged: Vec<String> = Vec::with_capacity(extra.len() + existing.len());
        for name in extra.iter().chain(existing.iter()) {
            if !merged.contains(name) {
                merged.push(name.clone());
            }
        }
        self.entries.insert(key, merged);
    }

    /// 候选列表，未配置时为空
    pub fn candidates(&self, key: CanonicalKey) -> &[String] {
        self.entries.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }
}
