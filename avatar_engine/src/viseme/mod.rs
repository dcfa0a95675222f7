//! 口型驱动
//!
//! 口型按音频帧节奏到达，直接覆盖写入、不做缓动，以免给信号增加延迟。
//! 采样持续到达期间口型通道归口型驱动所有，情绪补间不能碰。

use std::fmt;
use std::str::FromStr;

use crate::alias::{AliasResolver, CanonicalKey};
use crate::blend::{write_channel, BlendController};
use crate::rig::RigIndex;

/// 口型标识
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VisemeId {
    Aa,
    O,
    F,
    L,
    W,
    Sil,
}

impl VisemeId {
    pub const ALL: [VisemeId; 6] = [
        VisemeId::Aa,
        VisemeId::O,
        VisemeId::F,
        VisemeId::L,
        VisemeId::W,
        VisemeId::Sil,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VisemeId::Aa => "AA",
            VisemeId::O => "O",
            VisemeId::F => "F",
            VisemeId::L => "L",
            VisemeId::W => "W",
            VisemeId::Sil => "sil",
        }
    }

    /// 该口型驱动的通道
    pub fn channels(&self) -> &'static [CanonicalKey] {
        match self {
            VisemeId::Aa => &[CanonicalKey::JawOpen],
            VisemeId::O => &[CanonicalKey::MouthFunnel],
            VisemeId::F => &[
                CanonicalKey::MouthRollLower,
                CanonicalKey::MouthLowerDownLeft,
                CanonicalKey::MouthLowerDownRight,
            ],
            VisemeId::L => &[CanonicalKey::TongueOut, CanonicalKey::MouthClose],
            VisemeId::W => &[CanonicalKey::MouthPucker],
            VisemeId::Sil => &[CanonicalKey::MouthClose],
        }
    }

    /// 音素折叠到口型，无法识别时为 `None`
    pub fn from_phoneme(phoneme: &str) -> Option<Self> {
        let id = match phoneme.trim().to_ascii_lowercase().as_str() {
            "aa" | "ah" | "a" | "ae" | "e" | "eh" | "i" | "ih" | "iy" => VisemeId::Aa,
            "o" | "oh" | "ow" | "ao" | "aw" => VisemeId::O,
            "w" | "uw" | "oo" | "u" | "uh" => VisemeId::W,
            "f" | "v" => VisemeId::F,
            "l" | "t" | "d" | "n" | "th" | "dh" => VisemeId::L,
            "sil" | "sp" | "pau" | "" | "p" | "b" | "m" => VisemeId::Sil,
            _ => return None,
        };
        Some(id)
    }
}

impl fmt::Display for VisemeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VisemeId {
    type Err = ();

    /// 先按口型标识匹配，再按音素折叠
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VisemeId::ALL
            .iter()
            .copied()
            .find(|v| v.as_str().eq_ignore_ascii_case(s.trim()))
            .or_else(|| VisemeId::from_phoneme(s))
            .ok_or(())
    }
}

/// 所有口型涉及的规范键（去重）
fn vocabulary() -> Vec<CanonicalKey> {
    let mut keys: Vec<CanonicalKey> = Vec::new();
    for id in VisemeId::ALL {
        for key in id.channels() {
            if !keys.contains(key) {
                keys.push(*key);
            }
        }
    }
    keys
}

/// 口型驱动
#[derive(Debug)]
pub struct VisemeDriver {
    hold: f32,
    /// 释放后回到情绪目标的补间时长
    fade: f32,
    last_sample: Option<f64>,
}

impl VisemeDriver {
    pub fn new(hold: f32, fade: f32) -> Self {
        Self {
            hold: hold.max(0.0),
            fade: fade.max(0.0),
            last_sample: None,
        }
    }

    /// 正在占用口型通道
    pub fn is_active(&self) -> bool {
        self.last_sample.is_some()
    }

    fn resolved_vocabulary(rig: &RigIndex, resolver: &mut AliasResolver) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for key in vocabulary() {
            for name in resolver.resolve_channels(rig, key) {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        names
    }

    /// 应用一个口型采样
    ///
    /// 先把所有口型通道归零，再把 `id` 对应的通道设为 `strength`。
    /// 未知标识等同于静音：全部归零。
    pub fn apply(
        &mut self,
        rig: &RigIndex,
        resolver: &mut AliasResolver,
        blend: &mut BlendController,
        id: &str,
        strength: f32,
        now: f64,
    ) {
        let all = Self::resolved_vocabulary(rig, resolver);
        blend.claim(all.iter().map(String::as_str));
        for name in &all {
            write_channel(rig, name, 0.0);
        }

        match id.parse::<VisemeId>() {
            Ok(viseme) => {
                for key in viseme.channels() {
                    for name in resolver.resolve_channels(rig, *key) {
                        write_channel(rig, &name, strength);
                    }
                }
            }
            Err(()) => log::trace!("unknown viseme {id:?}, treating as silence"),
        }
        self.last_sample = Some(now);
    }

    /// 把通道交还给补间，各通道从口型值渐变回情绪目标
    pub fn release(&mut self, rig: &RigIndex, blend: &mut BlendController, now: f64) {
        if self.last_sample.take().is_none() {
            return;
        }
        blend.release_claims(rig, self.fade, now);
    }

    /// 超过保持时间没有新采样时自动释放
    pub fn tick(&mut self, rig: &RigIndex, blend: &mut BlendController, now: f64) {
        if let Some(last) = self.last_sample {
            if now - last > self.hold as f64 {
                self.release(rig, blend, now);
            }
        }
    }

    /// 换模型时调用，不触碰旧模型的数组
    pub fn reset(&mut self) {
        self.last_sample = None;
    }
}

impl Default for VisemeDriver {
    fn default() -> Self {
        Self::new(0.3, 0.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rig::{MorphMesh, SceneNode};

    const MOUTH: [&str; 8] = [
        "JawOpen",
        "MouthFunnel",
        "MouthF",
        "MouthLowerDownLeft",
        "MouthLowerDownRight",
        "TongueOut",
        "MouthClose",
        "MouthPucker",
    ];

    struct Fixture {
        rig: RigIndex,
        resolver: AliasResolver,
        blend: BlendController,
        driver: VisemeDriver,
    }

    impl Fixture {
        fn new() -> Self {
            let mut channels: Vec<(String, usize)> =
                MOUTH.iter().enumerate().map(|(i, n)| (n.to_string(), i)).collect();
            channels.push(("Smile".to_string(), MOUTH.len()));
            let scene = SceneNode::group("Scene").with_child(SceneNode::mesh("Face", MorphMesh::new(channels)));
            Self {
                rig: RigIndex::build(&scene),
                resolver: AliasResolver::default(),
                blend: BlendController::default(),
                driver: VisemeDriver::default(),
            }
        }

        fn apply(&mut self, id: &str, strength: f32, now: f64) {
            self.driver
                .apply(&self.rig, &mut self.resolver, &mut self.blend, id, strength, now);
        }

        fn weight(&self, channel: &str) -> f32 {
            self.blend.get_weight(&self.rig, channel)
        }
    }

    #[test]
    fn test_viseme_sets_mapped_channels() {
        let mut fx = Fixture::new();
        fx.apply("AA", 0.8, 0.0);
        assert!((fx.weight("JawOpen") - 0.8).abs() < 1e-6);
        fx.apply("F", 0.5, 0.02);
        assert_eq!(fx.weight("JawOpen"), 0.0);
        assert_eq!(fx.weight("MouthF"), 0.5);
        assert_eq!(fx.weight("MouthLowerDownLeft"), 0.5);
        assert_eq!(fx.weight("MouthLowerDownRight"), 0.5);
    }

    #[test]
    fn test_switch_to_silence_clears_other_visemes() {
        let mut fx = Fixture::new();
        fx.apply("AA", 0.8, 0.0);
        fx.apply("sil", 1.0, 0.02);
        for name in MOUTH {
            let expected = if name == "MouthClose" { 1.0 } else { 0.0 };
            assert_eq!(fx.weight(name), expected, "{name}");
        }
    }

    #[test]
    fn test_unknown_id_is_all_zero() {
        let mut fx = Fixture::new();
        fx.apply("W", 1.0, 0.0);
        fx.apply("QQ", 1.0, 0.02);
        for name in MOUTH {
            assert_eq!(fx.weight(name), 0.0, "{name}");
        }
    }

    #[test]
    fn test_visemes_exclude_emotion_tweens_until_released() {
        let mut fx = Fixture::new();
        fx.apply("AA", 0.6, 0.0);
        assert!(!fx.blend.schedule_tween(&fx.rig, "JawOpen", 0.15, 0.3, None, 0.05));
        assert!(fx.blend.schedule_tween(&fx.rig, "Smile", 1.0, 0.3, None, 0.05));

        fx.driver.tick(&fx.rig, &mut fx.blend, 0.2);
        assert!(fx.driver.is_active());
        fx.driver.tick(&fx.rig, &mut fx.blend, 0.5);
        assert!(!fx.driver.is_active());

        // 占用期间被拒的 0.15 在释放后补回，其余口型通道回到 0
        fx.blend.tick(&fx.rig, 0.7);
        assert!((fx.weight("JawOpen") - 0.15).abs() < 1e-6);
        assert_eq!(fx.weight("MouthClose"), 0.0);
        assert!(fx.blend.schedule_tween(&fx.rig, "JawOpen", 0.3, 0.3, None, 0.7));
    }

    #[test]
    fn test_phoneme_folding() {
        assert_eq!("aa".parse(), Ok(VisemeId::Aa));
        assert_eq!("SIL".parse(), Ok(VisemeId::Sil));
        assert_eq!(VisemeId::from_phoneme("v"), Some(VisemeId::F));
        assert_eq!(VisemeId::from_phoneme("oo"), Some(VisemeId::W));
        assert_eq!(VisemeId::from_phoneme("zz"), None);
    }
}
