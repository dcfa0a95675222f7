//! 动画配置
//!
//! 参数扁平化，默认值即推荐值；可从 JSON 覆盖任意子集。

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::alias::{AliasTable, CanonicalKey};
use crate::blend::Easing;
use crate::Result;

/// 动画配置（扁平化，不嵌套）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    // ========== 表情 ==========
    /// 切换情绪时各类别归零的时长（秒），默认 0.2
    pub reset_duration: f32,
    /// 补间默认缓动，默认 quad in/out
    pub default_easing: Easing,

    // ========== 程序化动作 ==========
    /// 点头时长（秒）与幅度（弧度）
    pub nod_duration: f32,
    pub nod_amplitude: f32,
    /// 摇头
    pub shake_duration: f32,
    pub shake_amplitude: f32,
    /// 上身侧倾
    pub lean_duration: f32,
    pub lean_amplitude: f32,
    /// 整体旋转时长与圈数
    pub spin_duration: f32,
    pub spin_turns: f32,
    /// 眨眼总时长（闭合 + 睁开）
    pub blink_duration: f32,

    // ========== 口型 ==========
    /// 最后一个口型采样之后保持占用的时间（秒）
    pub viseme_hold: f32,
    /// 释放后回到情绪目标的渐变时长（秒）
    pub viseme_release: f32,

    // ========== 外部协作 ==========
    /// 情绪分类器超时（毫秒）
    pub classifier_timeout_ms: u64,

    // ========== 动画片段 ==========
    /// 片段交叉淡入淡出时间（秒）
    pub clip_fade_time: f32,
    /// 片段层数
    pub clip_layers: usize,

    // ========== 别名 ==========
    /// 额外的候选通道名，插到内置列表之前
    pub alias_overrides: BTreeMap<CanonicalKey, Vec<String>>,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            // 太短会"啪"地一下切换，太长新旧表情会糊在一起
            reset_duration: 0.2,
            default_easing: Easing::QuadInOut,

            // 头部动作幅度不宜超过 ~20°，否则看起来像抽搐
            nod_duration: 0.8,
            nod_amplitude: 0.25,
            shake_duration: 0.8,
            shake_amplitude: 0.35,
            lean_duration: 1.2,
            lean_amplitude: 0.2,
            spin_duration: 1.5,
            spin_turns: 1.0,
            blink_duration: 0.12,

            // 音频帧约 10~40ms 一个，300ms 没有新采样就认为说完了
            viseme_hold: 0.3,
            viseme_release: 0.1,

            classifier_timeout_ms: 1500,

            clip_fade_time: 0.25,
            clip_layers: 4,

            alias_overrides: BTreeMap::new(),
        }
    }
}

impl AnimationConfig {
    /// 从 JSON 文本解析，缺省字段取默认值
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// 从 JSON 文件读取
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json_str(&text)?;
        log::info!("animation config loaded from {}", path.as_ref().display());
        Ok(config)
    }

    pub fn classifier_timeout(&self) -> Duration {
        Duration::from_millis(self.classifier_timeout_ms)
    }

    /// 内置别名表叠加覆盖项
    pub fn alias_table(&self) -> AliasTable {
        let mut table = AliasTable::builtin();
        for (key, names) in &self.alias_overrides {
            table.prepend(*key, names);
        }
        table
    }
}
