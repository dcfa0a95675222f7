//! 动画片段播放状态
//!
//! 片段数据和骨骼采样在外部；这里只决定"哪个片段、播到哪、权重多少"。

mod layer;

pub use layer::{ClipLayer, ClipPhase};

pub use crate::rig::ClipInfo;

/// 片段层管理器
#[derive(Debug)]
pub struct ClipLayerManager {
    layers: Vec<ClipLayer>,
    clips: Vec<ClipInfo>,
    fade_time: f32,
}

impl ClipLayerManager {
    pub fn new(layer_count: usize, fade_time: f32) -> Self {
        let layers = (0..layer_count.max(1)).map(ClipLayer::new).collect();
        Self {
            layers,
            clips: Vec::new(),
            fade_time: fade_time.max(0.0),
        }
    }

    /// 换模型：替换可用片段并停掉所有层
    pub fn reset_clips(&mut self, clips: Vec<ClipInfo>) {
        self.clips = clips;
        for layer in &mut self.layers {
            layer.assign(None);
        }
    }

    pub fn clips(&self) -> &[ClipInfo] {
        &self.clips
    }

    pub fn clip(&self, name: &str) -> Option<&ClipInfo> {
        self.clips.iter().find(|c| c.name == name)
    }

    /// 播放片段，淡出其它正在播放的层
    ///
    /// 片段不存在时什么也不做，返回 `false`。
    pub fn play(&mut self, name: &str, fade: Option<f32>) -> bool {
        let Some(clip) = self.clip(name).cloned() else {
            log::debug!("clip {name:?} not found on current model");
            return false;
        };
        let fade = fade.unwrap_or(self.fade_time).max(0.0);

        for layer in &mut self.layers {
            if layer.is_playing() {
                layer.release(fade);
            }
        }

        // 优先用空闲层，否则抢占权重最低的层
        let index = self
            .layers
            .iter()
            .position(ClipLayer::is_idle)
            .unwrap_or_else(|| {
                self.layers
                    .iter()
                    .enumerate()
                    .min_by(|a, b| a.1.weight().total_cmp(&b.1.weight()))
                    .map(|(i, _)| i)
                    .unwrap_or(0)
            });

        let layer = &mut self.layers[index];
        layer.assign(Some(clip));
        layer.start(fade);
        true
    }

    pub fn update(&mut self, dt: f32) {
        for layer in &mut self.layers {
            layer.update(dt);
        }
    }

    pub fn layers(&self) -> &[ClipLayer] {
        &self.layers
    }

    /// 正在播放（含淡入）的片段名
    pub fn playing(&self) -> Option<&str> {
        self.layers
            .iter()
            .find(|l| l.is_playing())
            .and_then(ClipLayer::clip_name)
    }
}

impl Default for ClipLayerManager {
    fn default() -> Self {
        Self::new(4, 0.25)
    }
}
