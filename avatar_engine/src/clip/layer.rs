//! 片段层
//!
//! 每层记录自己的片段、播放时间和淡入淡出阶段；骨骼采样由外部混合器按层权重完成。

use super::ClipInfo;

/// 层所处阶段，淡入淡出的进度直接存在变体里
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ClipPhase {
    Idle,
    FadingIn { elapsed: f32, length: f32 },
    Full,
    /// `from` 为开始淡出时的权重
    FadingOut { from: f32, elapsed: f32, length: f32 },
}

/// 单个片段层
#[derive(Debug)]
pub struct ClipLayer {
    pub id: usize,
    clip: Option<ClipInfo>,
    time: f32,
    looping: bool,
    /// 播放到结尾时的淡出时长
    fade: f32,
    phase: ClipPhase,
}

impl ClipLayer {
    pub fn new(id: usize) -> Self {
        Self {
            id,
            clip: None,
            time: 0.0,
            looping: false,
            fade: 0.0,
            phase: ClipPhase::Idle,
        }
    }

    /// 换片段并回到空闲
    pub fn assign(&mut self, clip: Option<ClipInfo>) {
        self.clip = clip;
        self.time = 0.0;
        self.phase = ClipPhase::Idle;
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    /// 从头播放，`fade` 同时作为淡入和自然结束时的淡出时长
    pub fn start(&mut self, fade: f32) {
        if self.clip.is_none() {
            return;
        }
        self.time = 0.0;
        self.fade = fade.max(0.0);
        self.phase = if self.fade > 0.0 {
            ClipPhase::FadingIn {
                elapsed: 0.0,
                length: self.fade,
            }
        } else {
            ClipPhase::Full
        };
    }

    /// 从当前权重淡出
    pub fn release(&mut self, fade: f32) {
        let from = self.weight();
        if fade > 0.0 && from > 0.0 {
            self.phase = ClipPhase::FadingOut {
                from,
                elapsed: 0.0,
                length: fade,
            };
        } else {
            self.phase = ClipPhase::Idle;
            self.time = 0.0;
        }
    }

    /// 推进，返回是否仍在活动
    pub fn update(&mut self, dt: f32) -> bool {
        if self.clip.is_none() || self.phase == ClipPhase::Idle {
            return false;
        }
        let dt = dt.max(0.0);

        self.phase = match self.phase {
            ClipPhase::FadingIn { elapsed, length } if elapsed + dt >= length => ClipPhase::Full,
            ClipPhase::FadingIn { elapsed, length } => ClipPhase::FadingIn {
                elapsed: elapsed + dt,
                length,
            },
            ClipPhase::FadingOut { elapsed, length, .. } if elapsed + dt >= length => ClipPhase::Idle,
            ClipPhase::FadingOut { from, elapsed, length } => ClipPhase::FadingOut {
                from,
                elapsed: elapsed + dt,
                length,
            },
            phase => phase,
        };
        if self.phase == ClipPhase::Idle {
            self.time = 0.0;
            return false;
        }

        self.advance(dt);
        true
    }

    fn advance(&mut self, dt: f32) {
        let duration = match &self.clip {
            Some(clip) if clip.duration > 0.0 => clip.duration,
            _ => return,
        };
        self.time += dt;
        if self.time <= duration {
            return;
        }
        if self.looping {
            self.time %= duration;
            return;
        }
        self.time = duration;
        if !matches!(self.phase, ClipPhase::FadingOut { .. }) {
            self.release(self.fade);
        }
    }

    /// 当前混合权重
    pub fn weight(&self) -> f32 {
        match self.phase {
            ClipPhase::Idle => 0.0,
            ClipPhase::Full => 1.0,
            ClipPhase::FadingIn { elapsed, length } => (elapsed / length).clamp(0.0, 1.0),
            ClipPhase::FadingOut { from, elapsed, length } => {
                from * (1.0 - (elapsed / length).clamp(0.0, 1.0))
            }
        }
    }

    pub fn phase(&self) -> ClipPhase {
        self.phase
    }

    pub fn clip_name(&self) -> Option<&str> {
        self.clip.as_ref().map(|c| c.name.as_str())
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn is_idle(&self) -> bool {
        self.phase == ClipPhase::Idle
    }

    /// 淡入或满权重
    pub fn is_playing(&self) -> bool {
        matches!(self.phase, ClipPhase::Full | ClipPhase::FadingIn { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer_with(name: &str, duration: f32) -> ClipLayer {
        let mut layer = ClipLayer::new(0);
        layer.assign(Some(ClipInfo::new(name, duration)));
        layer
    }

    #[test]
    fn test_fade_in_reaches_full() {
        let mut layer = layer_with("wave", 2.0);
        layer.start(0.5);
        assert!(matches!(layer.phase(), ClipPhase::FadingIn { .. }));
        layer.update(0.25);
        assert!((layer.weight() - 0.5).abs() < 1e-5);
        layer.update(0.25);
        assert_eq!(layer.phase(), ClipPhase::Full);
        assert!((layer.time() - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_release_fades_from_current_weight() {
        let mut layer = layer_with("wave", 2.0);
        layer.start(1.0);
        layer.update(0.5);
        layer.release(1.0);
        assert!((layer.weight() - 0.5).abs() < 1e-5);
        layer.update(0.5);
        assert!((layer.weight() - 0.25).abs() < 1e-5);
        assert!(!layer.update(0.5));
        assert!(layer.is_idle());
    }

    #[test]
    fn test_one_shot_clip_stops_at_end() {
        let mut layer = layer_with("bow", 1.0);
        layer.start(0.0);
        layer.update(1.5);
        assert!(layer.is_idle());
        assert_eq!(layer.weight(), 0.0);
    }

    #[test]
    fn test_looping_clip_wraps() {
        let mut layer = layer_with("idle", 1.0);
        layer.set_looping(true);
        layer.start(0.0);
        layer.update(1.25);
        assert!(layer.is_playing());
        assert!((layer.time() - 0.25).abs() < 1e-5);
    }

    #[test]
    fn test_start_without_clip_is_noop() {
        let mut layer = ClipLayer::new(3);
        layer.start(0.5);
        assert!(layer.is_idle());
        assert!(!layer.update(0.1));
    }
}
