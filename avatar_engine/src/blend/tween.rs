//! 单通道补间

use super::Easing;

/// 补间结束后自动接续的一段（用于眨眼这类先升后降的脉冲）
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FollowUp {
    pub target: f32,
    pub duration: f32,
}

/// 通道补间
#[derive(Clone, Debug, PartialEq)]
pub struct Tween {
    pub channel: String,
    pub start_value: f32,
    pub target: f32,
    pub start_time: f64,
    pub end_time: f64,
    pub easing: Easing,
    pub follow_up: Option<FollowUp>,
}

impl Tween {
    pub fn new(
        channel: impl Into<String>,
        start_value: f32,
        target: f32,
        start_time: f64,
        duration: f32,
        easing: Easing,
    ) -> Self {
        Self {
            channel: channel.into(),
            start_value,
            target,
            start_time,
            end_time: start_time + duration.max(0.0) as f64,
            easing,
            follow_up: None,
        }
    }

    /// 归一化进度，限制在 [0,1]
    pub fn fraction(&self, now: f64) -> f32 {
        let span = self.end_time - self.start_time;
        if span <= 0.0 {
            return 1.0;
        }
        ((now - self.start_time) / span).clamp(0.0, 1.0) as f32
    }

    /// 指定时刻的插值结果
    pub fn value_at(&self, now: f64) -> f32 {
        let eased = self.easing.apply(self.fraction(now));
        self.start_value + (self.target - self.start_value) * eased
    }

    pub fn is_finished(&self, now: f64) -> bool {
        self.fraction(now) >= 1.0
    }

    /// 结束后接续的补间，从本段终点出发
    pub fn next_segment(&self) -> Option<Tween> {
        self.follow_up.map(|next| {
            Tween::new(
                self.channel.clone(),
                self.target,
                next.target,
                self.end_time,
                next.duration,
                self.easing,
            )
        })
    }
}
