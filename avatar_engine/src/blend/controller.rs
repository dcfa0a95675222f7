//! 混合控制器

use std::collections::{HashMap, HashSet};

use crate::rig::RigIndex;

use super::{Easing, FollowUp, Tween};

/// 写入通道权重（限制在 [0,1]），返回写入的网格数
///
/// 没有该通道的网格直接跳过。
pub fn write_channel(rig: &RigIndex, channel: &str, value: f32) -> usize {
    let value = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };
    let mut written = 0;
    for mesh in rig.meshes() {
        if let Some(slot) = mesh.slot(channel) {
            mesh.influences().set(slot, value);
            written += 1;
        }
    }
    written
}

/// 读取第一个含该通道的网格上的当前值，不存在时为 0
pub fn read_channel(rig: &RigIndex, channel: &str) -> f32 {
    rig.meshes()
        .iter()
        .find_map(|mesh| mesh.slot(channel).and_then(|slot| mesh.influences().get(slot)))
        .unwrap_or(0.0)
}

/// 通道权重的唯一调度者
///
/// 每个通道同一时刻最多一个补间；新补间从旧补间在当前时刻的插值继续，不跳变。
/// 被口型驱动占用的通道拒绝补间。
#[derive(Debug, Default)]
pub struct BlendController {
    tweens: Vec<Tween>,
    claimed: HashSet<String>,
    /// 每个通道最近一次调度的最终目标，占用期间也照常记录
    resting: HashMap<String, f32>,
    default_easing: Easing,
}

impl BlendController {
    pub fn new(default_easing: Easing) -> Self {
        Self {
            tweens: Vec::new(),
            claimed: HashSet::new(),
            resting: HashMap::new(),
            default_easing,
        }
    }

    pub fn default_easing(&self) -> Easing {
        self.default_easing
    }

    /// 立即设置权重
    pub fn set_weight(&self, rig: &RigIndex, channel: &str, value: f32) -> usize {
        write_channel(rig, channel, value)
    }

    /// 当前写入的权重
    pub fn get_weight(&self, rig: &RigIndex, channel: &str) -> f32 {
        read_channel(rig, channel)
    }

    /// 指定时刻的实时值：有补间时取补间插值，否则取数组中的值
    pub fn live_weight(&self, rig: &RigIndex, channel: &str, now: f64) -> f32 {
        match self.find(channel) {
            Some(i) => self.tweens[i].value_at(now),
            None => read_channel(rig, channel),
        }
    }

    fn find(&self, channel: &str) -> Option<usize> {
        self.tweens.iter().position(|t| t.channel == channel)
    }

    /// 调度补间，取代该通道上已有的补间
    ///
    /// `duration <= 0` 时立即写入。通道被占用时返回 `false`。
    pub fn schedule_tween(
        &mut self,
        rig: &RigIndex,
        channel: &str,
        target: f32,
        duration: f32,
        easing: Option<Easing>,
        now: f64,
    ) -> bool {
        self.schedule(rig, channel, target, duration, easing, None, now)
    }

    /// 升到 `peak` 再回到 0 的脉冲，总时长 `duration`
    pub fn schedule_pulse(
        &mut self,
        rig: &RigIndex,
        channel: &str,
        peak: f32,
        duration: f32,
        now: f64,
    ) -> bool {
        let half = (duration * 0.5).max(0.0);
        let follow_up = FollowUp {
            target: 0.0,
            duration: half,
        };
        self.schedule(rig, channel, peak, half, Some(Easing::Linear), Some(follow_up), now)
    }

    #[allow(clippy::too_many_arguments)]
    fn schedule(
        &mut self,
        rig: &RigIndex,
        channel: &str,
        target: f32,
        duration: f32,
        easing: Option<Easing>,
        follow_up: Option<FollowUp>,
        now: f64,
    ) -> bool {
        let target = if target.is_nan() { 0.0 } else { target.clamp(0.0, 1.0) };
        let resting = follow_up.as_ref().map_or(target, |f| f.target.clamp(0.0, 1.0));
        self.resting.insert(channel.to_string(), resting);

        if self.claimed.contains(channel) {
            log::trace!("tween on {channel} deferred: claimed by visemes");
            return false;
        }

        let start_value = self.live_weight(rig, channel, now);
        self.cancel(channel);

        if duration <= 0.0 && follow_up.is_none() {
            write_channel(rig, channel, target);
            return true;
        }

        let mut tween = Tween::new(
            channel,
            start_value,
            target,
            now,
            duration,
            easing.unwrap_or(self.default_easing),
        );
        tween.follow_up = follow_up;
        self.tweens.push(tween);
        true
    }

    /// 取消通道上的补间，权重停在最后一次写入的值
    pub fn cancel(&mut self, channel: &str) -> Option<Tween> {
        self.find(channel).map(|i| self.tweens.remove(i))
    }

    /// 推进全部补间并写入权重
    pub fn tick(&mut self, rig: &RigIndex, now: f64) {
        let mut i = 0;
        while i < self.tweens.len() {
            let tween = &self.tweens[i];
            write_channel(rig, &tween.channel, tween.value_at(now));

            if !tween.is_finished(now) {
                i += 1;
                continue;
            }
            match tween.next_segment() {
                // 接续段原地替换，同一帧内再评估一次
                Some(next) => self.tweens[i] = next,
                None => {
                    self.tweens.remove(i);
                }
            }
        }
    }

    /// 占用通道：取消其上的补间，此后拒绝新的补间
    ///
    /// 被拒绝的补间目标仍会记下，释放时恢复。
    pub fn claim<'a, I>(&mut self, channels: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        for channel in channels {
            self.cancel(channel);
            self.claimed.insert(channel.to_string());
        }
    }

    /// 释放全部占用，每个通道从当前值补间回记下的目标（没有目标时回到 0）
    pub fn release_claims(&mut self, rig: &RigIndex, duration: f32, now: f64) {
        let claimed: Vec<String> = self.claimed.drain().collect();
        for channel in claimed {
            let target = self.resting_target(&channel).unwrap_or(0.0);
            if (read_channel(rig, &channel) - target).abs() > f32::EPSILON {
                self.schedule(rig, &channel, target, duration, None, None, now);
            }
        }
    }

    /// 通道最近一次调度的最终目标
    pub fn resting_target(&self, channel: &str) -> Option<f32> {
        self.resting.get(channel).copied()
    }

    pub fn is_claimed(&self, channel: &str) -> bool {
        self.claimed.contains(channel)
    }

    /// 换模型时调用：丢弃所有补间与占用
    pub fn clear(&mut self) {
        self.tweens.clear();
        self.claimed.clear();
        self.resting.clear();
    }

    pub fn tweens(&self) -> &[Tween] {
        &self.tweens
    }

    pub fn active_count(&self) -> usize {
        self.tweens.len()
    }

    pub fn is_animating(&self, channel: &str) -> bool {
        self.find(channel).is_some()
    }

    pub fn tween(&self, channel: &str) -> Option<&Tween> {
        self.find(channel).map(|i| &self.tweens[i])
    }
}
