//! 程序化动作驱动

use std::f32::consts::TAU;

use glam::Quat;

use crate::config::AnimationConfig;
use crate::rig::{JointHandle, JointRole, RigIndex};

use super::GestureKind;

/// 单个进行中的动作
#[derive(Clone, Debug)]
pub struct GestureState {
    pub kind: GestureKind,
    pub role: JointRole,
    joint: JointHandle,
    /// 开始时捕获的骨骼旋转
    pub base: Quat,
    pub start_time: f64,
    pub duration: f32,
    pub amplitude: f32,
}

impl GestureState {
    pub fn fraction(&self, now: f64) -> f32 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        ((now - self.start_time) / self.duration as f64).clamp(0.0, 1.0) as f32
    }

    /// base ∘ 绕轴旋转 amplitude × f(x)
    pub fn rotation_at(&self, now: f64) -> Quat {
        let angle = self.amplitude * self.kind.waveform(self.fraction(now));
        self.base * Quat::from_axis_angle(self.kind.axis(), angle)
    }
}

/// 程序化动作驱动，每根骨骼同时最多一个动作
#[derive(Debug)]
pub struct GestureDriver {
    active: Vec<GestureState>,
    /// (动作, 默认时长, 默认幅度)
    defaults: [(GestureKind, f32, f32); 4],
}

impl GestureDriver {
    pub fn new(config: &AnimationConfig) -> Self {
        Self {
            active: Vec::new(),
            defaults: [
                (GestureKind::Spin, config.spin_duration, config.spin_turns * TAU),
                (GestureKind::Nod, config.nod_duration, config.nod_amplitude),
                (GestureKind::Shake, config.shake_duration, config.shake_amplitude),
                (GestureKind::Lean, config.lean_duration, config.lean_amplitude),
            ],
        }
    }

    fn defaults_for(&self, kind: GestureKind) -> (f32, f32) {
        self.defaults
            .iter()
            .find(|(k, _, _)| *k == kind)
            .map(|&(_, duration, amplitude)| (duration, amplitude))
            .unwrap_or((1.0, 0.0))
    }

    /// 以默认时长和幅度播放
    pub fn play(&mut self, rig: &RigIndex, kind: GestureKind, now: f64) -> bool {
        self.play_with(rig, kind, now, None, 1.0)
    }

    /// 播放动作，取代同一骨骼上的旧动作
    ///
    /// 目标骨骼不存在时什么也不做，返回 `false`。
    pub fn play_with(
        &mut self,
        rig: &RigIndex,
        kind: GestureKind,
        now: f64,
        duration: Option<f32>,
        amplitude_scale: f32,
    ) -> bool {
        let role = kind.joint();
        let Some(joint) = rig.joint(role) else {
            log::debug!("gesture {kind} skipped: rig has no {role:?} joint");
            return false;
        };

        let (default_duration, default_amplitude) = self.defaults_for(kind);
        let state = GestureState {
            kind,
            role,
            joint: joint.clone(),
            base: joint.rotation(),
            start_time: now,
            duration: duration.unwrap_or(default_duration).max(0.0),
            amplitude: default_amplitude * amplitude_scale,
        };

        self.active.retain(|g| g.role != role);
        self.active.push(state);
        true
    }

    /// 推进所有动作
    ///
    /// 结束时骨骼停在波形终点（x = 1）的值上，不会跳回 base。
    pub fn tick(&mut self, now: f64) {
        self.active.retain(|gesture| {
            gesture.joint.set_rotation(gesture.rotation_at(now));
            gesture.fraction(now) < 1.0
        });
    }

    /// 换模型时丢弃全部动作
    pub fn clear(&mut self) {
        self.active.clear();
    }

    pub fn is_playing(&self, role: JointRole) -> bool {
        self.active.iter().any(|g| g.role == role)
    }

    pub fn active(&self, role: JointRole) -> Option<GestureKind> {
        self.active.iter().find(|g| g.role == role).map(|g| g.kind)
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }
}

impl Default for GestureDriver {
    fn default() -> Self {
        Self::new(&AnimationConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rig::SceneNode;

    fn skeleton() -> RigIndex {
        RigIndex::build(
            &SceneNode::joint("Hips")
                .with_child(SceneNode::joint("Spine").with_child(SceneNode::joint("Head"))),
        )
    }

    fn angle_about(q: Quat, axis: glam::Vec3) -> f32 {
        let (a, angle) = q.to_axis_angle();
        angle * a.dot(axis).signum()
    }

    #[test]
    fn test_nod_peaks_at_quarter_cycle() {
        let rig = skeleton();
        let mut driver = GestureDriver::default();
        assert!(driver.play(&rig, GestureKind::Nod, 0.0));

        let head = rig.joint(JointRole::Head).unwrap();
        driver.tick(0.2); // 0.8s 的四分之一
        let angle = angle_about(head.rotation(), glam::Vec3::X);
        assert!((angle - 0.25).abs() < 1e-3, "angle {angle}");
    }

    #[test]
    fn test_gesture_removed_after_duration_without_snap() {
        let rig = skeleton();
        let mut driver = GestureDriver::default();
        let root = rig.joint(JointRole::Root).unwrap();
        let base = Quat::from_rotation_x(0.3);
        root.set_rotation(base);

        driver.play_with(&rig, GestureKind::Spin, 0.0, Some(1.0), 0.25);
        driver.tick(0.5);
        assert!(driver.is_playing(JointRole::Root));
        driver.tick(1.0);
        assert!(!driver.is_playing(JointRole::Root));

        // 四分之一圈之后停在终点
        let expected = base * Quat::from_rotation_y(TAU * 0.25);
        assert!(root.rotation().abs_diff_eq(expected, 1e-4));

        // 之后的 tick 不再改动
        driver.tick(5.0);
        assert!(root.rotation().abs_diff_eq(expected, 1e-4));
    }

    #[test]
    fn test_defaults_follow_config() {
        let rig = skeleton();
        let config = AnimationConfig {
            nod_duration: 2.0,
            nod_amplitude: 0.1,
            ..AnimationConfig::default()
        };
        let mut driver = GestureDriver::new(&config);
        driver.play(&rig, GestureKind::Nod, 0.0);

        let head = rig.joint(JointRole::Head).unwrap();
        driver.tick(0.5);
        let angle = angle_about(head.rotation(), glam::Vec3::X);
        assert!((angle - 0.1).abs() < 1e-3, "angle {angle}");
        driver.tick(1.5);
        assert!(driver.is_playing(JointRole::Head));
    }

    #[test]
    fn test_missing_joint_is_noop() {
        let rig = RigIndex::build(&SceneNode::group("Scene"));
        let mut driver = GestureDriver::default();
        assert!(!driver.play(&rig, GestureKind::Shake, 0.0));
        assert_eq!(driver.active_count(), 0);
    }

    #[test]
    fn test_new_gesture_supersedes_on_same_joint() {
        let rig = skeleton();
        let mut driver = GestureDriver::default();
        driver.play(&rig, GestureKind::Nod, 0.0);
        driver.play(&rig, GestureKind::Shake, 0.1);
        driver.play(&rig, GestureKind::Lean, 0.1);
        assert_eq!(driver.active_count(), 2);
        assert_eq!(driver.active(JointRole::Head), Some(GestureKind::Shake));
        assert_eq!(driver.active(JointRole::Spine), Some(GestureKind::Lean));
    }

    #[test]
    fn test_base_captured_at_invocation() {
        let rig = skeleton();
        let head = rig.joint(JointRole::Head).unwrap();
        head.set_rotation(Quat::from_rotation_z(0.1));
        let mut driver = GestureDriver::default();
        driver.play(&rig, GestureKind::Shake, 0.0);
        driver.tick(0.8);
        assert!(head.rotation().abs_diff_eq(Quat::from_rotation_z(0.1), 1e-4));
    }
}
