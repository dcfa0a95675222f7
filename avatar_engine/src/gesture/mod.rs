//! 程序化动作
//!
//! 没有可用表情通道的模型，或显式的离散动作（点头、摇头、侧倾、转身），
//! 直接在骨骼上按固定波形旋转。

mod driver;

pub use driver::{GestureDriver, GestureState};

use std::f32::consts::TAU;
use std::fmt;
use std::str::FromStr;

use glam::Vec3;

use crate::rig::JointRole;

/// 动作种类
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GestureKind {
    Spin,
    Nod,
    Shake,
    Lean,
}

impl GestureKind {
    pub const ALL: [GestureKind; 4] = [
        GestureKind::Spin,
        GestureKind::Nod,
        GestureKind::Shake,
        GestureKind::Lean,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GestureKind::Spin => "spin",
            GestureKind::Nod => "nod",
            GestureKind::Shake => "shake",
            GestureKind::Lean => "lean",
        }
    }

    /// 作用的骨骼
    pub fn joint(&self) -> JointRole {
        match self {
            GestureKind::Spin => JointRole::Root,
            GestureKind::Nod | GestureKind::Shake => JointRole::Head,
            GestureKind::Lean => JointRole::Spine,
        }
    }

    /// 旋转轴（骨骼本地空间）
    pub fn axis(&self) -> Vec3 {
        match self {
            GestureKind::Spin | GestureKind::Shake => Vec3::Y,
            GestureKind::Nod => Vec3::X,
            GestureKind::Lean => Vec3::Z,
        }
    }

    /// 波形 f(x)，x ∈ [0,1]
    ///
    /// 转身单调走完一整圈；其余动作是一个完整的正弦周期。
    pub fn waveform(&self, x: f32) -> f32 {
        let x = x.clamp(0.0, 1.0);
        match self {
            GestureKind::Spin => x,
            GestureKind::Nod | GestureKind::Shake | GestureKind::Lean => (TAU * x).sin(),
        }
    }
}

impl fmt::Display for GestureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GestureKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        GestureKind::ALL
            .iter()
            .copied()
            .find(|g| g.as_str().eq_ignore_ascii_case(s))
            .ok_or(())
    }
}
