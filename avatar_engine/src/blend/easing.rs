//! 缓动曲线

use serde::{Deserialize, Serialize};

/// 三次贝塞尔缓动，控制点 x 需在 [0,1] 内，y 也在 [0,1] 内时曲线单调
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BezierCurve {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BezierCurve {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            x1: x1.clamp(0.0, 1.0),
            y1: y1.clamp(0.0, 1.0),
            x2: x2.clamp(0.0, 1.0),
            y2: y2.clamp(0.0, 1.0),
        }
    }

    /// CSS `ease-in-out`
    pub fn ease_in_out() -> Self {
        Self::new(0.42, 0.0, 0.58, 1.0)
    }

    /// 评估曲线：先解出参数 `s` 使 x(s) = t，再取 y(s)
    pub fn evaluate(&self, t: f32) -> f32 {
        if t <= 0.0 {
            return 0.0;
        }
        if t >= 1.0 {
            return 1.0;
        }
        let s = solve_param(self.x1, self.x2, t);
        cubic(self.y1, self.y2, s).clamp(0.0, 1.0)
    }
}

/// 端点固定为 0 和 1 的三次贝塞尔分量
fn cubic(p1: f32, p2: f32, s: f32) -> f32 {
    let r = 1.0 - s;
    3.0 * r * r * s * p1 + 3.0 * r * s * s * p2 + s * s * s
}

fn cubic_slope(p1: f32, p2: f32, s: f32) -> f32 {
    let r = 1.0 - s;
    3.0 * r * r * p1 + 6.0 * r * s * (p2 - p1) + 3.0 * s * s * (1.0 - p2)
}

/// 牛顿迭代，斜率过小时退回二分
fn solve_param(p1: f32, p2: f32, target: f32) -> f32 {
    const EPS: f32 = 1e-6;
    let (mut lo, mut hi) = (0.0f32, 1.0f32);
    let mut s = target;

    for _ in 0..20 {
        let err = cubic(p1, p2, s) - target;
        if err.abs() < EPS {
            return s;
        }
        if err > 0.0 {
            hi = s;
        } else {
            lo = s;
        }
        let slope = cubic_slope(p1, p2, s);
        let next = if slope.abs() > EPS { s - err / slope } else { f32::NAN };
        s = if next > lo && next < hi { next } else { (lo + hi) * 0.5 };
    }
    s
}

impl Default for BezierCurve {
    fn default() -> Self {
        Self::ease_in_out()
    }
}

/// 补间使用的缓动函数，全部为 [0,1] → [0,1] 的连续单调映射
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Easing {
    Linear,
    #[default]
    QuadInOut,
    CubicInOut,
    SineInOut,
    Bezier(BezierCurve),
}

impl Easing {
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::QuadInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            Easing::CubicInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            Easing::SineInOut => -((std::f32::consts::PI * t).cos() - 1.0) / 2.0,
            Easing::Bezier(curve) => curve.evaluate(t),
        }
    }
}
