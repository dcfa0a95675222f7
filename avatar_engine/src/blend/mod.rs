//! 表情通道补间与混合

mod controller;
mod easing;
mod tween;

pub use controller::{read_channel, write_channel, BlendController};
pub use easing::{BezierCurve, Easing};
pub use tween::{FollowUp, Tween};
