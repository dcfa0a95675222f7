//! 单个头像实例的动画上下文

mod runtime;

pub use runtime::{AvatarAnimationContext, BLINK_ACTION};
