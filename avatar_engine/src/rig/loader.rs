//! 外部资源加载器契约

use crate::Result;

use super::SceneNode;

/// 资源内附带的动画片段描述
#[derive(Clone, Debug, PartialEq)]
pub struct ClipInfo {
    pub name: String,
    /// 时长（秒）
    pub duration: f32,
}

impl ClipInfo {
    pub fn new(name: impl Into<String>, duration: f32) -> Self {
        Self {
            name: name.into(),
            duration: duration.max(0.0),
        }
    }
}

/// 加载结果
#[derive(Clone, Debug)]
pub struct LoadedAsset {
    pub scene_root: SceneNode,
    pub clips: Vec<ClipInfo>,
}

impl LoadedAsset {
    pub fn new(scene_root: SceneNode) -> Self {
        Self {
            scene_root,
            clips: Vec::new(),
        }
    }

    pub fn with_clips(mut self, clips: Vec<ClipInfo>) -> Self {
        self.clips = clips;
        self
    }
}

/// 资源加载器（glTF/VRM 等解析在外部完成）
///
/// 失败时返回 [`crate::AvatarError::Load`]。
pub trait AssetLoader {
    fn load(&self, url: &str) -> Result<LoadedAsset>;
}
