//! 场景图契约与 Rig 索引
//!
//! 资源解析由外部加载器完成，这里只消费它产出的节点树：
//! - 带 morph 通道表和权重数组的网格节点
//! - 带旋转的骨骼节点
//! - 其余普通节点

mod index;
mod loader;

pub use index::{JointRole, MorphBinding, RigIndex};
pub use loader::{AssetLoader, ClipInfo, LoadedAsset};

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use glam::Quat;
use parking_lot::Mutex;

/// 网格标识（按身份区分，不按名称）
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MeshId(u64);

impl MeshId {
    /// 分配新的唯一标识
    pub fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        MeshId(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// 网格的 morph 权重数组，渲染器每帧读取
#[derive(Clone, Debug, Default)]
pub struct InfluenceArray(Arc<Mutex<Vec<f32>>>);

impl InfluenceArray {
    pub fn new(len: usize) -> Self {
        Self(Arc::new(Mutex::new(vec![0.0; len])))
    }

    pub fn len(&self) -> usize {
        self.0.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.lock().is_empty()
    }

    pub fn get(&self, slot: usize) -> Option<f32> {
        self.0.lock().get(slot).copied()
    }

    /// 写入权重，越界的槽位直接忽略
    pub fn set(&self, slot: usize, value: f32) {
        if let Some(v) = self.0.lock().get_mut(slot) {
            *v = value;
        }
    }

    /// 拷贝当前全部权重
    pub fn snapshot(&self) -> Vec<f32> {
        self.0.lock().clone()
    }

    pub fn ptr_eq(&self, other: &InfluenceArray) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// 骨骼节点的旋转句柄
#[derive(Clone, Debug, Default)]
pub struct JointHandle(Arc<Mutex<Quat>>);

impl JointHandle {
    pub fn new(rotation: Quat) -> Self {
        Self(Arc::new(Mutex::new(rotation)))
    }

    pub fn rotation(&self) -> Quat {
        *self.0.lock()
    }

    pub fn set_rotation(&self, rotation: Quat) {
        *self.0.lock() = rotation;
    }

    pub fn ptr_eq(&self, other: &JointHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// 带 morph 通道的网格
#[derive(Clone, Debug)]
pub struct MorphMesh {
    pub id: MeshId,
    pub channel_names: HashMap<String, usize>,
    pub influences: InfluenceArray,
}

impl MorphMesh {
    /// 按通道表创建，权重数组长度取最大槽位 + 1
    pub fn new<I, S>(channels: I) -> Self
    where
        I: IntoIterator<Item = (S, usize)>,
        S: Into<String>,
    {
        let channel_names: HashMap<String, usize> =
            channels.into_iter().map(|(n, i)| (n.into(), i)).collect();
        let len = channel_names.values().map(|i| i + 1).max().unwrap_or(0);
        Self {
            id: MeshId::next(),
            channel_names,
            influences: InfluenceArray::new(len),
        }
    }
}

/// 节点角色（封闭集合）
#[derive(Clone, Debug)]
pub enum NodeRole {
    RenderableWithMorphs(MorphMesh),
    SkeletalJoint(JointHandle),
    Generic,
}

/// 场景图节点
#[derive(Clone, Debug)]
pub struct SceneNode {
    pub name: String,
    pub role: NodeRole,
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    pub fn group(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: NodeRole::Generic,
            children: Vec::new(),
        }
    }

    pub fn mesh(name: impl Into<String>, mesh: MorphMesh) -> Self {
        Self {
            name: name.into(),
            role: NodeRole::RenderableWithMorphs(mesh),
            children: Vec::new(),
        }
    }

    pub fn joint(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: NodeRole::SkeletalJoint(JointHandle::new(Quat::IDENTITY)),
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, child: SceneNode) -> Self {
        self.children.push(child);
        self
    }
}
