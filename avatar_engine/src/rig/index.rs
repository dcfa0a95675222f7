//! Rig 索引构建

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use super::{InfluenceArray, JointHandle, MeshId, NodeRole, SceneNode};

/// 程序化动作使用的骨骼角色
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum JointRole {
    Head,
    Spine,
    Root,
}

impl JointRole {
    pub const ALL: [JointRole; 3] = [JointRole::Head, JointRole::Spine, JointRole::Root];

    /// 常见骨骼名称（按优先级）
    pub fn candidates(&self) -> &'static [&'static str] {
        match self {
            JointRole::Head => &[
                "Head",
                "head",
                "頭",
                "mixamorig:Head",
                "J_Bip_C_Head",
                "CC_Base_Head",
            ],
            JointRole::Spine => &[
                "Spine",
                "spine",
                "上半身",
                "Spine1",
                "mixamorig:Spine",
                "J_Bip_C_Spine",
                "CC_Base_Spine01",
            ],
            JointRole::Root => &[
                "Hips",
                "hips",
                "mixamorig:Hips",
                "J_Bip_C_Hips",
                "CC_Base_Hip",
                "センター",
                "Root",
                "root",
                "Armature",
            ],
        }
    }
}

/// 单个网格的通道绑定
#[derive(Clone, Debug)]
pub struct MorphBinding {
    pub mesh: MeshId,
    pub name: String,
    channels: HashMap<String, usize>,
    influences: InfluenceArray,
}

impl MorphBinding {
    pub fn slot(&self, channel: &str) -> Option<usize> {
        self.channels.get(channel).copied()
    }

    pub fn influences(&self) -> &InfluenceArray {
        &self.influences
    }

    pub fn channel_names(&self) -> impl Iterator<Item = &str> {
        self.channels.keys().map(String::as_str)
    }
}

/// 模型加载后的规范化索引
///
/// 每次加载整体重建；`generation` 在进程内唯一，解析缓存以此判断是否过期。
#[derive(Clone, Debug)]
pub struct RigIndex {
    generation: u64,
    meshes: Vec<MorphBinding>,
    joints: HashMap<JointRole, JointHandle>,
}

fn next_generation() -> u64 {
    static COUNTER: AtomicU64 = AtomicU64::new(1);
    COUNTER.fetch_add(1, Ordering::Relaxed)
}

impl RigIndex {
    /// 空索引（尚未加载模型）
    pub fn empty() -> Self {
        Self {
            generation: next_generation(),
            meshes: Vec::new(),
            joints: HashMap::new(),
        }
    }

    /// 遍历一次场景图，收集 morph 网格与骨骼
    pub fn build(root: &SceneNode) -> Self {
        let mut meshes = Vec::new();
        let mut named_joints: HashMap<&str, &JointHandle> = HashMap::new();

        // 先序遍历，同名骨骼以先出现者为准
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            match &node.role {
                NodeRole::RenderableWithMorphs(mesh) => {
                    if !mesh.channel_names.is_empty() && !mesh.influences.is_empty() {
                        meshes.push(MorphBinding {
                            mesh: mesh.id,
                            name: node.name.clone(),
                            channels: mesh.channel_names.clone(),
                            influences: mesh.influences.clone(),
                        });
                    }
                }
                NodeRole::SkeletalJoint(handle) => {
                    named_joints.entry(node.name.as_str()).or_insert(handle);
                }
                NodeRole::Generic => {}
            }
            stack.extend(node.children.iter().rev());
        }

        let mut joints = HashMap::new();
        for role in JointRole::ALL {
            let found = role
                .candidates()
                .iter()
                .find_map(|name| named_joints.get(name));
            if let Some(handle) = found {
                joints.insert(role, (*handle).clone());
            }
        }

        log::debug!(
            "rig index built: {} morph meshes, joints {:?}",
            meshes.len(),
            joints.keys().collect::<Vec<_>>()
        );

        Self {
            generation: next_generation(),
            meshes,
            joints,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn meshes(&self) -> &[MorphBinding] {
        &self.meshes
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    /// 没有任何 morph 通道
    pub fn has_morphs(&self) -> bool {
        !self.meshes.is_empty()
    }

    /// 至少一个网格包含该通道
    pub fn has_channel(&self, channel: &str) -> bool {
        self.meshes.iter().any(|m| m.slot(channel).is_some())
    }

    pub fn joint(&self, role: JointRole) -> Option<&JointHandle> {
        self.joints.get(&role)
    }
}

impl Default for RigIndex {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rig::MorphMesh;

    fn sample_scene() -> SceneNode {
        SceneNode::group("Scene")
            .with_child(SceneNode::mesh(
                "Face",
                MorphMesh::new([("Smile", 0), ("JawOpen", 1)]),
            ))
            .with_child(SceneNode::mesh("Body", MorphMesh::new(Vec::<(String, usize)>::new())))
            .with_child(
                SceneNode::joint("Hips")
                    .with_child(SceneNode::joint("Spine").with_child(SceneNode::joint("Head"))),
            )
    }

    #[test]
    fn test_build_collects_morph_meshes() {
        let rig = RigIndex::build(&sample_scene());
        assert_eq!(rig.mesh_count(), 1);
        assert!(rig.has_channel("Smile"));
        assert!(rig.has_channel("JawOpen"));
        assert!(!rig.has_channel("Frown"));
        assert_eq!(rig.meshes()[0].slot("JawOpen"), Some(1));
        assert_eq!(rig.meshes()[0].influences().len(), 2);
    }

    #[test]
    fn test_build_records_joints() {
        let rig = RigIndex::build(&sample_scene());
        assert!(rig.joint(JointRole::Head).is_some());
        assert!(rig.joint(JointRole::Spine).is_some());
        assert!(rig.joint(JointRole::Root).is_some());
    }

    #[test]
    fn test_joint_candidates_follow_priority() {
        let scene = SceneNode::group("Scene")
            .with_child(SceneNode::joint("head"))
            .with_child(SceneNode::joint("Head"));
        let rig = RigIndex::build(&scene);
        let head = rig.joint(JointRole::Head).unwrap();
        let NodeRole::SkeletalJoint(expected) = &scene.children[1].role else {
            panic!("expected joint");
        };
        assert!(head.ptr_eq(expected));
    }

    #[test]
    fn test_scene_without_morphs_is_not_an_error() {
        let scene = SceneNode::group("Scene").with_child(SceneNode::joint("Head"));
        let rig = RigIndex::build(&scene);
        assert!(!rig.has_morphs());
        assert_eq!(rig.mesh_count(), 0);
    }

    #[test]
    fn test_generations_are_unique() {
        let scene = sample_scene();
        let a = RigIndex::build(&scene);
        let b = RigIndex::build(&scene);
        assert_ne!(a.generation(), b.generation());
    }
}
