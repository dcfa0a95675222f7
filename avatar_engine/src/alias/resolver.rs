//! 别名解析器（按 rig 代次缓存）

use std::collections::HashMap;

use crate::rig::RigIndex;

use super::{AliasTable, CanonicalKey};

/// 解析规范键到当前 rig 实际存在的通道名
///
/// 缓存与 [`RigIndex::generation`] 绑定，换模型后自动失效。
#[derive(Clone, Debug)]
pub struct AliasResolver {
    table: AliasTable,
    generation: Option<u64>,
    cache: HashMap<CanonicalKey, Option<String>>,
}

impl AliasResolver {
    pub fn new(table: AliasTable) -> Self {
        Self {
            table,
            generation: None,
            cache: HashMap::new(),
        }
    }

    pub fn table(&self) -> &AliasTable {
        &self.table
    }

    /// 丢弃缓存
    pub fn invalidate(&mut self) {
        self.cache.clear();
        self.generation = None;
    }

    /// 解析规范键；找不到返回 `None`（正常情况，调用方走回退路径）
    ///
    /// 按候选顺序取第一个在任意网格中存在的名字，网格顺序不参与决胜。
    pub fn resolve(&mut self, rig: &RigIndex, key: CanonicalKey) -> Option<String> {
        if self.generation != Some(rig.generation()) {
            self.cache.clear();
            self.generation = Some(rig.generation());
        }

        if let Some(hit) = self.cache.get(&key) {
            return hit.clone();
        }

        let found = self
            .table
            .candidates(key)
            .iter()
            .find(|name| rig.has_channel(name))
            .cloned();

        match &found {
            Some(name) => log::trace!("alias {key} -> {name}"),
            None => log::trace!("alias {key} absent on current rig"),
        }
        self.cache.insert(key, found.clone());
        found
    }

    /// 解析规范键到全部要写的通道
    ///
    /// 命中的名字带左右后缀时，若 rig 里也有对侧同名通道，一并返回（本侧在前）。
    pub fn resolve_channels(&mut self, rig: &RigIndex, key: CanonicalKey) -> Vec<String> {
        let Some(primary) = self.resolve(rig, key) else {
            return Vec::new();
        };
        let mirror = mirror_name(&primary).filter(|name| rig.has_channel(name));
        let mut channels = vec![primary];
        channels.extend(mirror);
        channels
    }

    /// 已缓存的条目数
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }
}

/// 左右成对的后缀
const SIDE_SUFFIXES: [(&str, &str); 4] = [("Left", "Right"), ("_L", "_R"), (".L", ".R"), ("_l", "_r")];

/// 对侧通道名：`mouthSmileLeft` → `mouthSmileRight`，`Brow_Drop_R` → `Brow_Drop_L`
fn mirror_name(name: &str) -> Option<String> {
    SIDE_SUFFIXES.iter().find_map(|&(left, right)| {
        if let Some(stem) = name.strip_suffix(left) {
            Some(format!("{stem}{right}"))
        } else {
            name.strip_suffix(right).map(|stem| format!("{stem}{left}"))
        }
    })
}

impl Default for AliasResolver {
    fn default() -> Self {
        Self::new(AliasTable::builtin())
    }
}
