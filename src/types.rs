use std::collections::BTreeMap;
use std::fmt;
use std::num::NonZeroU64;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::matrix::DescriptorSet;

/// 图片 ID，单次排序过程内唯一，按枚举顺序从 1 开始分配
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ImageId(NonZeroU64);

impl ImageId {
    pub const FIRST: ImageId = ImageId(NonZeroU64::MIN);

    pub fn new(id: u64) -> Option<Self> {
        NonZeroU64::new(id).map(Self)
    }

    pub fn get(self) -> u64 {
        self.0.get()
    }

    /// 返回下一个 ID
    pub fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 图片 ID 到绝对路径的映射，只增不改
#[derive(Debug, Default, Clone)]
pub struct PathMap(BTreeMap<ImageId, PathBuf>);

impl PathMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录图片路径，ID 已存在时不做修改并返回 false
    pub fn insert(&mut self, id: ImageId, path: PathBuf) -> bool {
        if self.0.contains_key(&id) {
            return false;
        }
        self.0.insert(id, path);
        true
    }

    pub fn get(&self, id: ImageId) -> Option<&Path> {
        self.0.get(&id).map(PathBuf::as_path)
    }

    pub fn contains(&self, id: ImageId) -> bool {
        self.0.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ImageId, &Path)> {
        self.0.iter().map(|(&id, path)| (id, path.as_path()))
    }
}

/// 图片与查询图片的距离，越小越相似
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RankEntry {
    pub id: ImageId,
    pub score: f64,
}

impl RankEntry {
    pub fn new(id: ImageId, score: f64) -> Self {
        Self { id, score }
    }
}

/// 成功提取特征的候选图片，每项的描述符都非空
pub type CollectionDescriptors = Vec<(ImageId, DescriptorSet)>;

/// 按距离升序排列的结果
pub type CollectionRanks = Vec<RankEntry>;

/// 一次成功扫描得到的图片集合
#[derive(Debug, Default)]
pub struct Collection {
    pub paths: PathMap,
    pub descriptors: CollectionDescriptors,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_id_sequence() {
        let first = ImageId::FIRST;
        assert_eq!(first.get(), 1);
        assert_eq!(first.next().get(), 2);
        assert_eq!(ImageId::new(0), None);
        assert_eq!(ImageId::new(3).map(ImageId::get), Some(3));
    }

    #[test]
    fn test_path_map_never_overwrites() {
        let mut map = PathMap::new();
        assert!(map.insert(ImageId::FIRST, PathBuf::from("/a.png")));
        assert!(!map.insert(ImageId::FIRST, PathBuf::from("/b.png")));
        assert_eq!(map.get(ImageId::FIRST), Some(Path::new("/a.png")));
        assert_eq!(map.len(), 1);
    }
}
