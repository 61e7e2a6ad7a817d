use std::fmt;
use std::path::{Path, PathBuf};

use log::debug;
use serde::Serialize;

use crate::rank::best_match;
use crate::types::{ImageId, PathMap, RankEntry};

pub const NO_SIMILAR_IMAGES: &str = "no similar images found";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedImage {
    pub id: ImageId,
    pub score: f64,
    pub path: PathBuf,
}

/// 排序结果，`ranked` 按距离升序排列
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub query: PathBuf,
    pub ranked: Vec<RankedImage>,
    /// 距离最小的图片
    pub best: Option<RankedImage>,
}

impl Report {
    /// # Arguments
    ///
    /// * `query` - 查询图片路径
    /// * `ranks` - 已按升序排列的距离
    /// * `paths` - 图片 ID 到路径的映射
    pub fn new(query: PathBuf, ranks: &[RankEntry], paths: &PathMap) -> Self {
        let ranked = ranks
            .iter()
            .filter_map(|entry| {
                paths.get(entry.id).map(|path| RankedImage {
                    id: entry.id,
                    score: entry.score,
                    path: path.to_path_buf(),
                })
            })
            .collect::<Vec<_>>();
        let best = best_match(ranks)
            .and_then(|entry| ranked.iter().find(|image| image.id == entry.id))
            .cloned();
        Self { query, ranked, best }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.best {
            Some(best) => {
                for image in &self.ranked {
                    writeln!(f, "{:.2}\t{}", image.score, image.path.display())?;
                }
                writeln!(f)?;
                write!(f, "best match: {}", best.path.display())
            }
            None => write!(f, "{}", NO_SIMILAR_IMAGES),
        }
    }
}

/// 展示最佳匹配图片
pub trait Viewer {
    fn present(&mut self, path: &Path) -> anyhow::Result<()>;
}

/// 无界面环境，不做任何展示
pub struct Headless;

impl Viewer for Headless {
    fn present(&mut self, path: &Path) -> anyhow::Result<()> {
        debug!("headless mode, not presenting {}", path.display());
        Ok(())
    }
}

/// 使用 OpenCV HighGUI 窗口展示，关闭窗口后返回
#[cfg(feature = "opencv")]
pub struct HighGui;

#[cfg(feature = "opencv")]
impl Viewer for HighGui {
    fn present(&mut self, path: &Path) -> anyhow::Result<()> {
        crate::utils::imshow("best match", path)?;
        Ok(())
    }
}
