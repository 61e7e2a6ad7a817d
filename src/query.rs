use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::config::ScanOptions;
use crate::error::{Error, Result};
use crate::features::{self, FeatureError, FeatureService};
use crate::matrix::DescriptorSet;
use crate::utils::{imread, scan_files};

/// 查询图片及其描述符
#[derive(Debug, Clone)]
pub struct QueryImage {
    pub path: PathBuf,
    pub descriptors: DescriptorSet,
}

/// 确定实际的查询图片路径
///
/// 如果 `path` 是目录，则取其中枚举到的第一个普通文件，其余文件被忽略
pub fn resolve_query_path(path: &Path, scan: &ScanOptions) -> Result<PathBuf> {
    if !path.exists() {
        return Err(Error::InvalidQueryPath(path.to_path_buf()));
    }
    if !path.is_dir() {
        return Ok(path.to_path_buf());
    }
    for entry in scan_files(path, scan) {
        match entry {
            Ok(file) => return Ok(file),
            Err(e) => warn!("{}: {}", path.display(), e),
        }
    }
    Err(Error::InvalidQueryPath(path.to_path_buf()))
}

/// 读取查询图片并提取描述符
pub fn resolve_query<F: FeatureService + ?Sized>(
    path: &Path,
    scan: &ScanOptions,
    features: &mut F,
) -> Result<QueryImage> {
    let path = resolve_query_path(path, scan)?;
    let image = match imread(&path) {
        Ok(image) => image,
        Err(source) => return Err(Error::UnreadableImage { path, source }),
    };
    let descriptors = match features::describe(features, &image) {
        Ok(descriptors) => descriptors,
        Err(FeatureError::NoKeypoints | FeatureError::NoDescriptors) => {
            return Err(Error::EmptyQueryDescriptors(path));
        }
        Err(source) => return Err(Error::FeatureService { path, source }),
    };
    debug!("query {}: {} descriptors", path.display(), descriptors.height());
    Ok(QueryImage { path, descriptors })
}
