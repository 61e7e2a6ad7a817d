//! 扫描候选图片目录并提取描述符

use std::path::Path;
use std::time::Instant;

use image::ImageError;
use indicatif::ProgressBar;
use log::{debug, error, info, warn};

use crate::config::ScanOptions;
use crate::error::{BoxError, Error, Result};
use crate::features::{self, FeatureError, FeatureService};
use crate::matrix::DescriptorSet;
use crate::metrics;
use crate::types::{Collection, ImageId};
use crate::utils::{imread, scan_files};

/// 单张图片的处理失败
enum Failure {
    /// 跳过该图片，继续处理其他图片
    Skip(BoxError),
    /// 中止整个扫描
    Abort(BoxError),
}

fn process_image<F: FeatureService + ?Sized>(
    path: &Path,
    features: &mut F,
) -> std::result::Result<DescriptorSet, Failure> {
    let image = match imread(path) {
        Ok(image) => image,
        Err(ImageError::IoError(e)) => return Err(Failure::Abort(e.into())),
        Err(e) => return Err(Failure::Skip(e.into())),
    };
    match features::describe(features, &image) {
        Ok(descriptors) => Ok(descriptors),
        Err(e @ (FeatureError::NoKeypoints | FeatureError::NoDescriptors)) => {
            Err(Failure::Skip(e.into()))
        }
        Err(e) => Err(Failure::Abort(e.into())),
    }
}

/// 扫描目录下的所有普通文件（不递归），按枚举顺序从 1 开始分配 ID 并提取描述符
///
/// 无法解码或者没有特征点的图片会被跳过，但仍然占用一个 ID。
/// 任何一张图片出现 I/O 错误或特征提取异常都会中止整个扫描。
///
/// # Arguments
///
/// * `dir` - 图片集合所在目录
/// * `scan` - 扫描选项
/// * `features` - 特征提取服务
/// * `pb` - 进度条
pub fn ingest_collection<F: FeatureService + ?Sized>(
    dir: &Path,
    scan: &ScanOptions,
    features: &mut F,
    pb: &ProgressBar,
) -> Result<Collection> {
    if !dir.is_dir() {
        return Err(Error::InvalidIndexPath(dir.to_path_buf()));
    }
    let dir = std::path::absolute(dir).map_err(|_| Error::InvalidIndexPath(dir.to_path_buf()))?;

    let instant = Instant::now();
    let mut collection = Collection::default();
    let mut next_id = ImageId::FIRST;

    for entry in scan_files(&dir, scan) {
        let path = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| dir.clone());
            error!("{}: {}", display_name(&path), e);
            Error::aborted(path, e)
        })?;

        let id = next_id;
        next_id = id.next();
        collection.paths.insert(id, path.clone());
        pb.set_message(display_name(&path));
        pb.inc(1);

        match process_image(&path, features) {
            Ok(descriptors) => {
                debug!("{} -> #{}, {} descriptors", path.display(), id, descriptors.height());
                metrics::inc_indexed();
                collection.descriptors.push((id, descriptors));
            }
            Err(Failure::Skip(e)) => {
                warn!("{}: {}, skipped", path.display(), e);
                metrics::inc_skipped();
            }
            Err(Failure::Abort(e)) => {
                error!("{}: {}", display_name(&path), e);
                return Err(Error::aborted(path, e));
            }
        }
    }

    if collection.paths.is_empty() {
        return Err(Error::EmptyCollection(dir));
    }

    info!(
        "ingested {} of {} images in {:.2}s",
        collection.descriptors.len(),
        collection.paths.len(),
        instant.elapsed().as_secs_f32()
    );
    Ok(collection)
}

fn display_name(path: &Path) -> String {
    path.file_name().unwrap_or(path.as_os_str()).to_string_lossy().into_owned()
}
