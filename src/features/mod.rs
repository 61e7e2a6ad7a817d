//! 特征点检测、描述符提取与匹配
//!
//! 排序流程只通过 [`FeatureService`] 使用这些能力，具体实现可以替换。

use image::GrayImage;
use serde::Serialize;
use thiserror::Error;

use crate::matrix::DescriptorSet;

pub mod native;
#[cfg(feature = "opencv")]
pub mod opencv_orb;

pub use native::NativeOrb;
#[cfg(feature = "opencv")]
pub use opencv_orb::OpenCvOrb;

#[derive(Error, Debug)]
pub enum FeatureError {
    #[error("no keypoints detected")]
    NoKeypoints,
    #[error("no descriptors extracted")]
    NoDescriptors,
    #[error("descriptor dimension mismatch: query {query}, candidate {candidate}")]
    DimensionMismatch { query: usize, candidate: usize },
    #[error("matcher returned {actual} matches for {expected} query descriptors")]
    IncompleteMatches { expected: usize, actual: usize },
    #[error("invalid match distance: {0}")]
    InvalidDistance(f32),
    #[error("feature backend error: {0}")]
    Backend(String),
}

#[cfg(feature = "opencv")]
impl From<opencv::Error> for FeatureError {
    fn from(err: opencv::Error) -> Self {
        FeatureError::Backend(err.to_string())
    }
}

/// 特征点
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    /// 邻域直径
    pub size: f32,
    /// 方向，-1 表示没有方向
    pub angle: f32,
    /// 响应强度
    pub response: f32,
    pub octave: i32,
}

impl Keypoint {
    pub fn new(x: f32, y: f32, response: f32) -> Self {
        Self { x, y, size: 31., angle: -1., response, octave: 0 }
    }
}

/// 查询描述符的最佳匹配
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DescriptorMatch {
    /// 查询描述符的行号
    pub query_index: usize,
    /// 候选描述符的行号
    pub candidate_index: usize,
    /// 匹配距离，非负
    pub distance: f32,
}

pub trait FeatureService {
    /// 检测特征点
    fn detect(&mut self, image: &GrayImage) -> Result<Vec<Keypoint>, FeatureError>;

    /// 计算特征点的描述符，无法计算描述符的特征点会被丢弃
    fn extract(
        &mut self,
        image: &GrayImage,
        keypoints: &[Keypoint],
    ) -> Result<DescriptorSet, FeatureError>;

    /// 为每个查询描述符寻找候选描述符中的最佳匹配，按查询行号排列
    fn match_descriptors(
        &mut self,
        query: &DescriptorSet,
        candidate: &DescriptorSet,
    ) -> Result<Vec<DescriptorMatch>, FeatureError>;

    /// 检测特征点并提取描述符
    fn detect_and_extract(&mut self, image: &GrayImage) -> Result<DescriptorSet, FeatureError> {
        let keypoints = self.detect(image)?;
        if keypoints.is_empty() {
            return Err(FeatureError::NoKeypoints);
        }
        let descriptors = self.extract(image, &keypoints)?;
        if descriptors.is_empty() {
            return Err(FeatureError::NoDescriptors);
        }
        Ok(descriptors)
    }
}

impl<T: FeatureService + ?Sized> FeatureService for Box<T> {
    fn detect(&mut self, image: &GrayImage) -> Result<Vec<Keypoint>, FeatureError> {
        (**self).detect(image)
    }

    fn extract(
        &mut self,
        image: &GrayImage,
        keypoints: &[Keypoint],
    ) -> Result<DescriptorSet, FeatureError> {
        (**self).extract(image, keypoints)
    }

    fn match_descriptors(
        &mut self,
        query: &DescriptorSet,
        candidate: &DescriptorSet,
    ) -> Result<Vec<DescriptorMatch>, FeatureError> {
        (**self).match_descriptors(query, candidate)
    }

    fn detect_and_extract(&mut self, image: &GrayImage) -> Result<DescriptorSet, FeatureError> {
        (**self).detect_and_extract(image)
    }
}

/// 预处理后提取描述符，查询图片与候选图片都经由此处
pub fn describe<F: FeatureService + ?Sized>(
    features: &mut F,
    image: &GrayImage,
) -> Result<DescriptorSet, FeatureError> {
    let image = crate::preprocess::preprocess(image);
    features.detect_and_extract(&image)
}
