//! 基于 OpenCV ORB 的实现，需要启用 `opencv` feature

use image::GrayImage;
use opencv::core::{DMatch, KeyPoint, Mat, NORM_HAMMING, Ptr, Vector};
use opencv::features2d::{BFMatcher, ORB, ORB_ScoreType};
use opencv::prelude::*;

use super::{DescriptorMatch, FeatureError, FeatureService, Keypoint};
use crate::matrix::DescriptorSet;

pub struct OpenCvOrb {
    orb: Ptr<ORB>,
    matcher: Ptr<BFMatcher>,
}

impl OpenCvOrb {
    /// # Arguments
    ///
    /// * `nfeatures` - 保留的最大特征点数量
    /// * `fast_threshold` - FAST 角点检测阈值
    pub fn create(nfeatures: u32, fast_threshold: u8) -> Result<Self, FeatureError> {
        let orb = ORB::create(
            nfeatures as i32,
            1.2,
            8,
            31,
            0,
            2,
            ORB_ScoreType::HARRIS_SCORE,
            31,
            fast_threshold as i32,
        )?;
        let matcher = BFMatcher::create(NORM_HAMMING, false)?;
        Ok(Self { orb, matcher })
    }
}

fn to_mat(image: &GrayImage) -> Result<Mat, FeatureError> {
    let mat =
        Mat::new_rows_cols_with_data(image.height() as i32, image.width() as i32, image.as_raw())?;
    Ok(mat.try_clone()?)
}

fn descriptors_to_mat(descriptors: &DescriptorSet) -> Result<Mat, FeatureError> {
    let mat = Mat::new_rows_cols_with_data(
        descriptors.height() as i32,
        descriptors.width() as i32,
        descriptors.as_bytes(),
    )?;
    Ok(mat.try_clone()?)
}

impl FeatureService for OpenCvOrb {
    fn detect(&mut self, image: &GrayImage) -> Result<Vec<Keypoint>, FeatureError> {
        let mat = to_mat(image)?;
        let mut keypoints = Vector::<KeyPoint>::new();
        self.orb.detect(&mat, &mut keypoints, &Mat::default())?;
        Ok(keypoints
            .iter()
            .map(|kp| Keypoint {
                x: kp.pt().x,
                y: kp.pt().y,
                size: kp.size(),
                angle: kp.angle(),
                response: kp.response(),
                octave: kp.octave(),
            })
            .collect())
    }

    fn extract(
        &mut self,
        image: &GrayImage,
        keypoints: &[Keypoint],
    ) -> Result<DescriptorSet, FeatureError> {
        let mat = to_mat(image)?;
        let mut kps = keypoints
            .iter()
            .map(|kp| {
                KeyPoint::new_coords(kp.x, kp.y, kp.size, kp.angle, kp.response, kp.octave, -1)
            })
            .collect::<opencv::Result<Vector<KeyPoint>>>()?;
        let mut des = Mat::default();
        self.orb.compute(&mat, &mut kps, &mut des)?;
        if des.rows() == 0 {
            return Err(FeatureError::NoDescriptors);
        }
        Ok(DescriptorSet::from_raw(des.cols() as usize, des.data_bytes()?.to_vec()))
    }

    fn match_descriptors(
        &mut self,
        query: &DescriptorSet,
        candidate: &DescriptorSet,
    ) -> Result<Vec<DescriptorMatch>, FeatureError> {
        if query.width() != candidate.width() {
            return Err(FeatureError::DimensionMismatch {
                query: query.width(),
                candidate: candidate.width(),
            });
        }
        let query_mat = descriptors_to_mat(query)?;
        let candidate_mat = descriptors_to_mat(candidate)?;
        let mut matches = Vector::<DMatch>::new();
        self.matcher.train_match(&query_mat, &candidate_mat, &mut matches, &Mat::default())?;
        Ok(matches
            .iter()
            .map(|m| DescriptorMatch {
                query_index: m.query_idx as usize,
                candidate_index: m.train_idx as usize,
                distance: m.distance,
            })
            .collect())
    }
}
