//! 纯 Rust 实现的 FAST 角点 + BRIEF 二进制描述符

use image::GrayImage;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{DescriptorMatch, FeatureError, FeatureService, Keypoint};
use crate::hamming::batch_nearest_hamming;
use crate::matrix::DescriptorSet;

/// 半径为 3 的 Bresenham 圆
const CIRCLE: [(i32, i32); 16] = [
    (0, -3),
    (1, -3),
    (2, -2),
    (3, -1),
    (3, 0),
    (3, 1),
    (2, 2),
    (1, 3),
    (0, 3),
    (-1, 3),
    (-2, 2),
    (-3, 1),
    (-3, 0),
    (-3, -1),
    (-2, -2),
    (-1, -3),
];

/// FAST-9：至少 9 个连续像素同时更亮或更暗
const ARC_LENGTH: u32 = 9;

/// BRIEF 采样区域半径，区域为 31x31
const PATCH_RADIUS: i32 = 15;

/// 256 bit
pub const DESCRIPTOR_BYTES: usize = 32;

const PATTERN_SEED: u64 = 0x1b2f_5a7c_9e01_3d46;

pub struct NativeOrb {
    nfeatures: usize,
    threshold: u8,
    pattern: Vec<[(i32, i32); 2]>,
}

impl NativeOrb {
    /// # Arguments
    ///
    /// * `nfeatures` - 保留的最大特征点数量
    /// * `threshold` - FAST 角点检测阈值
    pub fn new(nfeatures: usize, threshold: u8) -> Self {
        Self { nfeatures, threshold, pattern: brief_pattern() }
    }
}

impl Default for NativeOrb {
    fn default() -> Self {
        Self::new(500, 20)
    }
}

fn brief_pattern() -> Vec<[(i32, i32); 2]> {
    let mut rng = StdRng::seed_from_u64(PATTERN_SEED);
    let mut point = || {
        (
            rng.random_range(-PATCH_RADIUS..=PATCH_RADIUS),
            rng.random_range(-PATCH_RADIUS..=PATCH_RADIUS),
        )
    };
    (0..DESCRIPTOR_BYTES * 8).map(|_| [point(), point()]).collect()
}

/// 圆周上是否存在长度不小于 ARC_LENGTH 的连续段
fn has_arc(mask: u32) -> bool {
    if mask.count_ones() < ARC_LENGTH {
        return false;
    }
    let doubled = mask | (mask << 16);
    let mut run = 0;
    for i in 0..32 {
        if (doubled >> i) & 1 == 1 {
            run += 1;
            if run >= ARC_LENGTH {
                return true;
            }
        } else {
            run = 0;
        }
    }
    false
}

struct Pixels<'a> {
    data: &'a [u8],
    width: i32,
}

impl Pixels<'_> {
    #[inline(always)]
    fn at(&self, x: i32, y: i32) -> i16 {
        self.data[(y * self.width + x) as usize] as i16
    }
}

/// 计算角点得分，不是角点时返回 0
fn fast_score(pixels: &Pixels, x: i32, y: i32, threshold: i16) -> u32 {
    let p = pixels.at(x, y);
    let mut diffs = [0i16; 16];
    let mut brighter = 0u32;
    let mut darker = 0u32;
    for (i, &(dx, dy)) in CIRCLE.iter().enumerate() {
        let d = pixels.at(x + dx, y + dy) - p;
        diffs[i] = d;
        if d > threshold {
            brighter |= 1 << i;
        } else if d < -threshold {
            darker |= 1 << i;
        }
    }

    let (mask, sign) = if has_arc(brighter) {
        (brighter, 1)
    } else if has_arc(darker) {
        (darker, -1)
    } else {
        return 0;
    };
    (0..16)
        .filter(|i| (mask >> i) & 1 == 1)
        .map(|i| (sign * diffs[i] - threshold) as u32)
        .sum()
}

impl FeatureService for NativeOrb {
    fn detect(&mut self, image: &GrayImage) -> Result<Vec<Keypoint>, FeatureError> {
        let (w, h) = (image.width() as i32, image.height() as i32);
        let border = PATCH_RADIUS + 1;
        if w <= 2 * border || h <= 2 * border {
            return Ok(vec![]);
        }

        let pixels = Pixels { data: image.as_raw(), width: w };
        let threshold = self.threshold as i16;
        let mut scores = vec![0u32; (w * h) as usize];
        for y in border..h - border {
            for x in border..w - border {
                scores[(y * w + x) as usize] = fast_score(&pixels, x, y, threshold);
            }
        }

        // 3x3 非极大值抑制
        let mut keypoints = vec![];
        for y in border..h - border {
            for x in border..w - border {
                let s = scores[(y * w + x) as usize];
                if s == 0 {
                    continue;
                }
                let is_max = (-1..=1).all(|dy| {
                    (-1..=1).all(|dx| scores[((y + dy) * w + x + dx) as usize] <= s)
                });
                if is_max {
                    keypoints.push(Keypoint::new(x as f32, y as f32, s as f32));
                }
            }
        }

        keypoints.sort_by(|a, b| b.response.total_cmp(&a.response));
        keypoints.truncate(self.nfeatures);
        Ok(keypoints)
    }

    fn extract(
        &mut self,
        image: &GrayImage,
        keypoints: &[Keypoint],
    ) -> Result<DescriptorSet, FeatureError> {
        let (w, h) = (image.width() as i32, image.height() as i32);
        let pixels = Pixels { data: image.as_raw(), width: w };
        let mut descriptors = DescriptorSet::new(DESCRIPTOR_BYTES);

        for kp in keypoints {
            let (x, y) = (kp.x.round() as i32, kp.y.round() as i32);
            if x < PATCH_RADIUS || y < PATCH_RADIUS || x >= w - PATCH_RADIUS || y >= h - PATCH_RADIUS
            {
                continue;
            }
            let mut row = [0u8; DESCRIPTOR_BYTES];
            for (i, [(x1, y1), (x2, y2)]) in self.pattern.iter().enumerate() {
                if pixels.at(x + x1, y + y1) < pixels.at(x + x2, y + y2) {
                    row[i / 8] |= 1 << (i % 8);
                }
            }
            descriptors.push(&row);
        }

        Ok(descriptors)
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
        if candidate.is_empty() {
            return Err(FeatureError::NoDescriptors);
        }

        let matches = batch_nearest_hamming(query.as_bytes(), candidate.as_bytes(), query.width())
            .into_iter()
            .enumerate()
            .filter_map(|(query_index, nearest)| {
                nearest.map(|(candidate_index, distance)| DescriptorMatch {
                    query_index,
                    candidate_index,
                    distance: distance as f32,
                })
            })
            .collect();
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    /// 由黑白方块随机拼成的图片，方块交界处会产生角点
    fn blocks(seed: u64) -> GrayImage {
        let mut rng = StdRng::seed_from_u64(seed);
        let cells =
            (0..11 * 11).map(|_| if rng.random_bool(0.5) { 255 } else { 0 }).collect::<Vec<u8>>();
        GrayImage::from_fn(128, 128, |x, y| Luma([cells[(y / 12 * 11 + x / 12) as usize]]))
    }

    #[test]
    fn test_has_arc() {
        assert!(has_arc(0xffff));
        assert!(has_arc(0b1_1111_1111));
        assert!(!has_arc(0b1111_1111));
        // 首尾相接
        assert!(has_arc(0xf01f));
        assert!(!has_arc(0xf00f));
        assert!(!has_arc(0b0101_0101_0101_0101));
    }

    #[test]
    fn test_uniform_image_has_no_keypoints() {
        let mut orb = NativeOrb::default();
        let image = GrayImage::from_pixel(64, 64, Luma([128]));
        assert!(orb.detect(&image).unwrap().is_empty());
        assert!(matches!(orb.detect_and_extract(&image), Err(FeatureError::NoKeypoints)));
    }

    #[test]
    fn test_tiny_image_has_no_keypoints() {
        let mut orb = NativeOrb::default();
        let image = GrayImage::from_pixel(8, 8, Luma([0]));
        assert!(orb.detect(&image).unwrap().is_empty());
    }

    #[test]
    fn test_detect_blocks() {
        let mut orb = NativeOrb::new(10, 20);
        let image = blocks(7);
        let keypoints = orb.detect(&image).unwrap();
        assert!(!keypoints.is_empty());
        assert!(keypoints.len() <= 10);
        for kp in &keypoints {
            assert!(kp.x >= 16. && kp.x < 112.);
            assert!(kp.y >= 16. && kp.y < 112.);
        }
        assert!(keypoints.windows(2).all(|w| w[0].response >= w[1].response));
    }

    #[test]
    fn test_detect_and_extract_deterministic() {
        let image = blocks(3);
        let des1 = NativeOrb::default().detect_and_extract(&image).unwrap();
        let des2 = NativeOrb::default().detect_and_extract(&image).unwrap();
        assert_eq!(des1.width(), DESCRIPTOR_BYTES);
        assert_eq!(des1, des2);
    }

    #[test]
    fn test_extract_skips_border_keypoints() {
        let mut orb = NativeOrb::default();
        let image = blocks(1);
        let keypoints = [Keypoint::new(2., 2., 1.), Keypoint::new(64., 64., 1.)];
        let des = orb.extract(&image, &keypoints).unwrap();
        assert_eq!(des.height(), 1);
    }

    #[test]
    fn test_match_self_is_zero() {
        let mut orb = NativeOrb::default();
        let des = orb.detect_and_extract(&blocks(5)).unwrap();
        let matches = orb.match_descriptors(&des, &des).unwrap();
        assert_eq!(matches.len(), des.height());
        for (i, m) in matches.iter().enumerate() {
            assert_eq!(m.query_index, i);
            assert_eq!(m.distance, 0.);
        }
    }

    #[test]
    fn test_match_dimension_mismatch() {
        let mut orb = NativeOrb::default();
        let query = DescriptorSet::from_raw(32, vec![0; 32]);
        let candidate = DescriptorSet::from_raw(16, vec![0; 32]);
        assert!(matches!(
            orb.match_descriptors(&query, &candidate),
            Err(FeatureError::DimensionMismatch { query: 32, candidate: 16 })
        ));
    }
}
