use std::time::Instant;

use log::warn;

use crate::error::Error;
use crate::features::{FeatureError, FeatureService};
use crate::matrix::DescriptorSet;
use crate::metrics;
use crate::types::{Collection, CollectionRanks, RankEntry};

/// 计算候选图片相对于查询图片的距离，越小越相似
///
/// 距离为每个查询描述符的最佳匹配距离之和，只累加查询描述符的行数。
/// 结果会随查询特征点数量增长，并且没有按候选图片的特征点数量归一化。
pub fn image_rank<F: FeatureService + ?Sized>(
    features: &mut F,
    query: &DescriptorSet,
    candidate: &DescriptorSet,
) -> Result<f64, FeatureError> {
    let matches = features.match_descriptors(query, candidate)?;
    if matches.len() < query.height() {
        return Err(FeatureError::IncompleteMatches {
            expected: query.height(),
            actual: matches.len(),
        });
    }

    let mut rank = 0f64;
    for m in &matches[..query.height()] {
        if !m.distance.is_finite() || m.distance < 0. {
            return Err(FeatureError::InvalidDistance(m.distance));
        }
        rank += m.distance as f64;
    }
    Ok(rank)
}

/// 计算集合中每张图片的距离并按升序排列
///
/// 无法计算距离的图片会被记录日志并排除在结果之外
pub fn rank_collection<F: FeatureService + ?Sized>(
    features: &mut F,
    query: &DescriptorSet,
    collection: &Collection,
) -> CollectionRanks {
    let mut ranks = Vec::with_capacity(collection.descriptors.len());

    for (id, descriptors) in &collection.descriptors {
        let instant = Instant::now();
        match image_rank(features, query, descriptors) {
            Ok(score) => ranks.push(RankEntry::new(*id, score)),
            Err(source) => {
                let err = Error::RankComputationFailed { id: *id, source };
                let path = collection.paths.get(*id).unwrap_or(std::path::Path::new("?"));
                warn!("{}: {}, excluded", path.display(), err);
                metrics::inc_rank_failure();
            }
        }
        metrics::observe_rank_duration(instant.elapsed().as_secs_f64());
    }

    sort_ranks(&mut ranks);
    ranks
}

/// 稳定排序，距离相同的图片保持原有顺序
pub fn sort_ranks(ranks: &mut [RankEntry]) {
    ranks.sort_by(|a, b| a.score.total_cmp(&b.score));
}

/// 距离最小的图片，`ranks` 必须已经排序
pub fn best_match(ranks: &[RankEntry]) -> Option<&RankEntry> {
    ranks.first()
}

#[cfg(test)]
mod tests {
    use image::GrayImage;

    use super::*;
    use crate::features::{DescriptorMatch, Keypoint};
    use crate::types::ImageId;

    /// 每个查询描述符的匹配距离都等于候选描述符第一个字节
    struct ByteDistance;

    impl FeatureService for ByteDistance {
        fn detect(&mut self, _: &GrayImage) -> Result<Vec<Keypoint>, FeatureError> {
            unreachable!()
        }

        fn extract(&mut self, _: &GrayImage, _: &[Keypoint]) -> Result<DescriptorSet, FeatureError> {
            unreachable!()
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
            let distance = candidate.row(0)[0] as f32;
            Ok((0..query.height())
                .map(|query_index| DescriptorMatch { query_index, candidate_index: 0, distance })
                .collect())
        }
    }

    fn id(n: u64) -> ImageId {
        ImageId::new(n).unwrap()
    }

    #[test]
    fn test_image_rank_sums_query_rows() {
        let query = DescriptorSet::from_raw(2, vec![0; 6]);
        let candidate = DescriptorSet::from_raw(2, vec![5, 0]);
        assert_eq!(image_rank(&mut ByteDistance, &query, &candidate).unwrap(), 15.);
    }

    #[test]
    fn test_rank_collection_excludes_failures() {
        let query = DescriptorSet::from_raw(2, vec![0; 4]);
        let mut collection = Collection::default();
        for (n, des) in [
            (1, DescriptorSet::from_raw(2, vec![30, 0])),
            (2, DescriptorSet::from_raw(3, vec![1, 0, 0])),
            (3, DescriptorSet::from_raw(2, vec![10, 0])),
        ] {
            collection.paths.insert(id(n), format!("/{n}.png").into());
            collection.descriptors.push((id(n), des));
        }

        let ranks = rank_collection(&mut ByteDistance, &query, &collection);
        assert_eq!(ranks, vec![RankEntry::new(id(3), 20.), RankEntry::new(id(1), 60.)]);
        assert_eq!(best_match(&ranks), Some(&RankEntry::new(id(3), 20.)));
    }

    #[test]
    fn test_sort_ranks_stable() {
        let mut ranks = vec![
            RankEntry::new(id(1), 2.),
            RankEntry::new(id(2), 1.),
            RankEntry::new(id(3), 2.),
            RankEntry::new(id(4), 1.),
        ];
        sort_ranks(&mut ranks);
        let ids = ranks.iter().map(|r| r.id.get()).collect::<Vec<_>>();
        assert_eq!(ids, vec![2, 4, 1, 3]);

        let sorted = ranks.clone();
        sort_ranks(&mut ranks);
        assert_eq!(ranks, sorted);
    }

    #[test]
    fn test_best_match_is_minimum() {
        let mut ranks = vec![
            RankEntry::new(id(1), 120.5),
            RankEntry::new(id(2), 45.),
            RankEntry::new(id(3), 300.),
        ];
        sort_ranks(&mut ranks);
        assert_eq!(best_match(&ranks).map(|r| r.id), Some(id(2)));
        assert_eq!(best_match(&[]), None);
    }
}
