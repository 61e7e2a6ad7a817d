//! 排序流程：查询图片 -> 图片集合 -> 计算距离 -> 排序 -> 报告

use std::path::{Path, PathBuf};
use std::time::Instant;

use indicatif::ProgressBar;
use log::debug;

use crate::config::ScanOptions;
use crate::error::Result;
use crate::features::FeatureService;
use crate::ingest::ingest_collection;
use crate::query::{QueryImage, resolve_query};
use crate::rank::rank_collection;
use crate::report::Report;
use crate::types::{Collection, CollectionRanks};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    QueryResolved,
    CollectionReady,
    Ranked,
    Reported,
    /// 出现致命错误，提前终止
    Failed,
}

/// 一次排序会话，持有会话内的全部状态
///
/// 图片集合只在第一次成功扫描后缓存，之后重复调用 [`RankingSession::rank`]
/// 不会重新扫描目录，图片 ID 也保持不变。
pub struct RankingSession<F> {
    features: F,
    index_dir: PathBuf,
    query_path: PathBuf,
    scan: ScanOptions,
    progress: ProgressBar,
    state: SessionState,
    query: Option<QueryImage>,
    collection: Option<Collection>,
    ranks: CollectionRanks,
}

impl<F: FeatureService> RankingSession<F> {
    /// # Arguments
    ///
    /// * `features` - 特征提取服务
    /// * `index_dir` - 待排序的图片集合目录
    /// * `query_path` - 查询图片，或者包含查询图片的目录
    pub fn new(features: F, index_dir: impl Into<PathBuf>, query_path: impl Into<PathBuf>) -> Self {
        Self {
            features,
            index_dir: index_dir.into(),
            query_path: query_path.into(),
            scan: ScanOptions::default(),
            progress: ProgressBar::hidden(),
            state: SessionState::Idle,
            query: None,
            collection: None,
            ranks: vec![],
        }
    }

    pub fn scan_options(mut self, scan: ScanOptions) -> Self {
        self.scan = scan;
        self
    }

    pub fn progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// 对图片集合排序，出现致命错误时立即返回
    pub fn rank(&mut self) -> Result<Report> {
        self.state = SessionState::Idle;
        self.query = None;
        self.ranks.clear();
        let result = self.run();
        if result.is_err() {
            self.state = SessionState::Failed;
        }
        debug!("session finished in state {:?}", self.state);
        result
    }

    fn run(&mut self) -> Result<Report> {
        let query = resolve_query(&self.query_path, &self.scan, &mut self.features)?;
        self.state = SessionState::QueryResolved;

        let collection = match self.collection.take() {
            Some(collection) => {
                debug!("using cached collection of {} images", collection.paths.len());
                collection
            }
            None => {
                let ingested = ingest_collection(
                    &self.index_dir,
                    &self.scan,
                    &mut self.features,
                    &self.progress,
                );
                self.progress.finish_and_clear();
                ingested?
            }
        };
        let collection = self.collection.insert(collection);
        self.state = SessionState::CollectionReady;

        let instant = Instant::now();
        self.ranks = rank_collection(&mut self.features, &query.descriptors, collection);
        self.state = SessionState::Ranked;
        debug!(
            "ranked {} of {} images in {:.2}s",
            self.ranks.len(),
            collection.descriptors.len(),
            instant.elapsed().as_secs_f32()
        );

        let report = Report::new(query.path.clone(), &self.ranks, &collection.paths);
        self.query = Some(query);
        self.state = SessionState::Reported;
        Ok(report)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn index_dir(&self) -> &Path {
        &self.index_dir
    }

    /// 最近一次解析的查询图片
    pub fn query(&self) -> Option<&QueryImage> {
        self.query.as_ref()
    }

    /// 已缓存的图片集合
    pub fn collection(&self) -> Option<&Collection> {
        self.collection.as_ref()
    }

    /// 最近一次排序的结果
    pub fn ranks(&self) -> &CollectionRanks {
        &self.ranks
    }

    pub fn into_features(self) -> F {
        self.features
    }
}
