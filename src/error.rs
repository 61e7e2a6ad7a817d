use std::path::PathBuf;

use thiserror::Error;

use crate::features::FeatureError;
use crate::types::ImageId;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid index collection path: {}", .0.display())]
    InvalidIndexPath(PathBuf),
    #[error("invalid query path: {}", .0.display())]
    InvalidQueryPath(PathBuf),
    #[error("index collection is empty: {}", .0.display())]
    EmptyCollection(PathBuf),
    #[error("unable to read image {}: {source}", path.display())]
    UnreadableImage {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("query image has no descriptors: {}", .0.display())]
    EmptyQueryDescriptors(PathBuf),
    #[error("feature extraction failed for {}: {source}", path.display())]
    FeatureService {
        path: PathBuf,
        #[source]
        source: FeatureError,
    },
    #[error("ingestion aborted at {}: {source}", path.display())]
    IngestionAborted {
        path: PathBuf,
        #[source]
        source: BoxError,
    },
    #[error("rank computation failed for image {id}: {source}")]
    RankComputationFailed {
        id: ImageId,
        #[source]
        source: FeatureError,
    },
}

impl Error {
    pub(crate) fn aborted(path: impl Into<PathBuf>, source: impl Into<BoxError>) -> Self {
        Error::IngestionAborted { path: path.into(), source: source.into() }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
