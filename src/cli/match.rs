use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::cli::SubCommandExtend;
use crate::config::{FeatureOptions, Opts, ScanOptions};
use crate::features::describe;
use crate::query::resolve_query;
use crate::rank::image_rank;
use crate::utils::imread;

#[derive(Parser, Debug, Clone)]
pub struct MatchCommand {
    #[command(flatten)]
    pub features: FeatureOptions,
    /// 查询图片
    pub query: PathBuf,
    /// 候选图片
    pub image: PathBuf,
}

impl SubCommandExtend for MatchCommand {
    fn run(&self, _opts: &Opts) -> Result<()> {
        let mut features = self.features.create_service()?;
        let query = resolve_query(&self.query, &ScanOptions::default(), &mut features)?;

        let image = imread(&self.image)
            .with_context(|| format!("unable to read image {}", self.image.display()))?;
        let descriptors = describe(&mut features, &image)
            .with_context(|| format!("unable to extract features from {}", self.image.display()))?;

        let rank = image_rank(&mut features, &query.descriptors, &descriptors)?;
        println!("{:.2}\t{}", rank, self.image.display());
        Ok(())
    }
}
