use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use indicatif::ProgressBar;
use log::info;

use crate::cli::SubCommandExtend;
use crate::config::{FeatureOptions, Opts, ScanOptions};
use crate::metrics;
use crate::report::{Report, Viewer};
use crate::session::RankingSession;
use crate::utils::pb_style;

#[derive(Parser, Debug, Clone)]
pub struct RankCommand {
    #[command(flatten)]
    pub features: FeatureOptions,
    #[command(flatten)]
    pub scan: ScanOptions,
    /// 待排序的图片集合目录
    #[arg(short, long, value_name = "DIR")]
    pub index: PathBuf,
    /// 查询图片路径，如果是目录则使用其中的第一个文件
    #[arg(short, long, value_name = "PATH")]
    pub query: PathBuf,
    /// 输出格式
    #[arg(long, value_name = "FORMAT", value_enum, default_value_t = OutputFormat::Table)]
    pub output_format: OutputFormat,
    /// 在窗口中展示最佳匹配图片，需要启用 opencv feature
    #[arg(long)]
    pub show: bool,
    /// 结束后将 Prometheus 指标输出到 stderr
    #[arg(long)]
    pub metrics: bool,
}

impl SubCommandExtend for RankCommand {
    fn run(&self, _opts: &Opts) -> Result<()> {
        let features = self.features.create_service()?;
        let pb = ProgressBar::no_length().with_style(pb_style());
        let mut session = RankingSession::new(features, &self.index, &self.query)
            .scan_options(self.scan.clone())
            .progress(pb);

        let report = session.rank()?;
        print_result(&report, self.output_format)?;

        if let Some(best) = &report.best {
            info!("best match #{}: {}", best.id, best.path.display());
            if self.show {
                viewer().present(&best.path)?;
            }
        }

        if self.metrics {
            eprint!("{}", metrics::gather_text()?);
        }
        Ok(())
    }
}

#[cfg(feature = "opencv")]
fn viewer() -> Box<dyn Viewer> {
    Box::new(crate::report::HighGui)
}

#[cfg(not(feature = "opencv"))]
fn viewer() -> Box<dyn Viewer> {
    log::warn!("built without opencv feature, --show has no effect");
    Box::new(crate::report::Headless)
}

fn print_result(report: &Report, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(report)?)
        }
        OutputFormat::Table => {
            println!("{}", report)
        }
    }
    Ok(())
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Table,
}
