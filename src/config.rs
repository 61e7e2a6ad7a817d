use clap::{Parser, Subcommand, ValueEnum};
use regex::Regex;

use crate::cli::*;
use crate::features::{FeatureService, NativeOrb};
use crate::utils::suffix_regex;

#[derive(Parser, Debug, Clone)]
pub struct FeatureOptions {
    /// 特征提取实现
    #[arg(long, value_enum, default_value_t = Backend::Native)]
    pub backend: Backend,
    /// 特征点最大保留数量
    #[arg(short = 'n', value_name = "N", long, default_value_t = 500)]
    pub nfeatures: u32,
    /// FAST 角点检测器阈值
    #[arg(long, value_name = "THRESHOLD", default_value_t = 20)]
    pub fast_threshold: u8,
}

impl FeatureOptions {
    /// 根据选项创建特征提取服务
    pub fn create_service(&self) -> anyhow::Result<Box<dyn FeatureService>> {
        match self.backend {
            Backend::Native => {
                Ok(Box::new(NativeOrb::new(self.nfeatures as usize, self.fast_threshold)))
            }
            #[cfg(feature = "opencv")]
            Backend::Opencv => Ok(Box::new(crate::features::OpenCvOrb::create(
                self.nfeatures,
                self.fast_threshold,
            )?)),
            #[cfg(not(feature = "opencv"))]
            Backend::Opencv => Err(anyhow::anyhow!("imrank was built without the opencv feature")),
        }
    }
}

#[derive(Parser, Debug, Clone, Default)]
pub struct ScanOptions {
    /// 按文件名顺序扫描目录，而不是文件系统的枚举顺序
    #[arg(long)]
    pub sort: bool,
    /// 只扫描指定后缀名的文件，多个后缀用逗号分隔，默认扫描所有文件
    #[arg(short, long, value_name = "SUFFIX", value_parser = suffix_regex)]
    pub suffix: Option<Regex>,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "imrank", version)]
pub struct Opts {
    #[command(subcommand)]
    pub subcmd: SubCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum SubCommand {
    /// 按与查询图片的相似度对图片集合排序
    Rank(RankCommand),
    /// 计算一张图片相对于查询图片的匹配距离
    Match(MatchCommand),
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// 纯 Rust 实现的 FAST + BRIEF
    Native,
    /// OpenCV ORB，需要启用 opencv feature
    Opencv,
}
