use std::sync::LazyLock;

use prometheus::*;

static METRIC_IMAGES: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!("imrank_images_total", "count of the scanned images", &["outcome"])
        .unwrap()
});

static METRIC_RANK_FAILURES: LazyLock<IntCounter> = LazyLock::new(|| {
    register_int_counter!("imrank_rank_failures_total", "count of the failed rank computations")
        .unwrap()
});

static METRIC_RANK_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    register_histogram!(
        "imrank_rank_duration_seconds",
        "duration of the per-image rank computation in seconds",
        exponential_buckets(0.0001, 4., 8).unwrap()
    )
    .unwrap()
});

/// 成功提取描述符的图片
pub fn inc_indexed() {
    METRIC_IMAGES.with_label_values(&["indexed"]).inc();
}

/// 因无法解码或无特征点而跳过的图片
pub fn inc_skipped() {
    METRIC_IMAGES.with_label_values(&["skipped"]).inc();
}

pub fn inc_rank_failure() {
    METRIC_RANK_FAILURES.inc();
}

pub fn observe_rank_duration(seconds: f64) {
    METRIC_RANK_DURATION.observe(seconds);
}

/// 以 Prometheus 文本格式导出所有指标
pub fn gather_text() -> anyhow::Result<String> {
    let mut buffer = vec![];
    TextEncoder::new().encode(&prometheus::gather(), &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}
