use std::path::{Path, PathBuf};

use image::{GrayImage, ImageReader};
use indicatif::ProgressStyle;
use regex::Regex;
use walkdir::WalkDir;

use crate::config::ScanOptions;

/// 以灰度模式读取图片，格式根据文件内容判断
pub fn imread(path: &Path) -> image::ImageResult<GrayImage> {
    let image = ImageReader::open(path)?.with_guessed_format()?.decode()?;
    Ok(image.to_luma8())
}

/// 逐个列出目录下（不递归）的普通文件
///
/// 默认使用平台的枚举顺序，`opts.sort` 为真时按文件名排序
pub fn scan_files<'a>(
    dir: &Path,
    opts: &'a ScanOptions,
) -> impl Iterator<Item = walkdir::Result<PathBuf>> + 'a {
    let mut walker = WalkDir::new(dir).min_depth(1).max_depth(1);
    if opts.sort {
        walker = walker.sort_by_file_name();
    }
    walker.into_iter().filter_map(move |entry| match entry {
        Ok(entry) => {
            // 跟随符号链接判断
            if !entry.path().is_file() {
                return None;
            }
            let path = entry.into_path();
            match &opts.suffix {
                Some(re) if !has_suffix(&path, re) => None,
                _ => Some(Ok(path)),
            }
        }
        Err(e) => Some(Err(e)),
    })
}

fn has_suffix(path: &Path, re: &Regex) -> bool {
    path.extension().map(|ext| re.is_match(&ext.to_string_lossy())).unwrap_or(false)
}

/// 将逗号分隔的后缀名列表转换为忽略大小写的正则表达式
pub fn suffix_regex(suffix: &str) -> Result<Regex, regex::Error> {
    let alternatives = suffix.split(',').map(|s| regex::escape(s.trim())).collect::<Vec<_>>();
    Regex::new(&format!("(?i)^({})$", alternatives.join("|")))
}

pub fn pb_style() -> ProgressStyle {
    ProgressStyle::with_template("[{elapsed_precise}] {spinner} {pos} {wide_msg}")
        .expect("invalid progress bar template")
}

#[cfg(feature = "opencv")]
pub fn imshow(winname: &str, path: &Path) -> opencv::Result<()> {
    use opencv::{highgui, imgcodecs};

    let image = imgcodecs::imread(&path.to_string_lossy(), imgcodecs::IMREAD_COLOR)?;
    highgui::imshow(winname, &image)?;
    while highgui::get_window_property(
        winname,
        highgui::WindowPropertyFlags::WND_PROP_VISIBLE as i32,
    )? >= 1.0
    {
        highgui::wait_key(50)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suffix_regex() {
        let re = suffix_regex("jpg, png").unwrap();
        assert!(re.is_match("jpg"));
        assert!(re.is_match("PNG"));
        assert!(!re.is_match("jpeg"));
        assert!(!re.is_match("xpng"));
    }

    #[test]
    fn test_scan_files_non_recursive() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("b.png"), b"").unwrap();
        std::fs::write(dir.path().join("a.txt"), b"").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub").join("c.png"), b"").unwrap();

        let opts = ScanOptions { sort: true, suffix: None };
        let files = scan_files(dir.path(), &opts).collect::<walkdir::Result<Vec<_>>>().unwrap();
        assert_eq!(files, vec![dir.path().join("a.txt"), dir.path().join("b.png")]);

        let opts = ScanOptions { sort: true, suffix: Some(suffix_regex("png").unwrap()) };
        let files = scan_files(dir.path(), &opts).collect::<walkdir::Result<Vec<_>>>().unwrap();
        assert_eq!(files, vec![dir.path().join("b.png")]);
    }
}
