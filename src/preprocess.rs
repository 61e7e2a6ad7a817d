//! 特征提取前的降噪处理
//!
//! 查询图片与每一张候选图片都必须经过完全相同的处理，否则描述符空间不可比较。

use image::GrayImage;

/// 高斯核尺寸
pub const KERNEL_SIZE: usize = 5;

/// 根据核尺寸推导 sigma，与 OpenCV 在 sigma 为 0 时的规则一致
pub fn auto_sigma(ksize: usize) -> f32 {
    0.3 * ((ksize as f32 - 1.) * 0.5 - 1.) + 0.8
}

/// 归一化的一维高斯核
pub fn gaussian_kernel(ksize: usize, sigma: f32) -> Vec<f32> {
    let r = (ksize / 2) as f32;
    let kernel = (0..ksize)
        .map(|i| {
            let x = i as f32 - r;
            (-(x * x) / (2. * sigma * sigma)).exp()
        })
        .collect::<Vec<_>>();
    let sum: f32 = kernel.iter().sum();
    kernel.into_iter().map(|v| v / sum).collect()
}

/// reflect-101 边界：`gfedcb|abcdefgh|gfedcba`
fn reflect101(mut i: isize, n: isize) -> usize {
    if n == 1 {
        return 0;
    }
    loop {
        if i < 0 {
            i = -i;
        } else if i >= n {
            i = 2 * (n - 1) - i;
        } else {
            return i as usize;
        }
    }
}

/// 对单通道图片做 5x5 高斯平滑，输出尺寸不变
pub fn preprocess(image: &GrayImage) -> GrayImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return image.clone();
    }

    let kernel = gaussian_kernel(KERNEL_SIZE, auto_sigma(KERNEL_SIZE));
    let radius = (KERNEL_SIZE / 2) as isize;
    let (w, h) = (width as usize, height as usize);
    let src = image.as_raw();

    // 高斯核可分离，先横向后纵向
    let mut tmp = vec![0f32; w * h];
    for y in 0..h {
        let line = &src[y * w..(y + 1) * w];
        for x in 0..w {
            let mut acc = 0.;
            for (k, weight) in kernel.iter().enumerate() {
                let sx = reflect101(x as isize + k as isize - radius, w as isize);
                acc += weight * line[sx] as f32;
            }
            tmp[y * w + x] = acc;
        }
    }

    let mut output = vec![0u8; w * h];
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0.;
            for (k, weight) in kernel.iter().enumerate() {
                let sy = reflect101(y as isize + k as isize - radius, h as isize);
                acc += weight * tmp[sy * w + x];
            }
            output[y * w + x] = acc.round().clamp(0., 255.) as u8;
        }
    }

    GrayImage::from_raw(width, height, output).unwrap_or_else(|| image.clone())
}
