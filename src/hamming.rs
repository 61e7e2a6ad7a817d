use bytemuck::pod_read_unaligned;

/// 计算两个等长二进制描述符的汉明距离
#[inline(always)]
pub fn hamming(va: &[u8], vb: &[u8]) -> u32 {
    debug_assert_eq!(va.len(), vb.len());
    match va.len() {
        32 => hamming_256(va, vb),
        _ => hamming_naive(va, vb),
    }
}

#[inline(always)]
pub fn hamming_naive(va: &[u8], vb: &[u8]) -> u32 {
    va.iter().zip(vb).map(|(a, b)| (a ^ b).count_ones()).sum()
}

#[inline(always)]
pub fn hamming_256(va: &[u8], vb: &[u8]) -> u32 {
    // 描述符行在 Vec<u8> 中不保证 8 字节对齐，不能直接 cast_slice
    let va: [u64; 4] = pod_read_unaligned(va);
    let vb: [u64; 4] = pod_read_unaligned(vb);
    (va[0] ^ vb[0]).count_ones()
        + (va[1] ^ vb[1]).count_ones()
        + (va[2] ^ vb[2]).count_ones()
        + (va[3] ^ vb[3]).count_ones()
}

/// 在 vb 的若干行中寻找与 va 汉明距离最小的一行，返回其索引和距离
///
/// 距离相同时返回靠前的行。vb 为空时返回 None
pub fn nearest_hamming(va: &[u8], vb: &[u8]) -> Option<(usize, u32)> {
    let mut best: Option<(usize, u32)> = None;
    for (i, chunk) in vb.chunks_exact(va.len()).enumerate() {
        let d = hamming(va, chunk);
        if best.is_none_or(|(_, bd)| d < bd) {
            best = Some((i, d));
        }
    }
    best
}

/// 对 va 的每一行，在 vb 中寻找最近邻
pub fn batch_nearest_hamming(va: &[u8], vb: &[u8], width: usize) -> Vec<Option<(usize, u32)>> {
    va.chunks_exact(width).map(|chunk| nearest_hamming(chunk, vb)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hamming_identical() {
        let va = [0u8; 32];
        let vb = [0u8; 32];
        assert_eq!(hamming(&va, &vb), 0);
    }

    #[test]
    fn test_hamming_all_different() {
        let va = [0u8; 32];
        let vb = [255u8; 32];
        assert_eq!(hamming(&va, &vb), 256);
    }

    #[test]
    fn test_hamming_single_bit() {
        let va = [0u8; 1];
        let vb = [1u8; 1];
        assert_eq!(hamming(&va, &vb), 1);
    }

    #[test]
    fn test_hamming_256_unaligned() {
        let buf = [0xffu8; 65];
        let zeros = [0u8; 32];
        assert_eq!(hamming_256(&buf[1..33], &zeros), 256);
        assert_eq!(hamming_256(&buf[1..33], &buf[33..65]), 0);
    }

    #[test]
    fn test_nearest_hamming_multiple_vectors() {
        let va = [0u8; 32];
        // 3 个向量，距离分别为 2, 1, 1
        let mut vb = vec![0u8; 96];
        vb[0] = 3;
        vb[32] = 1;
        vb[64] = 2;

        assert_eq!(nearest_hamming(&va, &vb), Some((1, 1)));
    }

    #[test]
    fn test_nearest_hamming_empty() {
        let va = [0u8; 32];
        assert_eq!(nearest_hamming(&va, &[]), None);
    }

    #[test]
    fn test_batch_nearest_hamming() {
        let va = [0u8, 255];
        let vb = [255u8, 0];
        let result = batch_nearest_hamming(&va, &vb, 1);
        assert_eq!(result, vec![Some((1, 0)), Some((0, 0))]);
    }
}
