use std::slice::ChunksExact;

/// 按行存储的描述符矩阵，每行一个特征点
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorSet {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl DescriptorSet {
    /// 创建一个每行 `width` 字节的空矩阵
    pub fn new(width: usize) -> Self {
        assert!(width > 0, "descriptor width must be positive");
        Self { width, height: 0, data: vec![] }
    }

    /// 从连续内存构造，`data` 长度必须是 `width` 的整数倍
    pub fn from_raw(width: usize, data: Vec<u8>) -> Self {
        assert!(width > 0, "descriptor width must be positive");
        assert_eq!(data.len() % width, 0);
        Self { width, height: data.len() / width, data }
    }

    pub fn push(&mut self, row: &[u8]) {
        assert_eq!(self.width, row.len());
        self.height += 1;
        self.data.extend_from_slice(row);
    }

    /// 每行字节数
    pub fn width(&self) -> usize {
        self.width
    }

    /// 行数
    pub fn height(&self) -> usize {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.height == 0
    }

    pub fn row(&self, n: usize) -> &[u8] {
        &self.data[n * self.width..(n + 1) * self.width]
    }

    pub fn rows(&self) -> ChunksExact<'_, u8> {
        self.data.chunks_exact(self.width)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::DescriptorSet;

    #[test]
    fn descriptor_rows() {
        let mut des = DescriptorSet::new(2);
        assert!(des.is_empty());
        des.push(&[1, 2]);
        des.push(&[3, 4]);

        let mut iter = des.rows();
        assert_eq!(iter.len(), 2);
        assert_eq!(iter.next(), Some(&[1u8, 2][..]));
        assert_eq!(iter.next(), Some(&[3u8, 4][..]));
        assert_eq!(iter.next(), None);
        assert_eq!(des.row(1), &[3, 4]);
    }

    #[test]
    fn descriptor_from_raw() {
        let des = DescriptorSet::from_raw(3, vec![0; 9]);
        assert_eq!(des.height(), 3);
        assert_eq!(des.width(), 3);
    }
}
