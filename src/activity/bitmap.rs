//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 每日活跃位图，字节布局与Redis `SETBIT`/`GET` 一致（每字节高位在前）。

/// 按Redis布局解释的位图
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bitmap {
    bytes: Vec<u8>,
}

impl Bitmap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// 读取指定位置的位，超出长度视为0
    pub fn get(&self, position: u64) -> bool {
        let byte_index = (position / 8) as usize;
        match self.bytes.get(byte_index) {
            Some(byte) => byte & (0x80u8 >> (position % 8)) != 0,
            None => false,
        }
    }

    /// 按位或，结果长度取两者较长者
    pub fn or_assign(&mut self, other: &Bitmap) {
        if self.bytes.len() < other.bytes.len() {
            self.bytes.resize(other.bytes.len(), 0);
        }
        for (dst, src) in self.bytes.iter_mut().zip(&other.bytes) {
            *dst |= src;
        }
    }

    /// 按位与，结果长度取两者较短者
    pub fn and(&self, other: &Bitmap) -> Bitmap {
        let bytes = self
            .bytes
            .iter()
            .zip(&other.bytes)
            .map(|(a, b)| a & b)
            .collect();
        Bitmap { bytes }
    }

    /// 置位数量
    pub fn count_ones(&self) -> u64 {
        self.bytes.iter().map(|b| u64::from(b.count_ones())).sum()
    }

    /// 按升序遍历所有置位的位置
    pub fn iter_ones(&self) -> impl Iterator<Item = u64> + '_ {
        self.bytes
            .iter()
            .enumerate()
            .filter(|(_, byte)| **byte != 0)
            .flat_map(|(index, byte)| {
                (0..8u64)
                    .filter(move |bit| byte & (0x80u8 >> *bit) != 0)
                    .map(move |bit| index as u64 * 8 + bit)
            })
    }
}
