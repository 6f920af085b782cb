/// Stable codec IDs (u16) recorded in container metadata.
pub mod codec_ids {
    pub const DEFLATE: u16 = 0x0001;
    pub const ZSTD: u16    = 0x0002;
}

/// Default compression levels (balanced).
pub const DEFAULT_LEVEL_DEFLATE: i32 = 6;
pub const DEFAULT_LEVEL_ZSTD: i32 = 6;

/// Valid level ranges per codec.
pub const DEFLATE_LEVELS: std::ops::RangeInclusive<i32> = 0..=9;
pub const ZSTD_LEVELS: std::ops::RangeInclusive<i32> = 1..=22;

/// Upper bound on decoded bytes handed out per decompression step.
pub const DECOMPRESS_WINDOW: usize = 1024 * 1024;
