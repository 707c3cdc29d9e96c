pub mod error;
pub mod row;
pub mod value;

// Common type aliases
pub type RowOffset = u64;

// On-disk widths
pub const INT_WIDTH: usize = 8; // u64, little-endian
pub const VARCHAR_UNIT_WIDTH: usize = 2; // one UTF-16 code unit
pub const INDEX_ENTRY_SIZE: usize = 16; // key (8 bytes) + offset (8 bytes)
