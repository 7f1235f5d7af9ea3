//! Document numbering: per-(type, segment) counters and their formatting

pub mod allocator;

pub use allocator::*;
