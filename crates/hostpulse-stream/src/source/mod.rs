//! Per-category source buffers between collectors and the join stage.

pub mod buffer;

pub use buffer::{SourceBuffers, SourceItem, SourceReceivers, source_buffers};
