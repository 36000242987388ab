pub mod format;
pub mod reader;

pub use format::NdJsonFileFormat;
