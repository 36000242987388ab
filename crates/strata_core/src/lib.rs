pub mod arrays;
pub mod dataset;
pub mod expr;
pub mod format;
pub mod fragment;
pub mod fs;
pub mod scan;
pub mod source;
pub mod testutil;
