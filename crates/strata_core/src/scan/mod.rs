pub mod iter;
pub mod options;
pub mod task;
