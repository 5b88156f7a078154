pub mod queue;
pub mod storage;
pub mod vlm;
