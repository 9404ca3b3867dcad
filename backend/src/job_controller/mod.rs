//! Background analysis: the task queue, the worker that drains it and the
//! shared status map that records how each task ended.

pub mod queue;
pub mod state;
pub mod worker;
