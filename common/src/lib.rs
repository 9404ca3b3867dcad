pub mod jobs;
pub mod model;
pub mod responses;
