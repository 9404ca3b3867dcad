pub mod report;
pub mod sale;
