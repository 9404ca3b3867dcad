pub mod config;
pub mod job_controller;
pub mod llm;
pub mod pipeline;
pub mod services;
pub mod storage;
