pub mod analysis;
pub mod sales;
