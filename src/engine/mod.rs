pub mod assignment;
pub mod scoring;
