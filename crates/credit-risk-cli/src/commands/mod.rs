pub mod collections;
pub mod portfolio;
pub mod scoring;
