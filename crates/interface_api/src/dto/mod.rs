//! Data Transfer Objects

pub mod estimation;
