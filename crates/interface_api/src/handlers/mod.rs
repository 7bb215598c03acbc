//! Request handlers

pub mod estimation;
pub mod health;
