//! Route handlers

pub mod dashboard;
pub mod predict;
pub mod schema;
