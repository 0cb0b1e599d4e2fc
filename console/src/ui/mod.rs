//! Terminal presentation

pub mod clipboard;
pub mod logs;
pub mod prompt;
pub mod row;
pub mod table;
