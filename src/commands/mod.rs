pub mod check;
pub mod classify;
pub mod config;
pub mod help;
pub mod result;

pub use result::CommandResult;
