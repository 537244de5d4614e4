pub mod build_info;
pub mod cli;
pub mod commands;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod logging;
pub mod scan;
pub mod segments;
pub mod template;
