//! Laundry Advisor
//!
//! 洗濯表示ラベルの写真を解析サービスに送り、洗濯方法を表示するCLI

pub mod analyzer;
pub mod cli;
pub mod config;
pub mod controller;
pub mod error;
pub mod logging;
pub mod render;
pub mod scanner;
