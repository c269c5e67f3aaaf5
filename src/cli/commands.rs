//! # CLI Commands Module / CLI 命令模块
//!
//! The subcommand implementations behind the command-line interface.
//! CLI 子命令的实现。

pub mod init;
pub mod run;
