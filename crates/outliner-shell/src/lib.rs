//! Line-driven shell for the outliner.
//!
//! The binary (`outliner`) wires stdin/stdout to a [`Shell`]; the library
//! half exists so the command loop can be driven from tests.

pub mod command;
pub mod config;
pub mod shell;

pub use command::{BlockRef, Command, CommandError};
pub use config::{ConfigError, ShellConfig, default_config_path};
pub use shell::{Flow, Shell, ShellError};
