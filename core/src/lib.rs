pub mod config;
pub mod editor;
pub mod error;
pub mod find;
pub mod helper_utils;

pub use config::FindReplaceConfig;
pub use error::{Error, Result};
pub use find::{
    ExecuteOptions, FindReplace, FindReplacePanel, FindResult, Outcome, Request, SearchSession,
};
