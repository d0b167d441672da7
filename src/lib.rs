pub mod catalog;
pub mod certification;
pub mod config;
pub mod errors;
pub mod intent;
pub mod logging;
pub mod personalization;
pub mod search;
