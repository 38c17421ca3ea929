pub mod compile;
pub mod config;
pub mod errors;
pub mod logging;
pub mod remote;
pub mod ui;
