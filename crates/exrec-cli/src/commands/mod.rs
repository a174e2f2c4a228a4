pub mod config;
pub mod input;
pub mod inspect;
pub mod logging;
pub mod output;
pub mod session;
