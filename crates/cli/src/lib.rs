pub mod cli;
pub mod commands;
pub mod logging;
pub mod webdriver;
