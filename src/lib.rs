pub mod app;
pub mod command;
pub mod core;
pub mod history;
