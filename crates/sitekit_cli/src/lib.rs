pub mod config_loader;
pub mod exec;
pub mod preview;
pub mod project;
pub mod walk;
