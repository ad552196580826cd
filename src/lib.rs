pub mod config;
pub mod coordinator;
pub mod errors;
pub mod logging;
pub mod model;
pub mod navigation;
pub mod selector;
pub mod source;
pub mod wire;
