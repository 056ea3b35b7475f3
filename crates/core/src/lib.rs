pub mod config;
pub mod value;

pub use config::EngineConfig;
pub use value::*;
