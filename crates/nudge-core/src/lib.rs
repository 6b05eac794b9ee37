pub mod config;
pub mod error;
pub mod gateway;
pub mod orchestrator;
pub mod policy;
pub mod proactive;

pub use config::*;
pub use error::*;
pub use gateway::*;
pub use orchestrator::*;
pub use policy::*;
pub use proactive::*;
