pub mod arm_command;
pub mod config;
pub mod error;
pub mod joint_state;

pub use arm_command::*;
pub use config::*;
pub use error::*;
pub use joint_state::*;
