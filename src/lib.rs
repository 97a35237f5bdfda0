pub mod commands;
pub mod device;
pub mod error;
pub mod session;
pub mod utils;
pub mod visual;

// Re-export common items
pub use device::{ios_simulator_state, kill_android_emulator, kill_ios_simulator};
pub use error::{Error, Result};
