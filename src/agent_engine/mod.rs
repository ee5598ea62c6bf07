pub mod engine;
pub mod loop_control;
pub mod state;
pub mod transcript;
