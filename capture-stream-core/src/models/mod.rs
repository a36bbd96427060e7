pub mod audio_models;
pub mod config;
pub mod error;
pub mod outcome;
pub mod state;
pub mod status;
