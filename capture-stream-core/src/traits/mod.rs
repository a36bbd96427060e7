pub mod audio_source;
pub mod priority;
