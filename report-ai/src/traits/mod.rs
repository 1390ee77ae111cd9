pub mod chat;
pub mod frames;
pub mod transcription;
pub mod video;
