pub mod chat;
pub mod insight;
pub mod report;
pub mod video;
