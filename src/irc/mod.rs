pub mod away;
pub mod message;
pub mod network;
