pub mod chat;
pub mod push;
