pub mod chat;
pub mod contact;
pub mod settings;
pub mod team;
