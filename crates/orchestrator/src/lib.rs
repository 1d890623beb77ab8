pub mod api;
pub mod chat;
pub mod cli;
pub mod state;
pub mod toolclient;
