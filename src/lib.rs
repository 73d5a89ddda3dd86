// src/lib.rs - Library root for localchat

pub mod chat;
pub mod cli;
pub mod infra;
pub mod provider;
pub mod relay;
pub mod util;
