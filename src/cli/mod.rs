// src/cli/mod.rs - CLI definition (clap derive)

pub mod chat;
pub mod render;
pub mod sessions;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "localchat", about = "Local chat client for Ollama-compatible backends", version)]
pub struct Cli {
    /// Config file path
    #[arg(long)]
    pub config: Option<String>,

    /// Model identifier sent with every request (overrides config)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Backend or relay base URL (overrides config)
    #[arg(short, long)]
    pub backend: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Interactive chat (default)
    Chat,
    /// Run the CORS relay in front of the model backend
    Relay {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
        /// Backend URL to forward to
        #[arg(long)]
        upstream: Option<String>,
    },
    /// List stored chat sessions
    Sessions,
    /// Delete every stored chat session
    Clear,
}
