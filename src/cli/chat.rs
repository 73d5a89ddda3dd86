// src/cli/chat.rs - Interactive REPL

use tokio::io::{AsyncBufReadExt, BufReader};

use super::render::{render, speaker};
use super::sessions::{format_list, resolve};
use crate::chat::{ChatController, Session, SubmitOutcome};
use crate::util::short_id;

/// A line typed at the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    New,
    List,
    Select(String),
    Delete(String),
    Clear,
    Help,
    Quit,
    Unknown(String),
    Message(String),
}

impl ReplCommand {
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        if trimmed == "quit" || trimmed == "exit" {
            return ReplCommand::Quit;
        }
        if !trimmed.starts_with('/') {
            return ReplCommand::Message(trimmed.to_string());
        }

        let (cmd, arg) = match trimmed.split_once(' ') {
            Some((cmd, arg)) => (cmd, arg.trim().to_string()),
            None => (trimmed, String::new()),
        };
        match cmd {
            "/new" => ReplCommand::New,
            "/list" | "/chats" => ReplCommand::List,
            "/select" | "/open" => ReplCommand::Select(arg),
            "/delete" | "/rm" => ReplCommand::Delete(arg),
            "/clear" => ReplCommand::Clear,
            "/help" => ReplCommand::Help,
            "/quit" | "/exit" => ReplCommand::Quit,
            other => ReplCommand::Unknown(other.to_string()),
        }
    }
}

/// Run the interactive chat REPL until EOF, /quit or Ctrl+C.
pub async fn run_chat(controller: &ChatController, model: &str, backend: &str) -> anyhow::Result<()> {
    eprintln!(
        "localchat v{} | {} via {} | {} chat(s)\nType /help for commands.\n",
        env!("CARGO_PKG_VERSION"),
        model,
        backend,
        controller.sessions().len(),
    );

    if let Some(session) = controller.active_session() {
        print_transcript(&session);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt();
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            break;
        };

        match ReplCommand::parse(&line) {
            ReplCommand::Quit => break,
            ReplCommand::Message(text) => {
                if text.is_empty() {
                    continue;
                }
                match controller.submit(&text).await {
                    SubmitOutcome::Applied { reply, .. } => println!("\n{}\n", render(&reply)),
                    SubmitOutcome::Failed { .. } => {
                        // The apology is already in the transcript; show it.
                        if let Some(last) = controller
                            .active_session()
                            .and_then(|s| s.messages.last().cloned())
                        {
                            println!("\n{}\n", render(&last));
                        }
                    }
                    SubmitOutcome::Dropped { session_id } => {
                        eprintln!(
                            "  Chat [{}] is no longer stored (deleted or evicted to free space).",
                            short_id(&session_id)
                        );
                        if let Some(session) = controller.active_session() {
                            eprintln!("  Now in: {}", session.title);
                        }
                    }
                    SubmitOutcome::Busy => eprintln!("  Still waiting on the previous reply."),
                    SubmitOutcome::Ignored => {}
                }
            }
            ReplCommand::New => {
                let session = controller.submit_new_session();
                eprintln!("  Started chat [{}]", short_id(&session.id));
            }
            ReplCommand::List => {
                eprintln!("{}", format_list(&controller.sessions()));
            }
            ReplCommand::Select(arg) => match resolve(&controller.sessions(), &arg) {
                Some(id) => {
                    if let Some(session) = controller.submit_session_selection(&id) {
                        print_transcript(&session);
                    }
                }
                None => eprintln!("  No chat matches '{}'. Try /list.", arg),
            },
            ReplCommand::Delete(arg) => match resolve(&controller.sessions(), &arg) {
                Some(id) => {
                    controller.submit_session_deletion(&id);
                    eprintln!("  Deleted chat [{}]", short_id(&id));
                    if let Some(session) = controller.active_session() {
                        eprintln!("  Now in: {}", session.title);
                    }
                }
                None => eprintln!("  No chat matches '{}'. Try /list.", arg),
            },
            ReplCommand::Clear => {
                controller.submit_clear_all();
                eprintln!("  All chats cleared.");
            }
            ReplCommand::Help => print_help(),
            ReplCommand::Unknown(cmd) => {
                eprintln!("Unknown command: {}. Type /help for commands.", cmd);
            }
        }
    }

    Ok(())
}

fn prompt() {
    use std::io::Write;
    print!("> ");
    std::io::stdout().flush().ok();
}

fn print_transcript(session: &Session) {
    eprintln!("== {} [{}]", session.title, short_id(&session.id));
    for message in &session.messages {
        println!("{}:\n{}\n", speaker(message.role), render(message));
    }
}

fn print_help() {
    eprintln!("Slash commands:");
    eprintln!("  /new               Start a new chat");
    eprintln!("  /list              List chats (* marks the active one)");
    eprintln!("  /select <n|id>     Switch to a chat by list position or id prefix");
    eprintln!("  /delete <n|id>     Delete a chat");
    eprintln!("  /clear             Delete every chat");
    eprintln!("  /help              Show this help");
    eprintln!("  /quit, quit, exit  Leave");
}
