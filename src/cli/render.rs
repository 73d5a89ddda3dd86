// src/cli/render.rs - Turn a message into terminal text
//
// Markdown is flattened rather than styled: code blocks are indented, list
// items get bullets or numbers, and reasoning is shown first behind "| ".

use pulldown_cmark::{Event, Parser, Tag, TagEnd};

use crate::provider::{Message, Role};

pub fn render(message: &Message) -> String {
    let mut out = String::new();

    if let Some(thinking) = &message.thinking {
        for line in markdown_to_text(thinking.trim()).lines() {
            out.push_str("| ");
            out.push_str(line);
            out.push('\n');
        }
        out.push('\n');
    }

    out.push_str(&markdown_to_text(&message.content));
    out
}

/// One-line label for a transcript entry.
pub fn speaker(role: Role) -> &'static str {
    match role {
        Role::User => "you",
        Role::Assistant => "assistant",
    }
}

pub fn markdown_to_text(md: &str) -> String {
    let mut out = String::new();
    let mut lists: Vec<Option<u64>> = Vec::new();
    let mut in_code = false;

    for event in Parser::new(md) {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                out.push_str(&"#".repeat(level as usize));
                out.push(' ');
            }
            Event::End(TagEnd::Heading(_)) | Event::End(TagEnd::Paragraph) => {
                out.push_str("\n\n");
            }
            Event::Start(Tag::CodeBlock(_)) => in_code = true,
            Event::End(TagEnd::CodeBlock) => {
                in_code = false;
                out.push('\n');
            }
            Event::Start(Tag::List(start)) => lists.push(start),
            Event::End(TagEnd::List(_)) => {
                lists.pop();
                if lists.is_empty() {
                    out.push('\n');
                }
            }
            Event::Start(Tag::Item) => {
                out.push_str(&"  ".repeat(lists.len().saturating_sub(1)));
                match lists.last_mut() {
                    Some(Some(n)) => {
                        out.push_str(&format!("{n}. "));
                        *n += 1;
                    }
                    _ => out.push_str("- "),
                }
            }
            Event::End(TagEnd::Item) => {
                if !out.ends_with('\n') {
                    out.push('\n');
                }
            }
            Event::Text(text) if in_code => {
                for line in text.lines() {
                    out.push_str("    ");
                    out.push_str(line);
                    out.push('\n');
                }
            }
            Event::Text(text) => out.push_str(&text),
            Event::Code(code) => {
                out.push('`');
                out.push_str(&code);
                out.push('`');
            }
            Event::SoftBreak => out.push(' '),
            Event::HardBreak => out.push('\n'),
            Event::Rule => out.push_str("----\n\n"),
            _ => {}
        }
    }

    out.trim_end().to_string()
}
