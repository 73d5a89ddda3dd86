// src/cli/sessions.rs - Non-interactive session commands

use crate::chat::{SessionManager, SessionStore, SessionSummary};
use crate::util::short_id;

/// Print the stored sessions, most recent first. Reads only.
pub fn list_sessions(store: &SessionStore) {
    let summaries = stored_summaries(store);
    if summaries.is_empty() {
        eprintln!("No saved chats.");
    } else {
        println!("{}", format_list(&summaries));
    }
}

/// Summaries straight from storage. The front session is the one a chat
/// would resume in, so it is marked active.
pub fn stored_summaries(store: &SessionStore) -> Vec<SessionSummary> {
    store
        .load()
        .into_iter()
        .enumerate()
        .map(|(i, s)| SessionSummary {
            active: i == 0,
            message_count: s.messages.len(),
            id: s.id,
            title: s.title,
        })
        .collect()
}

pub fn clear_sessions(manager: &mut SessionManager) {
    let count = manager.sessions().len();
    manager.clear_all();
    eprintln!("Cleared {count} chat(s).");
}

/// One line per session: position, short id, title, message count.
pub fn format_list(summaries: &[SessionSummary]) -> String {
    summaries
        .iter()
        .enumerate()
        .map(|(i, s)| {
            format!(
                "{} {:>2}. [{}] {} ({} msg)",
                if s.active { "*" } else { " " },
                i + 1,
                short_id(&s.id),
                s.title,
                s.message_count,
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Resolve a 1-based list position or an id prefix to a session id.
pub fn resolve(summaries: &[SessionSummary], arg: &str) -> Option<String> {
    let arg = arg.trim();
    if arg.is_empty() {
        return None;
    }
    if let Ok(n) = arg.parse::<usize>() {
        if let Some(s) = n.checked_sub(1).and_then(|i| summaries.get(i)) {
            return Some(s.id.clone());
        }
    }
    let mut matches = summaries.iter().filter(|s| s.id.starts_with(arg));
    match (matches.next(), matches.next()) {
        (Some(only), None) => Some(only.id.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::Session;
    use tempfile::TempDir;

    fn summary(id: &str, title: &str, active: bool) -> SessionSummary {
        SessionSummary {
            id: id.into(),
            title: title.into(),
            active,
            message_count: 2,
        }
    }

    #[test]
    fn test_format_list_marks_active() {
        let list = vec![
            summary("aaaaaaaa-1", "First", true),
            summary("bbbbbbbb-2", "Second", false),
        ];
        assert_eq!(
            format_list(&list),
            "*  1. [aaaaaaaa] First (2 msg)\n   2. [bbbbbbbb] Second (2 msg)"
        );
    }

    #[test]
    fn test_resolve_by_position_and_prefix() {
        let list = vec![summary("abc-1", "a", true), summary("abd-2", "b", false)];
        assert_eq!(resolve(&list, "2").as_deref(), Some("abd-2"));
        assert_eq!(resolve(&list, "abc").as_deref(), Some("abc-1"));
        // Ambiguous prefix
        assert_eq!(resolve(&list, "ab"), None);
        assert_eq!(resolve(&list, "0"), None);
        assert_eq!(resolve(&list, ""), None);
    }

    #[test]
    fn test_listing_fresh_install_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let store = SessionStore::open_dir(tmp.path(), None);

        assert!(stored_summaries(&store).is_empty());
        list_sessions(&store);
        assert!(!tmp.path().join("chats.json").exists());
    }

    #[test]
    fn test_stored_summaries_follow_saved_order() {
        let tmp = TempDir::new().unwrap();
        let store = SessionStore::open_dir(tmp.path(), None);
        let mut saved = vec![Session::new(), Session::new()];
        store.save(&mut saved).unwrap();

        let summaries = stored_summaries(&store);
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].id, saved[0].id);
        assert!(summaries[0].active);
        assert!(!summaries[1].active);
        assert_eq!(summaries[1].message_count, 0);
    }
}
