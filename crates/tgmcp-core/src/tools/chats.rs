//! Dialog-level tools: listing, inspecting, muting, archiving chats.

use tracing::warn;

use crate::entity::{format_entity, Peer, PeerQuery};
use crate::port::{MessageFilter, MessageRequest, TelegramPort};
use crate::{Error, Result};

use super::resolve_chat;

fn dialog_title(peer: &Peer) -> String {
    let name = peer.display_name();
    if name.is_empty() {
        "Unknown".to_string()
    } else {
        name
    }
}

/// Paginated list of all dialogs.
pub async fn get_chats(tg: &dyn TelegramPort, page: u64, page_size: u64) -> Result<String> {
    if page < 1 || page_size < 1 {
        return Err(Error::InvalidArgument(
            "page and page_size must be at least 1".to_string(),
        ));
    }
    let dialogs = tg.get_dialogs(None).await?;
    // Page numbers come straight from the caller; an offset that does not
    // even fit in usize is past the end of any dialog list.
    let start = match (page - 1)
        .checked_mul(page_size)
        .and_then(|start| usize::try_from(start).ok())
    {
        Some(start) if start < dialogs.len() => start,
        _ => return Ok("Page out of range.".to_string()),
    };
    let end = dialogs
        .len()
        .min(start.saturating_add(usize::try_from(page_size).unwrap_or(usize::MAX)));
    let lines: Vec<String> = dialogs[start..end]
        .iter()
        .map(|d| format!("Chat ID: {}, Title: {}", d.peer.id(), dialog_title(&d.peer)))
        .collect();
    Ok(lines.join("\n"))
}

/// Dialog list with optional type filter and per-dialog metadata.
pub async fn list_chats(
    tg: &dyn TelegramPort,
    chat_type: Option<&str>,
    limit: usize,
) -> Result<String> {
    // The limit caps the dialog fetch itself; the type filter then applies
    // within that window, so it can return fewer than `limit` matches.
    let dialogs = tg.get_dialogs(Some(limit)).await?;
    let mut results = Vec::new();
    for dialog in &dialogs {
        if results.len() >= limit {
            break;
        }
        let current_type = dialog.peer.dialog_type();
        if let Some(wanted) = chat_type {
            if !wanted.eq_ignore_ascii_case(current_type) {
                continue;
            }
        }
        let mut info = match &dialog.peer {
            Peer::User(_) => format!(
                "Chat ID: {}, Name: {}",
                dialog.peer.id(),
                dialog_title(&dialog.peer)
            ),
            _ => format!(
                "Chat ID: {}, Title: {}",
                dialog.peer.id(),
                dialog_title(&dialog.peer)
            ),
        };
        info.push_str(&format!(", Type: {current_type}"));
        if let Some(username) = dialog.peer.username() {
            info.push_str(&format!(", Username: @{username}"));
        }
        if dialog.unread_count > 0 {
            info.push_str(&format!(", Unread: {}", dialog.unread_count));
        }
        results.push(info);
    }
    if results.is_empty() {
        return Ok("No chats found matching the criteria.".to_string());
    }
    Ok(results.join("\n"))
}

/// Detailed information about one chat, group, channel or user.
pub async fn get_chat(tg: &dyn TelegramPort, chat_id: i64) -> Result<String> {
    let peer = resolve_chat(tg, chat_id).await?;
    let mut lines = vec![format!("ID: {}", peer.id())];
    match &peer {
        Peer::User(user) => {
            lines.push(format!("Name: {}", user.display_name()));
            lines.push("Type: User".to_string());
            if let Some(username) = &user.username {
                lines.push(format!("Username: @{username}"));
            }
            if let Some(phone) = &user.phone {
                lines.push(format!("Phone: {phone}"));
            }
            lines.push(format!("Bot: {}", if user.is_bot { "Yes" } else { "No" }));
            lines.push(format!(
                "Verified: {}",
                if user.verified { "Yes" } else { "No" }
            ));
        }
        _ => {
            lines.push(format!("Title: {}", dialog_title(&peer)));
            lines.push(format!("Type: {}", peer.kind_label()));
            if let Some(username) = peer.username() {
                lines.push(format!("Username: @{username}"));
            }
            match tg.participant_count(&peer).await {
                Ok(count) => lines.push(format!("Participants: {count}")),
                Err(err) => {
                    warn!(chat_id, error = %err, "participant count unavailable");
                    lines.push(format!("Participants: Error fetching ({err})"));
                }
            }
        }
    }
    // Unread count and last message come from the dialog list; best effort.
    match tg.get_dialogs(None).await {
        Ok(dialogs) => {
            if let Some(dialog) = dialogs.iter().find(|d| d.peer.id() == chat_id) {
                lines.push(format!("Unread Messages: {}", dialog.unread_count));
                if let Some(last) = &dialog.last_message {
                    let sender = last.sender_name.as_deref().unwrap_or("Unknown");
                    lines.push(format!("Last Message: From {} at {}", sender, last.date));
                    lines.push(format!("Message: {}", last.text_or_placeholder()));
                }
            }
        }
        Err(err) => warn!(chat_id, error = %err, "dialog metadata unavailable"),
    }
    Ok(lines.join("\n"))
}

/// Plain message history dump, newest first.
pub async fn get_history(tg: &dyn TelegramPort, chat_id: i64, limit: usize) -> Result<String> {
    let peer = resolve_chat(tg, chat_id).await?;
    let req = MessageRequest {
        limit: Some(limit),
        ..Default::default()
    };
    let messages = tg.get_messages(&peer, &req).await?;
    if messages.is_empty() {
        return Ok("No messages found.".to_string());
    }
    let lines: Vec<String> = messages
        .iter()
        .map(|m| format!("ID: {} | {} | {}", m.id, m.date, m.text_or_placeholder()))
        .collect();
    Ok(lines.join("\n"))
}

pub async fn mark_as_read(tg: &dyn TelegramPort, chat_id: i64) -> Result<String> {
    let peer = resolve_chat(tg, chat_id).await?;
    tg.mark_as_read(&peer).await?;
    Ok(format!("Marked all messages as read in chat {chat_id}."))
}

pub async fn mute_chat(tg: &dyn TelegramPort, chat_id: i64) -> Result<String> {
    let peer = resolve_chat(tg, chat_id).await?;
    tg.set_muted(&peer, true).await?;
    Ok(format!("Chat {chat_id} muted."))
}

pub async fn unmute_chat(tg: &dyn TelegramPort, chat_id: i64) -> Result<String> {
    let peer = resolve_chat(tg, chat_id).await?;
    tg.set_muted(&peer, false).await?;
    Ok(format!("Chat {chat_id} unmuted."))
}

pub async fn archive_chat(tg: &dyn TelegramPort, chat_id: i64) -> Result<String> {
    let peer = resolve_chat(tg, chat_id).await?;
    tg.set_archived(&peer, true).await?;
    Ok(format!("Chat {chat_id} archived."))
}

pub async fn unarchive_chat(tg: &dyn TelegramPort, chat_id: i64) -> Result<String> {
    let peer = resolve_chat(tg, chat_id).await?;
    tg.set_archived(&peer, false).await?;
    Ok(format!("Chat {chat_id} unarchived."))
}

/// Pinned messages, preferring the server-side filter when available.
pub async fn get_pinned_messages(tg: &dyn TelegramPort, chat_id: i64) -> Result<String> {
    let peer = resolve_chat(tg, chat_id).await?;
    let filtered = MessageRequest {
        filter: MessageFilter::Pinned,
        ..Default::default()
    };
    let pinned = match tg.get_messages(&peer, &filtered).await {
        Ok(messages) => messages,
        Err(Error::Unsupported(_)) => {
            // Fall back to scanning recent history for the pinned flag.
            let recent = MessageRequest {
                limit: Some(50),
                ..Default::default()
            };
            tg.get_messages(&peer, &recent)
                .await?
                .into_iter()
                .filter(|m| m.pinned)
                .collect()
        }
        Err(err) => return Err(err),
    };
    if pinned.is_empty() {
        return Ok("No pinned messages found in this chat.".to_string());
    }
    let lines: Vec<String> = pinned
        .iter()
        .map(|m| format!("ID: {} | {} | {}", m.id, m.date, m.text_or_placeholder()))
        .collect();
    Ok(lines.join("\n"))
}

/// Global search for public chats, channels and bots.
pub async fn search_public_chats(tg: &dyn TelegramPort, query: &str) -> Result<String> {
    let users = tg.search_users(query, 20).await?;
    let entries: Vec<serde_json::Value> = users
        .into_iter()
        .map(|u| format_entity(&Peer::User(u)))
        .collect();
    Ok(serde_json::to_string_pretty(&entries)?)
}

/// Resolve any identifier form: `@name`, `+phone`, or a numeric ID.
pub async fn resolve_username(tg: &dyn TelegramPort, username: &str) -> Result<String> {
    let peer = tg.resolve(&PeerQuery::parse(username)).await?;
    Ok(serde_json::to_string_pretty(&format_entity(&peer))?)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::entity::{ChannelInfo, DialogInfo, MessageInfo, UserInfo};
    use crate::tools::mock::MockPort;

    fn user_peer(id: i64, first: &str) -> Peer {
        Peer::User(UserInfo {
            id,
            first_name: first.to_string(),
            ..Default::default()
        })
    }

    fn channel_peer(id: i64, title: &str) -> Peer {
        Peer::Channel(ChannelInfo {
            id,
            title: title.to_string(),
            username: None,
            broadcast: true,
            megagroup: false,
        })
    }

    fn dialog(peer: Peer, unread: i32) -> DialogInfo {
        DialogInfo {
            peer,
            unread_count: unread,
            last_message: None,
        }
    }

    fn port_with_dialogs() -> MockPort {
        MockPort {
            dialogs: vec![
                dialog(user_peer(1, "Alice"), 0),
                dialog(channel_peer(2, "News"), 3),
                dialog(user_peer(3, "Bob"), 1),
            ],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn get_chats_paginates() {
        let port = port_with_dialogs();
        let page1 = get_chats(&port, 1, 2).await.unwrap();
        assert_eq!(page1, "Chat ID: 1, Title: Alice\nChat ID: 2, Title: News");
        let page2 = get_chats(&port, 2, 2).await.unwrap();
        assert_eq!(page2, "Chat ID: 3, Title: Bob");
    }

    #[tokio::test]
    async fn get_chats_out_of_range_is_a_sentinel_not_an_error() {
        let port = port_with_dialogs();
        // First index (2-1)*3 = 3 equals the dialog count, so page 2 is empty.
        let out = get_chats(&port, 2, 3).await.unwrap();
        assert_eq!(out, "Page out of range.");
        let far = get_chats(&port, 100, 10).await.unwrap();
        assert_eq!(far, "Page out of range.");
    }

    #[tokio::test]
    async fn get_chats_survives_huge_page_numbers() {
        let port = port_with_dialogs();
        // Multiplication overflows u64.
        let out = get_chats(&port, u64::MAX, 20).await.unwrap();
        assert_eq!(out, "Page out of range.");
        // Offset fits u64 but dwarfs any dialog list.
        let out = get_chats(&port, 2, u64::MAX).await.unwrap();
        assert_eq!(out, "Page out of range.");
    }

    #[tokio::test]
    async fn get_chats_rejects_zero_page() {
        let port = port_with_dialogs();
        assert!(get_chats(&port, 0, 10).await.is_err());
        assert!(get_chats(&port, 1, 0).await.is_err());
    }

    #[tokio::test]
    async fn list_chats_filters_by_type() {
        let port = port_with_dialogs();
        let out = list_chats(&port, Some("user"), 20).await.unwrap();
        assert!(out.contains("Chat ID: 1, Name: Alice, Type: user"));
        assert!(out.contains("Chat ID: 3, Name: Bob, Type: user, Unread: 1"));
        assert!(!out.contains("News"));

        let channels = list_chats(&port, Some("channel"), 20).await.unwrap();
        assert_eq!(channels, "Chat ID: 2, Title: News, Type: channel, Unread: 3");
    }

    #[tokio::test]
    async fn list_chats_limit_caps_the_fetch_before_filtering() {
        let port = port_with_dialogs();
        // Limit 2 fetches Alice and News; Bob is outside the window even
        // though he matches the filter.
        let out = list_chats(&port, Some("user"), 2).await.unwrap();
        assert_eq!(out, "Chat ID: 1, Name: Alice, Type: user");
    }

    #[tokio::test]
    async fn list_chats_reports_no_matches() {
        let port = MockPort::default();
        let out = list_chats(&port, Some("group"), 20).await.unwrap();
        assert_eq!(out, "No chats found matching the criteria.");
    }

    #[tokio::test]
    async fn get_chat_formats_user_details() {
        let mut port = port_with_dialogs();
        port.peers = vec![Peer::User(UserInfo {
            id: 1,
            first_name: "Alice".to_string(),
            username: Some("alice".to_string()),
            phone: Some("+15550100".to_string()),
            ..Default::default()
        })];
        let out = get_chat(&port, 1).await.unwrap();
        assert!(out.starts_with("ID: 1\nName: Alice\nType: User"));
        assert!(out.contains("Username: @alice"));
        assert!(out.contains("Phone: +15550100"));
        assert!(out.contains("Bot: No"));
        assert!(out.contains("Unread Messages: 0"));
    }

    #[tokio::test]
    async fn pinned_messages_fall_back_to_flag_scan() {
        let date = Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap();
        let port = MockPort {
            peers: vec![channel_peer(2, "News")],
            messages: vec![
                MessageInfo {
                    id: 10,
                    date,
                    text: "hello".to_string(),
                    ..Default::default()
                },
                MessageInfo {
                    id: 11,
                    date,
                    text: "rules".to_string(),
                    pinned: true,
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        let out = get_pinned_messages(&port, 2).await.unwrap();
        assert!(out.contains("ID: 11"));
        assert!(!out.contains("ID: 10"));
    }

    #[tokio::test]
    async fn resolve_username_strips_at_sign() {
        let port = MockPort::with_peers(vec![Peer::User(UserInfo {
            id: 7,
            first_name: "Carol".to_string(),
            username: Some("carol".to_string()),
            ..Default::default()
        })]);
        let out = resolve_username(&port, "@carol").await.unwrap();
        assert!(out.contains("\"id\": 7"));
    }

    #[tokio::test]
    async fn resolve_username_accepts_phone_and_id_forms() {
        let port = MockPort::with_peers(vec![Peer::User(UserInfo {
            id: 42,
            first_name: "Alice".to_string(),
            phone: Some("+15551234567".to_string()),
            ..Default::default()
        })]);
        let by_phone = resolve_username(&port, "+15551234567").await.unwrap();
        assert!(by_phone.contains("\"id\": 42"));
        let by_id = resolve_username(&port, "42").await.unwrap();
        assert!(by_id.contains("Alice"));
    }
}
