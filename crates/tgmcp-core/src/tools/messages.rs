//! Message tools: reading, sending, editing, forwarding, pinning.

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};

use crate::port::{MessageRequest, TelegramPort};
use crate::Result;

use super::resolve_chat;

/// Parses `YYYY-MM-DD` as the start of that day in UTC.
fn parse_day_start(raw: &str) -> Option<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    Some(date.and_hms_opt(0, 0, 0)?.and_utc())
}

/// Parses `YYYY-MM-DD` as the last representable instant of that day in UTC,
/// so a `to_date` bound is inclusive of the whole day.
fn parse_day_end(raw: &str) -> Option<DateTime<Utc>> {
    let start = parse_day_start(raw)?;
    Some(start + TimeDelta::days(1) - TimeDelta::microseconds(1))
}

/// Paginated message history for one chat.
pub async fn get_messages(
    tg: &dyn TelegramPort,
    chat_id: i64,
    page: u64,
    page_size: u64,
) -> Result<String> {
    let peer = resolve_chat(tg, chat_id).await?;
    // The port's offset is i32; a page whose offset does not fit is past the
    // end of any history, so report it empty instead of fetching.
    let Some(offset) = page
        .saturating_sub(1)
        .checked_mul(page_size)
        .and_then(|offset| i32::try_from(offset).ok())
    else {
        return Ok("No messages found for this page.".to_string());
    };
    let req = MessageRequest {
        limit: Some(page_size as usize),
        add_offset: offset,
        ..Default::default()
    };
    let messages = tg.get_messages(&peer, &req).await?;
    if messages.is_empty() {
        return Ok("No messages found for this page.".to_string());
    }
    let lines: Vec<String> = messages
        .iter()
        .map(|m| {
            format!(
                "ID: {} | Date: {} | Message: {}",
                m.id,
                m.date,
                m.text_or_placeholder()
            )
        })
        .collect();
    Ok(lines.join("\n"))
}

/// Filtered message listing with text search and an inclusive date range.
pub async fn list_messages(
    tg: &dyn TelegramPort,
    chat_id: i64,
    limit: usize,
    search_query: Option<&str>,
    from_date: Option<&str>,
    to_date: Option<&str>,
) -> Result<String> {
    let peer = resolve_chat(tg, chat_id).await?;

    let from = match from_date {
        Some(raw) => match parse_day_start(raw) {
            Some(dt) => Some(dt),
            None => return Ok("Invalid from_date format. Use YYYY-MM-DD.".to_string()),
        },
        None => None,
    };
    let to = match to_date {
        Some(raw) => match parse_day_end(raw) {
            Some(dt) => Some(dt),
            None => return Ok("Invalid to_date format. Use YYYY-MM-DD.".to_string()),
        },
        None => None,
    };

    let req = MessageRequest {
        limit: Some(limit),
        search: search_query.map(str::to_string),
        ..Default::default()
    };
    let messages = tg.get_messages(&peer, &req).await?;
    let filtered: Vec<_> = messages
        .into_iter()
        .filter(|m| from.map_or(true, |f| m.date >= f) && to.map_or(true, |t| m.date <= t))
        .collect();
    if filtered.is_empty() {
        return Ok("No messages found matching the criteria.".to_string());
    }
    let lines: Vec<String> = filtered
        .iter()
        .map(|m| {
            let sender = m
                .sender_name
                .as_deref()
                .map(|name| format!("{name} | "))
                .unwrap_or_default();
            format!(
                "ID: {} | {}Date: {} | Message: {}",
                m.id,
                sender,
                m.date,
                m.text_or_placeholder()
            )
        })
        .collect();
    Ok(lines.join("\n"))
}

pub async fn send_message(tg: &dyn TelegramPort, chat_id: i64, message: &str) -> Result<String> {
    let peer = resolve_chat(tg, chat_id).await?;
    tg.send_message(&peer, message, None).await?;
    Ok("Message sent successfully.".to_string())
}

pub async fn reply_to_message(
    tg: &dyn TelegramPort,
    chat_id: i64,
    message_id: i32,
    text: &str,
) -> Result<String> {
    let peer = resolve_chat(tg, chat_id).await?;
    tg.send_message(&peer, text, Some(message_id)).await?;
    Ok(format!("Replied to message {message_id} in chat {chat_id}."))
}

pub async fn edit_message(
    tg: &dyn TelegramPort,
    chat_id: i64,
    message_id: i32,
    new_text: &str,
) -> Result<String> {
    let peer = resolve_chat(tg, chat_id).await?;
    tg.edit_message(&peer, message_id, new_text).await?;
    Ok(format!("Message {message_id} edited."))
}

pub async fn delete_message(
    tg: &dyn TelegramPort,
    chat_id: i64,
    message_id: i32,
) -> Result<String> {
    let peer = resolve_chat(tg, chat_id).await?;
    tg.delete_message(&peer, message_id).await?;
    Ok(format!("Message {message_id} deleted."))
}

pub async fn forward_message(
    tg: &dyn TelegramPort,
    from_chat_id: i64,
    message_id: i32,
    to_chat_id: i64,
) -> Result<String> {
    let from = resolve_chat(tg, from_chat_id).await?;
    let to = resolve_chat(tg, to_chat_id).await?;
    tg.forward_message(&to, message_id, &from).await?;
    Ok(format!(
        "Message {message_id} forwarded from {from_chat_id} to {to_chat_id}."
    ))
}

pub async fn pin_message(tg: &dyn TelegramPort, chat_id: i64, message_id: i32) -> Result<String> {
    let peer = resolve_chat(tg, chat_id).await?;
    tg.pin_message(&peer, message_id).await?;
    Ok(format!("Message {message_id} pinned in chat {chat_id}."))
}

pub async fn unpin_message(tg: &dyn TelegramPort, chat_id: i64, message_id: i32) -> Result<String> {
    let peer = resolve_chat(tg, chat_id).await?;
    tg.unpin_message(&peer, message_id).await?;
    Ok(format!("Message {message_id} unpinned in chat {chat_id}."))
}

/// A message together with the messages immediately before and after it.
pub async fn get_message_context(
    tg: &dyn TelegramPort,
    chat_id: i64,
    message_id: i32,
    context_size: usize,
) -> Result<String> {
    let peer = resolve_chat(tg, chat_id).await?;
    let central = match tg.get_message(&peer, message_id).await? {
        Some(message) => message,
        None => {
            return Ok(format!(
                "Message with ID {message_id} not found in chat {chat_id}."
            ))
        }
    };
    let before = tg
        .get_messages(
            &peer,
            &MessageRequest {
                limit: Some(context_size),
                max_id: message_id,
                ..Default::default()
            },
        )
        .await?;
    let after = tg
        .get_messages(
            &peer,
            &MessageRequest {
                limit: Some(context_size),
                min_id: message_id,
                reverse: true,
                ..Default::default()
            },
        )
        .await?;

    let mut context: Vec<_> = before.into_iter().chain(Some(central)).chain(after).collect();
    context.sort_by_key(|m| m.id);

    let mut out = format!("Context for message {message_id} in chat {chat_id}:\n");
    for message in &context {
        let sender = message.sender_name.as_deref().unwrap_or("Unknown");
        let highlight = if message.id == message_id {
            " [THIS MESSAGE]"
        } else {
            ""
        };
        out.push_str(&format!(
            "ID: {} | {} | {}{}\n{}\n\n",
            message.id,
            sender,
            message.date,
            highlight,
            message.text_or_placeholder()
        ));
    }
    Ok(out.trim_end().to_string())
}

/// Server-side text search within one chat.
pub async fn search_messages(
    tg: &dyn TelegramPort,
    chat_id: i64,
    query: &str,
    limit: usize,
) -> Result<String> {
    let peer = resolve_chat(tg, chat_id).await?;
    let req = MessageRequest {
        limit: Some(limit),
        search: Some(query.to_string()),
        ..Default::default()
    };
    let messages = tg.get_messages(&peer, &req).await?;
    if messages.is_empty() {
        return Ok(format!("No messages found matching '{query}'."));
    }
    let lines: Vec<String> = messages
        .iter()
        .map(|m| format!("ID: {} | {} | {}", m.id, m.date, m.text_or_placeholder()))
        .collect();
    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::entity::{MessageInfo, Peer, UserInfo};
    use crate::tools::mock::MockPort;

    fn peer() -> Peer {
        Peer::User(UserInfo {
            id: 5,
            first_name: "Dana".to_string(),
            ..Default::default()
        })
    }

    fn msg(id: i32, day: u32, text: &str) -> MessageInfo {
        MessageInfo {
            id,
            date: Utc.with_ymd_and_hms(2025, 6, day, 12, 0, 0).unwrap(),
            text: text.to_string(),
            ..Default::default()
        }
    }

    fn port() -> MockPort {
        MockPort {
            peers: vec![peer()],
            messages: vec![msg(1, 1, "first"), msg(2, 2, "second"), msg(3, 3, "third")],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn date_bounds_are_inclusive_over_whole_days() {
        let port = port();
        let out = list_messages(&port, 5, 20, None, Some("2025-06-02"), Some("2025-06-02"))
            .await
            .unwrap();
        assert!(out.contains("ID: 2"));
        assert!(!out.contains("ID: 1"));
        assert!(!out.contains("ID: 3"));
    }

    #[tokio::test]
    async fn invalid_dates_return_format_hints() {
        let port = port();
        let bad_from = list_messages(&port, 5, 20, None, Some("06/01/2025"), None)
            .await
            .unwrap();
        assert_eq!(bad_from, "Invalid from_date format. Use YYYY-MM-DD.");
        let bad_to = list_messages(&port, 5, 20, None, None, Some("not-a-date"))
            .await
            .unwrap();
        assert_eq!(bad_to, "Invalid to_date format. Use YYYY-MM-DD.");
    }

    #[tokio::test]
    async fn end_of_day_bound_includes_late_messages() {
        let mut late = msg(9, 4, "late");
        late.date = Utc.with_ymd_and_hms(2025, 6, 4, 23, 59, 59).unwrap();
        let port = MockPort {
            peers: vec![peer()],
            messages: vec![late],
            ..Default::default()
        };
        let out = list_messages(&port, 5, 20, None, Some("2025-06-04"), Some("2025-06-04"))
            .await
            .unwrap();
        assert!(out.contains("ID: 9"));
    }

    #[tokio::test]
    async fn get_messages_paginates_with_offset() {
        let port = port();
        let out = get_messages(&port, 5, 2, 2).await.unwrap();
        assert!(out.contains("ID: 3"));
        assert!(!out.contains("ID: 1 "));
        let calls = port.calls();
        assert!(calls.iter().any(|c| c.contains("add_offset=2")));
    }

    #[tokio::test]
    async fn empty_page_is_reported() {
        let port = port();
        let out = get_messages(&port, 5, 9, 10).await.unwrap();
        assert_eq!(out, "No messages found for this page.");
    }

    #[tokio::test]
    async fn huge_page_numbers_become_an_empty_page() {
        let port = port();
        // Multiplication overflows u64.
        let out = get_messages(&port, 5, u64::MAX, 20).await.unwrap();
        assert_eq!(out, "No messages found for this page.");
        // Offset fits u64 but not the port's i32 field.
        let out = get_messages(&port, 5, 3_000_000_000, 1).await.unwrap();
        assert_eq!(out, "No messages found for this page.");
        // Neither page reached the port.
        assert!(port.calls().is_empty());
    }

    #[tokio::test]
    async fn reply_passes_reply_id() {
        let port = port();
        let out = reply_to_message(&port, 5, 2, "pong").await.unwrap();
        assert_eq!(out, "Replied to message 2 in chat 5.");
        assert!(port
            .calls()
            .iter()
            .any(|c| c.contains("reply_to=Some(2)")));
    }

    #[tokio::test]
    async fn context_marks_the_central_message() {
        let port = port();
        let out = get_message_context(&port, 5, 2, 3).await.unwrap();
        assert!(out.starts_with("Context for message 2 in chat 5:"));
        assert!(out.contains("ID: 2 | Unknown |"));
        assert!(out.contains("[THIS MESSAGE]"));
        assert!(out.contains("ID: 1"));
        assert!(out.contains("ID: 3"));
    }

    #[tokio::test]
    async fn context_for_missing_message() {
        let port = port();
        let out = get_message_context(&port, 5, 99, 3).await.unwrap();
        assert_eq!(out, "Message with ID 99 not found in chat 5.");
    }

    #[tokio::test]
    async fn search_reports_no_matches() {
        let port = port();
        let out = search_messages(&port, 5, "zebra", 10).await.unwrap();
        assert_eq!(out, "No messages found matching 'zebra'.");
    }
}
