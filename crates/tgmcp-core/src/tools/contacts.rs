//! Contact tools: the address book, blocking, and contact-centric chat lookup.

use tracing::warn;

use crate::entity::{format_entity, Peer, UserInfo};
use crate::port::{ContactImport, MessageRequest, TelegramPort};
use crate::Result;

use super::resolve_user;

fn contact_line(user: &UserInfo) -> String {
    let mut line = format!("ID: {}, Name: {}", user.id, user.display_name());
    if let Some(username) = &user.username {
        line.push_str(&format!(", Username: @{username}"));
    }
    if let Some(phone) = &user.phone {
        line.push_str(&format!(", Phone: {phone}"));
    }
    line
}

pub async fn list_contacts(tg: &dyn TelegramPort) -> Result<String> {
    let contacts = tg.get_contacts().await?;
    if contacts.is_empty() {
        return Ok("No contacts found.".to_string());
    }
    let lines: Vec<String> = contacts.iter().map(contact_line).collect();
    Ok(lines.join("\n"))
}

pub async fn search_contacts(tg: &dyn TelegramPort, query: &str) -> Result<String> {
    let found = tg.search_users(query, 50).await?;
    if found.is_empty() {
        return Ok(format!("No contacts found matching '{query}'."));
    }
    let lines: Vec<String> = found.iter().map(contact_line).collect();
    Ok(lines.join("\n"))
}

pub async fn get_contact_ids(tg: &dyn TelegramPort) -> Result<String> {
    let ids = tg.get_contact_ids().await?;
    if ids.is_empty() {
        return Ok("No contact IDs found.".to_string());
    }
    let joined: Vec<String> = ids.iter().map(i64::to_string).collect();
    Ok(format!("Contact IDs: {}", joined.join(", ")))
}

pub async fn add_contact(
    tg: &dyn TelegramPort,
    phone: &str,
    first_name: &str,
    last_name: &str,
) -> Result<String> {
    let import = ContactImport {
        phone: phone.to_string(),
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
    };
    let imported = tg.import_contacts(std::slice::from_ref(&import)).await?;
    if imported > 0 {
        let name = format!("{first_name} {last_name}");
        Ok(format!("Contact {} added successfully.", name.trim()))
    } else {
        Ok("Contact not added. The service did not accept the import.".to_string())
    }
}

pub async fn delete_contact(tg: &dyn TelegramPort, user_id: i64) -> Result<String> {
    let user = resolve_user(tg, user_id).await?;
    tg.delete_contact(&user).await?;
    Ok(format!("Contact with user ID {user_id} deleted."))
}

pub async fn block_user(tg: &dyn TelegramPort, user_id: i64) -> Result<String> {
    let user = resolve_user(tg, user_id).await?;
    tg.block_user(&user).await?;
    Ok(format!("User {user_id} blocked."))
}

pub async fn unblock_user(tg: &dyn TelegramPort, user_id: i64) -> Result<String> {
    let user = resolve_user(tg, user_id).await?;
    tg.unblock_user(&user).await?;
    Ok(format!("User {user_id} unblocked."))
}

pub async fn import_contacts(
    tg: &dyn TelegramPort,
    contacts: Vec<ContactImport>,
) -> Result<String> {
    let imported = tg.import_contacts(&contacts).await?;
    Ok(format!("Imported {imported} contacts."))
}

pub async fn export_contacts(tg: &dyn TelegramPort) -> Result<String> {
    let contacts = tg.get_contacts().await?;
    let entries: Vec<serde_json::Value> = contacts
        .into_iter()
        .map(|u| format_entity(&Peer::User(u)))
        .collect();
    Ok(serde_json::to_string_pretty(&entries)?)
}

pub async fn get_blocked_users(tg: &dyn TelegramPort) -> Result<String> {
    let blocked = tg.get_blocked_users().await?;
    let entries: Vec<serde_json::Value> = blocked
        .into_iter()
        .map(|u| format_entity(&Peer::User(u)))
        .collect();
    Ok(serde_json::to_string_pretty(&entries)?)
}

fn matches_contact(user: &UserInfo, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    if user.display_name().to_lowercase().contains(&needle) {
        return true;
    }
    if let Some(username) = &user.username {
        if username.to_lowercase().contains(&needle) {
            return true;
        }
    }
    if let Some(phone) = &user.phone {
        if phone.contains(&needle) {
            return true;
        }
    }
    false
}

/// Find the direct chat with a contact matched by name, username or phone.
pub async fn get_direct_chat_by_contact(
    tg: &dyn TelegramPort,
    contact_query: &str,
) -> Result<String> {
    let contacts = tg.get_contacts().await?;
    let found: Vec<&UserInfo> = contacts
        .iter()
        .filter(|u| matches_contact(u, contact_query))
        .collect();
    if found.is_empty() {
        return Ok(format!("No contacts found matching '{contact_query}'."));
    }
    let dialogs = tg.get_dialogs(None).await?;
    let mut lines = Vec::new();
    for contact in &found {
        if let Some(dialog) = dialogs.iter().find(|d| d.peer.id() == contact.id) {
            let mut line = format!(
                "Chat ID: {}, Contact: {}",
                dialog.peer.id(),
                contact.display_name()
            );
            if let Some(username) = &contact.username {
                line.push_str(&format!(", Username: @{username}"));
            }
            if dialog.unread_count > 0 {
                line.push_str(&format!(", Unread: {}", dialog.unread_count));
            }
            lines.push(line);
        }
    }
    if lines.is_empty() {
        let names: Vec<String> = found.iter().map(|u| u.display_name()).collect();
        return Ok(format!(
            "Found contacts: {}, but no direct chats were found with them.",
            names.join(", ")
        ));
    }
    Ok(lines.join("\n"))
}

/// All chats involving a contact: the direct chat plus common groups.
pub async fn get_contact_chats(tg: &dyn TelegramPort, contact_id: i64) -> Result<String> {
    let contact = match super::resolve_chat(tg, contact_id).await? {
        Peer::User(user) => user,
        _ => return Ok(format!("ID {contact_id} is not a user/contact.")),
    };

    let mut lines = Vec::new();
    match tg.get_dialogs(None).await {
        Ok(dialogs) => {
            if let Some(dialog) = dialogs.iter().find(|d| d.peer.id() == contact_id) {
                let mut line = format!("Direct Chat ID: {}, Type: Private", dialog.peer.id());
                if dialog.unread_count > 0 {
                    line.push_str(&format!(", Unread: {}", dialog.unread_count));
                }
                lines.push(line);
            }
        }
        Err(err) => warn!(contact_id, error = %err, "dialog scan failed"),
    }

    match tg.get_common_chats(&contact).await {
        Ok(chats) => {
            for chat in &chats {
                let kind = match chat {
                    Peer::Channel(c) if c.broadcast => "Channel",
                    _ => "Group",
                };
                lines.push(format!(
                    "Chat ID: {}, Title: {}, Type: {kind}",
                    chat.id(),
                    chat.display_name()
                ));
            }
        }
        Err(err) => {
            warn!(contact_id, error = %err, "common chats unavailable");
            lines.push("Could not retrieve common groups.".to_string());
        }
    }

    let name = contact.display_name();
    if lines.is_empty() {
        return Ok(format!("No chats found with {name} (ID: {contact_id})."));
    }
    Ok(format!(
        "Chats with {name} (ID: {contact_id}):\n{}",
        lines.join("\n")
    ))
}

/// Most recent messages exchanged with a contact.
pub async fn get_last_interaction(tg: &dyn TelegramPort, contact_id: i64) -> Result<String> {
    let contact = resolve_user(tg, contact_id).await?;
    let name = contact.display_name();
    let peer = Peer::User(contact);
    let req = MessageRequest {
        limit: Some(5),
        ..Default::default()
    };
    let messages = tg.get_messages(&peer, &req).await?;
    if messages.is_empty() {
        return Ok(format!("No messages found with {name} (ID: {contact_id})."));
    }
    let mut out = format!("Last interactions with {name} (ID: {contact_id}):\n");
    for message in &messages {
        let from = if message.outgoing { "You" } else { name.as_str() };
        out.push_str(&format!(
            "Date: {}, From: {}, Message: {}\n",
            message.date,
            from,
            message.text_or_placeholder()
        ));
    }
    Ok(out.trim_end().to_string())
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::entity::DialogInfo;
    use crate::port::TelegramPort;
    use crate::tools::mock::MockPort;

    fn contact(id: i64, first: &str, username: Option<&str>, phone: Option<&str>) -> UserInfo {
        UserInfo {
            id,
            first_name: first.to_string(),
            username: username.map(str::to_string),
            phone: phone.map(str::to_string),
            ..Default::default()
        }
    }

    struct ContactsPort {
        inner: MockPort,
        contacts: Vec<UserInfo>,
    }

    #[async_trait]
    impl TelegramPort for ContactsPort {
        async fn get_contacts(&self) -> Result<Vec<UserInfo>> {
            Ok(self.contacts.clone())
        }

        async fn get_dialogs(&self, limit: Option<usize>) -> Result<Vec<DialogInfo>> {
            self.inner.get_dialogs(limit).await
        }

        async fn resolve(&self, query: &crate::entity::PeerQuery) -> Result<Peer> {
            self.inner.resolve(query).await
        }
    }

    fn port() -> ContactsPort {
        let alice = contact(1, "Alice", Some("alice"), Some("+15550100"));
        ContactsPort {
            inner: MockPort {
                peers: vec![Peer::User(alice.clone())],
                dialogs: vec![DialogInfo {
                    peer: Peer::User(alice.clone()),
                    unread_count: 2,
                    last_message: None,
                }],
                ..Default::default()
            },
            contacts: vec![alice, contact(2, "Bob", None, Some("+15550101"))],
        }
    }

    #[tokio::test]
    async fn list_contacts_formats_optional_fields() {
        let port = port();
        let out = list_contacts(&port).await.unwrap();
        assert!(out.contains("ID: 1, Name: Alice, Username: @alice, Phone: +15550100"));
        assert!(out.contains("ID: 2, Name: Bob, Phone: +15550101"));
    }

    #[tokio::test]
    async fn direct_chat_lookup_matches_by_name_case_insensitively() {
        let port = port();
        let out = get_direct_chat_by_contact(&port, "aLiCe").await.unwrap();
        assert_eq!(out, "Chat ID: 1, Contact: Alice, Username: @alice, Unread: 2");
    }

    #[tokio::test]
    async fn direct_chat_lookup_reports_contact_without_chat() {
        let port = port();
        let out = get_direct_chat_by_contact(&port, "+15550101").await.unwrap();
        assert_eq!(
            out,
            "Found contacts: Bob, but no direct chats were found with them."
        );
    }

    #[tokio::test]
    async fn direct_chat_lookup_reports_no_match() {
        let port = port();
        let out = get_direct_chat_by_contact(&port, "zelda").await.unwrap();
        assert_eq!(out, "No contacts found matching 'zelda'.");
    }

    #[tokio::test]
    async fn contact_chats_flags_non_user_ids() {
        let port = MockPort::with_peers(vec![Peer::Group(crate::entity::GroupInfo {
            id: 9,
            title: "team".to_string(),
        })]);
        let out = get_contact_chats(&port, 9).await.unwrap();
        assert_eq!(out, "ID 9 is not a user/contact.");
    }

    #[tokio::test]
    async fn last_interaction_labels_outgoing_messages() {
        use chrono::{TimeZone, Utc};
        let alice = contact(1, "Alice", None, None);
        let port = MockPort {
            peers: vec![Peer::User(alice)],
            messages: vec![
                crate::entity::MessageInfo {
                    id: 1,
                    date: Utc.with_ymd_and_hms(2025, 1, 2, 8, 0, 0).unwrap(),
                    text: "hi".to_string(),
                    outgoing: true,
                    ..Default::default()
                },
                crate::entity::MessageInfo {
                    id: 2,
                    date: Utc.with_ymd_and_hms(2025, 1, 2, 8, 1, 0).unwrap(),
                    text: "hello".to_string(),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        let out = get_last_interaction(&port, 1).await.unwrap();
        assert!(out.starts_with("Last interactions with Alice (ID: 1):"));
        assert!(out.contains("From: You, Message: hi"));
        assert!(out.contains("From: Alice, Message: hello"));
    }
}
