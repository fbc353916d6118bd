//! Domain model for remote entities.
//!
//! The resolver produces a closed [`Peer`] variant exactly once; tool
//! functions match it exhaustively instead of probing attributes on whatever
//! the client library returned.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

/// A user-supplied identifier before resolution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PeerQuery {
    Id(i64),
    Username(String),
    Phone(String),
}

impl PeerQuery {
    /// `@name` and bare words are usernames, `+digits` is a phone number,
    /// plain (optionally negative) digits are a chat/user ID.
    pub fn parse(raw: &str) -> PeerQuery {
        let raw = raw.trim();
        if let Some(name) = raw.strip_prefix('@') {
            return PeerQuery::Username(name.to_string());
        }
        if raw.starts_with('+') && raw[1..].chars().all(|c| c.is_ascii_digit()) {
            return PeerQuery::Phone(raw.to_string());
        }
        if let Ok(id) = raw.parse::<i64>() {
            return PeerQuery::Id(id);
        }
        PeerQuery::Username(raw.to_string())
    }
}

impl std::fmt::Display for PeerQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PeerQuery::Id(id) => write!(f, "{id}"),
            PeerQuery::Username(name) => write!(f, "@{name}"),
            PeerQuery::Phone(phone) => write!(f, "{phone}"),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UserInfo {
    pub id: i64,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub phone: Option<String>,
    pub is_bot: bool,
    pub verified: bool,
}

impl UserInfo {
    /// "first last", trimmed. Empty parts collapse.
    pub fn display_name(&self) -> String {
        let mut name = self.first_name.clone();
        if let Some(last) = &self.last_name {
            if !last.is_empty() {
                if !name.is_empty() {
                    name.push(' ');
                }
                name.push_str(last);
            }
        }
        name.trim().to_string()
    }
}

/// A basic (legacy) group.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GroupInfo {
    pub id: i64,
    pub title: String,
}

/// A channel or supergroup. `broadcast` and `megagroup` are mutually
/// exclusive flags set by the remote service.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChannelInfo {
    pub id: i64,
    pub title: String,
    pub username: Option<String>,
    pub broadcast: bool,
    pub megagroup: bool,
}

/// Closed set of entity shapes a query can resolve to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Peer {
    User(UserInfo),
    Group(GroupInfo),
    Channel(ChannelInfo),
}

impl Peer {
    pub fn id(&self) -> i64 {
        match self {
            Peer::User(u) => u.id,
            Peer::Group(g) => g.id,
            Peer::Channel(c) => c.id,
        }
    }

    /// A user's full name, or the chat title.
    pub fn display_name(&self) -> String {
        match self {
            Peer::User(u) => u.display_name(),
            Peer::Group(g) => g.title.clone(),
            Peer::Channel(c) => c.title.clone(),
        }
    }

    pub fn username(&self) -> Option<&str> {
        match self {
            Peer::User(u) => u.username.as_deref(),
            Peer::Group(_) => None,
            Peer::Channel(c) => c.username.as_deref(),
        }
    }

    /// Dialog-listing type: broadcast channels are "channel", everything
    /// group-shaped (basic groups and supergroups) is "group".
    pub fn dialog_type(&self) -> &'static str {
        match self {
            Peer::User(_) => "user",
            Peer::Group(_) => "group",
            Peer::Channel(c) if c.broadcast => "channel",
            Peer::Channel(_) => "group",
        }
    }

    /// Human label used by `get_chat`.
    pub fn kind_label(&self) -> &'static str {
        match self {
            Peer::User(_) => "User",
            Peer::Group(_) => "Group (Basic)",
            Peer::Channel(c) if c.megagroup => "Supergroup",
            Peer::Channel(c) if c.broadcast => "Channel",
            Peer::Channel(_) => "Group",
        }
    }
}

/// JSON shape shared by every tool that emits structured entities.
pub fn format_entity(peer: &Peer) -> Value {
    match peer {
        Peer::User(u) => {
            let mut obj = json!({
                "id": u.id,
                "name": u.display_name(),
                "type": "user",
            });
            if let Some(username) = &u.username {
                obj["username"] = json!(username);
            }
            if let Some(phone) = &u.phone {
                obj["phone"] = json!(phone);
            }
            obj
        }
        Peer::Group(g) => json!({
            "id": g.id,
            "name": g.title,
            "type": "group",
        }),
        Peer::Channel(c) => json!({
            "id": c.id,
            "name": c.title,
            "type": "channel",
        }),
    }
}

/// Media attached to a message, reduced to what the tools report.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MediaInfo {
    /// Concrete media constructor name, e.g. "MessageMediaPhoto".
    pub kind: String,
    /// Document ID when the media wraps a document (GIFs, files, voice).
    pub document_id: Option<i64>,
}

#[derive(Clone, Debug, Default)]
pub struct MessageInfo {
    pub id: i32,
    pub date: DateTime<Utc>,
    pub text: String,
    pub from_id: Option<i64>,
    pub outgoing: bool,
    pub pinned: bool,
    /// Sender display name when the listing call delivered one.
    pub sender_name: Option<String>,
    pub media: Option<MediaInfo>,
}

impl MessageInfo {
    /// Message text, or the placeholder the original listings used.
    pub fn text_or_placeholder(&self) -> &str {
        if self.text.is_empty() {
            "[Media/No text]"
        } else {
            &self.text
        }
    }
}

pub fn format_message(msg: &MessageInfo) -> Value {
    let mut obj = json!({
        "id": msg.id,
        "date": msg.date.to_rfc3339(),
        "text": msg.text,
    });
    if let Some(from_id) = msg.from_id {
        obj["from_id"] = json!(from_id);
    }
    if let Some(media) = &msg.media {
        obj["has_media"] = json!(true);
        obj["media_type"] = json!(media.kind);
    }
    obj
}

/// A conversation summary from the dialog list.
#[derive(Clone, Debug, Default)]
pub struct DialogInfo {
    pub peer: Peer,
    pub unread_count: i32,
    pub last_message: Option<MessageInfo>,
}

impl Default for Peer {
    fn default() -> Self {
        Peer::User(UserInfo::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(first: &str, last: Option<&str>) -> UserInfo {
        UserInfo {
            id: 7,
            first_name: first.to_string(),
            last_name: last.map(|s| s.to_string()),
            username: Some("someone".to_string()),
            phone: None,
            is_bot: false,
            verified: false,
        }
    }

    #[test]
    fn parses_queries() {
        assert_eq!(PeerQuery::parse("@alice"), PeerQuery::Username("alice".into()));
        assert_eq!(PeerQuery::parse("alice"), PeerQuery::Username("alice".into()));
        assert_eq!(PeerQuery::parse("+15551234567"), PeerQuery::Phone("+15551234567".into()));
        assert_eq!(PeerQuery::parse("-1001234"), PeerQuery::Id(-1001234));
        assert_eq!(PeerQuery::parse(" 42 "), PeerQuery::Id(42));
    }

    #[test]
    fn user_entity_concatenates_and_trims_name() {
        let v = format_entity(&Peer::User(user("Ada ", Some("Lovelace"))));
        assert_eq!(v["type"], "user");
        assert_eq!(v["name"], "Ada  Lovelace".trim());
        assert_eq!(v["username"], "someone");

        let v = format_entity(&Peer::User(user("Solo", None)));
        assert_eq!(v["name"], "Solo");
    }

    #[test]
    fn titled_entities_report_concrete_kind() {
        let v = format_entity(&Peer::Group(GroupInfo { id: 1, title: "g".into() }));
        assert_eq!(v["type"], "group");

        let v = format_entity(&Peer::Channel(ChannelInfo {
            id: 2,
            title: "c".into(),
            username: None,
            broadcast: true,
            megagroup: false,
        }));
        assert_eq!(v["type"], "channel");
    }

    #[test]
    fn dialog_type_folds_supergroups_into_groups() {
        let supergroup = Peer::Channel(ChannelInfo {
            id: 2,
            title: "sg".into(),
            username: None,
            broadcast: false,
            megagroup: true,
        });
        assert_eq!(supergroup.dialog_type(), "group");
        assert_eq!(supergroup.kind_label(), "Supergroup");
    }

    #[test]
    fn message_json_includes_media_flags() {
        let msg = MessageInfo {
            id: 3,
            media: Some(MediaInfo {
                kind: "MessageMediaPhoto".into(),
                document_id: None,
            }),
            ..Default::default()
        };
        let v = format_message(&msg);
        assert_eq!(v["has_media"], true);
        assert_eq!(v["media_type"], "MessageMediaPhoto");
    }
}
