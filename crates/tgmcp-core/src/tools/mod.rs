//! Tool functions.
//!
//! Every tool has the same fixed shape: parse primitive arguments, resolve
//! peers, make one or a few port calls, format the result as delimited lines
//! or pretty JSON. Tools return `Result<String>`; the dispatch boundary in
//! [`crate::registry`] turns any `Err` into a normalized user-facing string,
//! so a tool invocation can never take the host process down.

pub mod admin;
pub mod chats;
pub mod contacts;
pub mod groups;
pub mod media;
pub mod messages;
pub mod profile;

use std::path::Path;

use crate::entity::{Peer, PeerQuery, UserInfo};
use crate::port::TelegramPort;
use crate::{Error, Result};

pub(crate) async fn resolve_chat(tg: &dyn TelegramPort, chat_id: i64) -> Result<Peer> {
    tg.resolve(&PeerQuery::Id(chat_id)).await
}

pub(crate) async fn resolve_user(tg: &dyn TelegramPort, user_id: i64) -> Result<UserInfo> {
    match tg.resolve(&PeerQuery::Id(user_id)).await? {
        Peer::User(u) => Ok(u),
        other => Err(Error::InvalidArgument(format!(
            "ID {} is not a user",
            other.id()
        ))),
    }
}

// POSIX-style permission pre-checks. Remote calls against unreadable paths
// fail obscurely, so the media tools gate on these first.

pub(crate) fn is_readable_file(path: &Path) -> bool {
    if !path.is_file() {
        return false;
    }
    mode_bits(path).map(|m| m & 0o444 != 0).unwrap_or(false)
}

pub(crate) fn is_writable_dir(path: &Path) -> bool {
    if !path.is_dir() {
        return false;
    }
    mode_bits(path).map(|m| m & 0o200 != 0).unwrap_or(false)
}

#[cfg(unix)]
fn mode_bits(path: &Path) -> Option<u32> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path).ok().map(|md| md.permissions().mode())
}

#[cfg(not(unix))]
fn mode_bits(path: &Path) -> Option<u32> {
    std::fs::metadata(path).ok().map(|_| 0o666)
}

#[cfg(test)]
pub(crate) mod mock {
    //! Recording mock of the port for tool tests.

    use std::path::{Path, PathBuf};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::entity::*;
    use crate::port::*;
    use crate::{Error, Result};

    /// Mock port: preloaded answers plus a call log. Methods without a
    /// preloaded answer fall back to the trait's `Unsupported` default
    /// semantics via `Error::Unsupported`.
    #[derive(Default)]
    pub struct MockPort {
        pub peers: Vec<Peer>,
        pub me: Option<UserInfo>,
        pub dialogs: Vec<DialogInfo>,
        pub messages: Vec<MessageInfo>,
        pub calls: Mutex<Vec<String>>,
    }

    impl MockPort {
        pub fn with_peers(peers: Vec<Peer>) -> Self {
            Self {
                peers,
                ..Default::default()
            }
        }

        pub fn record(&self, call: impl Into<String>) {
            self.calls.lock().unwrap().push(call.into());
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TelegramPort for MockPort {
        async fn resolve(&self, query: &PeerQuery) -> Result<Peer> {
            let found = self.peers.iter().find(|p| match query {
                PeerQuery::Id(id) => p.id() == *id,
                PeerQuery::Username(name) => p.username() == Some(name.as_str()),
                PeerQuery::Phone(phone) => match p {
                    Peer::User(user) => user.phone.as_deref() == Some(phone.as_str()),
                    _ => false,
                },
            });
            found
                .cloned()
                .ok_or_else(|| Error::NotFound(format!("no peer for {query}")))
        }

        async fn get_me(&self) -> Result<UserInfo> {
            self.me
                .clone()
                .ok_or_else(|| Error::NotFound("me".to_string()))
        }

        async fn get_dialogs(&self, limit: Option<usize>) -> Result<Vec<DialogInfo>> {
            let mut dialogs = self.dialogs.clone();
            if let Some(limit) = limit {
                dialogs.truncate(limit);
            }
            Ok(dialogs)
        }

        async fn get_messages(
            &self,
            _peer: &Peer,
            req: &MessageRequest,
        ) -> Result<Vec<MessageInfo>> {
            self.record(format!(
                "get_messages(limit={:?}, add_offset={})",
                req.limit, req.add_offset
            ));
            let mut msgs: Vec<MessageInfo> = self
                .messages
                .iter()
                .filter(|m| {
                    if let Some(q) = &req.search {
                        if !m.text.contains(q.as_str()) {
                            return false;
                        }
                    }
                    if req.filter == MessageFilter::Pinned && !m.pinned {
                        return false;
                    }
                    if req.max_id > 0 && m.id >= req.max_id {
                        return false;
                    }
                    if req.min_id > 0 && m.id <= req.min_id {
                        return false;
                    }
                    true
                })
                .cloned()
                .collect();
            let skip = req.add_offset.max(0) as usize;
            if skip > 0 {
                msgs = msgs.into_iter().skip(skip).collect();
            }
            if let Some(limit) = req.limit {
                msgs.truncate(limit);
            }
            Ok(msgs)
        }

        async fn get_message(&self, _peer: &Peer, message_id: i32) -> Result<Option<MessageInfo>> {
            Ok(self.messages.iter().find(|m| m.id == message_id).cloned())
        }

        async fn send_message(
            &self,
            peer: &Peer,
            text: &str,
            reply_to: Option<i32>,
        ) -> Result<()> {
            self.record(format!(
                "send_message({}, {text:?}, reply_to={reply_to:?})",
                peer.id()
            ));
            Ok(())
        }

        async fn send_file(
            &self,
            peer: &Peer,
            path: &Path,
            _caption: Option<&str>,
            kind: FileKind,
        ) -> Result<()> {
            self.record(format!(
                "send_file({}, {}, {kind:?})",
                peer.id(),
                path.display()
            ));
            Ok(())
        }

        async fn media_info(&self, _peer: &Peer, message_id: i32) -> Result<Option<MediaInfo>> {
            Ok(self
                .messages
                .iter()
                .find(|m| m.id == message_id)
                .and_then(|m| m.media.clone()))
        }

        async fn download_media(
            &self,
            peer: &Peer,
            message_id: i32,
            dest: &Path,
        ) -> Result<bool> {
            self.record(format!(
                "download_media({}, {message_id}, {})",
                peer.id(),
                dest.display()
            ));
            std::fs::write(dest, b"media")?;
            Ok(true)
        }

        async fn leave_channel(&self, channel: &ChannelInfo) -> Result<()> {
            self.record(format!("leave_channel({})", channel.id));
            Ok(())
        }

        async fn delete_chat_user(&self, group: &GroupInfo, user_id: i64) -> Result<()> {
            self.record(format!("delete_chat_user({}, {user_id})", group.id));
            Ok(())
        }

        async fn edit_channel_title(&self, channel: &ChannelInfo, title: &str) -> Result<()> {
            self.record(format!("edit_channel_title({}, {title:?})", channel.id));
            Ok(())
        }

        async fn edit_group_title(&self, group: &GroupInfo, title: &str) -> Result<()> {
            self.record(format!("edit_group_title({}, {title:?})", group.id));
            Ok(())
        }

        async fn export_invite_link(&self, _peer: &Peer) -> Result<String> {
            self.record("export_invite_link");
            Err(Error::Unsupported("export_invite_link"))
        }

        async fn full_chat_invite_link(&self, _peer: &Peer) -> Result<Option<String>> {
            self.record("full_chat_invite_link");
            Ok(Some("https://t.me/+abcdef".to_string()))
        }

        async fn edit_admin(
            &self,
            channel: &ChannelInfo,
            user: &UserInfo,
            rights: &AdminRights,
            rank: &str,
        ) -> Result<()> {
            self.record(format!(
                "edit_admin({}, {}, add_admins={}, rank={rank:?})",
                channel.id, user.id, rights.add_admins
            ));
            Ok(())
        }

        async fn edit_banned(
            &self,
            channel: &ChannelInfo,
            user: &UserInfo,
            rights: &BannedRights,
        ) -> Result<()> {
            self.record(format!(
                "edit_banned({}, {}, view_messages={})",
                channel.id, user.id, rights.view_messages
            ));
            Ok(())
        }
    }
}
