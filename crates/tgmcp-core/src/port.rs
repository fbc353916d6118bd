//! Hexagonal port for the Telegram client library.
//!
//! Every remote call the tools need goes through [`TelegramPort`]. Default
//! method bodies return [`Error::Unsupported`], so an adapter states its
//! capabilities by which methods it overrides and tools can run ordered
//! fallback chains without probing.

use std::path::Path;

use async_trait::async_trait;

use crate::entity::{ChannelInfo, DialogInfo, GroupInfo, MediaInfo, MessageInfo, Peer, PeerQuery, UserInfo};
use crate::{Error, Result};

/// Options for a message-history fetch. Zero fields mean "unset".
#[derive(Clone, Debug, Default)]
pub struct MessageRequest {
    pub limit: Option<usize>,
    /// Messages to skip from the start of the result (1-indexed pagination).
    pub add_offset: i32,
    pub search: Option<String>,
    pub max_id: i32,
    pub min_id: i32,
    /// Oldest-first instead of the service's newest-first default.
    pub reverse: bool,
    pub filter: MessageFilter,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MessageFilter {
    #[default]
    Any,
    Pinned,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParticipantFilter {
    All,
    Admins,
    Banned,
}

/// How an uploaded file should be presented.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileKind {
    /// Let the service pick (photo/document by content).
    Auto,
    VoiceNote,
    Sticker,
}

/// Admin permission set. Field names follow the remote service's schema.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AdminRights {
    pub change_info: bool,
    pub post_messages: bool,
    pub edit_messages: bool,
    pub delete_messages: bool,
    pub ban_users: bool,
    pub invite_users: bool,
    pub pin_messages: bool,
    pub add_admins: bool,
    pub anonymous: bool,
    pub manage_call: bool,
    pub other: bool,
}

impl AdminRights {
    /// Default promotion set: everything except adding admins and anonymity.
    pub fn promote_default() -> Self {
        Self {
            change_info: true,
            post_messages: true,
            edit_messages: true,
            delete_messages: true,
            ban_users: true,
            invite_users: true,
            pin_messages: true,
            add_admins: false,
            anonymous: false,
            manage_call: true,
            other: true,
        }
    }

    /// Empty set, used for demotion.
    pub fn none() -> Self {
        Self {
            change_info: false,
            post_messages: false,
            edit_messages: false,
            delete_messages: false,
            ban_users: false,
            invite_users: false,
            pin_messages: false,
            add_admins: false,
            anonymous: false,
            manage_call: false,
            other: false,
        }
    }
}

/// Restriction set. `true` means the action is forbidden.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BannedRights {
    pub view_messages: bool,
    pub send_messages: bool,
    pub send_media: bool,
    pub send_stickers: bool,
    pub send_gifs: bool,
    pub send_games: bool,
    pub send_inline: bool,
    pub embed_links: bool,
    pub send_polls: bool,
    pub change_info: bool,
    pub invite_users: bool,
    pub pin_messages: bool,
}

impl BannedRights {
    /// Every restriction enabled: a permanent ban.
    pub fn all() -> Self {
        Self {
            view_messages: true,
            send_messages: true,
            send_media: true,
            send_stickers: true,
            send_gifs: true,
            send_games: true,
            send_inline: true,
            embed_links: true,
            send_polls: true,
            change_info: true,
            invite_users: true,
            pin_messages: true,
        }
    }

    /// No restrictions: lifts a ban.
    pub fn none() -> Self {
        Self {
            view_messages: false,
            send_messages: false,
            send_media: false,
            send_stickers: false,
            send_gifs: false,
            send_games: false,
            send_inline: false,
            embed_links: false,
            send_polls: false,
            change_info: false,
            invite_users: false,
            pin_messages: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrivacyKey {
    Status,
    Phone,
    ProfilePhoto,
}

impl PrivacyKey {
    pub fn parse(key: &str) -> Option<Self> {
        match key {
            "status" => Some(Self::Status),
            "phone" => Some(Self::Phone),
            "profile_photo" => Some(Self::ProfilePhoto),
            _ => None,
        }
    }

    pub const SUPPORTED: &'static str = "status, phone, profile_photo";
}

#[derive(Clone, Debug)]
pub struct ContactImport {
    pub phone: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Clone, Debug)]
pub struct BotCommandDef {
    pub command: String,
    pub description: String,
}

/// The client-library boundary.
///
/// Session management, flood handling and entity caching live on the other
/// side of this trait; nothing here retries.
#[allow(unused_variables)]
#[async_trait]
pub trait TelegramPort: Send + Sync {
    // ----- resolution / self -----

    async fn resolve(&self, query: &PeerQuery) -> Result<Peer> {
        Err(Error::Unsupported("resolve"))
    }

    async fn get_me(&self) -> Result<UserInfo> {
        Err(Error::Unsupported("get_me"))
    }

    // ----- dialogs -----

    async fn get_dialogs(&self, limit: Option<usize>) -> Result<Vec<DialogInfo>> {
        Err(Error::Unsupported("get_dialogs"))
    }

    async fn set_muted(&self, peer: &Peer, muted: bool) -> Result<()> {
        Err(Error::Unsupported("set_muted"))
    }

    async fn set_archived(&self, peer: &Peer, archived: bool) -> Result<()> {
        Err(Error::Unsupported("set_archived"))
    }

    async fn mark_as_read(&self, peer: &Peer) -> Result<()> {
        Err(Error::Unsupported("mark_as_read"))
    }

    // ----- messages -----

    async fn get_messages(&self, peer: &Peer, req: &MessageRequest) -> Result<Vec<MessageInfo>> {
        Err(Error::Unsupported("get_messages"))
    }

    async fn get_message(&self, peer: &Peer, message_id: i32) -> Result<Option<MessageInfo>> {
        Err(Error::Unsupported("get_message"))
    }

    async fn send_message(&self, peer: &Peer, text: &str, reply_to: Option<i32>) -> Result<()> {
        Err(Error::Unsupported("send_message"))
    }

    async fn edit_message(&self, peer: &Peer, message_id: i32, new_text: &str) -> Result<()> {
        Err(Error::Unsupported("edit_message"))
    }

    async fn delete_message(&self, peer: &Peer, message_id: i32) -> Result<()> {
        Err(Error::Unsupported("delete_message"))
    }

    async fn forward_message(&self, to: &Peer, message_id: i32, from: &Peer) -> Result<()> {
        Err(Error::Unsupported("forward_message"))
    }

    async fn pin_message(&self, peer: &Peer, message_id: i32) -> Result<()> {
        Err(Error::Unsupported("pin_message"))
    }

    async fn unpin_message(&self, peer: &Peer, message_id: i32) -> Result<()> {
        Err(Error::Unsupported("unpin_message"))
    }

    // ----- media -----

    async fn send_file(
        &self,
        peer: &Peer,
        path: &Path,
        caption: Option<&str>,
        kind: FileKind,
    ) -> Result<()> {
        Err(Error::Unsupported("send_file"))
    }

    /// Send a document the service already stores, addressed by ID.
    async fn send_document_id(&self, peer: &Peer, document_id: i64) -> Result<()> {
        Err(Error::Unsupported("send_document_id"))
    }

    /// Returns the media description, or None when the message has no media.
    async fn media_info(&self, peer: &Peer, message_id: i32) -> Result<Option<MediaInfo>> {
        Err(Error::Unsupported("media_info"))
    }

    /// Returns false when the message has no media to download.
    async fn download_media(&self, peer: &Peer, message_id: i32, dest: &Path) -> Result<bool> {
        Err(Error::Unsupported("download_media"))
    }

    async fn get_sticker_set_titles(&self) -> Result<Vec<String>> {
        Err(Error::Unsupported("get_sticker_set_titles"))
    }

    async fn search_gifs(&self, query: &str, limit: usize) -> Result<Vec<i64>> {
        Err(Error::Unsupported("search_gifs"))
    }

    // ----- contacts -----

    async fn get_contacts(&self) -> Result<Vec<UserInfo>> {
        Err(Error::Unsupported("get_contacts"))
    }

    async fn get_contact_ids(&self) -> Result<Vec<i64>> {
        Err(Error::Unsupported("get_contact_ids"))
    }

    /// Global user/contact search (also finds public chats and bots).
    async fn search_users(&self, query: &str, limit: usize) -> Result<Vec<UserInfo>> {
        Err(Error::Unsupported("search_users"))
    }

    /// Returns how many contacts the service accepted.
    async fn import_contacts(&self, contacts: &[ContactImport]) -> Result<usize> {
        Err(Error::Unsupported("import_contacts"))
    }

    async fn delete_contact(&self, user: &UserInfo) -> Result<()> {
        Err(Error::Unsupported("delete_contact"))
    }

    async fn block_user(&self, user: &UserInfo) -> Result<()> {
        Err(Error::Unsupported("block_user"))
    }

    async fn unblock_user(&self, user: &UserInfo) -> Result<()> {
        Err(Error::Unsupported("unblock_user"))
    }

    async fn get_blocked_users(&self) -> Result<Vec<UserInfo>> {
        Err(Error::Unsupported("get_blocked_users"))
    }

    async fn get_common_chats(&self, user: &UserInfo) -> Result<Vec<Peer>> {
        Err(Error::Unsupported("get_common_chats"))
    }

    // ----- groups / channels -----

    /// Returns the new chat's ID when the service reports one.
    async fn create_group(&self, title: &str, users: &[UserInfo]) -> Result<Option<i64>> {
        Err(Error::Unsupported("create_group"))
    }

    async fn create_channel(&self, title: &str, about: &str, megagroup: bool) -> Result<i64> {
        Err(Error::Unsupported("create_channel"))
    }

    /// Returns how many users ended up invited.
    async fn invite_to_channel(&self, channel: &ChannelInfo, users: &[UserInfo]) -> Result<usize> {
        Err(Error::Unsupported("invite_to_channel"))
    }

    async fn leave_channel(&self, channel: &ChannelInfo) -> Result<()> {
        Err(Error::Unsupported("leave_channel"))
    }

    /// Remove a user (possibly yourself) from a basic group.
    async fn delete_chat_user(&self, group: &GroupInfo, user_id: i64) -> Result<()> {
        Err(Error::Unsupported("delete_chat_user"))
    }

    async fn get_participants(
        &self,
        peer: &Peer,
        filter: ParticipantFilter,
    ) -> Result<Vec<UserInfo>> {
        Err(Error::Unsupported("get_participants"))
    }

    async fn participant_count(&self, peer: &Peer) -> Result<usize> {
        Err(Error::Unsupported("participant_count"))
    }

    async fn edit_channel_title(&self, channel: &ChannelInfo, title: &str) -> Result<()> {
        Err(Error::Unsupported("edit_channel_title"))
    }

    async fn edit_group_title(&self, group: &GroupInfo, title: &str) -> Result<()> {
        Err(Error::Unsupported("edit_group_title"))
    }

    /// `photo: None` deletes the current photo.
    async fn edit_channel_photo(&self, channel: &ChannelInfo, photo: Option<&Path>) -> Result<()> {
        Err(Error::Unsupported("edit_channel_photo"))
    }

    async fn edit_group_photo(&self, group: &GroupInfo, photo: Option<&Path>) -> Result<()> {
        Err(Error::Unsupported("edit_group_photo"))
    }

    // ----- invites -----

    async fn export_invite_link(&self, peer: &Peer) -> Result<String> {
        Err(Error::Unsupported("export_invite_link"))
    }

    /// Invite link recorded on the full chat info, if any.
    async fn full_chat_invite_link(&self, peer: &Peer) -> Result<Option<String>> {
        Err(Error::Unsupported("full_chat_invite_link"))
    }

    /// Returns the chat title when the account is already a member.
    async fn check_invite(&self, hash: &str) -> Result<Option<String>> {
        Err(Error::Unsupported("check_invite"))
    }

    /// Join via invite hash; returns the joined chat's title when known.
    async fn import_invite(&self, hash: &str) -> Result<Option<String>> {
        Err(Error::Unsupported("import_invite"))
    }

    // ----- admin -----

    async fn edit_admin(
        &self,
        channel: &ChannelInfo,
        user: &UserInfo,
        rights: &AdminRights,
        rank: &str,
    ) -> Result<()> {
        Err(Error::Unsupported("edit_admin"))
    }

    async fn edit_banned(
        &self,
        channel: &ChannelInfo,
        user: &UserInfo,
        rights: &BannedRights,
    ) -> Result<()> {
        Err(Error::Unsupported("edit_banned"))
    }

    /// Recent admin actions as loosely structured JSON events.
    async fn get_admin_log(&self, peer: &Peer, limit: usize) -> Result<Vec<serde_json::Value>> {
        Err(Error::Unsupported("get_admin_log"))
    }

    /// Only valid when the signed-in account is a bot.
    async fn set_bot_commands(&self, commands: &[BotCommandDef]) -> Result<()> {
        Err(Error::Unsupported("set_bot_commands"))
    }

    // ----- profile / account -----

    async fn update_profile(
        &self,
        first_name: Option<&str>,
        last_name: Option<&str>,
        about: Option<&str>,
    ) -> Result<()> {
        Err(Error::Unsupported("update_profile"))
    }

    async fn set_profile_photo(&self, path: &Path) -> Result<()> {
        Err(Error::Unsupported("set_profile_photo"))
    }

    /// Returns false when there was no photo to delete.
    async fn delete_profile_photo(&self) -> Result<bool> {
        Err(Error::Unsupported("delete_profile_photo"))
    }

    async fn get_user_photos(&self, user: &UserInfo, limit: usize) -> Result<Vec<i64>> {
        Err(Error::Unsupported("get_user_photos"))
    }

    /// Online status as a short human string.
    async fn get_user_status(&self, user: &UserInfo) -> Result<String> {
        Err(Error::Unsupported("get_user_status"))
    }

    /// Full user info (bio, bot details) as loosely structured JSON.
    async fn get_full_user(&self, user: &UserInfo) -> Result<serde_json::Value> {
        Err(Error::Unsupported("get_full_user"))
    }

    async fn get_privacy(&self, key: PrivacyKey) -> Result<serde_json::Value> {
        Err(Error::Unsupported("get_privacy"))
    }

    async fn set_privacy(
        &self,
        key: PrivacyKey,
        allow: &[UserInfo],
        disallow: &[UserInfo],
    ) -> Result<()> {
        Err(Error::Unsupported("set_privacy"))
    }
}
