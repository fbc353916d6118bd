//! [`TelegramPort`] implementation over a grammers [`Client`].
//!
//! Raw TL invocations need access hashes, so every chat seen through
//! resolution, dialog scans or contact lookups lands in an id-keyed cache,
//! mirroring how the service's own clients keep an entity cache.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;

use grammers_client::types::Chat;
use grammers_client::{Client, InputMessage, InvocationError};
use grammers_session::{PackedChat, PackedType};
use grammers_tl_types as tl;

use tgmcp_core::entity::{
    ChannelInfo, DialogInfo, GroupInfo, MediaInfo, MessageInfo, Peer, PeerQuery, UserInfo,
};
use tgmcp_core::port::{
    AdminRights, BannedRights, BotCommandDef, ContactImport, FileKind, MessageFilter,
    MessageRequest, ParticipantFilter, PrivacyKey, TelegramPort,
};
use tgmcp_core::{Error, Result};

use crate::convert;

pub struct GrammersPort {
    client: Client,
    cache: Mutex<HashMap<i64, Chat>>,
}

fn map_invocation(err: InvocationError) -> Error {
    if let InvocationError::Rpc(rpc) = &err {
        let name = rpc.name.as_str();
        return match name {
            "INVITE_HASH_EXPIRED" => Error::InviteExpired,
            "INVITE_HASH_INVALID" | "INVITE_HASH_EMPTY" => Error::InviteInvalid,
            "USER_ALREADY_PARTICIPANT" => Error::AlreadyParticipant,
            "INVITE_REQUEST_SENT" => Error::AdminApprovalRequired,
            "USERS_TOO_MUCH" | "CHANNELS_TOO_MUCH" => Error::ChatFull,
            "USER_NOT_MUTUAL_CONTACT" => Error::NotMutualContact,
            "USER_PRIVACY_RESTRICTED" => Error::PrivacyRestricted,
            "AUTH_KEY_UNREGISTERED" | "SESSION_REVOKED" => Error::Unauthorized,
            _ if name.starts_with("FLOOD_WAIT") => Error::Flood,
            _ => Error::Rpc(err.to_string()),
        };
    }
    Error::Rpc(err.to_string())
}

fn input_peer(packed: &PackedChat) -> tl::enums::InputPeer {
    let access_hash = packed.access_hash.unwrap_or(0);
    match packed.ty {
        PackedType::User | PackedType::Bot => tl::types::InputPeerUser {
            user_id: packed.id,
            access_hash,
        }
        .into(),
        PackedType::Chat => tl::types::InputPeerChat { chat_id: packed.id }.into(),
        _ => tl::types::InputPeerChannel {
            channel_id: packed.id,
            access_hash,
        }
        .into(),
    }
}

fn input_user(packed: &PackedChat) -> Result<tl::enums::InputUser> {
    match packed.ty {
        PackedType::User | PackedType::Bot => Ok(tl::types::InputUser {
            user_id: packed.id,
            access_hash: packed.access_hash.unwrap_or(0),
        }
        .into()),
        _ => Err(Error::InvalidArgument(format!(
            "entity {} is not a user",
            packed.id
        ))),
    }
}

fn input_channel(packed: &PackedChat) -> Result<tl::enums::InputChannel> {
    match packed.ty {
        PackedType::Megagroup | PackedType::Broadcast | PackedType::Gigagroup => {
            Ok(tl::types::InputChannel {
                channel_id: packed.id,
                access_hash: packed.access_hash.unwrap_or(0),
            }
            .into())
        }
        _ => Err(Error::InvalidArgument(format!(
            "entity {} is not a channel",
            packed.id
        ))),
    }
}

fn tl_user_info(user: &tl::types::User) -> UserInfo {
    UserInfo {
        id: user.id,
        first_name: user.first_name.clone().unwrap_or_default(),
        last_name: user.last_name.clone(),
        username: user.username.clone(),
        phone: user.phone.clone(),
        is_bot: user.bot,
        verified: user.verified,
    }
}

fn tl_chat_peer(chat: &tl::enums::Chat) -> Option<Peer> {
    match chat {
        tl::enums::Chat::Chat(group) => Some(Peer::Group(GroupInfo {
            id: group.id,
            title: group.title.clone(),
        })),
        tl::enums::Chat::Channel(channel) => Some(Peer::Channel(ChannelInfo {
            id: channel.id,
            title: channel.title.clone(),
            username: channel.username.clone(),
            broadcast: channel.broadcast,
            megagroup: channel.megagroup,
        })),
        _ => None,
    }
}

fn tl_chat_id(chat: &tl::enums::Chat) -> Option<i64> {
    match chat {
        tl::enums::Chat::Chat(group) => Some(group.id),
        tl::enums::Chat::Channel(channel) => Some(channel.id),
        _ => None,
    }
}

/// Pull the first chat id out of an `Updates` response.
fn updates_chat_id(updates: &tl::enums::Updates) -> Option<i64> {
    let chats = match updates {
        tl::enums::Updates::Updates(u) => &u.chats,
        tl::enums::Updates::Combined(u) => &u.chats,
        _ => return None,
    };
    chats.iter().find_map(tl_chat_id)
}

fn updates_chat_title(updates: &tl::enums::Updates) -> Option<String> {
    let chats = match updates {
        tl::enums::Updates::Updates(u) => &u.chats,
        tl::enums::Updates::Combined(u) => &u.chats,
        _ => return None,
    };
    chats.iter().find_map(|chat| match chat {
        tl::enums::Chat::Chat(group) => Some(group.title.clone()),
        tl::enums::Chat::Channel(channel) => Some(channel.title.clone()),
        _ => None,
    })
}

fn privacy_key_tl(key: PrivacyKey) -> tl::enums::InputPrivacyKey {
    match key {
        PrivacyKey::Status => tl::types::InputPrivacyKeyStatusTimestamp {}.into(),
        PrivacyKey::Phone => tl::types::InputPrivacyKeyPhoneNumber {}.into(),
        PrivacyKey::ProfilePhoto => tl::types::InputPrivacyKeyProfilePhoto {}.into(),
    }
}

impl GrammersPort {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn remember(&self, chat: &Chat) {
        self.cache.lock().unwrap().insert(chat.id(), chat.clone());
    }

    fn cached(&self, id: i64) -> Option<Chat> {
        self.cache.lock().unwrap().get(&id).cloned()
    }

    /// Chat for an id, scanning dialogs when the cache misses. The scan
    /// populates the cache for every dialog it touches.
    async fn chat_by_id(&self, id: i64) -> Result<Chat> {
        if let Some(chat) = self.cached(id) {
            return Ok(chat);
        }
        tracing::debug!(id, "entity cache miss, scanning dialogs");
        let mut dialogs = self.client.iter_dialogs();
        while let Some(dialog) = dialogs.next().await.map_err(map_invocation)? {
            self.remember(dialog.chat());
            if dialog.chat().id() == id {
                return Ok(dialog.chat().clone());
            }
        }
        Err(Error::NotFound(format!("no entity with ID {id}")))
    }

    async fn chat_for(&self, peer: &Peer) -> Result<Chat> {
        self.chat_by_id(peer.id()).await
    }

    async fn chat_for_user(&self, user: &UserInfo) -> Result<Chat> {
        self.chat_by_id(user.id).await
    }

    async fn invoke<R: tl::RemoteCall>(&self, request: &R) -> Result<R::Return> {
        self.client.invoke(request).await.map_err(map_invocation)
    }

    async fn packed_channel(&self, channel: &ChannelInfo) -> Result<tl::enums::InputChannel> {
        let chat = self.chat_by_id(channel.id).await?;
        input_channel(&chat.pack())
    }

    async fn packed_user(&self, user: &UserInfo) -> Result<tl::enums::InputUser> {
        let chat = self.chat_for_user(user).await?;
        input_user(&chat.pack())
    }

    async fn uploaded_file(&self, path: &Path) -> Result<grammers_client::types::media::Uploaded> {
        self.client
            .upload_file(path)
            .await
            .map_err(|err| Error::Rpc(format!("upload failed: {err}")))
    }

    async fn message_by_id(
        &self,
        chat: &Chat,
        message_id: i32,
    ) -> Result<Option<grammers_client::types::Message>> {
        let mut found = self
            .client
            .get_messages_by_id(chat, &[message_id])
            .await
            .map_err(map_invocation)?;
        Ok(found.pop().flatten())
    }
}

#[async_trait]
impl TelegramPort for GrammersPort {
    async fn resolve(&self, query: &PeerQuery) -> Result<Peer> {
        match query {
            PeerQuery::Id(id) => {
                let chat = self.chat_by_id(*id).await?;
                Ok(convert::peer(&chat))
            }
            PeerQuery::Username(name) => {
                let chat = self
                    .client
                    .resolve_username(name)
                    .await
                    .map_err(map_invocation)?
                    .ok_or_else(|| Error::NotFound(format!("no entity for @{name}")))?;
                self.remember(&chat);
                Ok(convert::peer(&chat))
            }
            PeerQuery::Phone(phone) => {
                let wanted: String = phone.chars().filter(char::is_ascii_digit).collect();
                let tl::enums::contacts::Contacts::Contacts(contacts) = self
                    .invoke(&tl::functions::contacts::GetContacts { hash: 0 })
                    .await?
                else {
                    return Err(Error::NotFound(format!("no contact with phone {phone}")));
                };
                for user in &contacts.users {
                    let tl::enums::User::User(user) = user else {
                        continue;
                    };
                    let matches = user
                        .phone
                        .as_deref()
                        .map(|p| p.ends_with(&wanted))
                        .unwrap_or(false);
                    if matches {
                        let packed = PackedChat {
                            ty: if user.bot {
                                PackedType::Bot
                            } else {
                                PackedType::User
                            },
                            id: user.id,
                            access_hash: user.access_hash,
                        };
                        let chat = self
                            .client
                            .unpack_chat(packed)
                            .await
                            .map_err(map_invocation)?;
                        self.remember(&chat);
                        return Ok(convert::peer(&chat));
                    }
                }
                Err(Error::NotFound(format!("no contact with phone {phone}")))
            }
        }
    }

    async fn get_me(&self) -> Result<UserInfo> {
        let me = self.client.get_me().await.map_err(map_invocation)?;
        Ok(convert::user_info(&me))
    }

    async fn get_dialogs(&self, limit: Option<usize>) -> Result<Vec<DialogInfo>> {
        let mut out = Vec::new();
        let mut dialogs = self.client.iter_dialogs();
        while let Some(dialog) = dialogs.next().await.map_err(map_invocation)? {
            self.remember(dialog.chat());
            out.push(convert::dialog_info(&dialog));
            if limit.is_some_and(|max| out.len() >= max) {
                break;
            }
        }
        Ok(out)
    }

    async fn set_muted(&self, peer: &Peer, muted: bool) -> Result<()> {
        let chat = self.chat_for(peer).await?;
        let mute_until = if muted { Some(i32::MAX) } else { Some(0) };
        self.invoke(&tl::functions::account::UpdateNotifySettings {
            peer: tl::types::InputNotifyPeer {
                peer: input_peer(&chat.pack()),
            }
            .into(),
            settings: tl::types::InputPeerNotifySettings {
                show_previews: None,
                silent: None,
                mute_until,
                sound: None,
                stories_muted: None,
                stories_hide_sender: None,
                stories_sound: None,
            }
            .into(),
        })
        .await?;
        Ok(())
    }

    async fn set_archived(&self, peer: &Peer, archived: bool) -> Result<()> {
        let chat = self.chat_for(peer).await?;
        let folder_id = if archived { 1 } else { 0 };
        self.invoke(&tl::functions::folders::EditPeerFolders {
            folder_peers: vec![tl::types::InputFolderPeer {
                peer: input_peer(&chat.pack()),
                folder_id,
            }
            .into()],
        })
        .await?;
        Ok(())
    }

    async fn mark_as_read(&self, peer: &Peer) -> Result<()> {
        let chat = self.chat_for(peer).await?;
        self.client.mark_as_read(&chat).await.map_err(map_invocation)
    }

    async fn get_messages(&self, peer: &Peer, req: &MessageRequest) -> Result<Vec<MessageInfo>> {
        let chat = self.chat_for(peer).await?;
        let limit = req.limit.unwrap_or(100);
        let skip = req.add_offset.max(0) as usize;
        let window = limit.saturating_add(skip);
        let mut collected = Vec::new();

        if req.search.is_some() || req.filter == MessageFilter::Pinned {
            let mut iter = self
                .client
                .search_messages(&chat)
                .query(req.search.as_deref().unwrap_or(""))
                .limit(window);
            if req.filter == MessageFilter::Pinned {
                iter = iter.filter(tl::types::InputMessagesFilterPinned {}.into());
            }
            while let Some(message) = iter.next().await.map_err(map_invocation)? {
                collected.push(convert::message_info(&message));
                if collected.len() >= window {
                    break;
                }
            }
        } else if req.min_id > 0 {
            // Newest-first scan down to min_id, then flip to ascending order.
            let mut iter = self.client.iter_messages(&chat);
            while let Some(message) = iter.next().await.map_err(map_invocation)? {
                if message.id() <= req.min_id {
                    break;
                }
                collected.push(convert::message_info(&message));
            }
            collected.reverse();
            collected.truncate(limit);
            return Ok(collected);
        } else {
            let mut iter = self.client.iter_messages(&chat).limit(window);
            if req.max_id > 0 {
                iter = iter.offset_id(req.max_id);
            }
            while let Some(message) = iter.next().await.map_err(map_invocation)? {
                collected.push(convert::message_info(&message));
                if collected.len() >= window {
                    break;
                }
            }
        }

        let mut out: Vec<MessageInfo> = collected.into_iter().skip(skip).collect();
        out.truncate(limit);
        if req.reverse {
            out.reverse();
        }
        Ok(out)
    }

    async fn get_message(&self, peer: &Peer, message_id: i32) -> Result<Option<MessageInfo>> {
        let chat = self.chat_for(peer).await?;
        Ok(self
            .message_by_id(&chat, message_id)
            .await?
            .map(|m| convert::message_info(&m)))
    }

    async fn send_message(&self, peer: &Peer, text: &str, reply_to: Option<i32>) -> Result<()> {
        let chat = self.chat_for(peer).await?;
        let mut message = InputMessage::text(text);
        if let Some(reply_id) = reply_to {
            message = message.reply_to(Some(reply_id));
        }
        self.client
            .send_message(&chat, message)
            .await
            .map_err(map_invocation)?;
        Ok(())
    }

    async fn edit_message(&self, peer: &Peer, message_id: i32, new_text: &str) -> Result<()> {
        let chat = self.chat_for(peer).await?;
        self.client
            .edit_message(&chat, message_id, InputMessage::text(new_text))
            .await
            .map_err(map_invocation)
    }

    async fn delete_message(&self, peer: &Peer, message_id: i32) -> Result<()> {
        let chat = self.chat_for(peer).await?;
        self.client
            .delete_messages(&chat, &[message_id])
            .await
            .map_err(map_invocation)?;
        Ok(())
    }

    async fn forward_message(&self, to: &Peer, message_id: i32, from: &Peer) -> Result<()> {
        let dest = self.chat_for(to).await?;
        let source = self.chat_for(from).await?;
        self.client
            .forward_messages(&dest, &[message_id], &source)
            .await
            .map_err(map_invocation)?;
        Ok(())
    }

    async fn pin_message(&self, peer: &Peer, message_id: i32) -> Result<()> {
        let chat = self.chat_for(peer).await?;
        self.client
            .pin_message(&chat, message_id)
            .await
            .map_err(map_invocation)
    }

    async fn unpin_message(&self, peer: &Peer, message_id: i32) -> Result<()> {
        let chat = self.chat_for(peer).await?;
        self.client
            .unpin_message(&chat, message_id)
            .await
            .map_err(map_invocation)
    }

    async fn send_file(
        &self,
        peer: &Peer,
        path: &Path,
        caption: Option<&str>,
        kind: FileKind,
    ) -> Result<()> {
        let chat = self.chat_for(peer).await?;
        let uploaded = self.uploaded_file(path).await?;
        let message = InputMessage::text(caption.unwrap_or(""));
        let message = match kind {
            FileKind::Auto => {
                let photo_ext = path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| {
                        ["jpg", "jpeg", "png"]
                            .iter()
                            .any(|p| ext.eq_ignore_ascii_case(p))
                    })
                    .unwrap_or(false);
                if photo_ext {
                    message.photo(uploaded)
                } else {
                    message.document(uploaded)
                }
            }
            FileKind::VoiceNote | FileKind::Sticker => message.document(uploaded),
        };
        self.client
            .send_message(&chat, message)
            .await
            .map_err(map_invocation)?;
        Ok(())
    }

    async fn send_document_id(&self, peer: &Peer, document_id: i64) -> Result<()> {
        let chat = self.chat_for(peer).await?;
        self.invoke(&tl::functions::messages::SendMedia {
            silent: false,
            background: false,
            clear_draft: false,
            noforwards: false,
            update_stickersets_order: false,
            invert_media: false,
            peer: input_peer(&chat.pack()),
            reply_to: None,
            media: tl::types::InputMediaDocument {
                spoiler: false,
                id: tl::types::InputDocument {
                    id: document_id,
                    access_hash: 0,
                    file_reference: Vec::new(),
                }
                .into(),
                ttl_seconds: None,
                query: None,
            }
            .into(),
            message: String::new(),
            random_id: rand_id(),
            reply_markup: None,
            entities: None,
            schedule_date: None,
            send_as: None,
            quick_reply_shortcut: None,
            effect: None,
        })
        .await?;
        Ok(())
    }

    async fn media_info(&self, peer: &Peer, message_id: i32) -> Result<Option<MediaInfo>> {
        let chat = self.chat_for(peer).await?;
        Ok(self
            .message_by_id(&chat, message_id)
            .await?
            .map(|m| convert::message_info(&m))
            .and_then(|info| info.media))
    }

    async fn download_media(&self, peer: &Peer, message_id: i32, dest: &Path) -> Result<bool> {
        let chat = self.chat_for(peer).await?;
        let Some(message) = self.message_by_id(&chat, message_id).await? else {
            return Ok(false);
        };
        if message.media().is_none() {
            return Ok(false);
        }
        message
            .download_media(dest)
            .await
            .map_err(|err| Error::Rpc(format!("download failed: {err}")))?;
        Ok(true)
    }

    async fn get_sticker_set_titles(&self) -> Result<Vec<String>> {
        match self
            .invoke(&tl::functions::messages::GetAllStickers { hash: 0 })
            .await?
        {
            tl::enums::messages::AllStickers::Stickers(all) => Ok(all
                .sets
                .into_iter()
                .map(|set| {
                    let tl::enums::StickerSet::Set(set) = set;
                    set.title
                })
                .collect()),
            tl::enums::messages::AllStickers::NotModified => Ok(Vec::new()),
        }
    }

    async fn search_gifs(&self, query: &str, limit: usize) -> Result<Vec<i64>> {
        // GIF search goes through the service's inline gif bot.
        let bot = self
            .client
            .resolve_username("gif")
            .await
            .map_err(map_invocation)?
            .ok_or_else(|| Error::NotFound("gif search bot unavailable".to_string()))?;
        let mut results = self.client.inline_query(&bot, query);
        let mut ids = Vec::new();
        while let Some(result) = results.next().await.map_err(map_invocation)? {
            if let tl::enums::BotInlineResult::BotInlineMediaResult(media) = &result.raw {
                if let Some(tl::enums::Document::Document(document)) = &media.document {
                    ids.push(document.id);
                }
            }
            if ids.len() >= limit {
                break;
            }
        }
        Ok(ids)
    }

    async fn get_contacts(&self) -> Result<Vec<UserInfo>> {
        let tl::enums::contacts::Contacts::Contacts(contacts) = self
            .invoke(&tl::functions::contacts::GetContacts { hash: 0 })
            .await?
        else {
            return Ok(Vec::new());
        };
        Ok(contacts
            .users
            .iter()
            .filter_map(|user| match user {
                tl::enums::User::User(user) => Some(tl_user_info(user)),
                _ => None,
            })
            .collect())
    }

    async fn get_contact_ids(&self) -> Result<Vec<i64>> {
        let ids = self
            .invoke(&tl::functions::contacts::GetContactIds { hash: 0 })
            .await?;
        Ok(ids.into_iter().map(i64::from).collect())
    }

    async fn search_users(&self, query: &str, limit: usize) -> Result<Vec<UserInfo>> {
        let tl::enums::contacts::Found::Found(found) = self
            .invoke(&tl::functions::contacts::Search {
                q: query.to_string(),
                limit: limit as i32,
            })
            .await?;
        Ok(found
            .users
            .iter()
            .filter_map(|user| match user {
                tl::enums::User::User(user) => Some(tl_user_info(user)),
                _ => None,
            })
            .collect())
    }

    async fn import_contacts(&self, contacts: &[ContactImport]) -> Result<usize> {
        let contacts = contacts
            .iter()
            .enumerate()
            .map(|(idx, contact)| {
                tl::types::InputPhoneContact {
                    client_id: idx as i64,
                    phone: contact.phone.clone(),
                    first_name: contact.first_name.clone(),
                    last_name: contact.last_name.clone(),
                }
                .into()
            })
            .collect();
        let tl::enums::contacts::ImportedContacts::Contacts(imported) = self
            .invoke(&tl::functions::contacts::ImportContacts { contacts })
            .await?;
        Ok(imported.imported.len())
    }

    async fn delete_contact(&self, user: &UserInfo) -> Result<()> {
        let id = self.packed_user(user).await?;
        self.invoke(&tl::functions::contacts::DeleteContacts { id: vec![id] })
            .await?;
        Ok(())
    }

    async fn block_user(&self, user: &UserInfo) -> Result<()> {
        let chat = self.chat_for_user(user).await?;
        self.invoke(&tl::functions::contacts::Block {
            my_stories_from: false,
            id: input_peer(&chat.pack()),
        })
        .await?;
        Ok(())
    }

    async fn unblock_user(&self, user: &UserInfo) -> Result<()> {
        let chat = self.chat_for_user(user).await?;
        self.invoke(&tl::functions::contacts::Unblock {
            my_stories_from: false,
            id: input_peer(&chat.pack()),
        })
        .await?;
        Ok(())
    }

    async fn get_blocked_users(&self) -> Result<Vec<UserInfo>> {
        let users = match self
            .invoke(&tl::functions::contacts::GetBlocked {
                my_stories_from: false,
                offset: 0,
                limit: 100,
            })
            .await?
        {
            tl::enums::contacts::Blocked::Blocked(blocked) => blocked.users,
            tl::enums::contacts::Blocked::Slice(blocked) => blocked.users,
        };
        Ok(users
            .iter()
            .filter_map(|user| match user {
                tl::enums::User::User(user) => Some(tl_user_info(user)),
                _ => None,
            })
            .collect())
    }

    async fn get_common_chats(&self, user: &UserInfo) -> Result<Vec<Peer>> {
        let user_id = self.packed_user(user).await?;
        let chats = match self
            .invoke(&tl::functions::messages::GetCommonChats {
                user_id,
                max_id: 0,
                limit: 100,
            })
            .await?
        {
            tl::enums::messages::Chats::Chats(chats) => chats.chats,
            tl::enums::messages::Chats::Slice(chats) => chats.chats,
        };
        Ok(chats.iter().filter_map(tl_chat_peer).collect())
    }

    async fn create_group(&self, title: &str, users: &[UserInfo]) -> Result<Option<i64>> {
        let mut inputs = Vec::with_capacity(users.len());
        for user in users {
            inputs.push(self.packed_user(user).await?);
        }
        let tl::enums::messages::InvitedUsers::Users(invited) = self
            .invoke(&tl::functions::messages::CreateChat {
                users: inputs,
                title: title.to_string(),
                ttl_period: None,
            })
            .await?;
        Ok(updates_chat_id(&invited.updates))
    }

    async fn create_channel(&self, title: &str, about: &str, megagroup: bool) -> Result<i64> {
        let updates = self
            .invoke(&tl::functions::channels::CreateChannel {
                broadcast: !megagroup,
                megagroup,
                for_import: false,
                forum: false,
                title: title.to_string(),
                about: about.to_string(),
                geo_point: None,
                address: None,
                ttl_period: None,
            })
            .await?;
        updates_chat_id(&updates)
            .ok_or_else(|| Error::Rpc("channel created but no ID returned".to_string()))
    }

    async fn invite_to_channel(&self, channel: &ChannelInfo, users: &[UserInfo]) -> Result<usize> {
        let channel = self.packed_channel(channel).await?;
        let mut inputs = Vec::with_capacity(users.len());
        for user in users {
            inputs.push(self.packed_user(user).await?);
        }
        let invited = inputs.len();
        self.invoke(&tl::functions::channels::InviteToChannel {
            channel,
            users: inputs,
        })
        .await?;
        Ok(invited)
    }

    async fn leave_channel(&self, channel: &ChannelInfo) -> Result<()> {
        let channel = self.packed_channel(channel).await?;
        self.invoke(&tl::functions::channels::LeaveChannel { channel })
            .await?;
        Ok(())
    }

    async fn delete_chat_user(&self, group: &GroupInfo, user_id: i64) -> Result<()> {
        let me = self.client.get_me().await.map_err(map_invocation)?;
        let user = if user_id == me.id() {
            tl::types::InputUserSelf {}.into()
        } else {
            let chat = self.chat_by_id(user_id).await?;
            input_user(&chat.pack())?
        };
        self.invoke(&tl::functions::messages::DeleteChatUser {
            revoke_history: false,
            chat_id: group.id,
            user_id: user,
        })
        .await?;
        Ok(())
    }

    async fn get_participants(
        &self,
        peer: &Peer,
        filter: ParticipantFilter,
    ) -> Result<Vec<UserInfo>> {
        match filter {
            ParticipantFilter::All => {
                let chat = self.chat_for(peer).await?;
                let mut out = Vec::new();
                let mut iter = self.client.iter_participants(&chat);
                while let Some(participant) = iter.next().await.map_err(map_invocation)? {
                    out.push(convert::user_info(&participant.user));
                }
                Ok(out)
            }
            ParticipantFilter::Admins | ParticipantFilter::Banned => {
                let chat = self.chat_for(peer).await?;
                let channel = input_channel(&chat.pack())?;
                let filter = match filter {
                    ParticipantFilter::Admins => {
                        tl::enums::ChannelParticipantsFilter::from(
                            tl::types::ChannelParticipantsAdmins {},
                        )
                    }
                    _ => tl::types::ChannelParticipantsKicked {
                        q: String::new(),
                    }
                    .into(),
                };
                match self
                    .invoke(&tl::functions::channels::GetParticipants {
                        channel,
                        filter,
                        offset: 0,
                        limit: 200,
                        hash: 0,
                    })
                    .await?
                {
                    tl::enums::channels::ChannelParticipants::Participants(found) => Ok(found
                        .users
                        .iter()
                        .filter_map(|user| match user {
                            tl::enums::User::User(user) => Some(tl_user_info(user)),
                            _ => None,
                        })
                        .collect()),
                    tl::enums::channels::ChannelParticipants::NotModified => Ok(Vec::new()),
                }
            }
        }
    }

    async fn participant_count(&self, peer: &Peer) -> Result<usize> {
        let chat = self.chat_for(peer).await?;
        match peer {
            Peer::Channel(_) => {
                let channel = input_channel(&chat.pack())?;
                let tl::enums::messages::ChatFull::Full(full) = self
                    .invoke(&tl::functions::channels::GetFullChannel { channel })
                    .await?;
                match full.full_chat {
                    tl::enums::ChatFull::ChannelFull(info) => {
                        Ok(info.participants_count.unwrap_or(0) as usize)
                    }
                    tl::enums::ChatFull::Full(info) => match info.participants {
                        tl::enums::ChatParticipants::Participants(p) => Ok(p.participants.len()),
                        _ => Ok(0),
                    },
                }
            }
            Peer::Group(group) => {
                let tl::enums::messages::ChatFull::Full(full) = self
                    .invoke(&tl::functions::messages::GetFullChat { chat_id: group.id })
                    .await?;
                match full.full_chat {
                    tl::enums::ChatFull::Full(info) => match info.participants {
                        tl::enums::ChatParticipants::Participants(p) => Ok(p.participants.len()),
                        _ => Ok(0),
                    },
                    tl::enums::ChatFull::ChannelFull(info) => {
                        Ok(info.participants_count.unwrap_or(0) as usize)
                    }
                }
            }
            Peer::User(_) => Ok(2),
        }
    }

    async fn edit_channel_title(&self, channel: &ChannelInfo, title: &str) -> Result<()> {
        let channel = self.packed_channel(channel).await?;
        self.invoke(&tl::functions::channels::EditTitle {
            channel,
            title: title.to_string(),
        })
        .await?;
        Ok(())
    }

    async fn edit_group_title(&self, group: &GroupInfo, title: &str) -> Result<()> {
        self.invoke(&tl::functions::messages::EditChatTitle {
            chat_id: group.id,
            title: title.to_string(),
        })
        .await?;
        Ok(())
    }

    async fn edit_channel_photo(&self, channel: &ChannelInfo, photo: Option<&Path>) -> Result<()> {
        let channel = self.packed_channel(channel).await?;
        let photo = self.chat_photo(photo).await?;
        self.invoke(&tl::functions::channels::EditPhoto { channel, photo })
            .await?;
        Ok(())
    }

    async fn edit_group_photo(&self, group: &GroupInfo, photo: Option<&Path>) -> Result<()> {
        let photo = self.chat_photo(photo).await?;
        self.invoke(&tl::functions::messages::EditChatPhoto {
            chat_id: group.id,
            photo,
        })
        .await?;
        Ok(())
    }

    async fn export_invite_link(&self, peer: &Peer) -> Result<String> {
        let chat = self.chat_for(peer).await?;
        match self
            .invoke(&tl::functions::messages::ExportChatInvite {
                legacy_revoke_permanent: false,
                request_needed: false,
                peer: input_peer(&chat.pack()),
                expire_date: None,
                usage_limit: None,
                title: None,
                subscription_pricing: None,
            })
            .await?
        {
            tl::enums::ExportedChatInvite::ChatInviteExported(invite) => Ok(invite.link),
            _ => Err(Error::Rpc("no invite link in response".to_string())),
        }
    }

    async fn full_chat_invite_link(&self, peer: &Peer) -> Result<Option<String>> {
        let chat = self.chat_for(peer).await?;
        let exported = match peer {
            Peer::Channel(_) => {
                let channel = input_channel(&chat.pack())?;
                let tl::enums::messages::ChatFull::Full(full) = self
                    .invoke(&tl::functions::channels::GetFullChannel { channel })
                    .await?;
                match full.full_chat {
                    tl::enums::ChatFull::ChannelFull(info) => info.exported_invite,
                    tl::enums::ChatFull::Full(info) => info.exported_invite,
                }
            }
            Peer::Group(group) => {
                let tl::enums::messages::ChatFull::Full(full) = self
                    .invoke(&tl::functions::messages::GetFullChat { chat_id: group.id })
                    .await?;
                match full.full_chat {
                    tl::enums::ChatFull::Full(info) => info.exported_invite,
                    tl::enums::ChatFull::ChannelFull(info) => info.exported_invite,
                }
            }
            Peer::User(_) => None,
        };
        Ok(exported.and_then(|invite| match invite {
            tl::enums::ExportedChatInvite::ChatInviteExported(invite) => Some(invite.link),
            _ => None,
        }))
    }

    async fn check_invite(&self, hash: &str) -> Result<Option<String>> {
        match self
            .invoke(&tl::functions::messages::CheckChatInvite {
                hash: hash.to_string(),
            })
            .await?
        {
            tl::enums::ChatInvite::Already(already) => Ok(match &already.chat {
                tl::enums::Chat::Chat(c) => Some(c.title.clone()),
                tl::enums::Chat::Channel(c) => Some(c.title.clone()),
                _ => None,
            }),
            _ => Ok(None),
        }
    }

    async fn import_invite(&self, hash: &str) -> Result<Option<String>> {
        let updates = self
            .invoke(&tl::functions::messages::ImportChatInvite {
                hash: hash.to_string(),
            })
            .await?;
        Ok(updates_chat_title(&updates))
    }

    async fn edit_admin(
        &self,
        channel: &ChannelInfo,
        user: &UserInfo,
        rights: &AdminRights,
        rank: &str,
    ) -> Result<()> {
        let channel = self.packed_channel(channel).await?;
        let user_id = self.packed_user(user).await?;
        self.invoke(&tl::functions::channels::EditAdmin {
            channel,
            user_id,
            admin_rights: tl::types::ChatAdminRights {
                change_info: rights.change_info,
                post_messages: rights.post_messages,
                edit_messages: rights.edit_messages,
                delete_messages: rights.delete_messages,
                ban_users: rights.ban_users,
                invite_users: rights.invite_users,
                pin_messages: rights.pin_messages,
                add_admins: rights.add_admins,
                anonymous: rights.anonymous,
                manage_call: rights.manage_call,
                other: rights.other,
                manage_topics: false,
                post_stories: false,
                edit_stories: false,
                delete_stories: false,
            }
            .into(),
            rank: rank.to_string(),
        })
        .await?;
        Ok(())
    }

    async fn edit_banned(
        &self,
        channel: &ChannelInfo,
        user: &UserInfo,
        rights: &BannedRights,
    ) -> Result<()> {
        let channel = self.packed_channel(channel).await?;
        let chat = self.chat_for_user(user).await?;
        self.invoke(&tl::functions::channels::EditBanned {
            channel,
            participant: input_peer(&chat.pack()),
            banned_rights: tl::types::ChatBannedRights {
                view_messages: rights.view_messages,
                send_messages: rights.send_messages,
                send_media: rights.send_media,
                send_stickers: rights.send_stickers,
                send_gifs: rights.send_gifs,
                send_games: rights.send_games,
                send_inline: rights.send_inline,
                embed_links: rights.embed_links,
                send_polls: rights.send_polls,
                change_info: rights.change_info,
                invite_users: rights.invite_users,
                pin_messages: rights.pin_messages,
                manage_topics: false,
                send_photos: rights.send_media,
                send_videos: rights.send_media,
                send_roundvideos: rights.send_media,
                send_audios: rights.send_media,
                send_voices: rights.send_media,
                send_docs: rights.send_media,
                send_plain: rights.send_messages,
                until_date: 0,
            }
            .into(),
        })
        .await?;
        Ok(())
    }

    async fn get_admin_log(&self, peer: &Peer, limit: usize) -> Result<Vec<serde_json::Value>> {
        let chat = self.chat_for(peer).await?;
        let channel = input_channel(&chat.pack())?;
        let tl::enums::channels::AdminLogResults::Results(results) = self
            .invoke(&tl::functions::channels::GetAdminLog {
                channel,
                q: String::new(),
                events_filter: None,
                admins: None,
                max_id: 0,
                min_id: 0,
                limit: limit as i32,
            })
            .await?;
        Ok(results
            .events
            .into_iter()
            .map(|event| {
                let tl::enums::ChannelAdminLogEvent::Event(event) = event;
                serde_json::json!({
                    "id": event.id,
                    "date": event.date,
                    "user_id": event.user_id,
                    "action": format!("{:?}", event.action),
                })
            })
            .collect())
    }

    async fn set_bot_commands(&self, commands: &[BotCommandDef]) -> Result<()> {
        self.invoke(&tl::functions::bots::SetBotCommands {
            scope: tl::types::BotCommandScopeDefault {}.into(),
            lang_code: String::new(),
            commands: commands
                .iter()
                .map(|command| {
                    tl::types::BotCommand {
                        command: command.command.clone(),
                        description: command.description.clone(),
                    }
                    .into()
                })
                .collect(),
        })
        .await?;
        Ok(())
    }

    async fn update_profile(
        &self,
        first_name: Option<&str>,
        last_name: Option<&str>,
        about: Option<&str>,
    ) -> Result<()> {
        self.invoke(&tl::functions::account::UpdateProfile {
            first_name: first_name.map(str::to_string),
            last_name: last_name.map(str::to_string),
            about: about.map(str::to_string),
        })
        .await?;
        Ok(())
    }

    async fn set_profile_photo(&self, path: &Path) -> Result<()> {
        let uploaded = self.uploaded_file(path).await?;
        self.invoke(&tl::functions::photos::UploadProfilePhoto {
            fallback: false,
            bot: None,
            file: Some(uploaded.raw),
            video: None,
            video_start_ts: None,
            video_emoji_markup: None,
        })
        .await?;
        Ok(())
    }

    async fn delete_profile_photo(&self) -> Result<bool> {
        let photos = match self
            .invoke(&tl::functions::photos::GetUserPhotos {
                user_id: tl::types::InputUserSelf {}.into(),
                offset: 0,
                max_id: 0,
                limit: 1,
            })
            .await?
        {
            tl::enums::photos::Photos::Photos(photos) => photos.photos,
            tl::enums::photos::Photos::Slice(photos) => photos.photos,
        };
        let Some(tl::enums::Photo::Photo(photo)) = photos.into_iter().next() else {
            return Ok(false);
        };
        self.invoke(&tl::functions::photos::DeletePhotos {
            id: vec![tl::types::InputPhoto {
                id: photo.id,
                access_hash: photo.access_hash,
                file_reference: photo.file_reference,
            }
            .into()],
        })
        .await?;
        Ok(true)
    }

    async fn get_user_photos(&self, user: &UserInfo, limit: usize) -> Result<Vec<i64>> {
        let user_id = self.packed_user(user).await?;
        let photos = match self
            .invoke(&tl::functions::photos::GetUserPhotos {
                user_id,
                offset: 0,
                max_id: 0,
                limit: limit as i32,
            })
            .await?
        {
            tl::enums::photos::Photos::Photos(photos) => photos.photos,
            tl::enums::photos::Photos::Slice(photos) => photos.photos,
        };
        Ok(photos
            .into_iter()
            .filter_map(|photo| match photo {
                tl::enums::Photo::Photo(photo) => Some(photo.id),
                tl::enums::Photo::Empty(_) => None,
            })
            .collect())
    }

    async fn get_user_status(&self, user: &UserInfo) -> Result<String> {
        let user_id = self.packed_user(user).await?;
        let users = self
            .invoke(&tl::functions::users::GetUsers { id: vec![user_id] })
            .await?;
        match users.first() {
            Some(tl::enums::User::User(user)) => Ok(convert::user_status(user.status.as_ref())),
            _ => Ok("unknown".to_string()),
        }
    }

    async fn get_full_user(&self, user: &UserInfo) -> Result<serde_json::Value> {
        let id = self.packed_user(user).await?;
        let full = self
            .invoke(&tl::functions::users::GetFullUser { id })
            .await?;
        Ok(serde_json::json!({
            "id": user.id,
            "name": user.display_name(),
            "username": user.username,
            "bot": user.is_bot,
            "full": format!("{full:?}"),
        }))
    }

    async fn get_privacy(&self, key: PrivacyKey) -> Result<serde_json::Value> {
        let tl::enums::account::PrivacyRules::Rules(rules) = self
            .invoke(&tl::functions::account::GetPrivacy {
                key: privacy_key_tl(key),
            })
            .await?;
        let entries: Vec<String> = rules
            .rules
            .iter()
            .map(|rule| format!("{rule:?}"))
            .collect();
        Ok(serde_json::json!({ "rules": entries }))
    }

    async fn set_privacy(
        &self,
        key: PrivacyKey,
        allow: &[UserInfo],
        disallow: &[UserInfo],
    ) -> Result<()> {
        let mut rules: Vec<tl::enums::InputPrivacyRule> = Vec::new();
        if !allow.is_empty() {
            let mut users = Vec::with_capacity(allow.len());
            for user in allow {
                users.push(self.packed_user(user).await?);
            }
            rules.push(tl::types::InputPrivacyValueAllowUsers { users }.into());
        }
        if !disallow.is_empty() {
            let mut users = Vec::with_capacity(disallow.len());
            for user in disallow {
                users.push(self.packed_user(user).await?);
            }
            rules.push(tl::types::InputPrivacyValueDisallowUsers { users }.into());
        }
        if rules.is_empty() {
            rules.push(tl::types::InputPrivacyValueAllowAll {}.into());
        }
        self.invoke(&tl::functions::account::SetPrivacy {
            key: privacy_key_tl(key),
            rules,
        })
        .await?;
        Ok(())
    }
}

impl GrammersPort {
    async fn chat_photo(&self, photo: Option<&Path>) -> Result<tl::enums::InputChatPhoto> {
        match photo {
            Some(path) => {
                let uploaded = self.uploaded_file(path).await?;
                Ok(tl::types::InputChatUploadedPhoto {
                    file: Some(uploaded.raw),
                    video: None,
                    video_start_ts: None,
                    video_emoji_markup: None,
                }
                .into())
            }
            None => Ok(tl::types::InputChatPhotoEmpty {}.into()),
        }
    }
}

fn rand_id() -> i64 {
    // Unique-enough message id for SendMedia; the service dedups on it.
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos() as i64)
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packed(ty: PackedType, id: i64) -> PackedChat {
        PackedChat {
            ty,
            id,
            access_hash: Some(42),
        }
    }

    #[test]
    fn input_peer_matches_packed_type() {
        assert!(matches!(
            input_peer(&packed(PackedType::User, 1)),
            tl::enums::InputPeer::User(_)
        ));
        assert!(matches!(
            input_peer(&packed(PackedType::Chat, 2)),
            tl::enums::InputPeer::Chat(_)
        ));
        assert!(matches!(
            input_peer(&packed(PackedType::Megagroup, 3)),
            tl::enums::InputPeer::Channel(_)
        ));
    }

    #[test]
    fn input_user_rejects_non_users() {
        assert!(input_user(&packed(PackedType::Bot, 1)).is_ok());
        assert!(input_user(&packed(PackedType::Broadcast, 2)).is_err());
    }

    #[test]
    fn input_channel_rejects_basic_groups() {
        assert!(input_channel(&packed(PackedType::Gigagroup, 1)).is_ok());
        assert!(input_channel(&packed(PackedType::Chat, 2)).is_err());
    }

    #[test]
    fn missing_access_hash_defaults_to_zero() {
        let no_hash = PackedChat {
            ty: PackedType::User,
            id: 7,
            access_hash: None,
        };
        let tl::enums::InputPeer::User(peer) = input_peer(&no_hash) else {
            panic!("expected a user peer");
        };
        assert_eq!(peer.access_hash, 0);
    }
}
