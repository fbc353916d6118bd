//! Group and channel lifecycle tools: creation, membership, titles, invites.

use std::path::Path;

use tracing::warn;

use crate::entity::{Peer, PeerQuery, UserInfo};
use crate::port::{ParticipantFilter, TelegramPort};
use crate::{Error, Result};

use super::{is_readable_file, resolve_chat};

async fn collect_users(
    tg: &dyn TelegramPort,
    user_ids: &[i64],
) -> std::result::Result<Vec<UserInfo>, String> {
    let mut users = Vec::with_capacity(user_ids.len());
    for &user_id in user_ids {
        match tg.resolve(&PeerQuery::Id(user_id)).await {
            Ok(Peer::User(user)) => users.push(user),
            Ok(_) | Err(_) => {
                return Err(format!("Error: User with ID {user_id} could not be found."))
            }
        }
    }
    Ok(users)
}

pub async fn create_group(
    tg: &dyn TelegramPort,
    title: &str,
    user_ids: &[i64],
) -> Result<String> {
    if user_ids.is_empty() {
        return Ok("Error: No valid users provided".to_string());
    }
    let users = match collect_users(tg, user_ids).await {
        Ok(users) => users,
        Err(message) => return Ok(message),
    };
    match tg.create_group(title, &users).await {
        Ok(Some(chat_id)) => Ok(format!("Group created with ID: {chat_id}")),
        Ok(None) => Ok(format!(
            "Group created successfully. Please check your recent chats for '{title}'."
        )),
        Err(Error::Flood) => {
            Ok("Error: Cannot create group due to Telegram limits. Try again later.".to_string())
        }
        Err(err) => Err(err),
    }
}

pub async fn create_channel(
    tg: &dyn TelegramPort,
    title: &str,
    about: &str,
    megagroup: bool,
) -> Result<String> {
    let channel_id = tg.create_channel(title, about, megagroup).await?;
    Ok(format!("Channel '{title}' created with ID: {channel_id}"))
}

pub async fn invite_to_group(
    tg: &dyn TelegramPort,
    group_id: i64,
    user_ids: &[i64],
) -> Result<String> {
    let channel = match resolve_chat(tg, group_id).await? {
        Peer::Channel(channel) => channel,
        other => {
            return Err(Error::InvalidArgument(format!(
                "chat {} is not a channel or supergroup",
                other.id()
            )))
        }
    };
    let users = match collect_users(tg, user_ids).await {
        Ok(users) => users,
        Err(message) => return Ok(message),
    };
    match tg.invite_to_channel(&channel, &users).await {
        Ok(invited) => Ok(format!(
            "Successfully invited {invited} users to {}",
            channel.title
        )),
        Err(Error::NotMutualContact) => Ok("Error: Cannot invite users who are not mutual \
             contacts. Please ensure the users are in your contacts and have added you back."
            .to_string()),
        Err(Error::PrivacyRestricted) => Ok("Error: One or more users have privacy settings \
             that prevent you from adding them."
            .to_string()),
        Err(err) => Err(err),
    }
}

/// Leaving depends on the entity kind: channels and supergroups have a leave
/// call, basic groups need a self-removal, and a direct chat has nothing to
/// leave at all (no remote call is made).
pub async fn leave_chat(tg: &dyn TelegramPort, chat_id: i64) -> Result<String> {
    match resolve_chat(tg, chat_id).await? {
        Peer::Channel(channel) => {
            tg.leave_channel(&channel).await?;
            Ok(format!(
                "Left channel/supergroup {} (ID: {chat_id}).",
                channel.title
            ))
        }
        Peer::Group(group) => {
            let me = tg.get_me().await?;
            tg.delete_chat_user(&group, me.id).await?;
            Ok(format!("Left basic group {} (ID: {chat_id}).", group.title))
        }
        Peer::User(_) => Ok(format!(
            "Cannot leave chat {chat_id}: this is a direct chat with a user, not a group or channel."
        )),
    }
}

pub async fn get_participants(tg: &dyn TelegramPort, chat_id: i64) -> Result<String> {
    let peer = resolve_chat(tg, chat_id).await?;
    let participants = tg.get_participants(&peer, ParticipantFilter::All).await?;
    if participants.is_empty() {
        return Ok("No participants found.".to_string());
    }
    let lines: Vec<String> = participants
        .iter()
        .map(|u| format!("ID: {}, Name: {}", u.id, u.display_name()))
        .collect();
    Ok(lines.join("\n"))
}

pub async fn edit_chat_title(tg: &dyn TelegramPort, chat_id: i64, title: &str) -> Result<String> {
    match resolve_chat(tg, chat_id).await? {
        Peer::Channel(channel) => tg.edit_channel_title(&channel, title).await?,
        Peer::Group(group) => tg.edit_group_title(&group, title).await?,
        Peer::User(_) => return Ok("Cannot edit title for this entity type (user).".to_string()),
    }
    Ok(format!("Chat {chat_id} title updated to '{title}'."))
}

pub async fn edit_chat_photo(
    tg: &dyn TelegramPort,
    chat_id: i64,
    file_path: &str,
) -> Result<String> {
    let path = Path::new(file_path);
    if !path.is_file() {
        return Ok(format!("Photo file not found: {file_path}"));
    }
    if !is_readable_file(path) {
        return Ok(format!("Photo file not readable: {file_path}"));
    }
    match resolve_chat(tg, chat_id).await? {
        Peer::Channel(channel) => tg.edit_channel_photo(&channel, Some(path)).await?,
        Peer::Group(group) => tg.edit_group_photo(&group, Some(path)).await?,
        Peer::User(_) => return Ok("Cannot edit photo for this entity type (user).".to_string()),
    }
    Ok(format!("Chat {chat_id} photo updated."))
}

pub async fn delete_chat_photo(tg: &dyn TelegramPort, chat_id: i64) -> Result<String> {
    match resolve_chat(tg, chat_id).await? {
        Peer::Channel(channel) => tg.edit_channel_photo(&channel, None).await?,
        Peer::Group(group) => tg.edit_group_photo(&group, None).await?,
        Peer::User(_) => return Ok("Cannot delete photo for this entity type (user).".to_string()),
    }
    Ok(format!("Chat {chat_id} photo deleted."))
}

/// Ordered fallback: ask for a fresh exported link, then fall back to the one
/// already recorded on the full chat info.
pub async fn get_invite_link(tg: &dyn TelegramPort, chat_id: i64) -> Result<String> {
    let peer = resolve_chat(tg, chat_id).await?;
    match tg.export_invite_link(&peer).await {
        Ok(link) => return Ok(link),
        Err(err) => warn!(chat_id, error = %err, "invite export failed, trying full chat info"),
    }
    match tg.full_chat_invite_link(&peer).await {
        Ok(Some(link)) => Ok(link),
        Ok(None) => Ok("No invite link available.".to_string()),
        Err(_) => Ok("Could not retrieve invite link for this chat.".to_string()),
    }
}

pub async fn export_chat_invite(tg: &dyn TelegramPort, chat_id: i64) -> Result<String> {
    let peer = resolve_chat(tg, chat_id).await?;
    match tg.export_invite_link(&peer).await {
        Ok(link) => Ok(link),
        Err(first) => match tg.full_chat_invite_link(&peer).await {
            Ok(Some(link)) => Ok(link),
            _ => Err(first),
        },
    }
}

fn invite_hash_from_link(link: &str) -> &str {
    let tail = link.rsplit('/').next().unwrap_or(link);
    tail.strip_prefix('+').unwrap_or(tail)
}

async fn join_by_hash(tg: &dyn TelegramPort, hash: &str) -> Result<String> {
    // Membership probe first: joining twice is a service error.
    match tg.check_invite(hash).await {
        Ok(Some(title)) => {
            return Ok(format!("You are already a member of this chat: {title}"));
        }
        Ok(None) => {}
        Err(err) => warn!(error = %err, "invite check failed, attempting join anyway"),
    }
    match tg.import_invite(hash).await {
        Ok(Some(title)) => Ok(format!("Successfully joined chat: {title}")),
        Ok(None) => Ok("Joined chat via invite hash.".to_string()),
        Err(Error::InviteExpired) => {
            Ok("The invite hash has expired and is no longer valid.".to_string())
        }
        Err(Error::InviteInvalid) => Ok("The invite hash is invalid or malformed.".to_string()),
        Err(Error::AlreadyParticipant) => {
            Ok("You are already a member of this chat.".to_string())
        }
        Err(Error::AdminApprovalRequired) => {
            Ok("Cannot join this chat - requires admin approval.".to_string())
        }
        Err(Error::ChatFull) => {
            Ok("Cannot join this chat - it has reached maximum number of participants.".to_string())
        }
        Err(err) => Err(err),
    }
}

pub async fn import_chat_invite(tg: &dyn TelegramPort, hash: &str) -> Result<String> {
    join_by_hash(tg, invite_hash_from_link(hash)).await
}

pub async fn join_chat_by_link(tg: &dyn TelegramPort, link: &str) -> Result<String> {
    join_by_hash(tg, invite_hash_from_link(link)).await
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::entity::{ChannelInfo, GroupInfo};
    use crate::tools::mock::MockPort;

    fn channel(id: i64, title: &str) -> Peer {
        Peer::Channel(ChannelInfo {
            id,
            title: title.to_string(),
            username: None,
            broadcast: false,
            megagroup: true,
        })
    }

    #[tokio::test]
    async fn leave_chat_routes_by_entity_kind() {
        let port = MockPort {
            peers: vec![
                channel(10, "Announcements"),
                Peer::Group(GroupInfo {
                    id: 20,
                    title: "Old Crew".to_string(),
                }),
                Peer::User(UserInfo {
                    id: 30,
                    first_name: "Eve".to_string(),
                    ..Default::default()
                }),
            ],
            me: Some(UserInfo {
                id: 99,
                first_name: "Me".to_string(),
                ..Default::default()
            }),
            ..Default::default()
        };

        let left_channel = leave_chat(&port, 10).await.unwrap();
        assert_eq!(left_channel, "Left channel/supergroup Announcements (ID: 10).");

        let left_group = leave_chat(&port, 20).await.unwrap();
        assert_eq!(left_group, "Left basic group Old Crew (ID: 20).");

        let direct = leave_chat(&port, 30).await.unwrap();
        assert_eq!(
            direct,
            "Cannot leave chat 30: this is a direct chat with a user, not a group or channel."
        );

        // The direct-chat case must not touch the service.
        let calls = port.calls();
        assert_eq!(
            calls,
            vec!["leave_channel(10)".to_string(), "delete_chat_user(20, 99)".to_string()]
        );
    }

    #[tokio::test]
    async fn invite_link_falls_back_to_full_chat_info() {
        let port = MockPort::with_peers(vec![channel(10, "Announcements")]);
        let link = get_invite_link(&port, 10).await.unwrap();
        assert_eq!(link, "https://t.me/+abcdef");
        let calls = port.calls();
        assert_eq!(calls[0], "export_invite_link");
        assert_eq!(calls[1], "full_chat_invite_link");
    }

    #[tokio::test]
    async fn invite_hash_extraction_handles_links_and_plus_prefix() {
        assert_eq!(invite_hash_from_link("https://t.me/+AbCdEf123"), "AbCdEf123");
        assert_eq!(invite_hash_from_link("https://t.me/joinchat/XyZ"), "XyZ");
        assert_eq!(invite_hash_from_link("AbCdEf123"), "AbCdEf123");
        assert_eq!(invite_hash_from_link("+AbCdEf123"), "AbCdEf123");
    }

    struct InvitePort {
        error: fn() -> Error,
    }

    #[async_trait]
    impl TelegramPort for InvitePort {
        async fn check_invite(&self, _hash: &str) -> Result<Option<String>> {
            Ok(None)
        }

        async fn import_invite(&self, _hash: &str) -> Result<Option<String>> {
            Err((self.error)())
        }
    }

    #[tokio::test]
    async fn join_maps_invite_failures_to_friendly_strings() {
        let cases: Vec<(fn() -> Error, &str)> = vec![
            (
                || Error::InviteExpired,
                "The invite hash has expired and is no longer valid.",
            ),
            (
                || Error::InviteInvalid,
                "The invite hash is invalid or malformed.",
            ),
            (
                || Error::AlreadyParticipant,
                "You are already a member of this chat.",
            ),
            (
                || Error::AdminApprovalRequired,
                "Cannot join this chat - requires admin approval.",
            ),
            (
                || Error::ChatFull,
                "Cannot join this chat - it has reached maximum number of participants.",
            ),
        ];
        for (error, expected) in cases {
            let port = InvitePort { error };
            let out = import_chat_invite(&port, "+hash").await.unwrap();
            assert_eq!(out, expected);
        }
    }

    #[tokio::test]
    async fn edit_chat_title_rejects_users_without_remote_call() {
        let port = MockPort::with_peers(vec![Peer::User(UserInfo {
            id: 5,
            first_name: "Dana".to_string(),
            ..Default::default()
        })]);
        let out = edit_chat_title(&port, 5, "new").await.unwrap();
        assert_eq!(out, "Cannot edit title for this entity type (user).");
        assert!(port.calls().is_empty());
    }

    #[tokio::test]
    async fn create_group_requires_users() {
        let port = MockPort::default();
        let out = create_group(&port, "Team", &[]).await.unwrap();
        assert_eq!(out, "Error: No valid users provided");
    }

    #[tokio::test]
    async fn create_group_reports_unresolvable_user() {
        let port = MockPort::default();
        let out = create_group(&port, "Team", &[42]).await.unwrap();
        assert_eq!(out, "Error: User with ID 42 could not be found.");
    }

    #[tokio::test]
    async fn edit_chat_photo_checks_file_before_resolving() {
        let port = MockPort::default();
        let out = edit_chat_photo(&port, 10, "/no/such/file.jpg").await.unwrap();
        assert_eq!(out, "Photo file not found: /no/such/file.jpg");
        assert!(port.calls().is_empty());
    }
}
