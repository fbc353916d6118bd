//! Moderation tools: admin promotion, bans, audit log, bot commands.

use serde_json::Value;

use crate::entity::{ChannelInfo, Peer};
use crate::port::{AdminRights, BannedRights, BotCommandDef, ParticipantFilter, TelegramPort};
use crate::{Error, Result};

use super::{resolve_chat, resolve_user};

async fn resolve_channel(tg: &dyn TelegramPort, chat_id: i64) -> Result<ChannelInfo> {
    match resolve_chat(tg, chat_id).await? {
        Peer::Channel(channel) => Ok(channel),
        other => Err(Error::InvalidArgument(format!(
            "chat {} is not a channel or supergroup",
            other.id()
        ))),
    }
}

fn rights_flag(overrides: Option<&Value>, key: &str, default: bool) -> bool {
    overrides
        .and_then(|v| v.get(key))
        .and_then(Value::as_bool)
        .unwrap_or(default)
}

/// Builds a permission set from the promote defaults with per-flag overrides.
fn admin_rights_from(overrides: Option<&Value>) -> AdminRights {
    let base = AdminRights::promote_default();
    AdminRights {
        change_info: rights_flag(overrides, "change_info", base.change_info),
        post_messages: rights_flag(overrides, "post_messages", base.post_messages),
        edit_messages: rights_flag(overrides, "edit_messages", base.edit_messages),
        delete_messages: rights_flag(overrides, "delete_messages", base.delete_messages),
        ban_users: rights_flag(overrides, "ban_users", base.ban_users),
        invite_users: rights_flag(overrides, "invite_users", base.invite_users),
        pin_messages: rights_flag(overrides, "pin_messages", base.pin_messages),
        add_admins: rights_flag(overrides, "add_admins", base.add_admins),
        anonymous: rights_flag(overrides, "anonymous", base.anonymous),
        manage_call: rights_flag(overrides, "manage_call", base.manage_call),
        other: rights_flag(overrides, "other", base.other),
    }
}

pub async fn promote_admin(
    tg: &dyn TelegramPort,
    group_id: i64,
    user_id: i64,
    rights: Option<&Value>,
) -> Result<String> {
    let channel = resolve_channel(tg, group_id).await?;
    let user = resolve_user(tg, user_id).await?;
    match tg
        .edit_admin(&channel, &user, &admin_rights_from(rights), "Admin")
        .await
    {
        Ok(()) => Ok(format!(
            "Successfully promoted user {user_id} to admin in {}",
            channel.title
        )),
        Err(Error::NotMutualContact) => Ok("Error: Cannot promote users who are not mutual \
             contacts. Please ensure the user is in your contacts and has added you back."
            .to_string()),
        Err(err) => Err(err),
    }
}

pub async fn demote_admin(tg: &dyn TelegramPort, group_id: i64, user_id: i64) -> Result<String> {
    let channel = resolve_channel(tg, group_id).await?;
    let user = resolve_user(tg, user_id).await?;
    match tg
        .edit_admin(&channel, &user, &AdminRights::none(), "")
        .await
    {
        Ok(()) => Ok(format!(
            "Successfully demoted user {user_id} from admin in {}",
            channel.title
        )),
        Err(Error::NotMutualContact) => Ok("Error: Cannot modify admin status of users who are \
             not mutual contacts. Please ensure the user is in your contacts and has added you \
             back."
            .to_string()),
        Err(err) => Err(err),
    }
}

pub async fn ban_user(tg: &dyn TelegramPort, chat_id: i64, user_id: i64) -> Result<String> {
    let channel = resolve_channel(tg, chat_id).await?;
    let user = resolve_user(tg, user_id).await?;
    match tg.edit_banned(&channel, &user, &BannedRights::all()).await {
        Ok(()) => Ok(format!(
            "User {user_id} banned from chat {} (ID: {chat_id}).",
            channel.title
        )),
        Err(Error::NotMutualContact) => Ok("Error: Cannot ban users who are not mutual \
             contacts. Please ensure the user is in your contacts and has added you back."
            .to_string()),
        Err(err) => Err(err),
    }
}

pub async fn unban_user(tg: &dyn TelegramPort, chat_id: i64, user_id: i64) -> Result<String> {
    let channel = resolve_channel(tg, chat_id).await?;
    let user = resolve_user(tg, user_id).await?;
    match tg.edit_banned(&channel, &user, &BannedRights::none()).await {
        Ok(()) => Ok(format!(
            "User {user_id} unbanned from chat {} (ID: {chat_id}).",
            channel.title
        )),
        Err(Error::NotMutualContact) => Ok("Error: Cannot modify status of users who are not \
             mutual contacts. Please ensure the user is in your contacts and has added you back."
            .to_string()),
        Err(err) => Err(err),
    }
}

pub async fn get_admins(tg: &dyn TelegramPort, chat_id: i64) -> Result<String> {
    let peer = resolve_chat(tg, chat_id).await?;
    let admins = tg.get_participants(&peer, ParticipantFilter::Admins).await?;
    if admins.is_empty() {
        return Ok("No admins found.".to_string());
    }
    let lines: Vec<String> = admins
        .iter()
        .map(|u| format!("ID: {}, Name: {}", u.id, u.display_name()))
        .collect();
    Ok(lines.join("\n"))
}

pub async fn get_banned_users(tg: &dyn TelegramPort, chat_id: i64) -> Result<String> {
    let peer = resolve_chat(tg, chat_id).await?;
    let banned = tg.get_participants(&peer, ParticipantFilter::Banned).await?;
    if banned.is_empty() {
        return Ok("No banned users found.".to_string());
    }
    let lines: Vec<String> = banned
        .iter()
        .map(|u| format!("ID: {}, Name: {}", u.id, u.display_name()))
        .collect();
    Ok(lines.join("\n"))
}

pub async fn get_recent_actions(tg: &dyn TelegramPort, chat_id: i64) -> Result<String> {
    let peer = resolve_chat(tg, chat_id).await?;
    let events = tg.get_admin_log(&peer, 20).await?;
    if events.is_empty() {
        return Ok("No recent admin actions found.".to_string());
    }
    Ok(serde_json::to_string_pretty(&events)?)
}

pub async fn set_bot_commands(
    tg: &dyn TelegramPort,
    bot_username: &str,
    commands: Vec<BotCommandDef>,
) -> Result<String> {
    let me = tg.get_me().await?;
    if !me.is_bot {
        return Ok("Error: This function can only be used by bot accounts. Your current \
             Telegram account is a regular user account, not a bot."
            .to_string());
    }
    tg.set_bot_commands(&commands).await?;
    Ok(format!("Bot commands set for {bot_username}."))
}
