//! Tool registry: the metadata served by `tools/list` and the dispatch
//! boundary behind `tools/call`.
//!
//! Dispatch is where errors stop being typed: a tool's `Err` is fed through
//! the normalizer and comes back as a stable user-facing string, so callers
//! always receive a successful text result.

use serde_json::{json, Value};

use crate::normalize::log_and_format_error;
use crate::port::{BotCommandDef, ContactImport, TelegramPort};
use crate::tools::{admin, chats, contacts, groups, media, messages, profile};
use crate::{Error, Result};

// ----- argument extraction -----

fn arg_i64(args: &Value, key: &str) -> Result<i64> {
    args.get(key)
        .and_then(Value::as_i64)
        .ok_or_else(|| Error::InvalidArgument(format!("missing integer argument '{key}'")))
}

fn arg_i32(args: &Value, key: &str) -> Result<i32> {
    let value = arg_i64(args, key)?;
    i32::try_from(value)
        .map_err(|_| Error::InvalidArgument(format!("argument '{key}' out of range: {value}")))
}

fn arg_str<'a>(args: &'a Value, key: &str) -> Result<&'a str> {
    args.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| Error::InvalidArgument(format!("missing string argument '{key}'")))
}

fn opt_str<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key).and_then(Value::as_str)
}

fn str_or<'a>(args: &'a Value, key: &str, default: &'a str) -> &'a str {
    opt_str(args, key).unwrap_or(default)
}

fn u64_or(args: &Value, key: &str, default: u64) -> u64 {
    args.get(key).and_then(Value::as_u64).unwrap_or(default)
}

fn usize_or(args: &Value, key: &str, default: usize) -> usize {
    u64_or(args, key, default as u64) as usize
}

fn bool_or(args: &Value, key: &str, default: bool) -> bool {
    args.get(key).and_then(Value::as_bool).unwrap_or(default)
}

fn i64_list(args: &Value, key: &str) -> Result<Vec<i64>> {
    let items = args
        .get(key)
        .and_then(Value::as_array)
        .ok_or_else(|| Error::InvalidArgument(format!("missing array argument '{key}'")))?;
    items
        .iter()
        .map(|v| {
            v.as_i64()
                .ok_or_else(|| Error::InvalidArgument(format!("'{key}' must contain integers")))
        })
        .collect()
}

fn i64_list_or_empty(args: &Value, key: &str) -> Result<Vec<i64>> {
    if args.get(key).is_none() {
        return Ok(Vec::new());
    }
    i64_list(args, key)
}

fn contact_list(args: &Value, key: &str) -> Result<Vec<ContactImport>> {
    let items = args
        .get(key)
        .and_then(Value::as_array)
        .ok_or_else(|| Error::InvalidArgument(format!("missing array argument '{key}'")))?;
    items
        .iter()
        .map(|item| {
            Ok(ContactImport {
                phone: arg_str(item, "phone")?.to_string(),
                first_name: arg_str(item, "first_name")?.to_string(),
                last_name: str_or(item, "last_name", "").to_string(),
            })
        })
        .collect()
}

fn command_list(args: &Value, key: &str) -> Result<Vec<BotCommandDef>> {
    let items = args
        .get(key)
        .and_then(Value::as_array)
        .ok_or_else(|| Error::InvalidArgument(format!("missing array argument '{key}'")))?;
    items
        .iter()
        .map(|item| {
            Ok(BotCommandDef {
                command: arg_str(item, "command")?.to_string(),
                description: arg_str(item, "description")?.to_string(),
            })
        })
        .collect()
}

// ----- schema helpers -----

fn integer(description: &str) -> Value {
    json!({"type": "integer", "description": description})
}

fn string(description: &str) -> Value {
    json!({"type": "string", "description": description})
}

fn boolean(description: &str) -> Value {
    json!({"type": "boolean", "description": description})
}

fn integer_array(description: &str) -> Value {
    json!({"type": "array", "items": {"type": "integer"}, "description": description})
}

fn spec(name: &str, description: &str, properties: Value, required: &[&str]) -> Value {
    json!({
        "name": name,
        "description": description,
        "inputSchema": {
            "type": "object",
            "properties": properties,
            "required": required,
        }
    })
}

/// Tool metadata for `tools/list`, in a stable order.
pub fn tool_specs() -> Vec<Value> {
    vec![
        // chats
        spec(
            "get_chats",
            "Get a paginated list of chats.",
            json!({
                "page": integer("Page number, starting at 1."),
                "page_size": integer("Chats per page (default 20)."),
            }),
            &[],
        ),
        spec(
            "list_chats",
            "List chats with metadata, optionally filtered by type (user, group, channel).",
            json!({
                "chat_type": string("Filter: user, group or channel."),
                "limit": integer("Maximum chats to return (default 20)."),
            }),
            &[],
        ),
        spec(
            "get_chat",
            "Get detailed information about a chat.",
            json!({"chat_id": integer("Chat ID.")}),
            &["chat_id"],
        ),
        spec(
            "get_history",
            "Get message history from a chat, newest first.",
            json!({
                "chat_id": integer("Chat ID."),
                "limit": integer("Maximum messages (default 100)."),
            }),
            &["chat_id"],
        ),
        spec(
            "mark_as_read",
            "Mark all messages in a chat as read.",
            json!({"chat_id": integer("Chat ID.")}),
            &["chat_id"],
        ),
        spec(
            "mute_chat",
            "Mute notifications for a chat.",
            json!({"chat_id": integer("Chat ID.")}),
            &["chat_id"],
        ),
        spec(
            "unmute_chat",
            "Unmute notifications for a chat.",
            json!({"chat_id": integer("Chat ID.")}),
            &["chat_id"],
        ),
        spec(
            "archive_chat",
            "Move a chat to the archive folder.",
            json!({"chat_id": integer("Chat ID.")}),
            &["chat_id"],
        ),
        spec(
            "unarchive_chat",
            "Move a chat back to the main folder.",
            json!({"chat_id": integer("Chat ID.")}),
            &["chat_id"],
        ),
        spec(
            "get_pinned_messages",
            "Get pinned messages in a chat.",
            json!({"chat_id": integer("Chat ID.")}),
            &["chat_id"],
        ),
        spec(
            "search_public_chats",
            "Search public chats, channels and bots by keyword.",
            json!({"query": string("Search keyword.")}),
            &["query"],
        ),
        spec(
            "resolve_username",
            "Resolve a username to a user or chat.",
            json!({"username": string("Username, with or without @.")}),
            &["username"],
        ),
        // messages
        spec(
            "get_messages",
            "Get paginated messages from a chat.",
            json!({
                "chat_id": integer("Chat ID."),
                "page": integer("Page number, starting at 1."),
                "page_size": integer("Messages per page (default 20)."),
            }),
            &["chat_id"],
        ),
        spec(
            "list_messages",
            "List messages with optional text search and date range filters.",
            json!({
                "chat_id": integer("Chat ID."),
                "limit": integer("Maximum messages (default 20)."),
                "search_query": string("Filter messages containing this text."),
                "from_date": string("Start date, YYYY-MM-DD (inclusive)."),
                "to_date": string("End date, YYYY-MM-DD (inclusive)."),
            }),
            &["chat_id"],
        ),
        spec(
            "send_message",
            "Send a message to a chat.",
            json!({
                "chat_id": integer("Chat ID."),
                "message": string("Message text."),
            }),
            &["chat_id", "message"],
        ),
        spec(
            "reply_to_message",
            "Reply to a specific message.",
            json!({
                "chat_id": integer("Chat ID."),
                "message_id": integer("Message to reply to."),
                "text": string("Reply text."),
            }),
            &["chat_id", "message_id", "text"],
        ),
        spec(
            "edit_message",
            "Edit a message you sent.",
            json!({
                "chat_id": integer("Chat ID."),
                "message_id": integer("Message to edit."),
                "new_text": string("Replacement text."),
            }),
            &["chat_id", "message_id", "new_text"],
        ),
        spec(
            "delete_message",
            "Delete a message.",
            json!({
                "chat_id": integer("Chat ID."),
                "message_id": integer("Message to delete."),
            }),
            &["chat_id", "message_id"],
        ),
        spec(
            "forward_message",
            "Forward a message to another chat.",
            json!({
                "from_chat_id": integer("Source chat ID."),
                "message_id": integer("Message to forward."),
                "to_chat_id": integer("Destination chat ID."),
            }),
            &["from_chat_id", "message_id", "to_chat_id"],
        ),
        spec(
            "pin_message",
            "Pin a message in a chat.",
            json!({
                "chat_id": integer("Chat ID."),
                "message_id": integer("Message to pin."),
            }),
            &["chat_id", "message_id"],
        ),
        spec(
            "unpin_message",
            "Unpin a message in a chat.",
            json!({
                "chat_id": integer("Chat ID."),
                "message_id": integer("Message to unpin."),
            }),
            &["chat_id", "message_id"],
        ),
        spec(
            "get_message_context",
            "Get a message with surrounding context.",
            json!({
                "chat_id": integer("Chat ID."),
                "message_id": integer("Central message ID."),
                "context_size": integer("Messages before and after (default 3)."),
            }),
            &["chat_id", "message_id"],
        ),
        spec(
            "search_messages",
            "Search messages within a chat.",
            json!({
                "chat_id": integer("Chat ID."),
                "query": string("Search text."),
                "limit": integer("Maximum results (default 20)."),
            }),
            &["chat_id", "query"],
        ),
        // contacts
        spec("list_contacts", "List all contacts.", json!({}), &[]),
        spec(
            "search_contacts",
            "Search contacts and users by name, username or phone.",
            json!({"query": string("Search text.")}),
            &["query"],
        ),
        spec("get_contact_ids", "Get all contact IDs.", json!({}), &[]),
        spec(
            "add_contact",
            "Add a contact by phone number.",
            json!({
                "phone": string("Phone number in international format."),
                "first_name": string("First name."),
                "last_name": string("Last name (optional)."),
            }),
            &["phone", "first_name"],
        ),
        spec(
            "delete_contact",
            "Delete a contact.",
            json!({"user_id": integer("User ID.")}),
            &["user_id"],
        ),
        spec(
            "block_user",
            "Block a user.",
            json!({"user_id": integer("User ID.")}),
            &["user_id"],
        ),
        spec(
            "unblock_user",
            "Unblock a user.",
            json!({"user_id": integer("User ID.")}),
            &["user_id"],
        ),
        spec(
            "import_contacts",
            "Import multiple contacts at once.",
            json!({
                "contacts": {
                    "type": "array",
                    "description": "Contacts to import.",
                    "items": {
                        "type": "object",
                        "properties": {
                            "phone": {"type": "string"},
                            "first_name": {"type": "string"},
                            "last_name": {"type": "string"},
                        },
                        "required": ["phone", "first_name"],
                    },
                },
            }),
            &["contacts"],
        ),
        spec("export_contacts", "Export all contacts as JSON.", json!({}), &[]),
        spec("get_blocked_users", "List blocked users.", json!({}), &[]),
        spec(
            "get_direct_chat_by_contact",
            "Find the direct chat with a contact by name, username or phone.",
            json!({"contact_query": string("Name, username or phone fragment.")}),
            &["contact_query"],
        ),
        spec(
            "get_contact_chats",
            "List all chats involving a contact.",
            json!({"contact_id": integer("Contact's user ID.")}),
            &["contact_id"],
        ),
        spec(
            "get_last_interaction",
            "Get the most recent messages exchanged with a contact.",
            json!({"contact_id": integer("Contact's user ID.")}),
            &["contact_id"],
        ),
        // groups
        spec(
            "create_group",
            "Create a new group with initial members.",
            json!({
                "title": string("Group title."),
                "user_ids": integer_array("User IDs to add."),
            }),
            &["title", "user_ids"],
        ),
        spec(
            "create_channel",
            "Create a channel or megagroup.",
            json!({
                "title": string("Channel title."),
                "about": string("Channel description."),
                "megagroup": boolean("Create a megagroup instead of a broadcast channel."),
            }),
            &["title"],
        ),
        spec(
            "invite_to_group",
            "Invite users to a group or channel.",
            json!({
                "group_id": integer("Group or channel ID."),
                "user_ids": integer_array("User IDs to invite."),
            }),
            &["group_id", "user_ids"],
        ),
        spec(
            "leave_chat",
            "Leave a group or channel.",
            json!({"chat_id": integer("Chat ID.")}),
            &["chat_id"],
        ),
        spec(
            "get_participants",
            "List participants of a group or channel.",
            json!({"chat_id": integer("Chat ID.")}),
            &["chat_id"],
        ),
        spec(
            "edit_chat_title",
            "Change the title of a group or channel.",
            json!({
                "chat_id": integer("Chat ID."),
                "title": string("New title."),
            }),
            &["chat_id", "title"],
        ),
        spec(
            "edit_chat_photo",
            "Set the photo of a group or channel from a local file.",
            json!({
                "chat_id": integer("Chat ID."),
                "file_path": string("Path to the image file."),
            }),
            &["chat_id", "file_path"],
        ),
        spec(
            "delete_chat_photo",
            "Remove the photo of a group or channel.",
            json!({"chat_id": integer("Chat ID.")}),
            &["chat_id"],
        ),
        spec(
            "get_invite_link",
            "Get an invite link for a group or channel.",
            json!({"chat_id": integer("Chat ID.")}),
            &["chat_id"],
        ),
        spec(
            "join_chat_by_link",
            "Join a chat via an invite link.",
            json!({"link": string("Invite link or hash.")}),
            &["link"],
        ),
        spec(
            "export_chat_invite",
            "Export a fresh invite link for a chat.",
            json!({"chat_id": integer("Chat ID.")}),
            &["chat_id"],
        ),
        spec(
            "import_chat_invite",
            "Join a chat via an invite hash.",
            json!({"hash": string("Invite hash, with or without leading +.")}),
            &["hash"],
        ),
        // admin
        spec(
            "promote_admin",
            "Promote a user to admin in a group or channel.",
            json!({
                "group_id": integer("Group or channel ID."),
                "user_id": integer("User to promote."),
                "rights": {
                    "type": "object",
                    "description": "Per-flag overrides of the default admin rights.",
                },
            }),
            &["group_id", "user_id"],
        ),
        spec(
            "demote_admin",
            "Demote an admin back to a regular member.",
            json!({
                "group_id": integer("Group or channel ID."),
                "user_id": integer("User to demote."),
            }),
            &["group_id", "user_id"],
        ),
        spec(
            "ban_user",
            "Ban a user from a group or channel.",
            json!({
                "chat_id": integer("Group or channel ID."),
                "user_id": integer("User to ban."),
            }),
            &["chat_id", "user_id"],
        ),
        spec(
            "unban_user",
            "Lift a ban on a user.",
            json!({
                "chat_id": integer("Group or channel ID."),
                "user_id": integer("User to unban."),
            }),
            &["chat_id", "user_id"],
        ),
        spec(
            "get_admins",
            "List admins of a group or channel.",
            json!({"chat_id": integer("Chat ID.")}),
            &["chat_id"],
        ),
        spec(
            "get_banned_users",
            "List banned users of a group or channel.",
            json!({"chat_id": integer("Chat ID.")}),
            &["chat_id"],
        ),
        spec(
            "get_recent_actions",
            "Get recent admin actions from the audit log.",
            json!({"chat_id": integer("Chat ID.")}),
            &["chat_id"],
        ),
        spec(
            "set_bot_commands",
            "Set the command menu of the signed-in bot account.",
            json!({
                "bot_username": string("Bot username."),
                "commands": {
                    "type": "array",
                    "description": "Commands to register.",
                    "items": {
                        "type": "object",
                        "properties": {
                            "command": {"type": "string"},
                            "description": {"type": "string"},
                        },
                        "required": ["command", "description"],
                    },
                },
            }),
            &["bot_username", "commands"],
        ),
        // media
        spec(
            "send_file",
            "Send a local file to a chat.",
            json!({
                "chat_id": integer("Chat ID."),
                "file_path": string("Path to the file."),
                "caption": string("Optional caption."),
            }),
            &["chat_id", "file_path"],
        ),
        spec(
            "download_media",
            "Download media from a message to a local file.",
            json!({
                "chat_id": integer("Chat ID."),
                "message_id": integer("Message containing the media."),
                "file_path": string("Destination path."),
            }),
            &["chat_id", "message_id", "file_path"],
        ),
        spec(
            "get_media_info",
            "Describe the media attached to a message.",
            json!({
                "chat_id": integer("Chat ID."),
                "message_id": integer("Message ID."),
            }),
            &["chat_id", "message_id"],
        ),
        spec(
            "send_voice",
            "Send a voice note (.ogg or .opus).",
            json!({
                "chat_id": integer("Chat ID."),
                "file_path": string("Path to the audio file."),
            }),
            &["chat_id", "file_path"],
        ),
        spec(
            "send_sticker",
            "Send a sticker (.webp).",
            json!({
                "chat_id": integer("Chat ID."),
                "file_path": string("Path to the sticker file."),
            }),
            &["chat_id", "file_path"],
        ),
        spec("get_sticker_sets", "List installed sticker sets.", json!({}), &[]),
        spec(
            "get_gif_search",
            "Search for GIFs.",
            json!({
                "query": string("Search text."),
                "limit": integer("Maximum results (default 10)."),
            }),
            &["query"],
        ),
        spec(
            "send_gif",
            "Send a GIF by document ID.",
            json!({
                "chat_id": integer("Chat ID."),
                "gif_id": integer("GIF document ID from get_gif_search."),
            }),
            &["chat_id", "gif_id"],
        ),
        // profile
        spec("get_me", "Get the signed-in account's profile.", json!({}), &[]),
        spec(
            "update_profile",
            "Update the signed-in account's name or bio.",
            json!({
                "first_name": string("New first name."),
                "last_name": string("New last name."),
                "about": string("New bio."),
            }),
            &[],
        ),
        spec(
            "set_profile_photo",
            "Set the profile photo from a local file.",
            json!({"file_path": string("Path to the image file.")}),
            &["file_path"],
        ),
        spec("delete_profile_photo", "Delete the current profile photo.", json!({}), &[]),
        spec(
            "get_privacy_settings",
            "Get the last-seen privacy rules.",
            json!({}),
            &[],
        ),
        spec(
            "set_privacy_settings",
            "Update privacy rules for a supported key.",
            json!({
                "key": string("Privacy key: status, phone or profile_photo."),
                "allow_users": integer_array("User IDs to always allow."),
                "disallow_users": integer_array("User IDs to always disallow."),
            }),
            &["key"],
        ),
        spec(
            "get_user_photos",
            "List a user's profile photo IDs.",
            json!({
                "user_id": integer("User ID."),
                "limit": integer("Maximum photos (default 10)."),
            }),
            &["user_id"],
        ),
        spec(
            "get_user_status",
            "Get a user's online status.",
            json!({"user_id": integer("User ID.")}),
            &["user_id"],
        ),
        spec(
            "get_bot_info",
            "Get full information about a bot.",
            json!({"bot_username": string("Bot username.")}),
            &["bot_username"],
        ),
    ]
}

async fn route(tg: &dyn TelegramPort, name: &str, args: &Value) -> Result<String> {
    match name {
        // chats
        "get_chats" => {
            chats::get_chats(tg, u64_or(args, "page", 1), u64_or(args, "page_size", 20)).await
        }
        "list_chats" => {
            chats::list_chats(tg, opt_str(args, "chat_type"), usize_or(args, "limit", 20)).await
        }
        "get_chat" => chats::get_chat(tg, arg_i64(args, "chat_id")?).await,
        "get_history" => {
            chats::get_history(tg, arg_i64(args, "chat_id")?, usize_or(args, "limit", 100)).await
        }
        "mark_as_read" => chats::mark_as_read(tg, arg_i64(args, "chat_id")?).await,
        "mute_chat" => chats::mute_chat(tg, arg_i64(args, "chat_id")?).await,
        "unmute_chat" => chats::unmute_chat(tg, arg_i64(args, "chat_id")?).await,
        "archive_chat" => chats::archive_chat(tg, arg_i64(args, "chat_id")?).await,
        "unarchive_chat" => chats::unarchive_chat(tg, arg_i64(args, "chat_id")?).await,
        "get_pinned_messages" => chats::get_pinned_messages(tg, arg_i64(args, "chat_id")?).await,
        "search_public_chats" => chats::search_public_chats(tg, arg_str(args, "query")?).await,
        "resolve_username" => chats::resolve_username(tg, arg_str(args, "username")?).await,
        // messages
        "get_messages" => {
            messages::get_messages(
                tg,
                arg_i64(args, "chat_id")?,
                u64_or(args, "page", 1),
                u64_or(args, "page_size", 20),
            )
            .await
        }
        "list_messages" => {
            messages::list_messages(
                tg,
                arg_i64(args, "chat_id")?,
                usize_or(args, "limit", 20),
                opt_str(args, "search_query"),
                opt_str(args, "from_date"),
                opt_str(args, "to_date"),
            )
            .await
        }
        "send_message" => {
            messages::send_message(tg, arg_i64(args, "chat_id")?, arg_str(args, "message")?).await
        }
        "reply_to_message" => {
            messages::reply_to_message(
                tg,
                arg_i64(args, "chat_id")?,
                arg_i32(args, "message_id")?,
                arg_str(args, "text")?,
            )
            .await
        }
        "edit_message" => {
            messages::edit_message(
                tg,
                arg_i64(args, "chat_id")?,
                arg_i32(args, "message_id")?,
                arg_str(args, "new_text")?,
            )
            .await
        }
        "delete_message" => {
            messages::delete_message(tg, arg_i64(args, "chat_id")?, arg_i32(args, "message_id")?)
                .await
        }
        "forward_message" => {
            messages::forward_message(
                tg,
                arg_i64(args, "from_chat_id")?,
                arg_i32(args, "message_id")?,
                arg_i64(args, "to_chat_id")?,
            )
            .await
        }
        "pin_message" => {
            messages::pin_message(tg, arg_i64(args, "chat_id")?, arg_i32(args, "message_id")?)
                .await
        }
        "unpin_message" => {
            messages::unpin_message(tg, arg_i64(args, "chat_id")?, arg_i32(args, "message_id")?)
                .await
        }
        "get_message_context" => {
            messages::get_message_context(
                tg,
                arg_i64(args, "chat_id")?,
                arg_i32(args, "message_id")?,
                usize_or(args, "context_size", 3),
            )
            .await
        }
        "search_messages" => {
            messages::search_messages(
                tg,
                arg_i64(args, "chat_id")?,
                arg_str(args, "query")?,
                usize_or(args, "limit", 20),
            )
            .await
        }
        // contacts
        "list_contacts" => contacts::list_contacts(tg).await,
        "search_contacts" => contacts::search_contacts(tg, arg_str(args, "query")?).await,
        "get_contact_ids" => contacts::get_contact_ids(tg).await,
        "add_contact" => {
            contacts::add_contact(
                tg,
                arg_str(args, "phone")?,
                arg_str(args, "first_name")?,
                str_or(args, "last_name", ""),
            )
            .await
        }
        "delete_contact" => contacts::delete_contact(tg, arg_i64(args, "user_id")?).await,
        "block_user" => contacts::block_user(tg, arg_i64(args, "user_id")?).await,
        "unblock_user" => contacts::unblock_user(tg, arg_i64(args, "user_id")?).await,
        "import_contacts" => {
            contacts::import_contacts(tg, contact_list(args, "contacts")?).await
        }
        "export_contacts" => contacts::export_contacts(tg).await,
        "get_blocked_users" => contacts::get_blocked_users(tg).await,
        "get_direct_chat_by_contact" => {
            contacts::get_direct_chat_by_contact(tg, arg_str(args, "contact_query")?).await
        }
        "get_contact_chats" => {
            contacts::get_contact_chats(tg, arg_i64(args, "contact_id")?).await
        }
        "get_last_interaction" => {
            contacts::get_last_interaction(tg, arg_i64(args, "contact_id")?).await
        }
        // groups
        "create_group" => {
            groups::create_group(tg, arg_str(args, "title")?, &i64_list(args, "user_ids")?).await
        }
        "create_channel" => {
            groups::create_channel(
                tg,
                arg_str(args, "title")?,
                str_or(args, "about", ""),
                bool_or(args, "megagroup", false),
            )
            .await
        }
        "invite_to_group" => {
            groups::invite_to_group(tg, arg_i64(args, "group_id")?, &i64_list(args, "user_ids")?)
                .await
        }
        "leave_chat" => groups::leave_chat(tg, arg_i64(args, "chat_id")?).await,
        "get_participants" => groups::get_participants(tg, arg_i64(args, "chat_id")?).await,
        "edit_chat_title" => {
            groups::edit_chat_title(tg, arg_i64(args, "chat_id")?, arg_str(args, "title")?).await
        }
        "edit_chat_photo" => {
            groups::edit_chat_photo(tg, arg_i64(args, "chat_id")?, arg_str(args, "file_path")?)
                .await
        }
        "delete_chat_photo" => groups::delete_chat_photo(tg, arg_i64(args, "chat_id")?).await,
        "get_invite_link" => groups::get_invite_link(tg, arg_i64(args, "chat_id")?).await,
        "join_chat_by_link" => groups::join_chat_by_link(tg, arg_str(args, "link")?).await,
        "export_chat_invite" => groups::export_chat_invite(tg, arg_i64(args, "chat_id")?).await,
        "import_chat_invite" => groups::import_chat_invite(tg, arg_str(args, "hash")?).await,
        // admin
        "promote_admin" => {
            admin::promote_admin(
                tg,
                arg_i64(args, "group_id")?,
                arg_i64(args, "user_id")?,
                args.get("rights"),
            )
            .await
        }
        "demote_admin" => {
            admin::demote_admin(tg, arg_i64(args, "group_id")?, arg_i64(args, "user_id")?).await
        }
        "ban_user" => {
            admin::ban_user(tg, arg_i64(args, "chat_id")?, arg_i64(args, "user_id")?).await
        }
        "unban_user" => {
            admin::unban_user(tg, arg_i64(args, "chat_id")?, arg_i64(args, "user_id")?).await
        }
        "get_admins" => admin::get_admins(tg, arg_i64(args, "chat_id")?).await,
        "get_banned_users" => admin::get_banned_users(tg, arg_i64(args, "chat_id")?).await,
        "get_recent_actions" => admin::get_recent_actions(tg, arg_i64(args, "chat_id")?).await,
        "set_bot_commands" => {
            admin::set_bot_commands(
                tg,
                arg_str(args, "bot_username")?,
                command_list(args, "commands")?,
            )
            .await
        }
        // media
        "send_file" => {
            media::send_file(
                tg,
                arg_i64(args, "chat_id")?,
                arg_str(args, "file_path")?,
                opt_str(args, "caption"),
            )
            .await
        }
        "download_media" => {
            media::download_media(
                tg,
                arg_i64(args, "chat_id")?,
                arg_i32(args, "message_id")?,
                arg_str(args, "file_path")?,
            )
            .await
        }
        "get_media_info" => {
            media::get_media_info(tg, arg_i64(args, "chat_id")?, arg_i32(args, "message_id")?)
                .await
        }
        "send_voice" => {
            media::send_voice(tg, arg_i64(args, "chat_id")?, arg_str(args, "file_path")?).await
        }
        "send_sticker" => {
            media::send_sticker(tg, arg_i64(args, "chat_id")?, arg_str(args, "file_path")?).await
        }
        "get_sticker_sets" => media::get_sticker_sets(tg).await,
        "get_gif_search" => {
            media::get_gif_search(tg, arg_str(args, "query")?, usize_or(args, "limit", 10)).await
        }
        "send_gif" => {
            media::send_gif(tg, arg_i64(args, "chat_id")?, arg_i64(args, "gif_id")?).await
        }
        // profile
        "get_me" => profile::get_me(tg).await,
        "update_profile" => {
            profile::update_profile(
                tg,
                opt_str(args, "first_name"),
                opt_str(args, "last_name"),
                opt_str(args, "about"),
            )
            .await
        }
        "set_profile_photo" => {
            profile::set_profile_photo(tg, arg_str(args, "file_path")?).await
        }
        "delete_profile_photo" => profile::delete_profile_photo(tg).await,
        "get_privacy_settings" => profile::get_privacy_settings(tg).await,
        "set_privacy_settings" => {
            profile::set_privacy_settings(
                tg,
                arg_str(args, "key")?,
                &i64_list_or_empty(args, "allow_users")?,
                &i64_list_or_empty(args, "disallow_users")?,
            )
            .await
        }
        "get_user_photos" => {
            profile::get_user_photos(tg, arg_i64(args, "user_id")?, usize_or(args, "limit", 10))
                .await
        }
        "get_user_status" => profile::get_user_status(tg, arg_i64(args, "user_id")?).await,
        "get_bot_info" => profile::get_bot_info(tg, arg_str(args, "bot_username")?).await,
        _ => Err(Error::UnknownTool),
    }
}

/// Run one tool call. Never fails: errors come back as normalized text.
pub async fn dispatch(tg: &dyn TelegramPort, name: &str, args: &Value) -> String {
    match route(tg, name, args).await {
        Ok(output) => output,
        Err(Error::UnknownTool) => format!("Unknown tool: {name}"),
        Err(err) => log_and_format_error(name, &err, args),
    }
}
