//! Conversions from grammers types into the core domain types.

use grammers_client::types::{Chat, Dialog, Media, Message, User};
use grammers_session::PackedType;
use grammers_tl_types as tl;

use tgmcp_core::entity::{
    ChannelInfo, DialogInfo, GroupInfo, MediaInfo, MessageInfo, Peer, UserInfo,
};

pub fn user_info(user: &User) -> UserInfo {
    UserInfo {
        id: user.id(),
        first_name: user.first_name().to_string(),
        last_name: user.last_name().map(str::to_string),
        username: user.username().map(str::to_string),
        phone: user.phone().map(str::to_string),
        is_bot: user.is_bot(),
        verified: user.verified(),
    }
}

/// Classify a chat by its packed type, which distinguishes basic groups from
/// megagroups where the `Chat` enum alone does not.
pub fn peer(chat: &Chat) -> Peer {
    let packed = chat.pack();
    match chat {
        Chat::User(user) => Peer::User(user_info(user)),
        Chat::Group(_) if packed.ty == PackedType::Chat => Peer::Group(GroupInfo {
            id: chat.id(),
            title: chat.name().to_string(),
        }),
        _ => Peer::Channel(ChannelInfo {
            id: chat.id(),
            title: chat.name().to_string(),
            username: chat.username().map(str::to_string),
            broadcast: matches!(packed.ty, PackedType::Broadcast | PackedType::Gigagroup),
            megagroup: packed.ty == PackedType::Megagroup,
        }),
    }
}

fn media_info(media: &Media) -> MediaInfo {
    match media {
        Media::Photo(_) => MediaInfo {
            kind: "photo".to_string(),
            document_id: None,
        },
        Media::Sticker(sticker) => MediaInfo {
            kind: "sticker".to_string(),
            document_id: Some(sticker.document.id()),
        },
        Media::Document(document) => MediaInfo {
            kind: "document".to_string(),
            document_id: Some(document.id()),
        },
        Media::Contact(_) => MediaInfo {
            kind: "contact".to_string(),
            document_id: None,
        },
        other => MediaInfo {
            kind: format!("{other:?}")
                .split(['(', ' '])
                .next()
                .unwrap_or("media")
                .to_lowercase(),
            document_id: None,
        },
    }
}

pub fn message_info(message: &Message) -> MessageInfo {
    let sender = message.sender();
    MessageInfo {
        id: message.id(),
        date: message.date(),
        text: message.text().to_string(),
        from_id: sender.as_ref().map(Chat::id),
        outgoing: message.outgoing(),
        pinned: message.pinned(),
        sender_name: sender.as_ref().map(|chat| chat.name().to_string()),
        media: message.media().as_ref().map(media_info),
    }
}

pub fn dialog_info(dialog: &Dialog) -> DialogInfo {
    let unread_count = match &dialog.raw {
        tl::enums::Dialog::Dialog(raw) => raw.unread_count,
        tl::enums::Dialog::Folder(_) => 0,
    };
    DialogInfo {
        peer: peer(dialog.chat()),
        unread_count,
        last_message: dialog.last_message.as_ref().map(message_info),
    }
}

/// Status enum to the short strings the tools print.
pub fn user_status(status: Option<&tl::enums::UserStatus>) -> String {
    match status {
        Some(tl::enums::UserStatus::Online(online)) => {
            format!("online (until {})", online.expires)
        }
        Some(tl::enums::UserStatus::Offline(offline)) => {
            format!("offline (last seen at {})", offline.was_online)
        }
        Some(tl::enums::UserStatus::Recently(_)) => "last seen recently".to_string(),
        Some(tl::enums::UserStatus::LastWeek(_)) => "last seen within a week".to_string(),
        Some(tl::enums::UserStatus::LastMonth(_)) => "last seen within a month".to_string(),
        _ => "unknown".to_string(),
    }
}
