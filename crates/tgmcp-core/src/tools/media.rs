//! Media tools: file transfer, voice notes, stickers, GIFs.
//!
//! Local filesystem checks run before any remote call so a bad path never
//! costs a round trip.

use std::path::Path;

use crate::port::{FileKind, TelegramPort};
use crate::Result;

use super::{is_readable_file, is_writable_dir, resolve_chat};

fn has_extension(path: &Path, allowed: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| allowed.iter().any(|a| ext.eq_ignore_ascii_case(a)))
        .unwrap_or(false)
}

pub async fn send_file(
    tg: &dyn TelegramPort,
    chat_id: i64,
    file_path: &str,
    caption: Option<&str>,
) -> Result<String> {
    let path = Path::new(file_path);
    if !path.is_file() {
        return Ok(format!("File not found: {file_path}"));
    }
    if !is_readable_file(path) {
        return Ok(format!("File is not readable: {file_path}"));
    }
    let peer = resolve_chat(tg, chat_id).await?;
    tg.send_file(&peer, path, caption, FileKind::Auto).await?;
    Ok(format!("File sent to chat {chat_id}."))
}

pub async fn send_voice(tg: &dyn TelegramPort, chat_id: i64, file_path: &str) -> Result<String> {
    let path = Path::new(file_path);
    if !path.is_file() {
        return Ok(format!("File not found: {file_path}"));
    }
    if !is_readable_file(path) {
        return Ok(format!("File is not readable: {file_path}"));
    }
    if !has_extension(path, &["ogg", "opus"]) {
        return Ok("Voice file must be .ogg or .opus format.".to_string());
    }
    let peer = resolve_chat(tg, chat_id).await?;
    tg.send_file(&peer, path, None, FileKind::VoiceNote).await?;
    Ok(format!("Voice message sent to chat {chat_id}."))
}

pub async fn send_sticker(tg: &dyn TelegramPort, chat_id: i64, file_path: &str) -> Result<String> {
    let path = Path::new(file_path);
    if !path.is_file() {
        return Ok(format!("File not found: {file_path}"));
    }
    if !is_readable_file(path) {
        return Ok(format!("File is not readable: {file_path}"));
    }
    if !has_extension(path, &["webp"]) {
        return Ok("Sticker file must be a .webp file.".to_string());
    }
    let peer = resolve_chat(tg, chat_id).await?;
    tg.send_file(&peer, path, None, FileKind::Sticker).await?;
    Ok(format!("Sticker sent to chat {chat_id}."))
}

pub async fn download_media(
    tg: &dyn TelegramPort,
    chat_id: i64,
    message_id: i32,
    file_path: &str,
) -> Result<String> {
    let peer = resolve_chat(tg, chat_id).await?;
    if tg.media_info(&peer, message_id).await?.is_none() {
        return Ok("No media found in the specified message.".to_string());
    }
    let dest = Path::new(file_path);
    let dir = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::path::PathBuf::from("."),
    };
    if !is_writable_dir(&dir) {
        return Ok(format!("Directory not writable: {}", dir.display()));
    }
    if !tg.download_media(&peer, message_id, dest).await? {
        return Ok("No media found in the specified message.".to_string());
    }
    if !dest.is_file() {
        return Ok(format!("Download failed: file not created at {file_path}"));
    }
    Ok(format!("Media downloaded to {file_path}."))
}

pub async fn get_media_info(
    tg: &dyn TelegramPort,
    chat_id: i64,
    message_id: i32,
) -> Result<String> {
    let peer = resolve_chat(tg, chat_id).await?;
    match tg.media_info(&peer, message_id).await? {
        Some(info) => {
            let value = serde_json::json!({
                "type": info.kind,
                "document_id": info.document_id,
            });
            Ok(serde_json::to_string_pretty(&value)?)
        }
        None => Ok("No media found in the specified message.".to_string()),
    }
}

pub async fn get_sticker_sets(tg: &dyn TelegramPort) -> Result<String> {
    let titles = tg.get_sticker_set_titles().await?;
    if titles.is_empty() {
        return Ok("No sticker sets found.".to_string());
    }
    Ok(titles.join("\n"))
}

pub async fn get_gif_search(tg: &dyn TelegramPort, query: &str, limit: usize) -> Result<String> {
    let ids = tg.search_gifs(query, limit).await?;
    Ok(serde_json::to_string_pretty(&ids)?)
}

pub async fn send_gif(tg: &dyn TelegramPort, chat_id: i64, gif_id: i64) -> Result<String> {
    let peer = resolve_chat(tg, chat_id).await?;
    tg.send_document_id(&peer, gif_id).await?;
    Ok(format!("GIF sent to chat {chat_id}."))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::entity::{MediaInfo, MessageInfo, Peer, UserInfo};
    use crate::tools::mock::MockPort;

    fn port_with_user() -> MockPort {
        MockPort::with_peers(vec![Peer::User(UserInfo {
            id: 5,
            first_name: "Dana".to_string(),
            ..Default::default()
        })])
    }

    #[tokio::test]
    async fn missing_file_short_circuits_before_any_remote_call() {
        let port = port_with_user();
        let out = send_file(&port, 5, "/no/such/file.pdf", None).await.unwrap();
        assert_eq!(out, "File not found: /no/such/file.pdf");
        assert!(port.calls().is_empty());
    }

    #[tokio::test]
    async fn voice_requires_opus_container() {
        let dir = std::env::temp_dir();
        let path = dir.join("note.mp3");
        std::fs::write(&path, b"audio").unwrap();
        let port = port_with_user();
        let out = send_voice(&port, 5, path.to_str().unwrap()).await.unwrap();
        assert_eq!(out, "Voice file must be .ogg or .opus format.");
        assert!(port.calls().is_empty());
        std::fs::remove_file(&path).ok();
    }

    #[tokio::test]
    async fn voice_accepts_ogg() {
        let dir = std::env::temp_dir();
        let path = dir.join("note.ogg");
        std::fs::write(&path, b"audio").unwrap();
        let port = port_with_user();
        let out = send_voice(&port, 5, path.to_str().unwrap()).await.unwrap();
        assert_eq!(out, "Voice message sent to chat 5.");
        assert!(port.calls()[0].contains("VoiceNote"));
        std::fs::remove_file(&path).ok();
    }

    #[tokio::test]
    async fn sticker_requires_webp() {
        let dir = std::env::temp_dir();
        let path = dir.join("sticker.png");
        std::fs::write(&path, b"img").unwrap();
        let port = port_with_user();
        let out = send_sticker(&port, 5, path.to_str().unwrap()).await.unwrap();
        assert_eq!(out, "Sticker file must be a .webp file.");
        std::fs::remove_file(&path).ok();
    }

    #[tokio::test]
    async fn download_reports_messages_without_media() {
        let mut port = port_with_user();
        port.messages = vec![MessageInfo {
            id: 1,
            date: Utc::now(),
            text: "plain".to_string(),
            ..Default::default()
        }];
        let out = download_media(&port, 5, 1, "/tmp/out.bin").await.unwrap();
        assert_eq!(out, "No media found in the specified message.");
        assert!(port.calls().iter().all(|c| !c.starts_with("download_media")));
    }

    #[tokio::test]
    async fn download_writes_and_confirms() {
        let dest = std::env::temp_dir().join("tgmcp_dl_test.bin");
        std::fs::remove_file(&dest).ok();
        let mut port = port_with_user();
        port.messages = vec![MessageInfo {
            id: 2,
            date: Utc::now(),
            text: String::new(),
            media: Some(MediaInfo {
                kind: "photo".to_string(),
                document_id: None,
            }),
            ..Default::default()
        }];
        let out = download_media(&port, 5, 2, dest.to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(out, format!("Media downloaded to {}.", dest.display()));
        std::fs::remove_file(&dest).ok();
    }

    #[tokio::test]
    async fn media_info_formats_document_details() {
        let mut port = port_with_user();
        port.messages = vec![MessageInfo {
            id: 3,
            date: Utc::now(),
            text: String::new(),
            media: Some(MediaInfo {
                kind: "document".to_string(),
                document_id: Some(777),
            }),
            ..Default::default()
        }];
        let out = get_media_info(&port, 5, 3).await.unwrap();
        assert!(out.contains("\"type\": \"document\""));
        assert!(out.contains("\"document_id\": 777"));
    }
}
