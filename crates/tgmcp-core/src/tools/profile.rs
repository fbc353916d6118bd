//! Account tools: own profile, privacy rules, other users' public info.

use std::path::Path;

use tracing::warn;

use crate::entity::{format_entity, Peer, PeerQuery};
use crate::port::{PrivacyKey, TelegramPort};
use crate::Result;

use super::{is_readable_file, resolve_user};

pub async fn get_me(tg: &dyn TelegramPort) -> Result<String> {
    let me = tg.get_me().await?;
    Ok(serde_json::to_string_pretty(&format_entity(&Peer::User(
        me,
    )))?)
}

pub async fn update_profile(
    tg: &dyn TelegramPort,
    first_name: Option<&str>,
    last_name: Option<&str>,
    about: Option<&str>,
) -> Result<String> {
    tg.update_profile(first_name, last_name, about).await?;
    Ok("Profile updated.".to_string())
}

pub async fn set_profile_photo(tg: &dyn TelegramPort, file_path: &str) -> Result<String> {
    let path = Path::new(file_path);
    if !path.is_file() {
        return Ok(format!("Photo file not found: {file_path}"));
    }
    if !is_readable_file(path) {
        return Ok(format!("Photo file not readable: {file_path}"));
    }
    tg.set_profile_photo(path).await?;
    Ok("Profile photo updated.".to_string())
}

pub async fn delete_profile_photo(tg: &dyn TelegramPort) -> Result<String> {
    if tg.delete_profile_photo().await? {
        Ok("Profile photo deleted.".to_string())
    } else {
        Ok("No profile photo to delete.".to_string())
    }
}

pub async fn get_privacy_settings(tg: &dyn TelegramPort) -> Result<String> {
    let value = tg.get_privacy(PrivacyKey::Status).await?;
    Ok(serde_json::to_string_pretty(&value)?)
}

pub async fn set_privacy_settings(
    tg: &dyn TelegramPort,
    key: &str,
    allow_users: &[i64],
    disallow_users: &[i64],
) -> Result<String> {
    let privacy_key = match PrivacyKey::parse(key) {
        Some(parsed) => parsed,
        None => {
            return Ok(format!(
                "Error: Unsupported privacy key '{key}'. Supported keys: {}",
                PrivacyKey::SUPPORTED
            ))
        }
    };
    let mut allow = Vec::with_capacity(allow_users.len());
    for &user_id in allow_users {
        match resolve_user(tg, user_id).await {
            Ok(user) => allow.push(user),
            Err(err) => warn!(user_id, error = %err, "skipping unresolvable allow entry"),
        }
    }
    let mut disallow = Vec::with_capacity(disallow_users.len());
    for &user_id in disallow_users {
        match resolve_user(tg, user_id).await {
            Ok(user) => disallow.push(user),
            Err(err) => warn!(user_id, error = %err, "skipping unresolvable disallow entry"),
        }
    }
    tg.set_privacy(privacy_key, &allow, &disallow).await?;
    Ok(format!("Privacy settings for {key} updated successfully."))
}

pub async fn get_user_photos(tg: &dyn TelegramPort, user_id: i64, limit: usize) -> Result<String> {
    let user = resolve_user(tg, user_id).await?;
    let photo_ids = tg.get_user_photos(&user, limit).await?;
    if photo_ids.is_empty() {
        return Ok(format!("No profile photos found for user {user_id}."));
    }
    Ok(serde_json::to_string_pretty(&photo_ids)?)
}

pub async fn get_user_status(tg: &dyn TelegramPort, user_id: i64) -> Result<String> {
    let user = resolve_user(tg, user_id).await?;
    tg.get_user_status(&user).await
}

pub async fn get_bot_info(tg: &dyn TelegramPort, bot_username: &str) -> Result<String> {
    let user = match tg.resolve(&PeerQuery::parse(bot_username)).await? {
        Peer::User(user) => user,
        _ => return Ok(format!("'{bot_username}' is not a bot or user account.")),
    };
    let full = tg.get_full_user(&user).await?;
    Ok(serde_json::to_string_pretty(&full)?)
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::entity::UserInfo;
    use crate::port::TelegramPort;
    use crate::tools::mock::MockPort;

    #[tokio::test]
    async fn get_me_formats_the_account_entity() {
        let port = MockPort {
            me: Some(UserInfo {
                id: 42,
                first_name: "Me".to_string(),
                username: Some("me_online".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let out = get_me(&port).await.unwrap();
        assert!(out.contains("\"id\": 42"));
        assert!(out.contains("\"username\": \"me_online\""));
        assert!(out.contains("\"type\": \"user\""));
    }

    #[tokio::test]
    async fn unsupported_privacy_key_is_reported_without_remote_calls() {
        let port = MockPort::default();
        let out = set_privacy_settings(&port, "last_seen", &[], &[])
            .await
            .unwrap();
        assert_eq!(
            out,
            "Error: Unsupported privacy key 'last_seen'. Supported keys: status, phone, profile_photo"
        );
    }

    struct PrivacyPort {
        recorded: std::sync::Mutex<Vec<(PrivacyKey, usize, usize)>>,
        known_user: UserInfo,
    }

    #[async_trait]
    impl TelegramPort for PrivacyPort {
        async fn resolve(&self, query: &crate::entity::PeerQuery) -> Result<Peer> {
            match query {
                crate::entity::PeerQuery::Id(id) if *id == self.known_user.id => {
                    Ok(Peer::User(self.known_user.clone()))
                }
                _ => Err(crate::Error::NotFound(format!("no peer for {query}"))),
            }
        }

        async fn set_privacy(
            &self,
            key: PrivacyKey,
            allow: &[UserInfo],
            disallow: &[UserInfo],
        ) -> Result<()> {
            self.recorded
                .lock()
                .unwrap()
                .push((key, allow.len(), disallow.len()));
            Ok(())
        }
    }

    #[tokio::test]
    async fn privacy_update_skips_unresolvable_users() {
        let port = PrivacyPort {
            recorded: Default::default(),
            known_user: UserInfo {
                id: 7,
                first_name: "Frank".to_string(),
                ..Default::default()
            },
        };
        let out = set_privacy_settings(&port, "phone", &[7, 999], &[999])
            .await
            .unwrap();
        assert_eq!(out, "Privacy settings for phone updated successfully.");
        let recorded = port.recorded.lock().unwrap();
        assert_eq!(recorded[0], (PrivacyKey::Phone, 1, 0));
    }

    #[tokio::test]
    async fn missing_profile_photo_file_is_reported() {
        let port = MockPort::default();
        let out = set_profile_photo(&port, "/no/such/pic.jpg").await.unwrap();
        assert_eq!(out, "Photo file not found: /no/such/pic.jpg");
    }
}
