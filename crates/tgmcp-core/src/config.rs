use std::{
    env, fs,
    path::{Path, PathBuf},
};

use crate::{errors::Error, Result};

/// Default name of the append-only error log. The error normalizer points
/// users at this file, so keep the two in sync.
pub const DEFAULT_ERROR_LOG: &str = "tgmcp_errors.log";

/// Typed configuration for the tool server.
#[derive(Clone, Debug)]
pub struct Config {
    pub api_id: i32,
    pub api_hash: String,

    /// Path of the file-based session, derived from `TELEGRAM_SESSION_NAME`.
    pub session_file: PathBuf,
    /// Portable base64 session. Takes precedence over the file when set.
    pub session_string: Option<String>,

    pub error_log_path: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let api_id = env_str("TELEGRAM_API_ID")
            .and_then(non_empty)
            .ok_or_else(|| {
                Error::Config("TELEGRAM_API_ID environment variable is required".to_string())
            })?
            .trim()
            .parse::<i32>()
            .map_err(|_| Error::Config("TELEGRAM_API_ID must be an integer".to_string()))?;

        let api_hash = env_str("TELEGRAM_API_HASH")
            .and_then(non_empty)
            .ok_or_else(|| {
                Error::Config("TELEGRAM_API_HASH environment variable is required".to_string())
            })?;

        let session_string = env_str("TELEGRAM_SESSION_STRING").and_then(non_empty);
        let session_name =
            env_str("TELEGRAM_SESSION_NAME").and_then(non_empty).unwrap_or_else(|| "tgmcp".to_string());

        if session_string.is_none() && session_name.trim().is_empty() {
            return Err(Error::Config(
                "either TELEGRAM_SESSION_STRING or TELEGRAM_SESSION_NAME must be set".to_string(),
            ));
        }

        let error_log_path = env_str("TGMCP_ERROR_LOG")
            .and_then(non_empty)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ERROR_LOG));

        Ok(Self {
            api_id,
            api_hash,
            session_file: session_file_path(&session_name),
            session_string,
            error_log_path,
        })
    }
}

fn session_file_path(name: &str) -> PathBuf {
    let name = name.trim();
    if name.ends_with(".session") {
        PathBuf::from(name)
    } else {
        PathBuf::from(format!("{name}.session"))
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_file_gets_extension() {
        assert_eq!(
            session_file_path("anon"),
            PathBuf::from("anon.session")
        );
        assert_eq!(
            session_file_path("anon.session"),
            PathBuf::from("anon.session")
        );
    }

    #[test]
    fn dotenv_does_not_override_existing_env() {
        let dir = std::env::temp_dir().join(format!("tgmcp-env-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let file = dir.join(".env");
        std::fs::write(&file, "TGMCP_TEST_KEY=from_file\n# comment\nQUOTED='x y'\n").unwrap();

        env::set_var("TGMCP_TEST_KEY", "from_env");
        load_dotenv_if_present(&file);
        assert_eq!(env::var("TGMCP_TEST_KEY").unwrap(), "from_env");
        assert_eq!(env::var("QUOTED").unwrap(), "x y");

        env::remove_var("TGMCP_TEST_KEY");
        env::remove_var("QUOTED");
        let _ = std::fs::remove_dir_all(&dir);
    }
}
