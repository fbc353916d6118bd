//! Session persistence: a binary session file, or a base64 string for
//! environments without a writable filesystem.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use grammers_client::Client;
use grammers_session::Session;

use tgmcp_core::config::Config;
use tgmcp_core::{Error, Result};

/// Load the session named by the config. A `TELEGRAM_SESSION_STRING` wins
/// over the session file.
pub fn load_session(config: &Config) -> Result<Session> {
    if let Some(encoded) = &config.session_string {
        let bytes = BASE64
            .decode(encoded.trim())
            .map_err(|err| Error::Config(format!("invalid session string: {err}")))?;
        return Session::load(&bytes)
            .map_err(|err| Error::Config(format!("corrupt session string: {err}")));
    }
    Session::load_file_or_create(&config.session_file)
        .map_err(|err| Error::Config(format!("cannot open session file: {err}")))
}

/// Persist the client's session to the configured file. No-op when running
/// from a session string.
pub fn save_session(client: &Client, config: &Config) -> Result<()> {
    if config.session_string.is_some() {
        return Ok(());
    }
    client
        .session()
        .save_to_file(&config.session_file)
        .map_err(|err| Error::Config(format!("cannot save session file: {err}")))?;
    Ok(())
}

/// Encode the client's current session as a portable base64 string.
pub fn encode_session(client: &Client) -> String {
    BASE64.encode(client.session().save())
}
