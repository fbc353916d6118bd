//! Telegram adapter built on grammers.
//!
//! Implements the core [`TelegramPort`](tgmcp_core::port::TelegramPort) with
//! the high-level grammers client where it reaches, and raw TL invocations
//! for the rest (contacts, privacy, invites, admin log, folders).

mod convert;
mod port;
mod session;

pub use grammers_client::{Client, SignInError};
pub use port::GrammersPort;
pub use session::{encode_session, load_session, save_session};

use grammers_client::Config as ClientConfig;
use grammers_client::InitParams;

use tgmcp_core::config::Config;
use tgmcp_core::{Error, Result};

/// Connect using the configured session (string takes precedence over the
/// session file). The returned client may still be unauthorized.
pub async fn connect(config: &Config) -> Result<Client> {
    let session = session::load_session(config)?;
    Client::connect(ClientConfig {
        session,
        api_id: config.api_id,
        api_hash: config.api_hash.clone(),
        params: InitParams::default(),
    })
    .await
    .map_err(|err| Error::Rpc(format!("connect failed: {err}")))
}
