/// Core error type for the tool server.
///
/// The adapter crate maps client-library errors into this type so tool
/// functions can branch on the conditions that have dedicated user-facing
/// messages (invite problems, mutual-contact requirements) without ever
/// inspecting error strings.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The adapter does not implement this call shape. Tools with a fallback
    /// chain treat this as "try the next shape"; everything else reports it.
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),

    #[error("authentication required")]
    Unauthorized,

    #[error("invite link expired")]
    InviteExpired,

    #[error("invite link invalid")]
    InviteInvalid,

    #[error("already a participant of this chat")]
    AlreadyParticipant,

    #[error("joining requires admin approval")]
    AdminApprovalRequired,

    #[error("chat has reached its participant limit")]
    ChatFull,

    #[error("user is not a mutual contact")]
    NotMutualContact,

    #[error("user privacy settings forbid this")]
    PrivacyRestricted,

    #[error("flood limit hit")]
    Flood,

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("rpc error: {0}")]
    Rpc(String),

    /// Dispatch found no tool with the requested name.
    #[error("unknown tool")]
    UnknownTool,
}

pub type Result<T> = std::result::Result<T, Error>;
