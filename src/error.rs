//! Client error types.
//!
//! [`ClientError`] is returned by every [`ChatBackend`](crate::api::ChatBackend)
//! call. The controller never lets it escape: history failures are logged,
//! chat failures become a "Connection Error." block.

/// Transport or decode failure while talking to the chat backend.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The request could not be sent or the body could not be read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The body was not the JSON shape we expected.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// A chat reply carried neither a `response` nor an `error`.
    #[error("chat reply had neither a response nor an error")]
    EmptyReply,

    /// A failed call from a [`ChatBackend`](crate::api::ChatBackend) that
    /// doesn't speak HTTP. [`HttpChatClient`](crate::api::HttpChatClient)
    /// never returns it.
    #[error("{0}")]
    Other(String),
}
