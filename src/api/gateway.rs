//! Purpose: Define the remote gateway seam the feed controller talks through.
//! Exports: `Gateway`, `GatewayError`, `GatewayResult`, `RemoteError`, `PostsPage`, `PostInput`.
//! Role: Async boundary; implementations own transport, the controller owns state.
//! Invariants: A structured error always carries at least one entry.
//! Invariants: The validation class is decided by the first entry's status alone.
use crate::core::error::{Error, ErrorKind};
use crate::core::post::{ImageUpload, Post, PostId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::future::Future;

use super::config::Credential;

/// Status code the server uses for rejected user input.
pub const VALIDATION_STATUS: u16 = 422;

pub type GatewayResult<T> = Result<T, GatewayError>;

/// One entry of the error list a server attaches to an otherwise valid response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RemoteError {
    pub message: String,
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub data: Option<Value>,
}

impl RemoteError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
            data: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

#[derive(Debug)]
pub enum GatewayError {
    /// The call failed or its payload could not be read.
    Transport(Error),
    /// The call succeeded but the response listed application errors.
    Structured(Vec<RemoteError>),
}

impl GatewayError {
    pub fn structured(errors: Vec<RemoteError>) -> Self {
        if errors.is_empty() {
            return Self::Transport(
                Error::new(ErrorKind::Internal).with_message("empty error list in response"),
            );
        }
        Self::Structured(errors)
    }

    pub fn is_validation(&self) -> bool {
        match self {
            Self::Structured(errors) => errors
                .first()
                .and_then(|first| first.status)
                .is_some_and(|status| status == VALIDATION_STATUS),
            Self::Transport(_) => false,
        }
    }

    /// Converts into a crate error carrying `message` for display.
    pub fn into_error(self, message: &str) -> Error {
        match self {
            Self::Transport(err) => {
                let mut converted = Error::new(err.kind()).with_message(message);
                if let Some(status) = err.status() {
                    converted = converted.with_status(status);
                }
                converted.with_source(err)
            }
            Self::Structured(errors) => {
                let kind = if errors
                    .first()
                    .and_then(|first| first.status)
                    .is_some_and(|status| status == VALIDATION_STATUS)
                {
                    ErrorKind::Validation
                } else {
                    ErrorKind::Remote
                };
                let mut err = Error::new(kind).with_message(message);
                if let Some(status) = errors.first().and_then(|first| first.status) {
                    err = err.with_status(status);
                }
                err.with_source(RemoteErrors(errors))
            }
        }
    }
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(err) => write!(f, "transport: {err}"),
            Self::Structured(errors) => write!(f, "remote: {}", RemoteErrors::render(errors)),
        }
    }
}

impl From<Error> for GatewayError {
    fn from(err: Error) -> Self {
        Self::Transport(err)
    }
}

/// Error-list wrapper kept as the source of a converted structured error.
#[derive(Debug)]
pub struct RemoteErrors(pub Vec<RemoteError>);

impl RemoteErrors {
    fn render(errors: &[RemoteError]) -> String {
        errors
            .iter()
            .map(|entry| match entry.status {
                Some(status) => format!("{} [{status}]", entry.message),
                None => entry.message.clone(),
            })
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl fmt::Display for RemoteErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&Self::render(&self.0))
    }
}

impl std::error::Error for RemoteErrors {}

#[derive(Clone, Debug, PartialEq)]
pub struct PostsPage {
    pub posts: Vec<Post>,
    pub total: u64,
}

/// Fields sent with a create or update mutation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PostInput {
    pub title: String,
    pub content: String,
    pub image_path: String,
}

/// Remote operations the feed depends on. Every call carries the caller's credential.
pub trait Gateway: Send + Sync {
    fn fetch_status(
        &self,
        credential: &Credential,
    ) -> impl Future<Output = GatewayResult<String>> + Send;

    fn fetch_posts(
        &self,
        credential: &Credential,
        page: i64,
    ) -> impl Future<Output = GatewayResult<PostsPage>> + Send;

    fn update_status(
        &self,
        credential: &Credential,
        status: &str,
    ) -> impl Future<Output = GatewayResult<String>> + Send;

    /// Returns the stored file path, or `None` when the server reported none.
    fn upload_image(
        &self,
        credential: &Credential,
        image: Option<&ImageUpload>,
        old_path: Option<&str>,
    ) -> impl Future<Output = GatewayResult<Option<String>>> + Send;

    fn create_post(
        &self,
        credential: &Credential,
        input: &PostInput,
    ) -> impl Future<Output = GatewayResult<Post>> + Send;

    fn update_post(
        &self,
        credential: &Credential,
        id: &PostId,
        input: &PostInput,
    ) -> impl Future<Output = GatewayResult<Post>> + Send;

    fn delete_post(
        &self,
        credential: &Credential,
        id: &PostId,
    ) -> impl Future<Output = GatewayResult<()>> + Send;
}

#[cfg(test)]
mod tests {
    use super::{GatewayError, RemoteError};
    use crate::core::error::{Error, ErrorKind};
    use std::error::Error as _;

    #[test]
    fn first_entry_decides_validation_class() {
        let err = GatewayError::structured(vec![
            RemoteError::new("Invalid input.").with_status(422),
            RemoteError::new("other").with_status(500),
        ]);
        assert!(err.is_validation());

        let err = GatewayError::structured(vec![
            RemoteError::new("Not authenticated!").with_status(401),
            RemoteError::new("Invalid input.").with_status(422),
        ]);
        assert!(!err.is_validation());
    }

    #[test]
    fn empty_error_list_is_a_transport_failure() {
        let err = GatewayError::structured(Vec::new());
        assert!(matches!(err, GatewayError::Transport(_)));
    }

    #[test]
    fn structured_error_converts_with_flow_message() {
        let err =
            GatewayError::structured(vec![RemoteError::new("Invalid input.").with_status(422)])
                .into_error("Validation failed. Make sure inputs are valid!");
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.status(), Some(422));
        assert_eq!(
            err.message(),
            Some("Validation failed. Make sure inputs are valid!")
        );
        assert_eq!(
            err.source().map(|source| source.to_string()).as_deref(),
            Some("Invalid input. [422]")
        );
    }

    #[test]
    fn transport_error_keeps_its_kind() {
        let err = GatewayError::from(Error::new(ErrorKind::Io).with_message("request failed"))
            .into_error("Failed to fetch posts.");
        assert_eq!(err.kind(), ErrorKind::Io);
        assert_eq!(err.message(), Some("Failed to fetch posts."));
    }
}
