//! Purpose: Public async surface of the feed client.
//! Exports: `FeedController`, the `Gateway` seam, `RemoteGateway`, configuration, and core types.
//! Role: Stable boundary for embedders; core state modules stay behind it.
//! Invariants: Everything an embedder needs to drive the feed is re-exported here.

mod config;
mod controller;
mod flight;
mod gateway;
mod remote;
mod status;

pub use crate::core::edit::{EditSession, SubmitPlan};
pub use crate::core::error::{Error, ErrorKind, to_exit_code};
pub use crate::core::pagination::{Direction, PAGE_SIZE, Pagination, last_page};
pub use crate::core::post::{ImageUpload, MISSING_IMAGE_PATH, Post, PostDraft, PostId};
pub use crate::core::store::{FeedStore, MergeOutcome, Mutation};
pub use config::{Credential, GatewayConfig, TIMEOUT_ENV, TOKEN_ENV, URL_ENV};
pub use controller::{
    ErrorNotice, FeedController, FeedView, InitOutcome, POST_DELETE_FAILED, POST_SAVE_FAILED,
    POST_VALIDATION_FAILED, POSTS_FETCH_FAILED, Phase,
};
pub use gateway::{
    Gateway, GatewayError, GatewayResult, PostInput, PostsPage, RemoteError, RemoteErrors,
    VALIDATION_STATUS,
};
pub use remote::RemoteGateway;
pub use status::{STATUS_FETCH_FAILED, STATUS_UPDATE_FAILED, StatusSession};
