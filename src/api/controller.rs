//! Purpose: Orchestrate feed loads, post saves, deletes, and status updates against a gateway.
//! Exports: `FeedController`, `FeedView`, `Phase`, `ErrorNotice`, `InitOutcome`, flow messages.
//! Role: Sole owner of pagination, feed store, edit session, status slice, and the error overlay.
//! Invariants: State locks are released before every await; remote results are applied after.
//! Invariants: Each flow returns its own result and records failures in a single overlay slot.
//! Invariants: A completed remote call is always applied, even if the UI moved on meanwhile.
//! Notes: Deletes reload the current page instead of splicing locally.
use super::config::Credential;
use super::flight::{InFlight, InFlightGuard, lock};
use super::gateway::{Gateway, GatewayError, PostInput};
use super::status::StatusSession;
use crate::core::edit::{EditSession, SubmitPlan};
use crate::core::error::{Error, ErrorKind};
use crate::core::pagination::{Direction, PAGE_SIZE, Pagination, last_page};
use crate::core::post::{MISSING_IMAGE_PATH, Post, PostDraft, PostId};
use crate::core::store::{FeedStore, MergeOutcome, Mutation};
use serde::Serialize;
use std::sync::Mutex;
use tracing::{debug, info, warn};

pub const POSTS_FETCH_FAILED: &str = "Failed to fetch posts.";
pub const POST_VALIDATION_FAILED: &str = "Validation failed. Make sure inputs are valid!";
pub const POST_SAVE_FAILED: &str = "Post creation failed!";
pub const POST_DELETE_FAILED: &str = "Deleting a post failed!";

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    LoadingPosts,
    Editing,
    SubmittingEdit,
}

/// What the error overlay displays.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ErrorNotice {
    pub kind: ErrorKind,
    pub message: String,
    pub hint: Option<String>,
}

impl ErrorNotice {
    fn from_error(err: &Error) -> Self {
        Self {
            kind: err.kind(),
            message: err
                .message()
                .map(str::to_string)
                .unwrap_or_else(|| err.to_string()),
            hint: err.hint().map(str::to_string),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FeedView {
    pub posts: Vec<Post>,
    pub total_posts: u64,
    pub page: i64,
    pub last_page: u64,
    pub posts_loading: bool,
    pub editing: bool,
    pub edit_target: Option<Post>,
    pub edit_loading: bool,
    pub status: String,
    pub error: Option<ErrorNotice>,
    pub phase: Phase,
}

/// Results of the two startup loads, which run concurrently and unordered.
#[derive(Debug)]
pub struct InitOutcome {
    pub status: Result<(), Error>,
    pub posts: Result<(), Error>,
}

#[derive(Debug, Default)]
struct FeedState {
    store: FeedStore,
    pagination: Pagination,
    edit: EditSession,
    posts_loading: bool,
}

impl FeedState {
    fn phase(&self) -> Phase {
        if self.edit.is_submitting() {
            Phase::SubmittingEdit
        } else if self.edit.is_editing() {
            Phase::Editing
        } else if self.posts_loading {
            Phase::LoadingPosts
        } else {
            Phase::Idle
        }
    }
}

pub struct FeedController<G> {
    gateway: G,
    credential: Credential,
    feed: Mutex<FeedState>,
    status: StatusSession,
    error: Mutex<Option<ErrorNotice>>,
    posts_flight: InFlight,
}

/// Holds the posts flow; clears the loading flag however the flow ends.
struct PostsFlight<'a> {
    feed: &'a Mutex<FeedState>,
    _flight: InFlightGuard<'a>,
}

impl Drop for PostsFlight<'_> {
    fn drop(&mut self) {
        lock(self.feed).posts_loading = false;
    }
}

/// Ends the edit session if the submit future is dropped before it finishes.
struct SubmitFlight<'a> {
    feed: &'a Mutex<FeedState>,
    armed: bool,
}

impl SubmitFlight<'_> {
    fn finish(mut self, state: &mut FeedState) {
        state.edit.end_submit();
        self.armed = false;
    }
}

impl Drop for SubmitFlight<'_> {
    fn drop(&mut self) {
        if self.armed {
            lock(self.feed).edit.end_submit();
        }
    }
}

impl<G: Gateway> FeedController<G> {
    pub fn new(gateway: G, credential: Credential) -> Self {
        Self {
            gateway,
            credential,
            feed: Mutex::new(FeedState::default()),
            status: StatusSession::new(),
            error: Mutex::new(None),
            posts_flight: InFlight::new(),
        }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Loads the user status and the first page together.
    pub async fn init(&self) -> InitOutcome {
        let (status, posts) = tokio::join!(self.load_status(), self.load(Direction::None));
        InitOutcome { status, posts }
    }

    pub async fn load_status(&self) -> Result<(), Error> {
        let result = self.status.load(&self.gateway, &self.credential).await;
        self.surface(result)
    }

    pub async fn load(&self, direction: Direction) -> Result<(), Error> {
        let flight = self.enter_posts("posts load")?;
        let page = {
            let mut state = lock(&self.feed);
            if direction != Direction::None {
                state.store.clear_posts();
            }
            state.pagination.advance(direction)
        };
        let result = self.fetch_page(page).await;
        drop(flight);
        self.surface(result)
    }

    pub fn start_create(&self) -> Result<(), Error> {
        lock(&self.feed).edit.start_create()
    }

    pub fn start_edit(&self, id: &PostId) -> Result<(), Error> {
        let mut state = lock(&self.feed);
        let FeedState { store, edit, .. } = &mut *state;
        edit.start_edit(store, id)
    }

    pub fn cancel_edit(&self) -> Result<(), Error> {
        lock(&self.feed).edit.cancel()
    }

    /// Saves the open edit session: image upload first, then create or update.
    pub async fn submit_edit(&self, draft: PostDraft) -> Result<Post, Error> {
        let (plan, flight) = {
            let mut state = lock(&self.feed);
            let plan = state.edit.begin_submit()?;
            (
                plan,
                SubmitFlight {
                    feed: &self.feed,
                    armed: true,
                },
            )
        };
        debug!(mutation = ?plan.mutation, "submitting post");

        match self.save_post(&plan, &draft).await {
            Ok(saved) => {
                let outcome = {
                    let mut state = lock(&self.feed);
                    let outcome = state.store.merge_after_mutation(saved.clone(), &plan.mutation);
                    flight.finish(&mut state);
                    outcome
                };
                if outcome == MergeOutcome::TargetMissing {
                    warn!(post = %saved.id, "updated post is no longer on the current page");
                }
                info!(post = %saved.id, ?outcome, "post saved");
                Ok(saved)
            }
            Err(err) => {
                let message = if err.is_validation() {
                    POST_VALIDATION_FAILED
                } else {
                    POST_SAVE_FAILED
                };
                let err = err.into_error(message);
                flight.finish(&mut lock(&self.feed));
                self.surface(Err(err))
            }
        }
    }

    pub async fn delete_post(&self, id: &PostId) -> Result<(), Error> {
        let flight = self.enter_posts("post delete")?;
        debug!(post = %id, "deleting post");
        let result = match self.gateway.delete_post(&self.credential, id).await {
            Ok(()) => {
                info!(post = %id, "post deleted; reloading page");
                let page = lock(&self.feed).pagination.page();
                self.fetch_page(page).await
            }
            Err(err) => {
                let err = err.into_error(POST_DELETE_FAILED);
                warn!(post = %id, kind = ?err.kind(), error = %err, "post delete failed");
                Err(err)
            }
        };
        drop(flight);
        self.surface(result)
    }

    pub fn set_status_draft(&self, text: impl Into<String>) {
        self.status.set_draft(text);
    }

    pub async fn update_status(&self) -> Result<String, Error> {
        let result = self.status.submit(&self.gateway, &self.credential).await;
        self.surface(result)
    }

    pub fn view(&self) -> FeedView {
        let error = self.current_error();
        let status = self.status.text();
        let state = lock(&self.feed);
        FeedView {
            posts: state.store.posts().to_vec(),
            total_posts: state.store.total(),
            page: state.pagination.page(),
            last_page: last_page(state.store.total()),
            posts_loading: state.posts_loading,
            editing: state.edit.is_editing(),
            edit_target: state.edit.target().cloned(),
            edit_loading: state.edit.is_submitting(),
            status,
            error,
            phase: state.phase(),
        }
    }

    pub fn phase(&self) -> Phase {
        lock(&self.feed).phase()
    }

    pub fn posts(&self) -> Vec<Post> {
        lock(&self.feed).store.posts().to_vec()
    }

    pub fn total_posts(&self) -> u64 {
        lock(&self.feed).store.total()
    }

    pub fn page(&self) -> i64 {
        lock(&self.feed).pagination.page()
    }

    pub fn last_page(&self) -> u64 {
        last_page(lock(&self.feed).store.total())
    }

    pub fn status_text(&self) -> String {
        self.status.text()
    }

    pub fn current_error(&self) -> Option<ErrorNotice> {
        lock(&self.error).clone()
    }

    pub fn has_error(&self) -> bool {
        lock(&self.error).is_some()
    }

    pub fn dismiss_error(&self) {
        *lock(&self.error) = None;
    }

    fn enter_posts(&self, flow: &str) -> Result<PostsFlight<'_>, Error> {
        let flight = self.posts_flight.enter(flow)?;
        lock(&self.feed).posts_loading = true;
        Ok(PostsFlight {
            feed: &self.feed,
            _flight: flight,
        })
    }

    async fn fetch_page(&self, page: i64) -> Result<(), Error> {
        debug!(page, "loading posts");
        match self.gateway.fetch_posts(&self.credential, page).await {
            Ok(mut fetched) => {
                if fetched.posts.len() > PAGE_SIZE {
                    warn!(
                        page,
                        received = fetched.posts.len(),
                        "server returned more posts than fit on a page"
                    );
                    fetched.posts.truncate(PAGE_SIZE);
                }
                let mut state = lock(&self.feed);
                state.store.replace_all(fetched.posts, fetched.total);
                state.posts_loading = false;
                Ok(())
            }
            Err(err) => {
                let err = err.into_error(POSTS_FETCH_FAILED);
                warn!(page, kind = ?err.kind(), error = %err, "posts load failed");
                let mut state = lock(&self.feed);
                state.store.clear_posts();
                state.posts_loading = false;
                Err(err)
            }
        }
    }

    async fn save_post(&self, plan: &SubmitPlan, draft: &PostDraft) -> Result<Post, GatewayError> {
        let uploaded = self
            .gateway
            .upload_image(
                &self.credential,
                draft.image.as_ref(),
                plan.old_image_path.as_deref(),
            )
            .await?;
        let input = PostInput {
            title: draft.title.clone(),
            content: draft.content.clone(),
            image_path: uploaded.unwrap_or_else(|| MISSING_IMAGE_PATH.to_string()),
        };
        match &plan.mutation {
            Mutation::Create => self.gateway.create_post(&self.credential, &input).await,
            Mutation::Update { target } => {
                self.gateway
                    .update_post(&self.credential, target, &input)
                    .await
            }
        }
    }

    /// Records a failed flow in the overlay, replacing any earlier error. Busy rejections are
    /// returned to the caller only.
    fn surface<T>(&self, result: Result<T, Error>) -> Result<T, Error> {
        if let Err(err) = &result {
            if err.kind() != ErrorKind::Busy {
                *lock(&self.error) = Some(ErrorNotice::from_error(err));
            }
        }
        result
    }
}
