//! Purpose: Track whether a post is being created or edited, and whether it is being saved.
//! Exports: `EditSession`, `SubmitPlan`.
//! Invariants: `target` is set only while `editing`; `submitting` implies `editing`.
//! Invariants: Starting an edit for an id absent from the page fails with `NotFound`.
use super::error::{Error, ErrorKind};
use super::post::{MISSING_IMAGE_PATH, Post, PostId};
use super::store::{FeedStore, Mutation};

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct EditSession {
    editing: bool,
    target: Option<Post>,
    submitting: bool,
}

/// Snapshot taken when a submit begins; the save resolves against this, not live state.
/// Edits always carry an old image path, `"undefined"` when the target had none.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SubmitPlan {
    pub mutation: Mutation,
    pub old_image_path: Option<String>,
}

impl EditSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn target(&self) -> Option<&Post> {
        self.target.as_ref()
    }

    pub fn start_create(&mut self) -> Result<(), Error> {
        self.ensure_not_submitting()?;
        self.editing = true;
        self.target = None;
        Ok(())
    }

    pub fn start_edit(&mut self, store: &FeedStore, id: &PostId) -> Result<(), Error> {
        self.ensure_not_submitting()?;
        let Some(post) = store.find(id) else {
            return Err(Error::new(ErrorKind::NotFound)
                .with_message(format!("post {id} is not on the current page"))
                .with_hint("Reload the feed before editing."));
        };
        self.editing = true;
        self.target = Some(post.clone());
        Ok(())
    }

    pub fn cancel(&mut self) -> Result<(), Error> {
        self.ensure_not_submitting()?;
        self.editing = false;
        self.target = None;
        Ok(())
    }

    pub fn begin_submit(&mut self) -> Result<SubmitPlan, Error> {
        if !self.editing {
            return Err(Error::new(ErrorKind::Usage)
                .with_message("no edit session is open")
                .with_hint("Start creating or editing a post first."));
        }
        self.ensure_not_submitting()?;
        self.submitting = true;
        let plan = match &self.target {
            Some(post) => SubmitPlan {
                mutation: Mutation::Update {
                    target: post.id.clone(),
                },
                old_image_path: Some(
                    post.image_path
                        .clone()
                        .unwrap_or_else(|| MISSING_IMAGE_PATH.to_string()),
                ),
            },
            None => SubmitPlan {
                mutation: Mutation::Create,
                old_image_path: None,
            },
        };
        Ok(plan)
    }

    /// Closes the session after a submit, whether it succeeded or not.
    pub fn end_submit(&mut self) {
        self.editing = false;
        self.target = None;
        self.submitting = false;
    }

    fn ensure_not_submitting(&self) -> Result<(), Error> {
        if self.submitting {
            return Err(Error::new(ErrorKind::Busy).with_message("a post save is in progress"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::EditSession;
    use crate::core::error::ErrorKind;
    use crate::core::post::{Post, PostId};
    use crate::core::store::{FeedStore, Mutation};
    use time::OffsetDateTime;

    fn store_with(id: &str, image: Option<&str>) -> FeedStore {
        let mut store = FeedStore::new();
        store.replace_all(
            vec![Post {
                id: PostId::new(id),
                title: "Title".to_string(),
                content: "Content".to_string(),
                image_path: image.map(str::to_string),
                creator: "tester".to_string(),
                created_at: OffsetDateTime::UNIX_EPOCH,
            }],
            1,
        );
        store
    }

    #[test]
    fn create_session_has_no_target() {
        let mut session = EditSession::new();
        session.start_create().expect("start");
        assert!(session.is_editing());
        assert!(session.target().is_none());
        let plan = session.begin_submit().expect("plan");
        assert_eq!(plan.mutation, Mutation::Create);
        assert_eq!(plan.old_image_path, None);
    }

    #[test]
    fn edit_session_clones_target_from_store() {
        let store = store_with("p1", Some("images/old.png"));
        let mut session = EditSession::new();
        session
            .start_edit(&store, &PostId::new("p1"))
            .expect("start");
        assert_eq!(session.target().map(|p| p.id.as_str()), Some("p1"));

        let plan = session.begin_submit().expect("plan");
        assert_eq!(
            plan.mutation,
            Mutation::Update {
                target: PostId::new("p1")
            }
        );
        assert_eq!(plan.old_image_path.as_deref(), Some("images/old.png"));
    }

    #[test]
    fn edit_of_post_without_image_sends_undefined_old_path() {
        let store = store_with("p1", None);
        let mut session = EditSession::new();
        session
            .start_edit(&store, &PostId::new("p1"))
            .expect("start");
        let plan = session.begin_submit().expect("plan");
        assert_eq!(plan.old_image_path.as_deref(), Some("undefined"));
    }

    #[test]
    fn edit_of_unknown_id_fails_fast() {
        let store = store_with("p1", None);
        let mut session = EditSession::new();
        let err = session
            .start_edit(&store, &PostId::new("missing"))
            .expect_err("err");
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.hint(), Some("Reload the feed before editing."));
        assert!(!session.is_editing());
        assert!(session.target().is_none());
    }

    #[test]
    fn submit_requires_open_session() {
        let mut session = EditSession::new();
        let err = session.begin_submit().expect_err("err");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }

    #[test]
    fn cancel_is_rejected_while_submitting() {
        let mut session = EditSession::new();
        session.start_create().expect("start");
        session.begin_submit().expect("plan");
        assert_eq!(session.cancel().expect_err("err").kind(), ErrorKind::Busy);
        assert_eq!(session.begin_submit().expect_err("err").kind(), ErrorKind::Busy);

        session.end_submit();
        assert!(!session.is_editing());
        assert!(!session.is_submitting());
        assert!(session.target().is_none());
    }

    #[test]
    fn cancel_clears_target() {
        let store = store_with("p1", None);
        let mut session = EditSession::new();
        session
            .start_edit(&store, &PostId::new("p1"))
            .expect("start");
        session.cancel().expect("cancel");
        assert!(!session.is_editing());
        assert!(session.target().is_none());
    }
}
