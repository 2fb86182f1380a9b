//! Purpose: Hold the currently displayed page of posts and the feed total.
//! Exports: `FeedStore`, `Mutation`, `MergeOutcome`.
//! Role: Pure in-memory state; only the controller mutates it, and only on success paths.
//! Invariants: The held sequence never exceeds `PAGE_SIZE` entries after a merge.
//! Invariants: `replace_all` discards prior contents unconditionally.
use super::pagination::PAGE_SIZE;
use super::post::{Post, PostId};

/// Which kind of save produced the post being merged.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Mutation {
    Create,
    Update { target: PostId },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MergeOutcome {
    Prepended { dropped_last: bool },
    Replaced { index: usize },
    /// The update target is no longer on the displayed page; nothing changed.
    TargetMissing,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FeedStore {
    posts: Vec<Post>,
    total: u64,
}

impl FeedStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn find(&self, id: &PostId) -> Option<&Post> {
        self.posts.iter().find(|post| &post.id == id)
    }

    pub fn replace_all(&mut self, posts: Vec<Post>, total: u64) {
        self.posts = posts;
        self.total = total;
    }

    /// Empties the displayed sequence while a page load is pending.
    pub fn clear_posts(&mut self) {
        self.posts.clear();
    }

    pub fn merge_after_mutation(&mut self, saved: Post, mutation: &Mutation) -> MergeOutcome {
        match mutation {
            Mutation::Update { target } => {
                let Some(index) = self.posts.iter().position(|post| &post.id == target) else {
                    return MergeOutcome::TargetMissing;
                };
                self.posts[index] = saved;
                MergeOutcome::Replaced { index }
            }
            Mutation::Create => {
                self.total += 1;
                let dropped_last = self.posts.len() >= PAGE_SIZE;
                if dropped_last {
                    self.posts.truncate(PAGE_SIZE - 1);
                }
                self.posts.insert(0, saved);
                MergeOutcome::Prepended { dropped_last }
            }
        }
    }
}
