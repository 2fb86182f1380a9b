//! Purpose: Client-side controller for a paginated, editable post feed.
//! Exports: `api` (controller, gateway seam, HTTP gateway) and `core` (feed state and errors).
//! Role: Library crate embedded by a UI layer that renders `FeedView` and forwards user actions.
//! Invariants: Core modules are synchronous and own no I/O; all remote calls live in `api`.
//! Invariants: The bearer credential is supplied by the embedder and never refreshed here.
pub mod api;
pub mod core;
