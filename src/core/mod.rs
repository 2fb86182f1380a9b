// Core modules holding feed state, pagination, edit-session rules, and errors.
pub mod edit;
pub mod error;
pub mod pagination;
pub mod post;
pub mod store;
