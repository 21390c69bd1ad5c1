//! # cmtours-client
//!
//! Authenticated HTTP client for the City Muscat Tours REST backend.
//!
//! The client owns the whole token lifecycle: bearer attachment, proactive
//! refresh of locally expired access tokens, a single retry after a 401,
//! and conservative classification of 401 messages so that a validation or
//! permission failure on that status never destroys a valid session. The
//! backend communicates semantics only through free-text messages, so the
//! classification is a pure string-matching function kept testable in
//! isolation.

pub mod classify;
pub mod client;
pub mod refresh;
pub mod response;

pub use classify::{UnauthorizedKind, classify_unauthorized};
pub use client::ApiClient;
pub use refresh::RefreshCoordinator;

pub use reqwest::Method;
