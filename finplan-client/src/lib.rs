//! # FinPlan Client Library
//!
//! The client-side session lifecycle for FinPlan: a small state machine
//! (`Unauthenticated` / `Verifying` / `Authenticated`) driven by a
//! swappable [`backend::AuthBackend`] capability.
//!
//! Two backend implementations exist:
//!
//! - [`http::HttpAuthBackend`]: talks to a real FinPlan API server
//! - [`mock::MockAuthBackend`]: in-memory stub for tests and offline work
//!
//! The backend is chosen by construction, never by a runtime flag.
//!
//! ## Example
//!
//! ```no_run
//! use finplan_client::{mock::MockAuthBackend, session::AuthSession};
//! use std::sync::Arc;
//!
//! # async fn example() {
//! let mut session = AuthSession::new(Arc::new(MockAuthBackend::new()));
//!
//! // Page-load lifecycle: verify whatever credential was stored
//! session.init(None).await;
//! assert!(!session.is_authenticated());
//!
//! match session.login("user@example.com", "secret1").await {
//!     Ok(user) => println!("Hello, {}", user.first_name),
//!     Err(err) => eprintln!("{}", err),
//! }
//! # }
//! ```

pub mod backend;
pub mod error;
pub mod http;
pub mod mock;
pub mod session;

pub use backend::{AuthBackend, AuthSuccess, UserProfile};
pub use error::ClientError;
pub use session::{AuthSession, SessionState};
