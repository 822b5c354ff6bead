//! Authentication
//!
//! Session tokens are issued by the remote chat server at login and
//! stored on the local user. The registry keeps the live remote client
//! for each logged-in user; the extractor ties both together per request.

mod middleware;
pub mod session;

pub use middleware::CurrentUser;
pub use session::SessionRegistry;
