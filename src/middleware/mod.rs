mod api_secret;
mod session_auth;

pub use api_secret::*;
pub use session_auth::*;
