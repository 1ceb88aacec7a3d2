// handlers/public/auth/mod.rs - Public authentication handlers
//
// Token acquisition endpoints that do not require authentication.

pub mod login; // POST /api/auth/login - authenticate and get JWT
pub mod register; // POST /api/auth/register - create new account
pub mod utils;

pub use login::login_post;
pub use register::{register_post, TokenResponse};
