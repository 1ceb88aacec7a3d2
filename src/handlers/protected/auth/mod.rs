// handlers/protected/auth/mod.rs - Session endpoints for authenticated users

pub mod me; // GET /api/auth/me

pub use me::me_get;
