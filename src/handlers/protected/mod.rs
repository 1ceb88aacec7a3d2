// handlers/protected/mod.rs - Handlers that run behind the auth gate
//
// Every route here is mounted with at least `Gate::verify()`; handlers receive the
// verified `Principal` through the extractor in `middleware::gate`.

pub mod auth;
pub mod users;

pub use users::users_get;
