// handlers/mod.rs - Handler tiers
//
// public    - no authentication (root, health, token acquisition)
// protected - bearer token required, some routes additionally role-restricted
// resources - generic document controller behind the opaque resource groups
//
// Which gate guards which handler is decided in `routes`, never inside a handler.

pub mod protected;
pub mod public;
pub mod resources;
