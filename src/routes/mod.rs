/// Router Module Index
///
/// Splits the routing table by how each endpoint authenticates, so access control is
/// visible at the module level rather than scattered across handlers.

/// Routes accessible to anonymous clients (health, listing reads).
pub mod public;

/// Routes wrapped in the `auth_middleware` layer. Requires a valid bearer token.
pub mod authenticated;

/// Routes whose handlers resolve authentication themselves, after checking that the target
/// application exists.
pub mod owner;
