// handlers/protected/mod.rs - Bearer-authenticated endpoints
//
// Every handler here receives the caller as an `AuthUser` extension and builds
// a caller-scoped `ProjectService`; ownership is enforced by the database.

pub mod configs;
pub mod projects;
