// handlers/mod.rs - Route handlers by security tier
//
// Public (no auth) → Protected (bearer JWT, forwarded to the database for
// row-level policy checks)

pub mod protected;
pub mod public;
