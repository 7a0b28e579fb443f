// handlers/mod.rs - two security tiers
//
// Public (no session) → Protected (session token via bearer header or cookie)
pub mod protected;
pub mod public;
