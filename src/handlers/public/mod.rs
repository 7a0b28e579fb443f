// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Service info, health probe and session acquisition.
pub mod auth;
pub mod health;
