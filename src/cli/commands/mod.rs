pub mod invoke;
pub mod ping;
pub mod routes;
pub mod token;
