// handlers/protected/mod.rs - Protected handlers (session token required)
//
// Every handler here runs behind `jwt_auth_middleware` and receives an
// `AuthUser`. Checks run in a fixed order: module/role (403), input (400),
// bar access (403), then the data call or downstream relay.
pub mod auth;
pub mod backups;
pub mod checklists;
pub mod integracoes;
pub mod notificacoes;
pub mod receitas;
pub mod utils;
pub mod vendas;
