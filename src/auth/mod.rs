use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub const ISSUER: &str = "zykor";

/// Roles stored in `usuarios_bar.role`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Financeiro,
    Gerente,
    Funcionario,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Financeiro => "financeiro",
            Role::Gerente => "gerente",
            Role::Funcionario => "funcionario",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "financeiro" => Some(Role::Financeiro),
            "gerente" => Some(Role::Gerente),
            "funcionario" | "funcionário" => Some(Role::Funcionario),
            _ => None,
        }
    }

    /// Rank used when duplicate memberships name different roles for one bar
    fn rank(&self) -> u8 {
        match self {
            Role::Admin => 3,
            Role::Financeiro => 2,
            Role::Gerente => 1,
            Role::Funcionario => 0,
        }
    }

    pub fn highest(self, other: Role) -> Role {
        if other.rank() > self.rank() {
            other
        } else {
            self
        }
    }
}

/// Business areas a non-admin user must be granted explicitly
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Module {
    Checklists,
    Receitas,
    Vendas,
    Financeiro,
    Notificacoes,
    Configuracoes,
}

impl Module {
    pub fn as_str(&self) -> &'static str {
        match self {
            Module::Checklists => "checklists",
            Module::Receitas => "receitas",
            Module::Vendas => "vendas",
            Module::Financeiro => "financeiro",
            Module::Notificacoes => "notificacoes",
            Module::Configuracoes => "configuracoes",
        }
    }
}

/// What a protected operation needs from the caller's grant on a bar
#[derive(Debug, Clone, Copy)]
pub enum Access {
    Module(Module),
    Role(&'static [Role]),
}

impl From<Module> for Access {
    fn from(module: Module) -> Self {
        Access::Module(module)
    }
}

impl From<&'static [Role]> for Access {
    fn from(roles: &'static [Role]) -> Self {
        Access::Role(roles)
    }
}

pub const ADMIN_ONLY: &[Role] = &[Role::Admin];

/// Role and modules a user holds in one bar (one `usuarios_bar` membership)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BarGrant {
    pub bar_id: i64,
    pub role: Role,
    #[serde(default)]
    pub modulos: Vec<String>,
}

impl BarGrant {
    pub fn new(bar_id: i64, role: Role, modulos: Vec<String>) -> Self {
        Self { bar_id, role, modulos }
    }

    /// Bar admins hold every module of their own bar
    pub fn allows(&self, access: Access) -> bool {
        match access {
            Access::Module(module) => {
                self.role == Role::Admin || self.modulos.iter().any(|m| m == module.as_str())
            }
            Access::Role(roles) => roles.contains(&self.role),
        }
    }
}

/// Session token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    #[serde(default)]
    pub nome: Option<String>,
    /// Platform operator; never derived from bar memberships
    #[serde(default)]
    pub superadmin: bool,
    #[serde(default)]
    pub bares: Vec<BarGrant>,
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
}

impl Claims {
    pub fn new(
        sub: Uuid,
        email: String,
        nome: Option<String>,
        superadmin: bool,
        bares: Vec<BarGrant>,
        expiry_hours: u64,
    ) -> Self {
        let now = Utc::now();
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            sub,
            email,
            nome,
            superadmin,
            bares,
            exp,
            iat: now.timestamp(),
            iss: ISSUER.to_string(),
        }
    }

    pub fn expires_in(&self) -> i64 {
        (self.exp - Utc::now().timestamp()).max(0)
    }
}

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Invalid JWT secret")]
    InvalidSecret,

    #[error("JWT expired")]
    Expired,

    #[error("Invalid JWT: {0}")]
    Invalid(String),
}

pub fn generate_jwt(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    let header = Header::default();

    encode(&header, claims, &encoding_key).map_err(|e| JwtError::TokenGeneration(e.to_string()))
}

/// Verify signature, expiry and issuer
pub fn validate_jwt(token: &str, secret: &str) -> Result<Claims, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let mut validation = Validation::default();
    validation.set_issuer(&[ISSUER]);
    validation.leeway = 0;

    decode::<Claims>(token, &decoding_key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => JwtError::Expired,
            _ => JwtError::Invalid(e.to_string()),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "unit-test-secret";

    fn claims(role: Role) -> Claims {
        Claims::new(
            Uuid::new_v4(),
            "gerente@bar.com".to_string(),
            Some("Gerente".to_string()),
            false,
            vec![BarGrant::new(3, role, vec!["checklists".to_string()])],
            1,
        )
    }

    #[test]
    fn token_roundtrip_keeps_claims() {
        let original = claims(Role::Gerente);
        let token = generate_jwt(&original, SECRET).unwrap();
        let decoded = validate_jwt(&token, SECRET).unwrap();
        assert_eq!(decoded.sub, original.sub);
        assert!(!decoded.superadmin);
        assert_eq!(decoded.bares, original.bares);
        assert_eq!(decoded.iss, ISSUER);
    }

    #[test]
    fn rejects_wrong_secret() {
        let token = generate_jwt(&claims(Role::Admin), SECRET).unwrap();
        assert!(matches!(validate_jwt(&token, "other-secret"), Err(JwtError::Invalid(_))));
    }

    #[test]
    fn rejects_expired_token() {
        let mut expired = claims(Role::Admin);
        expired.iat -= 7200;
        expired.exp = Utc::now().timestamp() - 60;
        let token = generate_jwt(&expired, SECRET).unwrap();
        assert!(matches!(validate_jwt(&token, SECRET), Err(JwtError::Expired)));
    }

    #[test]
    fn rejects_foreign_issuer() {
        let mut foreign = claims(Role::Admin);
        foreign.iss = "someone-else".to_string();
        let token = generate_jwt(&foreign, SECRET).unwrap();
        assert!(validate_jwt(&token, SECRET).is_err());
    }

    #[test]
    fn empty_secret_is_refused() {
        assert!(matches!(generate_jwt(&claims(Role::Admin), ""), Err(JwtError::InvalidSecret)));
        assert!(matches!(validate_jwt("x.y.z", ""), Err(JwtError::InvalidSecret)));
    }

    #[test]
    fn role_parsing_and_ranking() {
        assert_eq!(Role::parse("Admin"), Some(Role::Admin));
        assert_eq!(Role::parse("funcionário"), Some(Role::Funcionario));
        assert_eq!(Role::parse("dono"), None);
        assert_eq!(Role::Gerente.highest(Role::Financeiro), Role::Financeiro);
        assert_eq!(Role::Admin.highest(Role::Funcionario), Role::Admin);
    }

    #[test]
    fn grants_are_checked_per_access_kind() {
        let funcionario = BarGrant::new(2, Role::Funcionario, vec!["checklists".to_string()]);
        assert!(funcionario.allows(Module::Checklists.into()));
        assert!(!funcionario.allows(Module::Financeiro.into()));
        assert!(!funcionario.allows(ADMIN_ONLY.into()));

        let admin = BarGrant::new(1, Role::Admin, vec![]);
        assert!(admin.allows(Module::Financeiro.into()));
        assert!(admin.allows(ADMIN_ONLY.into()));
    }
}
