use std::env;

/// How inbound bearer tokens are verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStrategy {
    /// HS256 tokens issued by this service and checked against a local secret.
    Local,
    /// RS256 tokens issued by Auth0 and checked against its published JWKS.
    Auth0,
}

/// Who may mutate a book once the caller is authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationPolicy {
    /// Every mutation requires a stored user with the admin flag set.
    AdminRole,
    /// Create is open to any verified identity; update/delete require
    /// the record's creator.
    Owner,
}

#[derive(Debug, Clone)]
pub struct Auth0Config {
    pub domain: String,
    pub audience: String,
    /// Only needed for the login redirect / code-exchange endpoints.
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    pub base_url: String,
    pub auth_strategy: AuthStrategy,
    pub mutation_policy: MutationPolicy,
    /// Secret for the local HS256 path. Randomized per process when unset,
    /// which invalidates outstanding tokens across restarts.
    pub jwt_secret: String,
    pub token_ttl_secs: i64,
    pub jwks_ttl_secs: u64,
    pub auth0: Option<Auth0Config>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        let base_url =
            env::var("BASE_URL").unwrap_or_else(|_| format!("http://{}:{}", host, port));

        let auth_strategy = match env::var("AUTH_STRATEGY").ok().as_deref() {
            Some("auth0") => AuthStrategy::Auth0,
            Some("local") | None => AuthStrategy::Local,
            Some(other) => {
                tracing::warn!("unknown AUTH_STRATEGY '{}', defaulting to local", other);
                AuthStrategy::Local
            }
        };

        let mutation_policy = match env::var("MUTATION_POLICY").ok().as_deref() {
            Some("admin") => MutationPolicy::AdminRole,
            Some("owner") | None => MutationPolicy::Owner,
            Some(other) => {
                tracing::warn!("unknown MUTATION_POLICY '{}', defaulting to owner", other);
                MutationPolicy::Owner
            }
        };

        let jwt_secret = env::var("JWT_SECRET_KEY").unwrap_or_else(|_| {
            tracing::warn!("JWT_SECRET_KEY not set, generating a per-process secret");
            uuid::Uuid::new_v4().to_string()
        });

        let token_ttl_secs: i64 = env::var("TOKEN_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3600);

        let jwks_ttl_secs: u64 = env::var("JWKS_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(600);

        let auth0 = match (
            env::var("AUTH0_DOMAIN").ok(),
            env::var("AUTH0_API_AUDIENCE").ok(),
        ) {
            (Some(domain), Some(audience)) => Some(Auth0Config {
                domain,
                audience,
                client_id: env::var("AUTH0_CLIENT_ID").ok(),
                client_secret: env::var("AUTH0_CLIENT_SECRET").ok(),
            }),
            _ => None,
        };

        Self {
            host,
            port,
            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "bookstack.db".to_string()),
            base_url,
            auth_strategy,
            mutation_policy,
            jwt_secret,
            token_ttl_secs,
            jwks_ttl_secs,
            auth0,
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
