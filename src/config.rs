//! Process Configuration
//! Mission: Everything injectable lives here, loaded once at startup

use std::env;
use std::net::SocketAddr;

/// Runtime configuration assembled from the environment. Secrets are never
/// compiled in; defaults exist only for local development.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP server binds to
    pub bind_addr: SocketAddr,
    /// Path of the SQLite database file
    pub db_path: String,
    /// Shared secret for HS256 token signing
    pub jwt_secret: String,
    /// Bearer token lifetime in minutes
    pub token_ttl_minutes: i64,
    /// Password given to the bootstrap admin account
    pub bootstrap_admin_password: String,
    /// Role evaluation order for reads that branch on the caller's role.
    /// First matching role wins.
    pub role_precedence: Vec<String>,
    /// API key for the tutoring model, if configured
    pub gemini_api_key: Option<String>,
    /// Tutoring model identifier
    pub tutor_model: String,
}

const DEFAULT_TOKEN_TTL_MINUTES: i64 = 30;
const DEFAULT_ROLE_PRECEDENCE: &str = "admin,instructor,student";

impl Config {
    /// Load configuration from the environment with development defaults.
    pub fn from_env() -> Self {
        let bind_addr = env::var("BIND_ADDR")
            .ok()
            .and_then(|v| v.parse::<SocketAddr>().ok())
            .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 8000)));

        let db_path = env::var("DATABASE_PATH").unwrap_or_else(|_| "classhub.db".to_string());

        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            tracing::warn!("⚠️  JWT_SECRET not set, using development default");
            "dev-only-secret-change-me".to_string()
        });

        let token_ttl_minutes = env::var("TOKEN_TTL_MINUTES")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .filter(|&v| v > 0)
            .unwrap_or(DEFAULT_TOKEN_TTL_MINUTES);

        let bootstrap_admin_password =
            env::var("BOOTSTRAP_ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".to_string());

        let role_precedence = env::var("ROLE_PRECEDENCE")
            .unwrap_or_else(|_| DEFAULT_ROLE_PRECEDENCE.to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let gemini_api_key = env::var("GEMINI_API_KEY").ok().filter(|k| !k.is_empty());

        let tutor_model =
            env::var("TUTOR_MODEL").unwrap_or_else(|_| "gemini-1.5-flash".to_string());

        Self {
            bind_addr,
            db_path,
            jwt_secret,
            token_ttl_minutes,
            bootstrap_admin_password,
            role_precedence,
            gemini_api_key,
            tutor_model,
        }
    }
}
