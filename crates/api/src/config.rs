use crate::notifications::email::EmailConfig;

/// Server configuration loaded from environment variables.
///
/// Everything except `APP_KEY` has a default suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Secret mixed into every letter token.
    pub app_key: String,
    /// Public site URL confirmation links point to.
    pub frontend_url: String,
    /// SMTP settings; `None` disables confirmation emails.
    pub email: Option<EmailConfig>,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:3000`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `APP_KEY`              | required                   |
    /// | `FRONTEND_URL`         | `http://localhost:3000`    |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let app_key = std::env::var("APP_KEY").expect("APP_KEY must be set");
        assert!(!app_key.is_empty(), "APP_KEY must not be empty");

        let frontend_url = std::env::var("FRONTEND_URL")
            .unwrap_or_else(|_| "http://localhost:3000".into())
            .trim_end_matches('/')
            .to_string();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            app_key,
            frontend_url,
            email: EmailConfig::from_env(),
        }
    }

    /// Link a signer follows to confirm their signature.
    pub fn confirmation_url(&self, token: &str) -> String {
        format!("{}/confirm_signature?token={token}", self.frontend_url)
    }

    /// Public page of a letter in one locale.
    pub fn letter_url(&self, slug: &str, locale: &str) -> String {
        format!("{}/{locale}/{slug}", self.frontend_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_links_use_frontend_url() {
        let config = ServerConfig {
            host: "127.0.0.1".into(),
            port: 0,
            cors_origins: vec![],
            request_timeout_secs: 30,
            app_key: "k".into(),
            frontend_url: "https://letters.example.org".into(),
            email: None,
        };
        assert_eq!(
            config.confirmation_url("abc"),
            "https://letters.example.org/confirm_signature?token=abc"
        );
        assert_eq!(
            config.letter_url("clean-air-1a2b3c4d", "fr"),
            "https://letters.example.org/fr/clean-air-1a2b3c4d"
        );
    }
}
