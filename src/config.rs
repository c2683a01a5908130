use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// URL pubblico del relay, usato come base per i webhook Replicate
    pub public_url: String,
    pub replicate_api_token: Option<String>,
    pub replicate_api_base: String,
    pub plugger_api_key: Option<String>,
    pub plugger_url: String,
    /// Token OAuth statico per GCS (alternativa al service account)
    pub gcs_access_token: Option<String>,
    /// Key file del service account Google
    pub gcs_credentials_path: Option<PathBuf>,
    pub gcs_api_base: String,
    pub resend_api_key: Option<String>,
    pub resend_api_base: String,
    pub email_from: String,
    pub email_cc: Option<String>,
    pub email_subject: String,
    pub download_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            public_url: "http://localhost:8000".to_string(),
            replicate_api_token: None,
            replicate_api_base: "https://api.replicate.com/v1".to_string(),
            plugger_api_key: None,
            plugger_url: "https://inference.plugger.ai/".to_string(),
            gcs_access_token: None,
            gcs_credentials_path: None,
            gcs_api_base: "https://storage.googleapis.com".to_string(),
            resend_api_key: None,
            resend_api_base: "https://api.resend.com".to_string(),
            email_from: "Image Bot <images@example.com>".to_string(),
            email_cc: None,
            email_subject: "KI Bild".to_string(),
            download_timeout_secs: 10_000,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(host) = std::env::var("RELAY_HOST") {
            config.host = host;
        }

        if let Ok(port) = std::env::var("RELAY_PORT") {
            if let Ok(p) = port.parse() {
                config.port = p;
            }
        }

        if let Ok(url) = std::env::var("PUBLIC_URL") {
            config.public_url = url;
        }

        config.replicate_api_token = non_empty_var("REPLICATE_API_TOKEN");

        if let Ok(base) = std::env::var("REPLICATE_API_BASE") {
            config.replicate_api_base = base;
        }

        config.plugger_api_key = non_empty_var("PLUGGER_API_KEY");

        if let Ok(url) = std::env::var("PLUGGER_URL") {
            config.plugger_url = url;
        }

        config.gcs_access_token = non_empty_var("GCS_ACCESS_TOKEN");
        config.gcs_credentials_path =
            non_empty_var("GOOGLE_APPLICATION_CREDENTIALS").map(PathBuf::from);

        if let Ok(base) = std::env::var("GCS_API_BASE") {
            config.gcs_api_base = base;
        }

        config.resend_api_key = non_empty_var("RESEND_API_KEY");

        if let Ok(base) = std::env::var("RESEND_API_BASE") {
            config.resend_api_base = base;
        }

        if let Ok(from) = std::env::var("EMAIL_FROM") {
            config.email_from = from;
        }

        config.email_cc = non_empty_var("EMAIL_CC");

        if let Ok(subject) = std::env::var("EMAIL_SUBJECT") {
            config.email_subject = subject;
        }

        if let Ok(secs) = std::env::var("DOWNLOAD_TIMEOUT_SECS") {
            if let Ok(s) = secs.parse() {
                config.download_timeout_secs = s;
            }
        }

        config
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }

    /// Base dei webhook senza slash finale
    pub fn callback_base(&self) -> &str {
        self.public_url.trim_end_matches('/')
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.port, 8000);
        assert_eq!(config.email_subject, "KI Bild");
        assert_eq!(config.download_timeout(), Duration::from_secs(10_000));
    }

    #[test]
    fn test_callback_base_trims_slash() {
        let config = Config {
            public_url: "https://relay.example.com//".to_string(),
            ..Default::default()
        };
        assert_eq!(config.callback_base(), "https://relay.example.com");
    }
}
