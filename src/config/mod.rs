use serde::Deserialize;
use config::{Config, ConfigError, Environment, File};

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub policy: PolicyConfig,
    #[serde(default)]
    pub listing: ListingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub session_duration_hours: i64,
    #[serde(default)]
    pub secure_cookies: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Directory holding one sub-directory per bucket.
    pub root: String,
    /// Prefix for public object URLs, e.g. `/storage`.
    pub public_base_url: String,
    pub max_file_size_bytes: usize,
}

/// What to do when the role row for a signed-in user can't be read.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RoleLookupFailurePolicy {
    /// Treat the user as a student, the least privileged role.
    #[default]
    DefaultToStudent,
    /// Refuse the request.
    Deny,
}

/// What to do when one attachment in a submission fails to upload.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentFailurePolicy {
    /// Keep going; the notice is stored with the attachments that made it.
    #[default]
    SkipFailed,
    /// Fail the whole submission before the notice row is inserted.
    Abort,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct PolicyConfig {
    #[serde(default)]
    pub role_lookup_failure: RoleLookupFailurePolicy,
    #[serde(default)]
    pub attachment_upload_failure: AttachmentFailurePolicy,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ListingConfig {
    /// Upper bound for an explicit `limit`. Unbounded listings ignore it.
    pub max_limit: i64,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            max_limit: 200,
        }
    }
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.base_url", "http://localhost:8080")?
            .set_default("database.url", "sqlite://noticeboard.db?mode=rwc")?
            .set_default("database.max_connections", 10)?
            .set_default("auth.session_duration_hours", 24)?
            .set_default("auth.secure_cookies", false)?
            .set_default("storage.root", "storage")?
            .set_default("storage.public_base_url", "/storage")?
            .set_default("storage.max_file_size_bytes", 20 * 1024 * 1024)?
            .set_default("policy.role_lookup_failure", "default_to_student")?
            .set_default("policy.attachment_upload_failure", "skip_failed")?
            .set_default("listing.max_limit", 200)?

            // Add config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))

            // Add environment variables (with NOTICEBOARD__ prefix, double underscore separates levels)
            .add_source(Environment::with_prefix("NOTICEBOARD").separator("__"))

            .build()?;

        config.try_deserialize()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                base_url: "http://localhost:8080".to_string(),
            },
            database: DatabaseConfig {
                url: "sqlite://noticeboard.db?mode=rwc".to_string(),
                max_connections: 10,
            },
            auth: AuthConfig {
                session_duration_hours: 24,
                secure_cookies: false,
            },
            storage: StorageConfig {
                root: "storage".to_string(),
                public_base_url: "/storage".to_string(),
                max_file_size_bytes: 20 * 1024 * 1024,
            },
            policy: PolicyConfig::default(),
            listing: ListingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policies_default_to_lenient_behaviour() {
        let settings = Settings::default();
        assert_eq!(settings.policy.role_lookup_failure, RoleLookupFailurePolicy::DefaultToStudent);
        assert_eq!(settings.policy.attachment_upload_failure, AttachmentFailurePolicy::SkipFailed);
    }

    #[test]
    fn policy_names_deserialize_from_snake_case() {
        let policy: PolicyConfig = serde_json::from_str(
            r#"{"role_lookup_failure":"deny","attachment_upload_failure":"abort"}"#,
        )
        .unwrap();
        assert_eq!(policy.role_lookup_failure, RoleLookupFailurePolicy::Deny);
        assert_eq!(policy.attachment_upload_failure, AttachmentFailurePolicy::Abort);
    }
}
