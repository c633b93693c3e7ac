use crate::ClientError;
use secrecy::SecretString;

pub const DEFAULT_STRAVA_BASE_URL: &str = "https://www.strava.com/api/v3";
pub const DEFAULT_STRAVA_OAUTH_URL: &str = "https://www.strava.com/oauth/token";
pub const DEFAULT_NOTION_BASE_URL: &str = "https://api.notion.com/v1";
pub const NOTION_VERSION: &str = "2022-06-28";

#[derive(Clone, Debug)]
pub struct StravaConfig {
    pub client_id: String,
    pub client_secret: SecretString,
    pub refresh_token: SecretString,
    pub base_url: String,
    pub oauth_url: String,
}

impl StravaConfig {
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_env_with(|k| std::env::var(k).ok())
    }

    /// Read configuration through `get` so tests never touch the process environment.
    pub fn from_env_with<F>(mut get: F) -> Result<Self, ClientError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let client_id = required(&mut get, "STRAVA_CLIENT_ID")?;
        let client_secret = required(&mut get, "STRAVA_CLIENT_SECRET")?;
        let refresh_token = required(&mut get, "STRAVA_REFRESH_TOKEN")?;
        let base_url = get("STRAVA_BASE_URL").unwrap_or_else(|| DEFAULT_STRAVA_BASE_URL.into());
        let oauth_url = get("STRAVA_OAUTH_URL").unwrap_or_else(|| DEFAULT_STRAVA_OAUTH_URL.into());
        Ok(Self {
            client_id,
            client_secret: SecretString::new(client_secret.into()),
            refresh_token: SecretString::new(refresh_token.into()),
            base_url,
            oauth_url,
        })
    }
}

#[derive(Clone, Debug)]
pub struct NotionConfig {
    pub token: SecretString,
    pub base_url: String,
}

impl NotionConfig {
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_env_with(|k| std::env::var(k).ok())
    }

    pub fn from_env_with<F>(mut get: F) -> Result<Self, ClientError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let token = required(&mut get, "NOTION_TOKEN")?;
        let base_url = get("NOTION_BASE_URL").unwrap_or_else(|| DEFAULT_NOTION_BASE_URL.into());
        Ok(Self {
            token: SecretString::new(token.into()),
            base_url,
        })
    }
}

fn required<F>(get: &mut F, key: &str) -> Result<String, ClientError>
where
    F: FnMut(&str) -> Option<String>,
{
    get(key)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ClientError::Config(format!("{key} missing")))
}
