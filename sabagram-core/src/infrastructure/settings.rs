use anyhow::{Context, Result, anyhow};

#[derive(Debug, Clone)]
pub struct Settings {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_access_token: Option<String>,
    pub admin_key: Option<String>,
    pub log_level: String,
    pub comment_preview_limit: usize,
    pub feed_page_size: u32,
    pub http_connect_timeout_secs: u64,
    pub http_request_timeout_secs: u64,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Собирает настройки из произвольного источника пар ключ-значение.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let supabase_url =
            get_required(&lookup, "SUPABASE_URL").context("SUPABASE_URL is required")?;
        if !supabase_url.starts_with("http://") && !supabase_url.starts_with("https://") {
            return Err(anyhow!("SUPABASE_URL must start with http:// or https://"));
        }
        let supabase_anon_key =
            get_required(&lookup, "SUPABASE_ANON_KEY").context("SUPABASE_ANON_KEY is required")?;
        let supabase_access_token = get_optional(&lookup, "SUPABASE_ACCESS_TOKEN");
        let admin_key = get_optional(&lookup, "ADMIN_KEY");

        let log_level = lookup("LOG_LEVEL")
            .or_else(|| lookup("RUST_LOG"))
            .unwrap_or_else(|| "info".to_string());
        let comment_preview_limit = parse_positive(&lookup, "COMMENT_PREVIEW_LIMIT", 2usize)?;
        let feed_page_size = parse_positive(&lookup, "FEED_PAGE_SIZE", 20u32)?;
        let http_connect_timeout_secs = parse_positive(&lookup, "HTTP_CONNECT_TIMEOUT_SECS", 5u64)?;
        let http_request_timeout_secs =
            parse_positive(&lookup, "HTTP_REQUEST_TIMEOUT_SECS", 15u64)?;

        Ok(Self {
            supabase_url: supabase_url.trim_end_matches('/').to_string(),
            supabase_anon_key,
            supabase_access_token,
            admin_key,
            log_level,
            comment_preview_limit,
            feed_page_size,
            http_connect_timeout_secs,
            http_request_timeout_secs,
        })
    }
}

fn get_required<F>(lookup: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(key).ok_or_else(|| anyhow!("{key} is not set"))?;
    let value = value.trim().to_string();
    if value.is_empty() {
        return Err(anyhow!("{key} must not be empty"));
    }
    Ok(value)
}

fn get_optional<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_positive<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + PartialEq + Default + ToString,
{
    let value = lookup(key)
        .unwrap_or_else(|| default.to_string())
        .trim()
        .parse::<T>()
        .map_err(|_| anyhow!("Failed to parse {key}, expecting positive integer"))?;

    if value == T::default() {
        return Err(anyhow!("{key} must be > 0"));
    }
    Ok(value)
}
