/// Get environment variable with HOOKGUARD_ prefix, falling back to unprefixed version
///
/// `HOOKGUARD_{key}` wins over `{key}`, so a deployment can namespace its
/// settings while `.env` files written for other tooling keep working.
///
/// # Examples
///
/// ```rust
/// use hookguard::utils::get_env_with_prefix;
///
/// // Checks HOOKGUARD_WEBHOOK_SECRET first, then WEBHOOK_SECRET
/// let secret = get_env_with_prefix("WEBHOOK_SECRET");
/// ```
pub fn get_env_with_prefix(key: &str) -> Option<String> {
    std::env::var(format!("HOOKGUARD_{}", key))
        .or_else(|_| std::env::var(key))
        .ok()
}

/// Like [`get_env_with_prefix`], parsed into `T`. Unparsable values are ignored.
pub fn parse_env_with_prefix<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = get_env_with_prefix(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key = key, value = %raw, "Ignoring unparsable environment variable");
            None
        }
    }
}
