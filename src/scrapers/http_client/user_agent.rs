//! User agent presets.

/// Sent when no user agent is configured.
pub const USER_AGENT: &str = "Mozilla/5.0 (compatible; YaizuMCPScraper/1.0)";

/// Desktop browser agent; the documentation portal serves its login flow to it.
pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";

/// Configured user agent: `None` for the default, `"browser"` for
/// [`BROWSER_USER_AGENT`], anything else verbatim.
pub fn resolve_user_agent(config: Option<&str>) -> String {
    match config.map(str::trim).filter(|s| !s.is_empty()) {
        None => USER_AGENT.to_string(),
        Some("browser") => BROWSER_USER_AGENT.to_string(),
        Some(custom) => custom.to_string(),
    }
}
