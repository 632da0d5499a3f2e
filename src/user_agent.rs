//! Shared User-Agent string for API and file-download traffic.

/// Project URL for User-Agent identification.
const PROJECT_UA_URL: &str = "https://github.com/projctl/projctl";

/// Default User-Agent for every request the tool sends.
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("projctl/{version} (+{PROJECT_UA_URL})")
}
