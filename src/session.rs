use std::fmt;

/// Connection details for the Phoenix backend.
///
/// Built once from configuration and handed to every client that talks to
/// the backend.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    api_base_url: String,
    token: Option<String>,
}

impl Session {
    pub fn new(api_base_url: &str, token: Option<String>) -> Self {
        Self {
            api_base_url: api_base_url.trim_end_matches('/').to_owned(),
            token: token.filter(|token| !token.trim().is_empty()),
        }
    }

    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base_url, path.trim_start_matches('/'))
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Value of the `Authorization` header if a token is present
    pub fn bearer(&self) -> Option<String> {
        self.token.as_ref().map(|token| format!("Bearer {}", token))
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("api_base_url", &self.api_base_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_paths() {
        let session = Session::new("https://example.com/api/", None);
        assert_eq!(
            session.endpoint("/tts/generate"),
            "https://example.com/api/tts/generate"
        );
        assert_eq!(session.endpoint("tts/voices"), "https://example.com/api/tts/voices");
    }

    #[test]
    fn bearer_header() {
        let session = Session::new("https://example.com/api", Some("abc".to_owned()));
        assert_eq!(session.bearer(), Some("Bearer abc".to_owned()));
        let anonymous = Session::new("https://example.com/api", Some("  ".to_owned()));
        assert_eq!(anonymous.bearer(), None);
    }

    #[test]
    fn debug_hides_token() {
        let session = Session::new("https://example.com/api", Some("secret".to_owned()));
        let printed = format!("{:?}", session);
        assert!(!printed.contains("secret"));
        assert!(printed.contains("redacted"));
    }
}
