//! Provider credentials and browser session cookies.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use super::ConfigError;

static CREDENTIALS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([^:]+?):([^:]+?)(?::(.+))?$").unwrap());

/// Placeholder shipped in example configs.
const PLACEHOLDER: &str = "user:pass";

/// Cookie injected by the provider's DDoS guard; replaying it breaks the session.
const IGNORED_COOKIE: &str = "__ddg9__";

/// Basic-auth credentials for a provider.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// Parse a `username:password` string.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        if raw == PLACEHOLDER {
            return Err(ConfigError::ValidationError(
                "credentials are still the 'user:pass' placeholder".to_string(),
            ));
        }

        let caps = CREDENTIALS_RE.captures(raw).ok_or_else(|| {
            ConfigError::ValidationError(
                "incorrect credentials format (expected 'user:pass')".to_string(),
            )
        })?;

        Ok(Self {
            username: caps[1].to_string(),
            password: caps[2].to_string(),
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Session cookies keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionCookies(BTreeMap<String, String>);

impl SessionCookies {
    /// Parse the Netscape `cookies.txt` format (tab separated, `#` comments).
    pub fn parse_netscape(content: &str) -> Self {
        let mut cookies = BTreeMap::new();
        for line in content.lines() {
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() < 2 {
                continue;
            }
            let name = fields[fields.len() - 2];
            let value = fields[fields.len() - 1];
            if name == IGNORED_COOKIE {
                continue;
            }
            cookies.insert(name.to_string(), value.trim_end().to_string());
        }
        Self(cookies)
    }

    /// Load cookies from a Netscape `cookies.txt` file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::ParseError(format!("failed to read cookies {}: {}", path.display(), e))
        })?;
        Ok(Self::parse_netscape(&content))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Render as a `Cookie` request header value.
    pub fn header_value(&self) -> String {
        self.0
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl FromIterator<(String, String)> for SessionCookies {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_credentials() {
        let creds = Credentials::parse("alice:s3cret").unwrap();
        assert_eq!(creds.username, "alice");
        assert_eq!(creds.password, "s3cret");
    }

    #[test]
    fn test_parse_credentials_with_trailing_segment() {
        let creds = Credentials::parse("alice:s3cret:extra").unwrap();
        assert_eq!(creds.username, "alice");
        assert_eq!(creds.password, "s3cret");
    }

    #[test]
    fn test_parse_credentials_rejects_placeholder_and_garbage() {
        assert!(Credentials::parse("user:pass").is_err());
        assert!(Credentials::parse("alice").is_err());
        assert!(Credentials::parse(":secret").is_err());
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let creds = Credentials::parse("alice:s3cret").unwrap();
        assert!(!format!("{:?}", creds).contains("s3cret"));
    }

    #[test]
    fn test_parse_netscape_cookies() {
        let content = "# Netscape HTTP Cookie File\n\
            \n\
            nyaa.si\tFALSE\t/\tTRUE\t1999999999\tsession\tabc123\n\
            nyaa.si\tFALSE\t/\tFALSE\t1999999999\t__ddg9__\t1.2.3.4\n\
            nyaa.si\tFALSE\t/\tFALSE\t1999999999\tremember_token\txyz\n";
        let cookies = SessionCookies::parse_netscape(content);
        assert_eq!(cookies.len(), 2);
        assert_eq!(cookies.get("session"), Some("abc123"));
        assert_eq!(cookies.get("__ddg9__"), None);
        assert_eq!(cookies.header_value(), "remember_token=xyz; session=abc123");
    }
}
