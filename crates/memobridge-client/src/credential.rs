//! Credential URL parsing.
//!
//! A session is bound to one URL of the form
//! `https://host[:port][/prefix]/api/note?<opaque query>`. The query carries
//! the secret and is appended to every request.

use std::fmt;

use memobridge_core::{defaults, note_link, Error, Result};
use reqwest::Url;

/// A validated API credential.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    origin: String,
    prefix: String,
    query: String,
}

impl Credential {
    /// Validate the shape of a credential URL.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidCredential`] when the string is not an http(s) URL
    /// with a host, does not point at `/api/note`, or has no query.
    pub fn parse(raw: &str) -> Result<Self> {
        let url = Url::parse(raw.trim())
            .map_err(|e| Error::InvalidCredential(format!("not a URL: {}", e)))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::InvalidCredential(format!(
                "unsupported scheme: {}",
                url.scheme()
            )));
        }
        if url.host_str().is_none() {
            return Err(Error::InvalidCredential("missing host".to_string()));
        }

        let path = url.path().trim_end_matches('/');
        let prefix = path
            .strip_suffix(defaults::CREDENTIAL_PATH)
            .ok_or_else(|| {
                Error::InvalidCredential(format!(
                    "path must end with {}, got {}",
                    defaults::CREDENTIAL_PATH,
                    url.path()
                ))
            })?
            .to_string();

        let query = url
            .query()
            .filter(|q| !q.is_empty())
            .ok_or_else(|| Error::InvalidCredential("missing query credential".to_string()))?
            .to_string();

        Ok(Self {
            origin: url.origin().ascii_serialization(),
            prefix,
            query,
        })
    }

    /// `scheme://host[:port]`.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Full URL for an API path, credential query included.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}{}?{}", self.origin, self.prefix, path, self.query)
    }

    /// Human-facing link to a note.
    pub fn note_link(&self, id: i64) -> String {
        note_link(&format!("{}{}", self.origin, self.prefix), id)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("origin", &self.origin)
            .field("prefix", &self.prefix)
            .field("query", &"<redacted>")
            .finish()
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}?…", self.origin, self.prefix, defaults::CREDENTIAL_PATH)
    }
}

impl std::str::FromStr for Credential {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let c = Credential::parse("https://memos.example.com/api/note?openId=abc").unwrap();
        assert_eq!(c.origin(), "https://memos.example.com");
        assert_eq!(
            c.endpoint("/api/tag"),
            "https://memos.example.com/api/tag?openId=abc"
        );
        assert_eq!(c.note_link(12), "https://memos.example.com/m/12");
    }

    #[test]
    fn test_parse_with_port_and_prefix() {
        let c = Credential::parse("http://10.0.0.2:5230/memos/api/note/?openId=x&v=1").unwrap();
        assert_eq!(c.origin(), "http://10.0.0.2:5230");
        assert_eq!(
            c.endpoint("/api/resource/blob"),
            "http://10.0.0.2:5230/memos/api/resource/blob?openId=x&v=1"
        );
        assert_eq!(c.note_link(3), "http://10.0.0.2:5230/memos/m/3");
    }

    #[test]
    fn test_rejects_wrong_path() {
        let err = Credential::parse("https://memos.example.com/api/tag?openId=abc").unwrap_err();
        assert!(matches!(err, Error::InvalidCredential(_)));
    }

    #[test]
    fn test_rejects_missing_query() {
        for raw in [
            "https://memos.example.com/api/note",
            "https://memos.example.com/api/note?",
        ] {
            let err = Credential::parse(raw).unwrap_err();
            assert!(matches!(err, Error::InvalidCredential(_)), "{raw}");
        }
    }

    #[test]
    fn test_rejects_non_http() {
        assert!(Credential::parse("ftp://host/api/note?openId=a").is_err());
        assert!(Credential::parse("not a url").is_err());
    }

    #[test]
    fn test_debug_redacts_query() {
        let c = Credential::parse("https://h.example/api/note?openId=topsecret").unwrap();
        assert!(!format!("{:?}", c).contains("topsecret"));
        assert!(!c.to_string().contains("topsecret"));
    }
}
