//! Page identity and storage-key derivation.
//!
//! A page is identified by its origin plus a normalized path. Over time the
//! highlighter has persisted anchors under several key shapes for the same
//! page (with the query string, with the raw trailing slash, hashed). All of
//! them are aliases of one identity: [`DocumentIdentity::key_set`] returns the
//! canonical key first, followed by every alias in a fixed priority order.
//!
//! ```rust
//! use canonical::DocumentIdentity;
//!
//! let identity = DocumentIdentity::from_location("https://example.com/docs/?page=2#intro").unwrap();
//! let keys = identity.key_set();
//! assert_eq!(keys.canonical(), "highlights_https://example.com/docs");
//! assert_eq!(keys.aliases()[0], "highlights_https://example.com/docs?page=2");
//! assert_eq!(keys.aliases()[1], "highlights_https://example.com/docs/");
//! ```

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::CanonicalError;
use crate::hash::short_digest;

/// Prefix shared by every location-derived storage key.
pub const KEY_PREFIX: &str = "highlights_";

/// Prefix of the legacy hashed key shape.
pub const HASHED_KEY_PREFIX: &str = "highlights_h";

const HASHED_KEY_DIGEST_LEN: usize = 16;

/// Stable logical identifier for "this page" across reloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentIdentity {
    origin: String,
    path: String,
    raw_path: String,
    query: Option<String>,
}

impl DocumentIdentity {
    /// Derive an identity from a full location string.
    ///
    /// Only `http`, `https` and `file` locations qualify; fragments are ignored.
    pub fn from_location(location: &str) -> Result<Self, CanonicalError> {
        let url = Url::parse(location).map_err(|err| CanonicalError::InvalidUrl {
            location: location.to_string(),
            reason: err.to_string(),
        })?;

        let origin = match url.scheme() {
            "http" | "https" => url.origin().ascii_serialization(),
            "file" => "file://".to_string(),
            other => return Err(CanonicalError::UnsupportedScheme(other.to_string())),
        };

        let raw_path = url.path().to_string();
        Ok(Self {
            origin,
            path: normalize_path(&raw_path).to_string(),
            raw_path,
            query: url
                .query()
                .filter(|query| !query.is_empty())
                .map(str::to_string),
        })
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Path with a single trailing slash removed (except for `/`).
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Canonical key plus every alias key, in priority order.
    pub fn key_set(&self) -> KeySet {
        let base = format!("{}{}", self.origin, self.path);
        let canonical = format!("{KEY_PREFIX}{base}");

        let mut aliases = Vec::with_capacity(3);
        if let Some(query) = &self.query {
            aliases.push(format!("{canonical}?{query}"));
        }
        aliases.push(format!("{KEY_PREFIX}{}{}", self.origin, self.raw_path));
        aliases.push(format!(
            "{HASHED_KEY_PREFIX}{}",
            short_digest(&base, HASHED_KEY_DIGEST_LEN)
        ));

        KeySet::new(canonical, aliases)
    }
}

/// Strip one trailing slash from paths longer than `/`.
pub fn normalize_path(path: &str) -> &str {
    if path.len() > 1 {
        path.strip_suffix('/').unwrap_or(path)
    } else {
        path
    }
}

/// The canonical storage key of one identity together with its aliases.
///
/// Aliases never contain the canonical key and never repeat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySet {
    canonical: String,
    aliases: Vec<String>,
}

impl KeySet {
    pub fn new<I, S>(canonical: impl Into<String>, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let canonical = canonical.into();
        let mut unique: Vec<String> = Vec::new();
        for alias in aliases {
            let alias = alias.into();
            if alias != canonical && !unique.contains(&alias) {
                unique.push(alias);
            }
        }
        Self {
            canonical,
            aliases: unique,
        }
    }

    /// A key set without aliases.
    pub fn single(canonical: impl Into<String>) -> Self {
        Self {
            canonical: canonical.into(),
            aliases: Vec::new(),
        }
    }

    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// Every key, canonical first.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.canonical.as_str()).chain(self.aliases.iter().map(String::as_str))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.iter().any(|candidate| candidate == key)
    }

    pub fn len(&self) -> usize {
        1 + self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_and_fragment_do_not_change_canonical_key() {
        let a = DocumentIdentity::from_location("https://example.com/a/b/").unwrap();
        let b = DocumentIdentity::from_location("https://example.com/a/b#section").unwrap();
        assert_eq!(a.key_set().canonical(), b.key_set().canonical());
        assert_eq!(a.path(), "/a/b");
    }

    #[test]
    fn root_path_is_kept() {
        let identity = DocumentIdentity::from_location("https://example.com").unwrap();
        let keys = identity.key_set();
        assert_eq!(keys.canonical(), "highlights_https://example.com/");
        // raw path equals the normalized one, so only the hashed alias remains
        assert_eq!(keys.len(), 2);
        assert!(keys.aliases()[0].starts_with(HASHED_KEY_PREFIX));
    }

    #[test]
    fn alias_order_is_fixed() {
        let identity =
            DocumentIdentity::from_location("http://example.com:8080/wiki/?q=rust").unwrap();
        let key_set = identity.key_set();
        let keys: Vec<&str> = key_set.iter().collect();
        assert_eq!(keys[0], "highlights_http://example.com:8080/wiki");
        assert_eq!(keys[1], "highlights_http://example.com:8080/wiki?q=rust");
        assert_eq!(keys[2], "highlights_http://example.com:8080/wiki/");
        assert_eq!(
            keys[3],
            format!(
                "{HASHED_KEY_PREFIX}{}",
                short_digest("http://example.com:8080/wiki", 16)
            )
        );
    }

    #[test]
    fn file_locations_use_file_origin() {
        let identity = DocumentIdentity::from_location("file:///home/me/notes.html").unwrap();
        assert_eq!(
            identity.key_set().canonical(),
            "highlights_file:///home/me/notes.html"
        );
    }

    #[test]
    fn browser_internal_pages_are_rejected() {
        assert_eq!(
            DocumentIdentity::from_location("chrome://extensions"),
            Err(CanonicalError::UnsupportedScheme("chrome".into()))
        );
        assert!(matches!(
            DocumentIdentity::from_location("not a url"),
            Err(CanonicalError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn key_set_drops_duplicate_aliases() {
        let keys = KeySet::new("a", ["b", "a", "b", "c"]);
        assert_eq!(keys.aliases(), ["b".to_string(), "c".to_string()]);
        assert!(keys.contains("c"));
        assert!(!keys.contains("d"));
    }
}
