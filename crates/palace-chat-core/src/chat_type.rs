use std::fmt;

/// Chat type used when the page path doesn't name one.
pub const DEFAULT_CHAT_TYPE: &str = "bedrock";

/// Chat types the backend ships with. Anything else is still forwarded as-is.
pub const KNOWN_CHAT_TYPES: [&str; 5] = ["bedrock", "ocean", "vampire", "mkm", "claude"];

/// Routing tag sent with every turn so the backend can pick a model variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatType(String);

impl ChatType {
    /// Derive the chat type from a navigation path.
    ///
    /// `/` and the empty path map to [`DEFAULT_CHAT_TYPE`]. Otherwise the
    /// leading separator is dropped and the remainder is used verbatim, so
    /// `/ocean` is `ocean` and `/a/b` is `a/b`.
    pub fn from_path(path: &str) -> Self {
        if path == "/" {
            return Self::default();
        }

        let rest = path.strip_prefix('/').unwrap_or(path);
        if rest.is_empty() {
            Self::default()
        } else {
            Self(rest.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_known(&self) -> bool {
        KNOWN_CHAT_TYPES.contains(&self.0.as_str())
    }
}

impl Default for ChatType {
    fn default() -> Self {
        Self(DEFAULT_CHAT_TYPE.to_string())
    }
}

impl fmt::Display for ChatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
