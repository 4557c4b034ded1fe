//! Endpoint resolution
//!
//! Classifies path strings as local or `[user@]host:path` remote. The
//! classification is purely syntactic; no network validation happens here.

/// A local path, or a remote host-plus-path pair.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Endpoint {
    host: Option<String>,
    path: String,
}

impl Endpoint {
    /// Classify `path`, splitting off a `[user@]host:` prefix when present.
    ///
    /// The host part is either a dotted IPv4 address whose first octet is
    /// 1-9, or a hostname (letters/digits/underscore) with optional
    /// dot-separated labels. Anything that does not match is a local path
    /// carried through unchanged.
    pub fn parse(path: &str) -> Self {
        // Regular expression for remote paths with named groups; the login
        // group keeps any user@ prefix since that is what ssh/scp expect
        let re = regex::Regex::new(
            r"^(?P<login>(?:[a-zA-Z]\w*@)?(?:[1-9]\d{0,2}\.\d{1,3}\.\d{1,3}\.\d{1,3}|[a-zA-Z]\w*(?:\.\w+)*)):(?P<path>.+)$",
        )
        .unwrap();
        if let Some(captures) = re.captures(path) {
            Self {
                host: Some(captures["login"].to_string()),
                path: captures["path"].to_string(),
            }
        } else {
            Self {
                host: None,
                path: path.to_string(),
            }
        }
    }

    pub fn local(path: &str) -> Self {
        Self {
            host: None,
            path: path.to_string(),
        }
    }

    pub fn remote(host: &str, path: &str) -> Self {
        Self {
            host: Some(host.to_string()),
            path: path.to_string(),
        }
    }

    /// The ssh login target, including any `user@` prefix.
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_remote(&self) -> bool {
        self.host.is_some()
    }

    pub fn is_local(&self) -> bool {
        self.host.is_none()
    }
}
