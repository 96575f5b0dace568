//! Logical key to object key mapping

use keystash_core::KeyEncoding;

/// Replace `/` with `__` and `:` with `-`
///
/// Matches the file names of the file-based session store. The mapping is
/// not injective: `a/b` and `a__b` land on the same object.
pub fn sanitize(key: &str) -> String {
    key.replace('/', "__").replace(':', "-")
}

/// Percent-encode `%`, `/` and `:`
///
/// Escaping `%` itself keeps the mapping injective, and the output never
/// contains `/` or `:`.
pub fn percent_encode(key: &str) -> String {
    let mut encoded = String::with_capacity(key.len());
    for c in key.chars() {
        match c {
            '%' => encoded.push_str("%25"),
            '/' => encoded.push_str("%2F"),
            ':' => encoded.push_str("%3A"),
            other => encoded.push(other),
        }
    }
    encoded
}

/// Resolves logical keys to prefixed object keys
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectKeyResolver {
    prefix: String,
    encoding: KeyEncoding,
}

impl ObjectKeyResolver {
    pub fn new(prefix: impl Into<String>, encoding: KeyEncoding) -> Self {
        Self {
            prefix: prefix.into(),
            encoding,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn encoding(&self) -> KeyEncoding {
        self.encoding
    }

    /// `prefix + encode(key)`. An empty key resolves to the bare prefix.
    pub fn resolve(&self, key: &str) -> String {
        let encoded = match self.encoding {
            KeyEncoding::Substitute => sanitize(key),
            KeyEncoding::Percent => percent_encode(key),
        };
        format!("{}{}", self.prefix, encoded)
    }
}

impl Default for ObjectKeyResolver {
    fn default() -> Self {
        Self::new("", KeyEncoding::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_sanitize_examples() {
        assert_eq!(sanitize("creds.json"), "creds.json");
        assert_eq!(
            sanitize("session-123@s.whatsapp.net:4.json"),
            "session-123@s.whatsapp.net-4.json"
        );
        assert_eq!(sanitize("sender-key-a/b:c.json"), "sender-key-a__b-c.json");
        assert_eq!(sanitize(""), "");
    }

    #[test]
    fn test_sanitize_collides() {
        assert_eq!(sanitize("a/b"), sanitize("a__b"));
        assert_eq!(sanitize("a:b"), sanitize("a-b"));
    }

    #[test]
    fn test_percent_encode_examples() {
        assert_eq!(percent_encode("a/b:c"), "a%2Fb%3Ac");
        assert_eq!(percent_encode("100%"), "100%25");
        assert_ne!(percent_encode("a/b"), percent_encode("a__b"));
        assert_ne!(percent_encode("a/b"), percent_encode("a%2Fb"));
    }

    #[test]
    fn test_resolver_prefixes() {
        let resolver = ObjectKeyResolver::new("bots/alice/", KeyEncoding::Substitute);
        assert_eq!(
            resolver.resolve("pre-key-1.json"),
            "bots/alice/pre-key-1.json"
        );
        assert_eq!(resolver.resolve(""), "bots/alice/");

        let percent = ObjectKeyResolver::new("p-", KeyEncoding::Percent);
        assert_eq!(percent.resolve("x:y.json"), "p-x%3Ay.json");
    }

    #[test]
    fn test_default_resolver() {
        let resolver = ObjectKeyResolver::default();
        assert_eq!(resolver.prefix(), "");
        assert_eq!(resolver.encoding(), KeyEncoding::Substitute);
        assert_eq!(resolver.resolve("a:b"), "a-b");
    }

    fn percent_decode(encoded: &str) -> String {
        encoded
            .replace("%2F", "/")
            .replace("%3A", ":")
            .replace("%25", "%")
    }

    proptest! {
        #[test]
        fn prop_sanitize_strips_separators(key in ".*") {
            let sanitized = sanitize(&key);
            prop_assert!(!sanitized.contains('/'));
            prop_assert!(!sanitized.contains(':'));
        }

        #[test]
        fn prop_percent_encode_strips_separators(key in ".*") {
            let encoded = percent_encode(&key);
            prop_assert!(!encoded.contains('/'));
            prop_assert!(!encoded.contains(':'));
        }

        #[test]
        fn prop_percent_encode_is_injective(a in "[a-z0-9/:%_-]{0,12}", b in "[a-z0-9/:%_-]{0,12}") {
            prop_assume!(a != b);
            prop_assert_ne!(percent_encode(&a), percent_encode(&b));
        }

        #[test]
        fn prop_percent_encode_inverts(key in "[a-z0-9/:_.@-]{0,24}") {
            prop_assert_eq!(percent_decode(&percent_encode(&key)), key);
        }
    }
}
