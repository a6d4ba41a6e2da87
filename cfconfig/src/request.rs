use std::str::FromStr;

/// A configuration key the application needs at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestedKey {
    key: String,
    dev_fallback: Option<String>,
}

impl RequestedKey {
    /// Key that must come from the environment in every setup.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            dev_fallback: None,
        }
    }

    /// Key with a value used during local development instead of the
    /// environment. An empty fallback counts as none.
    pub fn with_fallback(key: impl Into<String>, fallback: impl Into<String>) -> Self {
        let fallback = fallback.into();
        Self {
            key: key.into(),
            dev_fallback: (!fallback.is_empty()).then_some(fallback),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn dev_fallback(&self) -> Option<&str> {
        self.dev_fallback.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("requested key must not be empty: '{0}'")]
pub struct ParseRequestError(String);

/// Parses `KEY` or `KEY=fallback`.
impl FromStr for RequestedKey {
    type Err = ParseRequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, fallback) = match s.split_once('=') {
            Some((key, fallback)) => (key.trim(), fallback),
            None => (s.trim(), ""),
        };
        if key.is_empty() {
            return Err(ParseRequestError(s.to_string()));
        }
        Ok(Self::with_fallback(key, fallback))
    }
}

/// Ordered list of requested keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Requested(Vec<RequestedKey>);

impl Requested {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn require(mut self, key: impl Into<String>) -> Self {
        self.0.push(RequestedKey::new(key));
        self
    }

    pub fn with_fallback(mut self, key: impl Into<String>, fallback: impl Into<String>) -> Self {
        self.0.push(RequestedKey::with_fallback(key, fallback));
        self
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RequestedKey> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<RequestedKey>> for Requested {
    fn from(keys: Vec<RequestedKey>) -> Self {
        Self(keys)
    }
}

impl FromIterator<RequestedKey> for Requested {
    fn from_iter<I: IntoIterator<Item = RequestedKey>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Requested {
    type Item = &'a RequestedKey;
    type IntoIter = std::slice::Iter<'a, RequestedKey>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_plain_key() {
        let req: RequestedKey = "API_TOKEN".parse().unwrap();
        assert_eq!(req.key(), "API_TOKEN");
        assert_eq!(req.dev_fallback(), None);
    }

    #[test]
    fn parse_key_with_fallback() {
        let req: RequestedKey = "A=b".parse().unwrap();
        assert_eq!(req.key(), "A");
        assert_eq!(req.dev_fallback(), Some("b"));
    }

    #[test]
    fn fallback_keeps_equals_signs() {
        let req: RequestedKey = "DSN=host=db user=app".parse().unwrap();
        assert_eq!(req.dev_fallback(), Some("host=db user=app"));
    }

    #[test]
    fn empty_fallback_is_none() {
        let req: RequestedKey = "A=".parse().unwrap();
        assert_eq!(req.dev_fallback(), None);
        assert_eq!(RequestedKey::with_fallback("A", "").dev_fallback(), None);
    }

    #[test]
    fn empty_key_rejected() {
        assert!("=value".parse::<RequestedKey>().is_err());
        assert!("".parse::<RequestedKey>().is_err());
    }

    #[test]
    fn builder_keeps_order() {
        let requested = Requested::new().require("B").with_fallback("A", "x");
        let keys: Vec<_> = requested.iter().map(RequestedKey::key).collect();
        assert_eq!(keys, ["B", "A"]);
    }
}
