//! # JVM Option Lists
//!
//! Ordered, key-addressable lists of JVM command-line options, rendered into
//! the space-joined strings the Alfresco image reads from `JAVA_OPTS` and
//! `JAVA_TOOL_OPTIONS`.
//!
//! Options are edited by property key, so toggling a subsystem never depends
//! on the exact text of a neighbouring option.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A single JVM option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JvmOption {
    /// A system property, rendered as `-D{key}={value}`.
    Property { key: String, value: String },

    /// Any other token (`-Xmx1g`, `-XX:+UseG1GC`), rendered verbatim.
    Flag(String)
}

impl JvmOption {
    pub fn property(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Property {
            key: key.into(),
            value: value.into()
        }
    }

    fn key(&self) -> Option<&str> {
        match self {
            Self::Property { key, .. } => Some(key),
            Self::Flag(_) => None
        }
    }
}

impl fmt::Display for JvmOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Property { key, value } => write!(f, "-D{key}={value}"),
            Self::Flag(flag) => f.write_str(flag)
        }
    }
}

/// Error returned when an option string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JvmOptionsParseError {
    #[error("Invalid JVM option token {token}: {reason}")]
    InvalidToken { token: String, reason: String }
}

/// Ordered list of JVM options.
///
/// Setting an existing property replaces its value in place, so rendering
/// order stays stable across edits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct JvmOptions {
    options: Vec<JvmOption>
}

impl JvmOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a property list from `(key, value)` pairs, keeping their order.
    pub fn from_properties<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>
    {
        let mut options = Self::new();
        for (key, value) in pairs {
            options.set(key, value);
        }
        options
    }

    /// Sets a property, replacing the existing value or appending a new entry.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let key = key.into();
        let value = value.into();
        match self.position(&key) {
            Some(index) => self.options[index] = JvmOption::Property { key, value },
            None => self.options.push(JvmOption::Property { key, value })
        }
        self
    }

    /// Appends a non-property flag such as `-Xmx1g`.
    pub fn push_flag(&mut self, flag: impl Into<String>) -> &mut Self {
        self.options.push(JvmOption::Flag(flag.into()));
        self
    }

    /// Removes a property, returning its previous value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let index = self.position(key)?;
        match self.options.remove(index) {
            JvmOption::Property { value, .. } => Some(value),
            JvmOption::Flag(_) => None
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.options.iter().find_map(|option| match option {
            JvmOption::Property { key: k, value } if k == key => Some(value.as_str()),
            _ => None
        })
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &JvmOption> {
        self.options.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.options.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// Renders the list as a single space-joined string.
    #[must_use]
    pub fn render(&self) -> String {
        self.options
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.options.iter().position(|option| option.key() == Some(key))
    }
}

impl fmt::Display for JvmOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl FromStr for JvmOptions {
    type Err = JvmOptionsParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut options = Self::new();
        for token in tokenize(s)? {
            let token = token.as_str();
            if let Some(property) = token.strip_prefix("-D") {
                let (key, value) =
                    property
                        .split_once('=')
                        .ok_or_else(|| JvmOptionsParseError::InvalidToken {
                            token: token.to_string(),
                            reason: "system property has no '='".to_string()
                        })?;
                if key.is_empty() {
                    return Err(JvmOptionsParseError::InvalidToken {
                        token: token.to_string(),
                        reason: "empty property name".to_string()
                    });
                }
                options.set(key, value);
            } else if token.starts_with('-') {
                options.push_flag(token);
            } else {
                return Err(JvmOptionsParseError::InvalidToken {
                    token: token.to_string(),
                    reason: "options must start with '-'".to_string()
                });
            }
        }
        Ok(options)
    }
}

/// Splits on whitespace outside double quotes. Quotes stay in the token, so
/// `-Dname="a b"` keeps the value `"a b"` and renders unchanged.
fn tokenize(s: &str) -> Result<Vec<String>, JvmOptionsParseError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    for c in s.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                current.push(c);
            }
            c if c.is_whitespace() && !quoted => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c)
        }
    }
    if quoted {
        return Err(JvmOptionsParseError::InvalidToken {
            token: current,
            reason: "unterminated quote".to_string()
        });
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    Ok(tokens)
}

impl TryFrom<String> for JvmOptions {
    type Error = JvmOptionsParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<JvmOptions> for String {
    fn from(options: JvmOptions) -> Self {
        options.render()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_keeps_insertion_order() {
        let options = JvmOptions::from_properties([("b", "2"), ("a", "1")]);
        assert_eq!(options.render(), "-Db=2 -Da=1");
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut options = JvmOptions::from_properties([("a", "1"), ("b", "2"), ("c", "3")]);
        options.set("b", "20");
        assert_eq!(options.render(), "-Da=1 -Db=20 -Dc=3");
        assert_eq!(options.len(), 3);
    }

    #[test]
    fn test_remove_by_key() {
        let mut options = JvmOptions::from_properties([("a", "1"), ("b", "2")]);
        assert_eq!(options.remove("a"), Some("1".to_string()));
        assert_eq!(options.remove("missing"), None);
        assert_eq!(options.render(), "-Db=2");
    }

    #[test]
    fn test_parse_properties_and_flags() {
        let options: JvmOptions = "-Xmx1g -Dmessaging.broker.url=\"failover:(nio://a:1)?timeout=3000\""
            .parse()
            .unwrap();
        assert_eq!(options.len(), 2);
        assert_eq!(
            options.get("messaging.broker.url"),
            Some("\"failover:(nio://a:1)?timeout=3000\"")
        );
        assert_eq!(
            options.render(),
            "-Xmx1g -Dmessaging.broker.url=\"failover:(nio://a:1)?timeout=3000\""
        );
    }

    #[test]
    fn test_parse_rejects_bare_words() {
        let err = "-Da=1 oops".parse::<JvmOptions>().unwrap_err();
        assert!(matches!(err, JvmOptionsParseError::InvalidToken { ref token, .. } if token == "oops"));
    }

    #[test]
    fn test_parse_rejects_property_without_value() {
        assert!("-Dmissing".parse::<JvmOptions>().is_err());
        assert!("-D=value".parse::<JvmOptions>().is_err());
    }

    #[test]
    fn test_parse_collapses_whitespace() {
        let options: JvmOptions = "\n  -Da=1\n\t-Db=2  ".parse().unwrap();
        assert_eq!(options.render(), "-Da=1 -Db=2");
    }

    #[test]
    fn test_parse_keeps_quoted_values_together() {
        let options: JvmOptions = r#"-Dfoo="a b" -Xmx1g -Dbar=plain"#.parse().unwrap();
        assert_eq!(options.get("foo"), Some(r#""a b""#));
        assert_eq!(options.get("bar"), Some("plain"));
        assert_eq!(options.len(), 3);
        assert_eq!(options.render(), r#"-Dfoo="a b" -Xmx1g -Dbar=plain"#);
    }

    #[test]
    fn test_parse_rejects_unterminated_quote() {
        let err = r#"-Da=1 -Dfoo="a b"#.parse::<JvmOptions>().unwrap_err();
        assert!(matches!(
            err,
            JvmOptionsParseError::InvalidToken { ref reason, .. } if reason == "unterminated quote"
        ));
    }
}
