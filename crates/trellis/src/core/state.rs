use std::fmt;

use convert_case::{Case, Casing};

use crate::error::{Error, Result};

/// A widget name: lowercase ASCII alphanumerics and underscores.
///
/// Names label widgets in traces and debug dumps. They carry no identity;
/// many widgets may share one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeName(String);

impl NodeName {
    /// Return true if the character may appear in a name.
    fn valid_char(c: char) -> bool {
        c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'
    }

    /// Snake-case an arbitrary string and strip anything that isn't allowed.
    /// An empty result becomes `"widget"`.
    pub fn convert(name: &str) -> Self {
        let filtered: String = name
            .to_case(Case::Snake)
            .chars()
            .filter(|c| Self::valid_char(*c))
            .collect();
        if filtered.is_empty() {
            Self("widget".into())
        } else {
            Self(filtered)
        }
    }

    /// Return the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for NodeName {
    type Error = Error;

    fn try_from(name: &str) -> Result<Self> {
        if name.is_empty() || !name.chars().all(Self::valid_char) {
            return Err(Error::Invalid(format!("invalid widget name: {name:?}")));
        }
        Ok(Self(name.to_string()))
    }
}

impl fmt::Display for NodeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<&str> for NodeName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
