use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// How many instances of a service the container hands out.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Lifetime {
    /// One instance for the whole container tree, built on first resolve.
    #[default]
    Singleton,
    /// One instance per scope, dropped when the scope is cleared.
    Scoped,
    /// A new instance on every resolve, never cached.
    Transient,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_parse_lifetime() {
        assert_eq!(Lifetime::from_str("scoped").unwrap(), Lifetime::Scoped);
        assert_eq!(Lifetime::from_str("Transient").unwrap(), Lifetime::Transient);
        assert!(Lifetime::from_str("request").is_err());
        assert_eq!(Lifetime::default().to_string(), "singleton");
    }
}
