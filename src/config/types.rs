use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::secrets::error::MergeError;

/// Key-value engine API revision of the secret store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KvVersion {
    /// Flat engine: `data` holds the secret map directly.
    V1,
    /// Versioned engine: mount-based routing, secret map under `data.data`.
    V2,
}

impl FromStr for KvVersion {
    type Err = MergeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "v1" => Ok(KvVersion::V1),
            "2" | "v2" => Ok(KvVersion::V2),
            other => Err(MergeError::Configuration(format!(
                "unsupported KV version '{other}' (expected 1 or 2)"
            ))),
        }
    }
}

impl fmt::Display for KvVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KvVersion::V1 => write!(f, "v1"),
            KvVersion::V2 => write!(f, "v2"),
        }
    }
}

/// How resolved values are written back into the file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubstitutionMode {
    /// Replace every occurrence of the token anywhere in the file.
    #[default]
    Global,
    /// Replace the token only on the line the reference was parsed from.
    Line,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kv_version_accepts_numeric_and_prefixed() {
        assert_eq!("1".parse::<KvVersion>().unwrap(), KvVersion::V1);
        assert_eq!("v1".parse::<KvVersion>().unwrap(), KvVersion::V1);
        assert_eq!("2".parse::<KvVersion>().unwrap(), KvVersion::V2);
        assert_eq!(" V2 ".parse::<KvVersion>().unwrap(), KvVersion::V2);
    }

    #[test]
    fn kv_version_rejects_unknown() {
        let err = "3".parse::<KvVersion>().unwrap_err();
        assert!(matches!(err, MergeError::Configuration(_)));
        assert!(err.to_string().contains("'3'"));
    }

    #[test]
    fn substitution_defaults_to_global() {
        assert_eq!(SubstitutionMode::default(), SubstitutionMode::Global);
    }
}
