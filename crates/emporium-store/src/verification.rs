use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How hash mismatches are handled when documents are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum VerificationMode {
    /// Fail the read with `HashVerificationFailed`.
    #[default]
    Strict,
    /// Log a warning and return the document anyway.
    Warn,
    /// Skip hash verification.
    Off,
}

impl VerificationMode {
    /// Convert verification mode to string.
    pub const fn as_str(&self) -> &'static str {
        match *self {
            Self::Strict => "strict",
            Self::Warn => "warn",
            Self::Off => "off",
        }
    }
}

impl FromStr for VerificationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "warn" => Ok(Self::Warn),
            "off" => Ok(Self::Off),
            other => Err(format!("unknown verification mode '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_mode_parsing() {
        assert_eq!("strict".parse::<VerificationMode>(), Ok(VerificationMode::Strict));
        assert_eq!("WARN".parse::<VerificationMode>(), Ok(VerificationMode::Warn));
        assert_eq!("off".parse::<VerificationMode>(), Ok(VerificationMode::Off));
        assert!("silent".parse::<VerificationMode>().is_err());
        assert_eq!(VerificationMode::default().as_str(), "strict");
    }
}
