use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CustomerId(pub String);

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Membership tier. Drives refund windows and shipping discounts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerTier {
    Standard,
    Gold,
    Platinum,
}

impl CustomerTier {
    pub const ALL: [CustomerTier; 3] = [Self::Standard, Self::Gold, Self::Platinum];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Gold => "gold",
            Self::Platinum => "platinum",
        }
    }
}

impl fmt::Display for CustomerTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CustomerTier {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(Self::Standard),
            "gold" => Ok(Self::Gold),
            "platinum" => Ok(Self::Platinum),
            _ => Err(DomainError::UnknownVariant {
                kind: "customer tier",
                value: value.to_string(),
                expected: "standard|gold|platinum",
            }),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub tier: CustomerTier,
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::CustomerTier;
    use crate::errors::DomainError;

    #[test]
    fn tier_parsing_is_case_insensitive() {
        assert_eq!("GOLD".parse::<CustomerTier>(), Ok(CustomerTier::Gold));
        assert_eq!(" platinum ".parse::<CustomerTier>(), Ok(CustomerTier::Platinum));
    }

    #[test]
    fn unknown_tier_is_rejected_not_defaulted() {
        let error = "diamond".parse::<CustomerTier>().expect_err("diamond is not a tier");
        assert!(matches!(error, DomainError::UnknownVariant { kind: "customer tier", .. }));
        assert!(error.to_string().contains("standard|gold|platinum"));
    }
}
