use serde::{Deserialize, Serialize};
use std::fmt;

/// Five-tier verdict on a move's quality score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum QualityTier {
    Poor,
    Dubious,
    Good,
    Excellent,
    Brilliant,
}

impl QualityTier {
    /// `[90,100]` Brilliant, `[75,90)` Excellent, `[50,75)` Good,
    /// `[25,50)` Dubious, `[0,25)` Poor.
    pub fn from_score(score: f64) -> QualityTier {
        if score >= 90.0 {
            QualityTier::Brilliant
        } else if score >= 75.0 {
            QualityTier::Excellent
        } else if score >= 50.0 {
            QualityTier::Good
        } else if score >= 25.0 {
            QualityTier::Dubious
        } else {
            QualityTier::Poor
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            QualityTier::Brilliant => "!!",
            QualityTier::Excellent => "!",
            QualityTier::Good => "=",
            QualityTier::Dubious => "?!",
            QualityTier::Poor => "?",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            QualityTier::Brilliant => "Brilliant",
            QualityTier::Excellent => "Excellent",
            QualityTier::Good => "Good",
            QualityTier::Dubious => "Dubious",
            QualityTier::Poor => "Poor",
        }
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name(), self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(QualityTier::from_score(100.0), QualityTier::Brilliant);
        assert_eq!(QualityTier::from_score(90.0), QualityTier::Brilliant);
        assert_eq!(QualityTier::from_score(89.9), QualityTier::Excellent);
        assert_eq!(QualityTier::from_score(75.0), QualityTier::Excellent);
        assert_eq!(QualityTier::from_score(74.99), QualityTier::Good);
        assert_eq!(QualityTier::from_score(50.0), QualityTier::Good);
        assert_eq!(QualityTier::from_score(49.9), QualityTier::Dubious);
        assert_eq!(QualityTier::from_score(25.0), QualityTier::Dubious);
        assert_eq!(QualityTier::from_score(24.9), QualityTier::Poor);
        assert_eq!(QualityTier::from_score(0.0), QualityTier::Poor);
    }

    #[test]
    fn test_symbols() {
        assert_eq!(QualityTier::Brilliant.symbol(), "!!");
        assert_eq!(QualityTier::Dubious.to_string(), "Dubious ?!");
    }
}
