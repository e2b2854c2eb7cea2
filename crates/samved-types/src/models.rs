use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One persisted generation result. Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRecord {
    pub id: i64,
    /// `None` for anonymous generations.
    pub owner_id: Option<Uuid>,
    pub topic: String,
    pub language: String,
    pub count: u32,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RatingValue {
    Like,
    Dislike,
}

impl RatingValue {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::Dislike => "dislike",
        }
    }
}

impl fmt::Display for RatingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RatingValue {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(Self::Like),
            "dislike" => Ok(Self::Dislike),
            other => Err(format!("unknown rating value: {}", other)),
        }
    }
}

/// Result of a vote attempt. A second vote by the same rater on the same
/// record is reported, never applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteOutcome {
    Recorded,
    AlreadyVoted,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingCounts {
    pub likes: u64,
    pub dislikes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_value_parses_its_own_text() {
        for v in [RatingValue::Like, RatingValue::Dislike] {
            assert_eq!(v.as_str().parse::<RatingValue>().unwrap(), v);
        }
        assert!("meh".parse::<RatingValue>().is_err());
    }

    #[test]
    fn wire_names_are_lowercase() {
        assert_eq!(serde_json::to_string(&RatingValue::Dislike).unwrap(), "\"dislike\"");
        assert_eq!(
            serde_json::to_string(&VoteOutcome::AlreadyVoted).unwrap(),
            "\"already_voted\""
        );
    }
}
