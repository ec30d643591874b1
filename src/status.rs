use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Products expiring within this many days (inclusive) are near expiration.
pub const NEAR_EXPIRATION_DAYS: i64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Status {
    #[serde(rename = "Expired")]
    Expired,
    #[serde(rename = "Near Expiration")]
    NearExpiration,
    #[serde(rename = "Within Range")]
    WithinRange,
}

impl Status {
    pub const ALL: [Status; 3] = [Status::Expired, Status::NearExpiration, Status::WithinRange];

    pub fn label(self) -> &'static str {
        match self {
            Status::Expired => "Expired",
            Status::NearExpiration => "Near Expiration",
            Status::WithinRange => "Within Range",
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            Status::Expired => "expired",
            Status::NearExpiration => "near_expiration",
            Status::WithinRange => "within_range",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Status::Expired => "#fe4a23",
            Status::NearExpiration => "#ffcf28",
            Status::WithinRange => "#09b96d",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStatusError(pub String);

impl fmt::Display for ParseStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown status '{}'", self.0)
    }
}

impl std::error::Error for ParseStatusError {}

impl FromStr for Status {
    type Err = ParseStatusError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let value = raw.trim();
        Status::ALL
            .into_iter()
            .find(|status| {
                status.slug().eq_ignore_ascii_case(value) || status.label().eq_ignore_ascii_case(value)
            })
            .ok_or_else(|| ParseStatusError(value.to_string()))
    }
}

/// Classifies an expiration date against a reference day.
///
/// Expiring on the reference day itself counts as near expiration, not expired.
pub fn classify(expiration_date: NaiveDate, reference_date: NaiveDate) -> Status {
    let delta_days = (expiration_date - reference_date).num_days();
    if delta_days < 0 {
        Status::Expired
    } else if delta_days <= NEAR_EXPIRATION_DAYS {
        Status::NearExpiration
    } else {
        Status::WithinRange
    }
}
