use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WatchId(pub i64);

impl fmt::Display for WatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Above,
    Below,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Above => "above",
            Direction::Below => "below",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Watch {
    #[serde(rename = "_id")]
    pub id: WatchId,

    pub owner: String,
    pub destination: String,
    pub symbol: String,

    pub target_price: f64,
    pub direction: Direction,

    pub active: bool,

    // unix seconds
    pub created_at: i64,
    #[serde(default)]
    pub last_checked_at: Option<i64>,
    #[serde(default)]
    pub last_alerted_at: Option<i64>,

    #[serde(default)]
    pub alert_count: i64,
}

/// Everything the caller supplies when creating a watch. The store assigns the rest.
#[derive(Debug, Clone)]
pub struct NewWatch {
    pub owner: String,
    pub destination: String,
    pub symbol: String,
    pub target_price: f64,
    pub direction: Direction,
    pub created_at: i64,
}

impl Watch {
    pub(crate) fn from_new(id: WatchId, new: NewWatch) -> Self {
        Self {
            id,
            owner: new.owner,
            destination: new.destination,
            symbol: new.symbol,
            target_price: new.target_price,
            direction: new.direction,
            active: true,
            created_at: new.created_at,
            last_checked_at: None,
            last_alerted_at: None,
            alert_count: 0,
        }
    }

    /// True when a watch with these parameters would duplicate this (active) one.
    pub fn same_intent(&self, owner: &str, symbol: &str, target_price: f64, direction: Direction) -> bool {
        self.active
            && self.owner == owner
            && self.symbol == symbol
            && self.target_price == target_price
            && self.direction == direction
    }
}
