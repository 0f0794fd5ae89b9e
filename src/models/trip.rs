use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum TripStatus {
    #[default]
    #[serde(rename = "WAITING")]
    Waiting,
    #[serde(rename = "FINISHED")]
    Finished,
}

impl TripStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TripStatus::Waiting => "WAITING",
            TripStatus::Finished => "FINISHED",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, AppError> {
        match raw {
            "WAITING" => Ok(TripStatus::Waiting),
            "FINISHED" => Ok(TripStatus::Finished),
            other => Err(AppError::Other(anyhow::anyhow!(
                "unknown trip status in database: {other}"
            ))),
        }
    }
}

impl fmt::Display for TripStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Database row; restrictions and participants live in their own tables.
#[derive(Debug, Clone, FromRow)]
pub struct Trip {
    pub id: i64,
    pub created_by: i64,
    pub starting_point: String,
    pub destination: String,
    pub max_capacity: i64,
    pub price_per_person: f64,
    pub begin_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub description: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl Trip {
    pub fn status(&self) -> Result<TripStatus, AppError> {
        TripStatus::parse(&self.status)
    }
}

/// Fields a trip is created with. Route and capacity are frozen afterwards.
#[derive(Debug, Clone, Deserialize)]
pub struct NewTrip {
    #[serde(rename = "from")]
    pub starting_point: String,
    #[serde(rename = "to")]
    pub destination: String,
    #[serde(rename = "capacity")]
    pub max_capacity: i64,
    #[serde(rename = "price")]
    pub price_per_person: f64,
    #[serde(rename = "beginAt")]
    pub begin_at: DateTime<Utc>,
    #[serde(rename = "endAt")]
    pub end_at: DateTime<Utc>,
    pub description: String,
    #[serde(default)]
    pub restrictions: Vec<String>,
}

/// The editable subset. The new restriction list replaces the old one
/// wholesale; it is never merged.
#[derive(Debug, Clone, Deserialize)]
pub struct TripEdits {
    pub description: String,
    #[serde(rename = "beginAt")]
    pub begin_at: DateTime<Utc>,
    #[serde(rename = "endAt")]
    pub end_at: DateTime<Utc>,
    #[serde(rename = "price")]
    pub price_per_person: f64,
    #[serde(default)]
    pub restrictions: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripResponse {
    pub id: i64,
    pub created_by: i64,
    pub starting_point: String,
    pub destination: String,
    pub max_capacity: i64,
    pub price_per_person: f64,
    pub begin_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub description: String,
    pub status: TripStatus,
    pub restrictions: Vec<String>,
    pub participants: Vec<i64>,
}

impl TripResponse {
    pub fn from_parts(
        trip: Trip,
        restrictions: Vec<String>,
        participants: Vec<i64>,
    ) -> Result<Self, AppError> {
        let status = trip.status()?;
        Ok(Self {
            id: trip.id,
            created_by: trip.created_by,
            starting_point: trip.starting_point,
            destination: trip.destination,
            max_capacity: trip.max_capacity,
            price_per_person: trip.price_per_person,
            begin_at: trip.begin_at,
            end_at: trip.end_at,
            description: trip.description,
            status,
            restrictions,
            participants,
        })
    }
}
