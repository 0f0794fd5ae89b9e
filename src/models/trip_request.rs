use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

use crate::error::AppError;

/// A join request starts PENDING and is replied to exactly once:
/// PENDING -> ACCEPTED or PENDING -> DECLINED, both terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum TripRequestStatus {
    #[default]
    #[serde(rename = "PENDING")]
    Pending,
    #[serde(rename = "ACCEPTED")]
    Accepted,
    #[serde(rename = "DECLINED")]
    Declined,
}

impl TripRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TripRequestStatus::Pending => "PENDING",
            TripRequestStatus::Accepted => "ACCEPTED",
            TripRequestStatus::Declined => "DECLINED",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, AppError> {
        match raw {
            "PENDING" => Ok(TripRequestStatus::Pending),
            "ACCEPTED" => Ok(TripRequestStatus::Accepted),
            "DECLINED" => Ok(TripRequestStatus::Declined),
            other => Err(AppError::Other(anyhow::anyhow!(
                "unknown trip request status in database: {other}"
            ))),
        }
    }
}

impl fmt::Display for TripRequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The owner's decision on a pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyDecision {
    Accept,
    Decline,
}

#[derive(Debug, Clone, FromRow)]
pub struct TripRequest {
    pub id: i64,
    pub trip_id: i64,
    pub sender_id: i64,
    pub receiver_id: i64,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub replied_at: Option<DateTime<Utc>>,
}

impl TripRequest {
    pub fn status(&self) -> Result<TripRequestStatus, AppError> {
        TripRequestStatus::parse(&self.status)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripRequestResponse {
    pub id: i64,
    pub trip_id: i64,
    pub sender_id: i64,
    pub receiver_id: i64,
    pub status: TripRequestStatus,
}

impl TripRequestResponse {
    pub fn from_row(request: TripRequest) -> Result<Self, AppError> {
        let status = request.status()?;
        Ok(Self {
            id: request.id,
            trip_id: request.trip_id,
            sender_id: request.sender_id,
            receiver_id: request.receiver_id,
            status,
        })
    }
}
