use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use crate::{
    error::AppError,
    models::trip_request::{TripRequest, TripRequestStatus},
};

const REQUEST_COLUMNS: &str =
    "id, trip_id, sender_id, receiver_id, status, created_at, replied_at";

pub async fn insert(
    conn: &mut SqliteConnection,
    trip_id: i64,
    sender_id: i64,
    receiver_id: i64,
    created_at: DateTime<Utc>,
) -> Result<TripRequest, AppError> {
    let sql = format!(
        "INSERT INTO trip_requests (trip_id, sender_id, receiver_id, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)
         RETURNING {REQUEST_COLUMNS}"
    );
    let request = sqlx::query_as::<_, TripRequest>(&sql)
        .bind(trip_id)
        .bind(sender_id)
        .bind(receiver_id)
        .bind(TripRequestStatus::Pending.as_str())
        .bind(created_at)
        .fetch_one(conn)
        .await?;
    Ok(request)
}

pub async fn find(
    conn: &mut SqliteConnection,
    request_id: i64,
) -> Result<Option<TripRequest>, AppError> {
    let sql = format!("SELECT {REQUEST_COLUMNS} FROM trip_requests WHERE id = ?1");
    let request = sqlx::query_as::<_, TripRequest>(&sql)
        .bind(request_id)
        .fetch_optional(conn)
        .await?;
    Ok(request)
}

pub async fn set_status(
    conn: &mut SqliteConnection,
    request_id: i64,
    status: TripRequestStatus,
    replied_at: DateTime<Utc>,
) -> Result<(), AppError> {
    sqlx::query("UPDATE trip_requests SET status = ?1, replied_at = ?2 WHERE id = ?3")
        .bind(status.as_str())
        .bind(replied_at)
        .bind(request_id)
        .execute(conn)
        .await?;
    Ok(())
}
