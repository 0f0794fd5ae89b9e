use chrono::Utc;
use tracing::info;

use crate::{
    db::DbPool,
    error::AppError,
    models::trip_request::{ReplyDecision, TripRequestResponse, TripRequestStatus},
    store,
};

/// Creates a PENDING join request from `sender_id` to the trip's owner.
pub async fn request_to_join(
    db: &DbPool,
    trip_id: i64,
    sender_id: i64,
) -> Result<TripRequestResponse, AppError> {
    let now = Utc::now();
    let mut tx = db.begin().await?;

    let trip = store::trips::find(&mut *tx, trip_id)
        .await?
        .ok_or(AppError::TripNotFound)?;
    let receiver = store::users::find_by_id(&mut *tx, trip.created_by)
        .await?
        .ok_or(AppError::UserNotFound)?;
    let sender = store::users::find_by_id(&mut *tx, sender_id)
        .await?
        .ok_or(AppError::UserNotFound)?;

    let request = store::requests::insert(&mut *tx, trip.id, sender.id, receiver.id, now).await?;
    let response = TripRequestResponse::from_row(request)?;
    tx.commit().await?;

    info!(
        request_id = response.id,
        trip_id, sender_id, "join request created"
    );
    Ok(response)
}

/// Applies the owner's one-shot reply to a pending request.
///
/// Everything runs inside a single transaction: the capacity check and the
/// participant insert commit together or not at all, so an accept can never
/// push a trip past `max_capacity`.
pub async fn reply_to_join_request(
    db: &DbPool,
    request_id: i64,
    caller_id: i64,
    decision: ReplyDecision,
) -> Result<(), AppError> {
    let now = Utc::now();
    let mut tx = db.begin().await?;

    let request = store::requests::find(&mut *tx, request_id)
        .await?
        .ok_or(AppError::RequestNotFound)?;

    // Ownership is fixed at request-creation time.
    if request.receiver_id != caller_id {
        return Err(AppError::PermissionDenied);
    }
    if request.status()? != TripRequestStatus::Pending {
        return Err(AppError::InvalidState("join request was already replied to"));
    }

    match decision {
        ReplyDecision::Accept => {
            let trip = store::trips::find(&mut *tx, request.trip_id)
                .await?
                .ok_or(AppError::TripNotFound)?;
            let occupied = store::trips::count_participants(&mut *tx, trip.id).await?;
            if occupied >= trip.max_capacity {
                return Err(AppError::TripFull);
            }
            store::trips::add_participant(&mut *tx, trip.id, request.sender_id, now).await?;
            store::requests::set_status(&mut *tx, request.id, TripRequestStatus::Accepted, now)
                .await?;
        }
        ReplyDecision::Decline => {
            store::requests::set_status(&mut *tx, request.id, TripRequestStatus::Declined, now)
                .await?;
        }
    }

    tx.commit().await?;

    info!(request_id, caller_id, ?decision, "join request replied");
    Ok(())
}
