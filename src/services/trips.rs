use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::info;

use crate::{
    db::DbPool,
    error::AppError,
    models::{
        page::{PagedResponse, PageParams},
        trip::{NewTrip, Trip, TripEdits, TripResponse, TripStatus},
    },
    store,
};

/// Creates a trip in WAITING status with the owner as its sole participant.
pub async fn create_trip(
    db: &DbPool,
    owner_id: i64,
    details: NewTrip,
) -> Result<TripResponse, AppError> {
    if details.max_capacity < 1 {
        return Err(AppError::InvalidCapacity);
    }
    validate_price_and_window(details.price_per_person, details.begin_at, details.end_at)?;

    let now = Utc::now();
    let mut tx = db.begin().await?;

    let owner = store::users::find_by_id(&mut *tx, owner_id)
        .await?
        .ok_or(AppError::UserNotFound)?;

    let trip = store::trips::insert(
        &mut *tx,
        owner.id,
        &details.starting_point,
        &details.destination,
        details.max_capacity,
        details.price_per_person,
        details.begin_at,
        details.end_at,
        &details.description,
        now,
    )
    .await?;
    store::trips::replace_restrictions(&mut *tx, trip.id, &details.restrictions).await?;
    store::trips::add_participant(&mut *tx, trip.id, owner.id, now).await?;

    let response = project_trip(&mut *tx, trip).await?;
    tx.commit().await?;

    info!(trip_id = response.id, owner_id, "trip created");
    Ok(response)
}

/// Overwrites the editable fields and replaces the restriction list wholesale.
/// Route, capacity, owner, and status cannot be changed through this path.
pub async fn edit_trip(
    db: &DbPool,
    caller_id: i64,
    trip_id: i64,
    edits: TripEdits,
) -> Result<TripResponse, AppError> {
    validate_price_and_window(edits.price_per_person, edits.begin_at, edits.end_at)?;

    let mut tx = db.begin().await?;

    let trip = store::trips::find(&mut *tx, trip_id)
        .await?
        .ok_or(AppError::TripNotFound)?;
    if trip.created_by != caller_id {
        return Err(AppError::PermissionDenied);
    }

    store::trips::update_editable_fields(
        &mut *tx,
        trip.id,
        &edits.description,
        edits.begin_at,
        edits.end_at,
        edits.price_per_person,
    )
    .await?;
    store::trips::replace_restrictions(&mut *tx, trip.id, &edits.restrictions).await?;

    let updated = store::trips::find(&mut *tx, trip.id)
        .await?
        .ok_or(AppError::TripNotFound)?;
    let response = project_trip(&mut *tx, updated).await?;
    tx.commit().await?;

    Ok(response)
}

/// Projects a single trip to its public view.
// The upstream API meant to hide trips from non-participants but never did;
// the requester id stays in the signature until that rule is settled.
pub async fn get_trip(
    db: &DbPool,
    _requester_id: i64,
    trip_id: i64,
) -> Result<TripResponse, AppError> {
    let mut conn = db.acquire().await?;
    let trip = store::trips::find(&mut *conn, trip_id)
        .await?
        .ok_or(AppError::TripNotFound)?;
    project_trip(&mut *conn, trip).await
}

/// All trips still waiting for passengers, newest departure first.
pub async fn waiting_trips(
    db: &DbPool,
    params: PageParams,
) -> Result<PagedResponse<TripResponse>, AppError> {
    let params = params.normalized();
    let mut conn = db.acquire().await?;
    let total = store::trips::count_by_status(&mut *conn, TripStatus::Waiting).await?;
    let trips = store::trips::list_by_status(&mut *conn, TripStatus::Waiting, params).await?;
    paged(&mut *conn, trips, params, total).await
}

/// Trips the caller participated in that have finished.
pub async fn joined_trips(
    db: &DbPool,
    caller_id: i64,
    params: PageParams,
) -> Result<PagedResponse<TripResponse>, AppError> {
    let params = params.normalized();
    let mut conn = db.acquire().await?;
    let total =
        store::trips::count_by_participant_and_status(&mut *conn, caller_id, TripStatus::Finished)
            .await?;
    let trips = store::trips::list_by_participant_and_status(
        &mut *conn,
        caller_id,
        TripStatus::Finished,
        params,
    )
    .await?;
    paged(&mut *conn, trips, params, total).await
}

/// Waiting trips the caller actually created (not merely joined).
pub async fn created_trips(
    db: &DbPool,
    caller_id: i64,
    params: PageParams,
) -> Result<PagedResponse<TripResponse>, AppError> {
    let params = params.normalized();
    let mut conn = db.acquire().await?;
    let total =
        store::trips::count_by_creator_and_status(&mut *conn, caller_id, TripStatus::Waiting)
            .await?;
    let trips = store::trips::list_by_creator_and_status(
        &mut *conn,
        caller_id,
        TripStatus::Waiting,
        params,
    )
    .await?;
    paged(&mut *conn, trips, params, total).await
}

pub(crate) async fn project_trip(
    conn: &mut SqliteConnection,
    trip: Trip,
) -> Result<TripResponse, AppError> {
    let restrictions = store::trips::list_restrictions(conn, trip.id).await?;
    let participants = store::trips::list_participants(conn, trip.id).await?;
    TripResponse::from_parts(trip, restrictions, participants)
}

async fn paged(
    conn: &mut SqliteConnection,
    trips: Vec<Trip>,
    params: PageParams,
    total: i64,
) -> Result<PagedResponse<TripResponse>, AppError> {
    let mut items = Vec::with_capacity(trips.len());
    for trip in trips {
        items.push(project_trip(conn, trip).await?);
    }
    Ok(PagedResponse::new(items, params, total.max(0) as u64))
}

fn validate_price_and_window(
    price: f64,
    begin_at: DateTime<Utc>,
    end_at: DateTime<Utc>,
) -> Result<(), AppError> {
    if price < 0.0 || !price.is_finite() {
        return Err(AppError::BadRequest(
            "price per person must be non-negative".into(),
        ));
    }
    if begin_at >= end_at {
        return Err(AppError::BadRequest(
            "trip must begin before it ends".into(),
        ));
    }
    Ok(())
}
