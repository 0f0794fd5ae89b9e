use crate::{
    db::DbPool,
    error::AppError,
    models::user::{User, UserResponse},
    store,
};

/// Identity lookup: resolves a user id to its record or `UserNotFound`.
pub async fn resolve_user(db: &DbPool, user_id: i64) -> Result<User, AppError> {
    let mut conn = db.acquire().await?;
    store::users::find_by_id(&mut *conn, user_id)
        .await?
        .ok_or(AppError::UserNotFound)
}

pub async fn get_user(db: &DbPool, user_id: i64) -> Result<UserResponse, AppError> {
    let user = resolve_user(db, user_id).await?;
    Ok(user.into())
}
