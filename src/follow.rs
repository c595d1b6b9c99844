//! Follow and unfollow on behalf of the current user.
//!
//! Following yourself and following twice are silently ignored, as is
//! unfollowing someone you never followed.

use sqlx::SqlitePool;

use crate::{
    db_helpers::{delete_follow_in_db, follow_exists_in_db, get_user_by_username, insert_follow_in_db},
    errors::RequestError,
    models::User,
};

/// Makes `user_id` follow `author_username` and returns the author.
pub async fn follow(
    pool: &SqlitePool,
    user_id: i64,
    author_username: &str,
) -> Result<User, RequestError> {
    let author = find_author(pool, author_username).await?;
    if author.id == user_id {
        tracing::debug!(user_id, "ignoring self-follow");
        return Ok(author);
    }

    if insert_follow_in_db(pool, user_id, author.id).await?.is_some() {
        tracing::info!(user_id, author_id = author.id, "followed author");
    }
    Ok(author)
}

pub async fn unfollow(
    pool: &SqlitePool,
    user_id: i64,
    author_username: &str,
) -> Result<User, RequestError> {
    let author = find_author(pool, author_username).await?;
    if delete_follow_in_db(pool, user_id, author.id).await? {
        tracing::info!(user_id, author_id = author.id, "unfollowed author");
    }
    Ok(author)
}

pub async fn is_following(
    pool: &SqlitePool,
    user_id: i64,
    author_id: i64,
) -> Result<bool, RequestError> {
    follow_exists_in_db(pool, user_id, author_id).await
}

async fn find_author(pool: &SqlitePool, username: &str) -> Result<User, RequestError> {
    get_user_by_username(pool, username)
        .await?
        .ok_or(RequestError::NotFound("Author"))
}
