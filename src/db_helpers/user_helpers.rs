use chrono::Utc;
use sqlx::{Sqlite, SqlitePool};

use crate::{data_formats::RegisterRequest, errors::RequestError, models::User};

use super::{begin_write, USER_COLUMNS};

/// Expects `user.password` to be hashed already.
pub async fn insert_user(pool: &SqlitePool, user: &RegisterRequest) -> Result<User, RequestError> {
    if user.username.trim().is_empty() {
        return Err(RequestError::constraint("username must not be empty"));
    }
    let query = format!(
        r#"
        INSERT INTO users (email, username, password, created_at)
        VALUES ($1, $2, $3, $4)
        RETURNING {USER_COLUMNS}
        "#
    );
    let mut tx = begin_write(pool).await?;
    let user = sqlx::query_as::<Sqlite, User>(&query)
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.password)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(user)
}

/// Removes the user with their posts, comments and follow edges in both directions.
pub async fn delete_user_in_db(pool: &SqlitePool, id: i64) -> Result<(), RequestError> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(RequestError::NotFound("User"));
    }
    Ok(())
}
