use sqlx::{Sqlite, SqliteExecutor};

use crate::{errors::RequestError, models::Follow};

/// `None` when the pair already existed.
pub async fn insert_follow_in_db<'e, E>(
    executor: E,
    user_id: i64,
    author_id: i64,
) -> Result<Option<Follow>, RequestError>
where
    E: SqliteExecutor<'e>,
{
    let follow = sqlx::query_as::<Sqlite, Follow>(
        r#"
        INSERT INTO follows (user_id, author_id)
        VALUES ($1, $2)
        ON CONFLICT (user_id, author_id) DO NOTHING
        RETURNING id, user_id, author_id
        "#,
    )
    .bind(user_id)
    .bind(author_id)
    .fetch_optional(executor)
    .await?;
    Ok(follow)
}

/// Returns whether an edge was removed.
pub async fn delete_follow_in_db<'e, E>(
    executor: E,
    user_id: i64,
    author_id: i64,
) -> Result<bool, RequestError>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM follows WHERE user_id = $1 AND author_id = $2")
        .bind(user_id)
        .bind(author_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn follow_exists_in_db<'e, E>(
    executor: E,
    user_id: i64,
    author_id: i64,
) -> Result<bool, RequestError>
where
    E: SqliteExecutor<'e>,
{
    let edges = sqlx::query_scalar::<Sqlite, i64>(
        "SELECT COUNT(*) FROM follows WHERE user_id = $1 AND author_id = $2",
    )
    .bind(user_id)
    .bind(author_id)
    .fetch_one(executor)
    .await?;
    Ok(edges > 0)
}
