use chrono::Utc;
use sqlx::{Sqlite, SqlitePool};

use crate::{errors::RequestError, models::Comment};

use super::{begin_write, get_post_in_db};

const COMMENT_QUERY: &str = r#"
        SELECT comments.id         AS "id",
               comments.post_id    AS "post_id",
               comments.author_id  AS "author_id",
               users.username      AS "author_username",
               comments.text       AS "text",
               comments.created    AS "created"
        FROM   comments
            JOIN users
                ON users.id = comments.author_id
"#;

pub async fn create_comment_in_db(
    pool: &SqlitePool,
    post_id: i64,
    author_id: i64,
    text: &str,
) -> Result<Comment, RequestError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(RequestError::constraint("comment text must not be empty"));
    }
    let mut tx = begin_write(pool).await?;
    get_post_in_db(&mut *tx, post_id).await?;

    let id = sqlx::query_scalar::<Sqlite, i64>(
        r#"
        INSERT INTO comments (post_id, author_id, text, created)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(post_id)
    .bind(author_id)
    .bind(text)
    .bind(Utc::now())
    .fetch_one(&mut *tx)
    .await?;

    let query = format!("{COMMENT_QUERY} WHERE comments.id = $1");
    let comment = sqlx::query_as::<Sqlite, Comment>(&query)
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(comment)
}

/// Newest comment first.
pub async fn list_comments_for_post_in_db(
    pool: &SqlitePool,
    post_id: i64,
) -> Result<Vec<Comment>, RequestError> {
    let query = format!(
        "{COMMENT_QUERY} WHERE comments.post_id = $1 ORDER BY comments.created DESC, comments.id DESC"
    );
    let comments = sqlx::query_as::<Sqlite, Comment>(&query)
        .bind(post_id)
        .fetch_all(pool)
        .await?;
    Ok(comments)
}
