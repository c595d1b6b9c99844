use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqliteExecutor, SqlitePool};

use crate::{data_formats::PostRequest, errors::RequestError, models::Post};

use super::{begin_write, get_group_by_slug_in_db};

const POST_QUERY: &str = r#"
            SELECT posts.id            AS "id",
                   posts.text          AS "text",
                   posts.pub_date      AS "pub_date",
                   posts.image         AS "image",
                   posts.author_id     AS "author_id",
                   users.username      AS "author_username",
                   posts.group_id      AS "group_id",
                   post_groups.slug    AS "group_slug",
                   post_groups.title   AS "group_title"
            FROM   posts
                JOIN users
                    ON users.id = posts.author_id
                LEFT JOIN post_groups
                    ON post_groups.id = posts.group_id
"#;

// $1 group, $2 author, $3 follower; NULL disables the condition.
const POST_FILTER: &str = r#"
            WHERE  ( posts.group_id = $1
                    OR $1 IS NULL )
                AND ( posts.author_id = $2
                    OR $2 IS NULL )
                AND ( posts.author_id IN (SELECT follows.author_id
                                          FROM   follows
                                          WHERE  follows.user_id = $3)
                    OR $3 IS NULL )
"#;

/// Which posts a listing selects. Every set field narrows the result.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PostFilter {
    pub group_id: Option<i64>,
    pub author_id: Option<i64>,
    /// Only posts by authors this user follows.
    pub followed_by: Option<i64>,
}

/// Posts matching `filter`, newest first, ties broken by the higher id.
pub async fn list_posts_in_db(
    pool: &SqlitePool,
    filter: PostFilter,
    limit: i64,
    offset: i64,
) -> Result<Vec<Post>, RequestError> {
    let query = format!(
        "{POST_QUERY} {POST_FILTER} ORDER BY posts.pub_date DESC, posts.id DESC LIMIT $4 OFFSET $5"
    );
    let posts = sqlx::query_as::<Sqlite, Post>(&query)
        .bind(filter.group_id)
        .bind(filter.author_id)
        .bind(filter.followed_by)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
    Ok(posts)
}

pub async fn count_posts_in_db(pool: &SqlitePool, filter: PostFilter) -> Result<i64, RequestError> {
    let query = format!("SELECT COUNT(*) FROM posts {POST_FILTER}");
    let count = sqlx::query_scalar::<Sqlite, i64>(&query)
        .bind(filter.group_id)
        .bind(filter.author_id)
        .bind(filter.followed_by)
        .fetch_one(pool)
        .await?;
    Ok(count)
}

pub async fn get_post_in_db<'e, E>(executor: E, id: i64) -> Result<Post, RequestError>
where
    E: SqliteExecutor<'e>,
{
    let query = format!("{POST_QUERY} WHERE posts.id = $1");
    sqlx::query_as::<Sqlite, Post>(&query)
        .bind(id)
        .fetch_optional(executor)
        .await?
        .ok_or(RequestError::NotFound("Post"))
}

/// Publishes a post; `pub_date` is stamped here and never touched again.
pub async fn create_post_in_db(
    pool: &SqlitePool,
    author_id: i64,
    PostRequest { text, group, image }: PostRequest,
) -> Result<Post, RequestError> {
    let text = validate_text(&text)?;
    let mut tx = begin_write(pool).await?;
    let group_id = resolve_group_id(&mut *tx, group.as_deref()).await?;
    let id = insert_post(
        &mut *tx,
        author_id,
        &text,
        group_id,
        normalize_image(image).as_deref(),
        Utc::now(),
    )
    .await?;
    let post = get_post_in_db(&mut *tx, id).await?;
    tx.commit().await?;
    Ok(post)
}

pub(crate) async fn insert_post<'e, E>(
    executor: E,
    author_id: i64,
    text: &str,
    group_id: Option<i64>,
    image: Option<&str>,
    pub_date: DateTime<Utc>,
) -> Result<i64, RequestError>
where
    E: SqliteExecutor<'e>,
{
    let id = sqlx::query_scalar::<Sqlite, i64>(
        r#"
        INSERT INTO posts (text, pub_date, image, author_id, group_id)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(text)
    .bind(pub_date)
    .bind(image)
    .bind(author_id)
    .bind(group_id)
    .fetch_one(executor)
    .await?;
    Ok(id)
}

/// Replaces text, group and image. Ownership is checked by the caller.
pub async fn update_post_in_db(
    pool: &SqlitePool,
    id: i64,
    PostRequest { text, group, image }: PostRequest,
) -> Result<Post, RequestError> {
    let text = validate_text(&text)?;
    let mut tx = begin_write(pool).await?;
    let group_id = resolve_group_id(&mut *tx, group.as_deref()).await?;
    let result = sqlx::query(
        r#"
        UPDATE posts SET text = $1, group_id = $2, image = $3
        WHERE id = $4
        "#,
    )
    .bind(&text)
    .bind(group_id)
    .bind(normalize_image(image))
    .bind(id)
    .execute(&mut *tx)
    .await?;
    if result.rows_affected() == 0 {
        return Err(RequestError::NotFound("Post"));
    }
    let post = get_post_in_db(&mut *tx, id).await?;
    tx.commit().await?;
    Ok(post)
}

fn validate_text(text: &str) -> Result<String, RequestError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(RequestError::constraint("post text must not be empty"));
    }
    Ok(text.to_owned())
}

fn normalize_image(image: Option<String>) -> Option<String> {
    image.filter(|path| !path.trim().is_empty())
}

async fn resolve_group_id<'e, E>(executor: E, slug: Option<&str>) -> Result<Option<i64>, RequestError>
where
    E: SqliteExecutor<'e>,
{
    let Some(slug) = slug.filter(|slug| !slug.is_empty()) else {
        return Ok(None);
    };
    match get_group_by_slug_in_db(executor, slug).await {
        Ok(group) => Ok(Some(group.id)),
        Err(RequestError::NotFound(_)) => Err(RequestError::constraint(format!(
            "group `{slug}` does not exist"
        ))),
        Err(error) => Err(error),
    }
}
