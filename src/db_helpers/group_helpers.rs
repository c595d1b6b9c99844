use sqlx::{Sqlite, SqliteExecutor, SqlitePool};

use crate::{errors::RequestError, models::Group};

use super::{begin_write, QueryBuilder};

pub async fn create_group_in_db(
    pool: &SqlitePool,
    title: &str,
    slug: &str,
    description: &str,
) -> Result<Group, RequestError> {
    if slug.trim().is_empty() {
        return Err(RequestError::constraint("group slug must not be empty"));
    }
    let mut tx = begin_write(pool).await?;
    let group = sqlx::query_as::<Sqlite, Group>(
        r#"
        INSERT INTO post_groups (title, slug, description)
        VALUES ($1, $2, $3)
        RETURNING id, title, slug, description
        "#,
    )
    .bind(title)
    .bind(slug)
    .bind(description)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(group)
}

pub async fn get_group_by_slug_in_db<'e, E>(executor: E, slug: &str) -> Result<Group, RequestError>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<Sqlite, Group>(
        "SELECT id, title, slug, description FROM post_groups WHERE slug = $1",
    )
    .bind(slug)
    .fetch_optional(executor)
    .await?
    .ok_or(RequestError::NotFound("Group"))
}

pub async fn list_groups_in_db(pool: &SqlitePool) -> Result<Vec<Group>, RequestError> {
    let groups = sqlx::query_as::<Sqlite, Group>(
        "SELECT id, title, slug, description FROM post_groups ORDER BY title, id",
    )
    .fetch_all(pool)
    .await?;
    Ok(groups)
}

/// Cosmetic edit; the slug stays the group's identity.
pub async fn update_group_in_db(
    pool: &SqlitePool,
    slug: &str,
    title: Option<String>,
    description: Option<String>,
) -> Result<Group, RequestError> {
    let mut tx = begin_write(pool).await?;
    let (query, params) = QueryBuilder::new("UPDATE post_groups SET ".to_owned(), Some(", "))
        .add_param("title", title)
        .add_param("description", description)
        .build();

    if !query.is_empty() {
        let query = format!("{query} WHERE slug = ${}", params.len() + 1);
        let mut update = sqlx::query(&query);
        for param in params {
            update = update.bind(param);
        }
        let result = update.bind(slug).execute(&mut *tx).await?;
        if result.rows_affected() == 0 {
            return Err(RequestError::NotFound("Group"));
        }
    }

    let group = get_group_by_slug_in_db(&mut *tx, slug).await?;
    tx.commit().await?;
    Ok(group)
}

/// Posts of the group survive with their group cleared.
pub async fn delete_group_in_db(pool: &SqlitePool, slug: &str) -> Result<(), RequestError> {
    let result = sqlx::query("DELETE FROM post_groups WHERE slug = $1")
        .bind(slug)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(RequestError::NotFound("Group"));
    }
    Ok(())
}
