use sqlx::{Sqlite, SqliteExecutor, SqlitePool, Transaction};

use crate::{errors::RequestError, models::User};

mod comment_helpers;
mod follow_helpers;
mod group_helpers;
mod post_helpers;
mod user_helpers;

pub use comment_helpers::*;
pub use follow_helpers::*;
pub use group_helpers::*;
pub use post_helpers::*;
pub use user_helpers::*;

const USER_COLUMNS: &str = "id, username, email, password, created_at";

struct QueryBuilder {
    query: String,
    params: Vec<String>,
    seperator: Option<&'static str>,
    counter: usize,
}

impl QueryBuilder {
    fn new(initial: String, seperator: Option<&'static str>) -> Self {
        Self {
            query: initial,
            params: vec![],
            seperator,
            counter: 0,
        }
    }

    fn add_param(mut self, column: &str, param: Option<String>) -> Self {
        if let Some(value) = param {
            let filter = format!("{} = ${} ", column, self.params.len() + 1);
            self.query.push_str(&filter);
            if let Some(seperator) = self.seperator {
                self.query.push_str(seperator);
            }
            self.params.push(value);
            self.counter += 1;
        }
        self
    }

    fn trim(mut self) -> Self {
        if let Some(seperator) = self.seperator {
            self.query = self.query.trim_end_matches(seperator).to_string();
        }
        self
    }

    /// Returns an empty query when no parameter was added.
    fn build(mut self) -> (String, Vec<String>) {
        self = self.trim();
        self.query = if self.counter > 0 {
            self.query
        } else {
            String::new()
        };
        (self.query, self.params)
    }
}

// ----------------- Helper Functions -----------------

/// Takes the write lock at `BEGIN`; reads inside never need a lock upgrade.
pub(crate) async fn begin_write(
    pool: &SqlitePool,
) -> Result<Transaction<'static, Sqlite>, RequestError> {
    Ok(pool.begin_with("BEGIN IMMEDIATE").await?)
}

pub async fn get_user_by_username<'e, E>(
    executor: E,
    username: &str,
) -> Result<Option<User>, RequestError>
where
    E: SqliteExecutor<'e>,
{
    let query = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");
    let result = sqlx::query_as::<Sqlite, User>(&query)
        .bind(username)
        .fetch_optional(executor)
        .await?;
    Ok(result)
}

pub async fn get_user_by_email<'e, E>(executor: E, email: &str) -> Result<Option<User>, RequestError>
where
    E: SqliteExecutor<'e>,
{
    let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
    let result = sqlx::query_as::<Sqlite, User>(&query)
        .bind(email)
        .fetch_optional(executor)
        .await?;
    Ok(result)
}
