//! Feed assembly: which posts a view shows, in what order, one page at a time.

use sqlx::SqlitePool;

use crate::{
    db_helpers::{
        count_posts_in_db, get_group_by_slug_in_db, get_user_by_username, list_posts_in_db,
        PostFilter,
    },
    errors::RequestError,
    models::{Group, Post, User},
    pagination::{PageNumber, Paginator},
};

/// The viewing context of a feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedSelector<'a> {
    AllPosts,
    /// By group slug.
    PostsInGroup(&'a str),
    /// By author username.
    PostsByAuthor(&'a str),
    /// Posts of every author the given user follows.
    PostsFromFollowedAuthors(i64),
}

#[derive(Debug, Clone)]
pub struct FeedPage {
    pub posts: Vec<Post>,
    pub page: PageNumber,
    pub total_pages: u32,
    pub total_count: i64,
    /// Set for `PostsInGroup`.
    pub group: Option<Group>,
    /// Set for `PostsByAuthor`.
    pub author: Option<User>,
}

pub async fn assemble_feed(
    pool: &SqlitePool,
    selector: FeedSelector<'_>,
    page: PageNumber,
) -> Result<FeedPage, RequestError> {
    let paginator = Paginator::default();
    let mut group = None;
    let mut author = None;

    let filter = match selector {
        FeedSelector::AllPosts => PostFilter::default(),
        FeedSelector::PostsInGroup(slug) => {
            let found = get_group_by_slug_in_db(pool, slug).await?;
            let filter = PostFilter {
                group_id: Some(found.id),
                ..Default::default()
            };
            group = Some(found);
            filter
        }
        FeedSelector::PostsByAuthor(username) => {
            let found = get_user_by_username(pool, username)
                .await?
                .ok_or(RequestError::NotFound("Author"))?;
            let filter = PostFilter {
                author_id: Some(found.id),
                ..Default::default()
            };
            author = Some(found);
            filter
        }
        FeedSelector::PostsFromFollowedAuthors(user_id) => PostFilter {
            followed_by: Some(user_id),
            ..Default::default()
        },
    };

    let total_count = count_posts_in_db(pool, filter).await?;
    let count = u64::try_from(total_count).unwrap_or_default();

    let posts = if paginator.page_len(count, page) == 0 {
        Vec::new()
    } else {
        let window = paginator.window(page);
        let offset = i64::try_from(window.offset).unwrap_or(i64::MAX);
        list_posts_in_db(pool, filter, i64::from(window.limit), offset).await?
    };

    tracing::debug!(?selector, %page, total_count, returned = posts.len(), "assembled feed");

    Ok(FeedPage {
        posts,
        page,
        total_pages: paginator.total_pages(count),
        total_count,
        group,
        author,
    })
}
