use serde::{Deserialize, Serialize};

use crate::feed::FeedPage;

use super::response::{CommentResponse, GroupResponse, PostResponse, ProfileResponse};

#[derive(Debug, Deserialize, Serialize)]
pub struct UserWrapper<T> {
    pub user: T,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ProfileWrapper {
    pub profile: ProfileResponse,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct PostWrapper<T> {
    pub post: T,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CommentWrapper<T> {
    pub comment: T,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct GroupsWrapper {
    pub groups: Vec<GroupResponse>,
}

/// One page of a feed, with the group or author it was scoped to.
#[derive(Debug, Deserialize, Serialize)]
pub struct PostsPageWrapper {
    pub posts: Vec<PostResponse>,
    pub page: u32,
    #[serde(rename = "totalPages")]
    pub total_pages: u32,
    #[serde(rename = "postsCount")]
    pub posts_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<GroupResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<ProfileResponse>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct PostDetailWrapper {
    pub post: PostResponse,
    pub comments: Vec<CommentResponse>,
    #[serde(rename = "authorPostsCount")]
    pub author_posts_count: i64,
}

impl<T> UserWrapper<T> {
    pub fn wrap_with_user_data(request: T) -> UserWrapper<T> {
        UserWrapper { user: request }
    }
}

impl PostsPageWrapper {
    /// The author profile is left for the caller, it depends on the viewer.
    pub fn new(feed: FeedPage) -> Self {
        PostsPageWrapper {
            posts: feed.posts.into_iter().map(PostResponse::from).collect(),
            page: feed.page.get(),
            total_pages: feed.total_pages,
            posts_count: feed.total_count,
            group: feed.group.map(GroupResponse::from),
            author: None,
        }
    }
}
