use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Comment, Group, Post, User};

#[derive(Deserialize, Serialize, Debug)]
pub struct UserResponse {
    pub email: String,
    pub token: String,
    pub username: String,
}

#[derive(Deserialize, Serialize, Debug, Default, Clone)]
pub struct ProfileResponse {
    pub username: String,
    pub following: bool,
    #[serde(rename = "postsCount")]
    pub posts_count: i64,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct GroupResponse {
    pub title: String,
    pub slug: String,
    pub description: String,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct GroupSummary {
    pub slug: String,
    pub title: String,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct PostResponse {
    pub id: i64,
    pub text: String,
    #[serde(rename = "pubDate")]
    pub pub_date: DateTime<Utc>,
    pub image: Option<String>,
    pub author: String,
    pub group: Option<GroupSummary>,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct CommentResponse {
    pub id: i64,
    pub text: String,
    pub created: DateTime<Utc>,
    pub author: String,
}

impl UserResponse {
    pub fn new(User { username, email, .. }: User, token: String) -> Self {
        UserResponse {
            email,
            token,
            username,
        }
    }
}

impl ProfileResponse {
    pub fn new(User { username, .. }: User, following: bool, posts_count: i64) -> Self {
        ProfileResponse {
            username,
            following,
            posts_count,
        }
    }
}

impl From<Group> for GroupResponse {
    fn from(
        Group {
            title,
            slug,
            description,
            ..
        }: Group,
    ) -> Self {
        GroupResponse {
            title,
            slug,
            description,
        }
    }
}

impl From<Post> for PostResponse {
    fn from(
        Post {
            id,
            text,
            pub_date,
            image,
            author_username,
            group_slug,
            group_title,
            ..
        }: Post,
    ) -> Self {
        let group = match (group_slug, group_title) {
            (Some(slug), Some(title)) => Some(GroupSummary { slug, title }),
            _ => None,
        };
        PostResponse {
            id,
            text,
            pub_date,
            image,
            author: author_username,
            group,
        }
    }
}

impl From<Comment> for CommentResponse {
    fn from(
        Comment {
            id,
            text,
            created,
            author_username,
            ..
        }: Comment,
    ) -> Self {
        CommentResponse {
            id,
            text,
            created,
            author: author_username,
        }
    }
}
