use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use sqlx::SqlitePool;

use crate::{
    authentication::{hash_password_argon2, verify_password_argon2, AuthUser, MaybeUser},
    data_formats::{
        CommentRequest, CommentResponse, CommentWrapper, GroupResponse, GroupsWrapper,
        LoginRequest, PageQuery, PostDetailWrapper, PostRequest, PostResponse, PostWrapper,
        PostsPageWrapper, ProfileResponse, ProfileWrapper, RegisterRequest, UserResponse,
        UserWrapper,
    },
    db_helpers::{
        count_posts_in_db, create_comment_in_db, create_post_in_db, delete_user_in_db,
        get_post_in_db, get_user_by_email, insert_user, list_comments_for_post_in_db,
        list_groups_in_db, update_post_in_db, PostFilter,
    },
    errors::{RequestError, RequestErrorJsonWrapper},
    feed::{assemble_feed, FeedSelector},
    follow::{follow, is_following, unfollow},
    models::User,
    page_cache::index_page_key,
    AppState, JsonResponse,
};

type UserJson = UserWrapper<UserResponse>;
type JsonResult<T> = Result<Json<T>, RequestError>;

// ----------------- Helper Handlers -----------------
pub async fn alive() -> &'static str {
    "alive"
}

pub async fn not_found(uri: Uri) -> JsonResponse<RequestErrorJsonWrapper> {
    (
        StatusCode::NOT_FOUND,
        Json(RequestErrorJsonWrapper::new(&format!(
            "URL {} provided was not found",
            uri
        ))),
    )
}

async fn profile_of(
    pool: &SqlitePool,
    viewer: Option<i64>,
    author: User,
) -> Result<ProfileResponse, RequestError> {
    let following = match viewer {
        Some(viewer) => is_following(pool, viewer, author.id).await?,
        None => false,
    };
    let posts_count = count_posts_in_db(
        pool,
        PostFilter {
            author_id: Some(author.id),
            ..Default::default()
        },
    )
    .await?;
    Ok(ProfileResponse::new(author, following, posts_count))
}

// ----------------- User Handlers -----------------
pub async fn register_user(
    State(state): State<AppState>,
    Json(UserWrapper { mut user }): Json<UserWrapper<RegisterRequest>>,
) -> JsonResult<UserJson> {
    user.password = hash_password_argon2(user.password).await.map_err(|e| {
        tracing::error!(error = %e, "could not hash password");
        RequestError::ServerError
    })?;

    let user = insert_user(&state.pool, &user).await?;
    let token = state.tokens.issue(user.id).map_err(|e| {
        tracing::error!(error = %e, "could not issue token");
        RequestError::ServerError
    })?;
    tracing::info!(user_id = user.id, username = %user.username, "registered user");
    Ok(Json(UserWrapper::wrap_with_user_data(UserResponse::new(
        user, token,
    ))))
}

pub async fn login_user(
    State(state): State<AppState>,
    Json(UserWrapper { user: request }): Json<UserWrapper<LoginRequest>>,
) -> JsonResult<UserJson> {
    let user = get_user_by_email(&state.pool, &request.email)
        .await?
        .ok_or(RequestError::NotAuthorized("Incorrect email or password"))?;

    let is_password_correct = verify_password_argon2(request.password, &user.password)
        .await
        .map_err(|_| RequestError::NotAuthorized("Incorrect email or password"))?;
    if !is_password_correct {
        return Err(RequestError::NotAuthorized("Incorrect email or password"));
    }

    let token = state.tokens.issue(user.id).map_err(|e| {
        tracing::error!(error = %e, "could not issue token");
        RequestError::ServerError
    })?;
    Ok(Json(UserWrapper::wrap_with_user_data(UserResponse::new(
        user, token,
    ))))
}

pub async fn delete_current_user(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<StatusCode, RequestError> {
    delete_user_in_db(&state.pool, user.id).await?;
    tracing::info!(user_id = user.id, "deleted user and everything they owned");
    Ok(StatusCode::NO_CONTENT)
}
// ----------------- End User Handlers -----------------

// ----------------- Feed Handlers -----------------

/// The all-posts feed, served from the page cache while the entry is fresh.
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Response, RequestError> {
    let page = query.page_number();
    let key = index_page_key(page);

    if let Some(body) = state.index_cache.get(&key).await {
        tracing::debug!(%page, "index page served from cache");
        return Ok(json_body(body));
    }

    let feed = assemble_feed(&state.pool, FeedSelector::AllPosts, page).await?;
    let body = serde_json::to_vec(&PostsPageWrapper::new(feed)).map_err(|e| {
        tracing::error!(error = %e, "could not serialize index page");
        RequestError::ServerError
    })?;
    let body = Bytes::from(body);
    state
        .index_cache
        .put(key, body.clone(), state.index_ttl)
        .await;
    Ok(json_body(body))
}

fn json_body(body: Bytes) -> Response {
    ([(header::CONTENT_TYPE, "application/json")], body).into_response()
}

pub async fn list_groups(State(state): State<AppState>) -> JsonResult<GroupsWrapper> {
    let groups = list_groups_in_db(&state.pool).await?;
    Ok(Json(GroupsWrapper {
        groups: groups.into_iter().map(GroupResponse::from).collect(),
    }))
}

pub async fn group_posts(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> JsonResult<PostsPageWrapper> {
    let feed = assemble_feed(
        &state.pool,
        FeedSelector::PostsInGroup(&slug),
        query.page_number(),
    )
    .await?;
    Ok(Json(PostsPageWrapper::new(feed)))
}

pub async fn profile(
    State(state): State<AppState>,
    maybe_user: MaybeUser,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> JsonResult<PostsPageWrapper> {
    let mut feed = assemble_feed(
        &state.pool,
        FeedSelector::PostsByAuthor(&username),
        query.page_number(),
    )
    .await?;
    let author = feed.author.take().ok_or(RequestError::NotFound("Author"))?;
    let author = profile_of(&state.pool, maybe_user.get_id(), author).await?;

    let mut page = PostsPageWrapper::new(feed);
    page.author = Some(author);
    Ok(Json(page))
}

pub async fn follow_index(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<PageQuery>,
) -> JsonResult<PostsPageWrapper> {
    let feed = assemble_feed(
        &state.pool,
        FeedSelector::PostsFromFollowedAuthors(user.id),
        query.page_number(),
    )
    .await?;
    Ok(Json(PostsPageWrapper::new(feed)))
}
// ----------------- End Feed Handlers -----------------

// ----------------- Post Handlers -----------------
pub async fn post_detail(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
) -> JsonResult<PostDetailWrapper> {
    let post = get_post_in_db(&state.pool, post_id).await?;
    let comments = list_comments_for_post_in_db(&state.pool, post.id).await?;
    let author_posts_count = count_posts_in_db(
        &state.pool,
        PostFilter {
            author_id: Some(post.author_id),
            ..Default::default()
        },
    )
    .await?;
    Ok(Json(PostDetailWrapper {
        post: PostResponse::from(post),
        comments: comments.into_iter().map(CommentResponse::from).collect(),
        author_posts_count,
    }))
}

pub async fn create_post(
    State(state): State<AppState>,
    user: AuthUser,
    Json(PostWrapper { post }): Json<PostWrapper<PostRequest>>,
) -> Result<(StatusCode, Json<PostWrapper<PostResponse>>), RequestError> {
    let post = create_post_in_db(&state.pool, user.id, post).await?;
    tracing::info!(post_id = post.id, author_id = user.id, "post created");
    Ok((
        StatusCode::CREATED,
        Json(PostWrapper {
            post: PostResponse::from(post),
        }),
    ))
}

pub async fn edit_post(
    State(state): State<AppState>,
    user: AuthUser,
    Path(post_id): Path<i64>,
    Json(PostWrapper { post }): Json<PostWrapper<PostRequest>>,
) -> JsonResult<PostWrapper<PostResponse>> {
    let existing = get_post_in_db(&state.pool, post_id).await?;
    if existing.author_id != user.id {
        return Err(RequestError::Forbidden);
    }
    let post = update_post_in_db(&state.pool, post_id, post).await?;
    Ok(Json(PostWrapper {
        post: PostResponse::from(post),
    }))
}
// ----------------- End Post Handlers -----------------

// ----------------- Comment Handlers -----------------
pub async fn add_comment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(post_id): Path<i64>,
    Json(CommentWrapper { comment }): Json<CommentWrapper<CommentRequest>>,
) -> Result<(StatusCode, Json<CommentWrapper<CommentResponse>>), RequestError> {
    let comment = create_comment_in_db(&state.pool, post_id, user.id, &comment.text).await?;
    Ok((
        StatusCode::CREATED,
        Json(CommentWrapper {
            comment: CommentResponse::from(comment),
        }),
    ))
}

// ----------------- Follow Handlers -----------------
pub async fn profile_follow(
    State(state): State<AppState>,
    user: AuthUser,
    Path(username): Path<String>,
) -> JsonResult<ProfileWrapper> {
    let author = follow(&state.pool, user.id, &username).await?;
    let profile = profile_of(&state.pool, Some(user.id), author).await?;
    Ok(Json(ProfileWrapper { profile }))
}

pub async fn profile_unfollow(
    State(state): State<AppState>,
    user: AuthUser,
    Path(username): Path<String>,
) -> JsonResult<ProfileWrapper> {
    let author = unfollow(&state.pool, user.id, &username).await?;
    let profile = profile_of(&state.pool, Some(user.id), author).await?;
    Ok(Json(ProfileWrapper { profile }))
}
