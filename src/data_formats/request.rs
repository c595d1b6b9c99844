use serde::{Deserialize, Serialize};

// ----------------- User Request -----------------
#[derive(Deserialize, Serialize, Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub username: String,
}

// ----------------- Post Request -----------------
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct PostRequest {
    pub text: String,
    /// Group slug; absent or empty leaves the post without a group.
    #[serde(default)]
    pub group: Option<String>,
    /// Reference into the blob store.
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct CommentRequest {
    pub text: String,
}
