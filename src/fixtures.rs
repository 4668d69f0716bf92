//! Builders for the accounts, sessions, uploads and posts scenarios need as
//! preconditions. Setup failures here abort the calling scenario.

use rand::{distributions::Alphanumeric, Rng};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::assertions::expect_status;
use crate::client::{ApiClient, ApiResponse, FilePart};
use crate::error::{HarnessError, HarnessResult};
use crate::models::{
    first_scalar, Post, Profile, Session, TestUser, UploadedMedia, TOKEN_FIELDS, UPLOAD_REF_FIELDS,
    USER_ID_FIELDS,
};

/// A 1x1 transparent PNG.
pub const PNG_1X1: &[u8] = &[
    0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48, 0x44, 0x52,
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1f, 0x15, 0xc4,
    0x89, 0x00, 0x00, 0x00, 0x0a, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9c, 0x63, 0x60, 0x00, 0x00, 0x00,
    0x02, 0x00, 0x01, 0xe2, 0x21, 0xbc, 0x33, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4e, 0x44, 0xae,
    0x42, 0x60, 0x82,
];

/// How `create_user` treats an account that already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignupPolicy {
    RequireCreated,
    /// Accept 409 so fixed fixtures survive re-runs.
    AllowExisting,
}

pub fn random_string(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

pub fn png_file(file_name: &str) -> FilePart {
    FilePart {
        file_name: file_name.to_string(),
        content_type: "image/png",
        bytes: PNG_1X1.to_vec(),
    }
}

pub async fn signup(client: &ApiClient, user: &TestUser) -> HarnessResult<ApiResponse> {
    client.post_json(&["auth", "signup"], &serde_json::to_value(user)?, None).await
}

pub async fn create_user(client: &ApiClient, user: TestUser, policy: SignupPolicy) -> HarnessResult<TestUser> {
    let response = signup(client, &user).await?;
    let accepted: &[u16] = match policy {
        SignupPolicy::RequireCreated => &[200, 201],
        SignupPolicy::AllowExisting => &[200, 201, 409],
    };
    expect_status(&response, accepted, &format!("signup {}", user.username))?;
    debug!(username = %user.username, status = response.status_code(), "fixture user ready");
    Ok(user)
}

pub async fn login(client: &ApiClient, email: &str, password: &str) -> HarnessResult<ApiResponse> {
    client
        .post_json(&["auth", "login"], &json!({ "email": email, "password": password }), None)
        .await
}

pub async fn authenticate(client: &ApiClient, user: &TestUser) -> HarnessResult<Session> {
    let context = format!("login {}", user.email);
    let response = login(client, &user.email, &user.password)
        .await?
        .ensure_success(&context)?;
    let body = response.json_body(&context)?;
    token_from(body)
        .map(Session::new)
        .ok_or(HarnessError::MissingField {
            context,
            fields: TOKEN_FIELDS,
        })
}

pub fn token_from(body: &Value) -> Option<String> {
    first_scalar(body, TOKEN_FIELDS)
}

/// Signs up a fresh account and logs it in.
pub async fn user_with_session(client: &ApiClient, prefix: &str) -> HarnessResult<(TestUser, Session)> {
    let user = create_user(client, TestUser::generate(prefix), SignupPolicy::RequireCreated).await?;
    let session = authenticate(client, &user).await?;
    info!(username = %user.username, "fixture session established");
    Ok((user, session))
}

pub async fn fetch_profile(
    client: &ApiClient,
    username: &str,
    session: Option<&Session>,
) -> HarnessResult<ApiResponse> {
    client.get(&["users", username], session).await
}

/// Strict profile fetch for setup steps.
pub async fn require_profile(client: &ApiClient, username: &str, session: &Session) -> HarnessResult<Profile> {
    let context = format!("get profile {username}");
    let response = fetch_profile(client, username, Some(session))
        .await?
        .ensure_success(&context)?;
    Ok(Profile(response.json_body(&context)?.clone()))
}

pub fn require_user_id(profile: &Profile, username: &str) -> HarnessResult<String> {
    profile.id().ok_or(HarnessError::MissingField {
        context: format!("profile {username}"),
        fields: USER_ID_FIELDS,
    })
}

pub async fn follow(client: &ApiClient, user_id: &str, session: &Session) -> HarnessResult<ApiResponse> {
    client.post_empty(&["users", user_id, "follow"], Some(session)).await
}

pub async fn unfollow(client: &ApiClient, user_id: &str, session: &Session) -> HarnessResult<ApiResponse> {
    client.delete(&["users", user_id, "follow"], Some(session)).await
}

pub async fn upload(client: &ApiClient, file: FilePart, session: Option<&Session>) -> HarnessResult<ApiResponse> {
    client.post_file(&["uploads"], file, session).await
}

pub async fn upload_media(
    client: &ApiClient,
    file: FilePart,
    session: Option<&Session>,
) -> HarnessResult<UploadedMedia> {
    let context = format!("upload {}", file.file_name);
    let response = upload(client, file, session).await?.ensure_success(&context)?;
    let body = response.json_body(&context)?;
    let reference = first_scalar(body, UPLOAD_REF_FIELDS).ok_or(HarnessError::MissingField {
        context,
        fields: UPLOAD_REF_FIELDS,
    })?;
    let url = body
        .get("url")
        .and_then(Value::as_str)
        .filter(|url| !url.trim().is_empty())
        .map(str::to_string);
    Ok(UploadedMedia { reference, url })
}

pub async fn create_post(
    client: &ApiClient,
    text: &str,
    media: &[String],
    session: &Session,
) -> HarnessResult<ApiResponse> {
    let mut payload = json!({ "text": text });
    if !media.is_empty() {
        payload["media"] = json!(media);
    }
    client.post_json(&["tweets"], &payload, Some(session)).await
}

/// Strict post creation for setup steps; the returned post always has an id.
pub async fn require_post(client: &ApiClient, text: &str, session: &Session) -> HarnessResult<(String, Post)> {
    let context = "create post";
    let response = create_post(client, text, &[], session)
        .await?
        .ensure_success(context)?;
    let post = Post(response.json_body(context)?.clone());
    let id = post.id().ok_or(HarnessError::MissingField {
        context: context.to_string(),
        fields: &["id"],
    })?;
    Ok((id, post))
}

pub async fn delete_post(client: &ApiClient, post_id: &str, session: &Session) -> HarnessResult<ApiResponse> {
    client.delete(&["tweets", post_id], Some(session)).await
}

pub async fn list_posts(client: &ApiClient, session: &Session) -> HarnessResult<ApiResponse> {
    client.get(&["tweets"], Some(session)).await
}

pub async fn like_post(client: &ApiClient, post_id: &str, session: &Session) -> HarnessResult<ApiResponse> {
    client.post_empty(&["tweets", post_id, "like"], Some(session)).await
}

pub async fn unlike_post(client: &ApiClient, post_id: &str, session: &Session) -> HarnessResult<ApiResponse> {
    client.delete(&["tweets", post_id, "like"], Some(session)).await
}
