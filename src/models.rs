use serde::Serialize;
use serde_json::Value;
use url::Url;
use uuid::Uuid;

/// Field names the backend has used for the bearer token on login and signup.
pub const TOKEN_FIELDS: &[&str] = &["access_token", "token", "accessToken", "jwt", "jwtToken"];
pub const USER_ID_FIELDS: &[&str] = &["id", "userId"];
pub const FOLLOWERS_FIELDS: &[&str] = &["followersCount", "followers"];
pub const FOLLOWING_COUNT_FIELDS: &[&str] = &["followingCount", "following"];
pub const FOLLOWING_FLAG_FIELDS: &[&str] = &["following", "isFollowing"];
pub const UPLOAD_REF_FIELDS: &[&str] = &["url", "location", "id"];
pub const MEDIA_LIST_FIELDS: &[&str] = &["media", "images"];
pub const MEDIA_SINGLE_FIELD: &str = "image";
pub const POST_TEXT_FIELDS: &[&str] = &["text", "content"];

/// A disposable account. Accounts are never deleted, so every generated
/// identity must be unique across all runs against the same backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestUser {
    pub email: String,
    pub username: String,
    pub password: String,
    #[serde(rename = "name")]
    pub display_name: String,
}

impl TestUser {
    pub fn generate(prefix: &str) -> Self {
        let suffix = Uuid::new_v4().simple().to_string();
        Self::with_suffix(prefix, &suffix[..12])
    }

    /// The long-lived account the login scenario reuses across runs.
    pub fn login_fixture() -> Self {
        Self::with_suffix("login", "fixture")
    }

    pub fn with_suffix(prefix: &str, suffix: &str) -> Self {
        Self {
            email: format!("{prefix}_{suffix}@example.com"),
            username: format!("{prefix}{suffix}"),
            password: "Password123!".to_string(),
            display_name: format!("Contract {prefix}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
}

impl Session {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

/// Server-side view of a user as returned by `GET /users/{username}`.
#[derive(Debug, Clone)]
pub struct Profile(pub Value);

impl Profile {
    pub fn id(&self) -> Option<String> {
        first_scalar(&self.0, USER_ID_FIELDS)
    }

    pub fn username(&self) -> Option<&str> {
        self.0.get("username").and_then(Value::as_str)
    }

    pub fn followers_count(&self) -> u64 {
        counter(&self.0, FOLLOWERS_FIELDS, "followers")
    }

    pub fn following_count(&self) -> u64 {
        counter(&self.0, FOLLOWING_COUNT_FIELDS, "following")
    }

    /// The requesting session's follow relationship to this profile, if the
    /// backend reported one.
    pub fn is_following(&self) -> Option<bool> {
        FOLLOWING_FLAG_FIELDS
            .iter()
            .find_map(|field| self.0.get(*field).and_then(Value::as_bool))
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }
}

#[derive(Debug, Clone)]
pub struct Post(pub Value);

impl Post {
    pub fn id(&self) -> Option<String> {
        first_scalar(&self.0, &["id"])
    }

    pub fn text(&self) -> Option<&str> {
        POST_TEXT_FIELDS
            .iter()
            .find_map(|field| self.0.get(*field).and_then(Value::as_str))
    }

    /// Media references carried by the post, read from whichever media field
    /// the backend populated. `None` means no media-bearing field exists.
    pub fn media_refs(&self) -> Option<Vec<String>> {
        for field in MEDIA_LIST_FIELDS {
            if let Some(Value::Array(items)) = self.0.get(*field) {
                return Some(items.iter().filter_map(media_entry_ref).collect());
            }
        }
        self.0
            .get(MEDIA_SINGLE_FIELD)
            .and_then(Value::as_str)
            .map(|url| vec![url.to_string()])
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedMedia {
    /// URL when the backend returned one, otherwise a location or identifier.
    pub reference: String,
    pub url: Option<String>,
}

fn media_entry_ref(entry: &Value) -> Option<String> {
    match entry {
        Value::String(url) => Some(url.clone()),
        Value::Object(map) => map.get("url").and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}

/// Whether a post's media entry refers to an uploaded reference. Entries must
/// match exactly, except that a URL reference also matches an entry carrying
/// the same path, either relative or on another host.
pub fn media_matches(entry: &str, reference: &str) -> bool {
    if entry == reference {
        return true;
    }
    let Ok(reference) = Url::parse(reference) else {
        return false;
    };
    let path = reference.path();
    if path.len() <= 1 {
        return false;
    }
    match Url::parse(entry) {
        Ok(entry) => entry.path() == path,
        Err(_) => entry == path,
    }
}

/// Returns the first non-empty string or number among `fields`, as a string.
pub fn first_scalar(value: &Value, fields: &[&str]) -> Option<String> {
    fields.iter().find_map(|field| match value.get(*field)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Reads a counter from the first field holding a number or an array, then
/// from `_count.<nested>`. Booleans never count; absence reads as zero.
pub fn counter(value: &Value, fields: &[&str], nested: &str) -> u64 {
    let direct = fields.iter().find_map(|field| match value.get(*field)? {
        Value::Number(n) => n.as_u64(),
        Value::Array(items) => Some(items.len() as u64),
        _ => None,
    });
    direct
        .or_else(|| {
            value
                .get("_count")
                .and_then(|count| count.get(nested))
                .and_then(Value::as_u64)
        })
        .unwrap_or(0)
}

/// Upper, lower, title and swap-case renderings of a username.
pub fn case_variants(username: &str) -> [String; 4] {
    let mut chars = username.chars();
    let title = match chars.next() {
        Some(first) => {
            let rest = chars.as_str().to_lowercase();
            first.to_uppercase().chain(rest.chars()).collect()
        }
        None => String::new(),
    };
    let swapped = username
        .chars()
        .map(|c| {
            if c.is_uppercase() {
                c.to_lowercase().collect::<String>()
            } else {
                c.to_uppercase().collect::<String>()
            }
        })
        .collect();
    [username.to_uppercase(), username.to_lowercase(), title, swapped]
}
