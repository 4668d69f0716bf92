// In-memory stand-in for the social backend, served through wiremock.
// Quirks switch on specific contract violations so scenarios can be shown to
// fail for the right reason.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{json, Map, Value};
use wiremock::matchers::any;
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use crate::config::{parse_base_url, HarnessConfig};

#[derive(Debug, Clone, Copy, Default)]
pub struct Quirks {
    pub allow_self_follow: bool,
    pub oldest_first: bool,
    pub case_sensitive_lookup: bool,
    pub require_auth_for_upload: bool,
    pub drop_media: bool,
    pub accept_duplicate_signup: bool,
    /// Login succeeds whatever the password.
    pub ignore_password: bool,
    pub short_tokens: bool,
    /// Follower counters always read zero.
    pub frozen_follower_count: bool,
    /// Unfollow answers 200 but keeps the edge.
    pub sticky_unfollow: bool,
    /// The follow flag is always false.
    pub follow_flag_off: bool,
    /// A profile reports that it follows itself.
    pub self_follow_flag: bool,
    /// PATCH echoes the update without storing it.
    pub forgetful_patch: bool,
    pub like_created_status: bool,
    /// Uploaded files are never served.
    pub missing_files: bool,
    /// Report `followersCount`/`followingCount`/`following` instead of
    /// `_count` and `isFollowing`.
    pub camel_counters: bool,
}

struct Account {
    id: String,
    email: String,
    username: String,
    password: String,
    fields: Map<String, Value>,
}

struct Tweet {
    id: String,
    author: String,
    text: String,
    media: Vec<String>,
}

#[derive(Default)]
struct State {
    accounts: Vec<Account>,
    tokens: HashMap<String, String>,
    follows: HashSet<(String, String)>,
    tweets: Vec<Tweet>,
    likes: HashSet<(String, String)>,
    uploads: usize,
    next_id: usize,
    log: Vec<String>,
}

impl State {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }

    fn account_by_name(&self, name: &str, case_sensitive: bool) -> Option<&Account> {
        self.accounts.iter().find(|account| {
            account.id == name
                || if case_sensitive {
                    account.username == name
                } else {
                    account.username.eq_ignore_ascii_case(name)
                }
        })
    }
}

#[derive(Clone)]
pub struct FakeBackend {
    base: String,
    quirks: Quirks,
    state: Arc<Mutex<State>>,
}

impl FakeBackend {
    pub async fn start(quirks: Quirks) -> (MockServer, FakeBackend) {
        let server = MockServer::start().await;
        let backend = FakeBackend {
            base: server.uri(),
            quirks,
            state: Arc::new(Mutex::new(State::default())),
        };
        Mock::given(any())
            .respond_with(backend.clone())
            .mount(&server)
            .await;
        (server, backend)
    }

    pub fn config(server: &MockServer) -> HarnessConfig {
        HarnessConfig {
            base_url: parse_base_url(&server.uri()).unwrap(),
            timeout: Duration::from_secs(5),
            feed_spacing: Duration::ZERO,
        }
    }

    pub fn requests(&self) -> Vec<String> {
        self.state.lock().unwrap().log.clone()
    }

    pub fn tweet_count(&self) -> usize {
        self.state.lock().unwrap().tweets.len()
    }

    pub fn follow_count(&self) -> usize {
        self.state.lock().unwrap().follows.len()
    }

    pub fn account_count(&self) -> usize {
        self.state.lock().unwrap().accounts.len()
    }

    fn profile_json(&self, state: &State, account: &Account, viewer: Option<&str>) -> Value {
        let followers = state.follows.iter().filter(|(_, to)| *to == account.id).count();
        let following = state.follows.iter().filter(|(from, _)| *from == account.id).count();
        let is_following = viewer
            .map(|viewer| {
                (self.quirks.self_follow_flag && viewer == account.id)
                    || state.follows.contains(&(viewer.to_string(), account.id.clone()))
            })
            .unwrap_or(false)
            && !self.quirks.follow_flag_off;
        let followers = if self.quirks.frozen_follower_count { 0 } else { followers };

        let mut body = Map::new();
        body.insert("id".into(), json!(account.id));
        body.insert("email".into(), json!(account.email));
        body.insert("username".into(), json!(account.username));
        body.extend(account.fields.clone());
        if self.quirks.camel_counters {
            body.insert("followersCount".into(), json!(followers));
            body.insert("followingCount".into(), json!(following));
            body.insert("following".into(), json!(is_following));
        } else {
            body.insert(
                "_count".into(),
                json!({ "followers": followers, "following": following }),
            );
            body.insert("isFollowing".into(), json!(is_following));
        }
        Value::Object(body)
    }

    fn tweet_json(&self, tweet: &Tweet) -> Value {
        let mut body = json!({ "id": tweet.id, "text": tweet.text, "authorId": tweet.author });
        if !self.quirks.drop_media {
            body["media"] = tweet.media.iter().map(|url| json!({ "url": url })).collect();
        }
        body
    }
}

fn reply(status: u16, body: Value) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(body)
}

fn error(status: u16, message: &str) -> ResponseTemplate {
    reply(status, json!({ "statusCode": status, "message": message }))
}

fn bearer(request: &Request) -> Option<String> {
    request
        .headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_string)
}

impl Respond for FakeBackend {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let mut guard = self.state.lock().unwrap();
        let state = &mut *guard;

        let method = request.method.to_string();
        let path = request.url.path().to_string();
        state.log.push(format!("{method} {path}"));

        let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
        let caller = bearer(request).and_then(|token| state.tokens.get(&token).cloned());
        let body: Value = serde_json::from_slice(&request.body).unwrap_or(Value::Null);
        let text = |key: &str| body.get(key).and_then(Value::as_str).map(str::to_string);

        match (method.as_str(), segments.as_slice()) {
            ("POST", ["auth", "signup"]) => {
                let (Some(email), Some(username), Some(password)) =
                    (text("email"), text("username"), text("password"))
                else {
                    return error(400, "email, username and password are required");
                };
                if !self.quirks.accept_duplicate_signup
                    && state
                        .accounts
                        .iter()
                        .any(|a| a.email == email || a.username.eq_ignore_ascii_case(&username))
                {
                    return error(409, "Email or username already exists");
                }
                let id = state.next_id("user");
                let mut fields = Map::new();
                fields.insert("name".into(), json!(text("name").unwrap_or_default()));
                state.accounts.push(Account {
                    id: id.clone(),
                    email,
                    username: username.clone(),
                    password,
                    fields,
                });
                let token = format!("token-{id}-0123456789");
                state.tokens.insert(token.clone(), id.clone());
                reply(
                    201,
                    json!({ "access_token": token, "user": { "id": id, "username": username } }),
                )
            }
            ("POST", ["auth", "login"]) => {
                let email = text("email").unwrap_or_default();
                let password = text("password").unwrap_or_default();
                match state
                    .accounts
                    .iter()
                    .find(|a| a.email == email && (a.password == password || self.quirks.ignore_password))
                {
                    Some(account) => {
                        let token = if self.quirks.short_tokens {
                            format!("t{}", state.tokens.len())
                        } else {
                            format!("token-{}-{}", account.id, state.tokens.len())
                        };
                        let id = account.id.clone();
                        state.tokens.insert(token.clone(), id.clone());
                        reply(200, json!({ "access_token": token, "user": { "id": id } }))
                    }
                    None => error(401, "Invalid credentials"),
                }
            }
            ("PATCH", ["users", "profile"]) => {
                let Some(caller) = caller else {
                    return error(401, "Unauthorized");
                };
                let Some(updates) = body.as_object().cloned() else {
                    return error(400, "expected a JSON object");
                };
                let Some(index) = state.accounts.iter().position(|a| a.id == caller) else {
                    return error(404, "User not found");
                };
                let mut profile = self.profile_json(state, &state.accounts[index], Some(&caller));
                if self.quirks.forgetful_patch {
                    if let Some(fields) = profile.as_object_mut() {
                        fields.extend(updates);
                    }
                } else {
                    state.accounts[index].fields.extend(updates);
                    profile = self.profile_json(state, &state.accounts[index], Some(&caller));
                }
                reply(200, profile)
            }
            ("GET", ["users", name]) => {
                match state.account_by_name(name, self.quirks.case_sensitive_lookup) {
                    Some(account) => reply(200, self.profile_json(state, account, caller.as_deref())),
                    None => error(404, &format!("User @{name} not found")),
                }
            }
            ("POST", ["users", target, "follow"]) => {
                let Some(caller) = caller else {
                    return error(401, "Unauthorized");
                };
                if !state.accounts.iter().any(|a| a.id == *target) {
                    return error(404, "User not found");
                }
                if caller == *target && !self.quirks.allow_self_follow {
                    return error(400, "Cannot follow yourself");
                }
                if !state.follows.insert((caller, target.to_string())) {
                    return error(409, "Already following");
                }
                reply(200, json!({ "success": true }))
            }
            ("DELETE", ["users", target, "follow"]) => {
                let Some(caller) = caller else {
                    return error(401, "Unauthorized");
                };
                let edge = (caller, target.to_string());
                let found = if self.quirks.sticky_unfollow {
                    state.follows.contains(&edge)
                } else {
                    state.follows.remove(&edge)
                };
                if found {
                    reply(200, json!({ "success": true }))
                } else {
                    error(404, "Not following")
                }
            }
            ("POST", ["tweets"]) => {
                let Some(caller) = caller else {
                    return error(401, "Unauthorized");
                };
                let Some(tweet_text) = text("text") else {
                    return error(400, "text is required");
                };
                let media = body
                    .get("media")
                    .and_then(Value::as_array)
                    .map(|items| {
                        items
                            .iter()
                            .filter_map(Value::as_str)
                            .map(str::to_string)
                            .collect()
                    })
                    .unwrap_or_default();
                let tweet = Tweet {
                    id: state.next_id("tweet"),
                    author: caller,
                    text: tweet_text,
                    media,
                };
                let created = self.tweet_json(&tweet);
                state.tweets.push(tweet);
                reply(201, created)
            }
            ("GET", ["tweets"]) => {
                let mut items: Vec<Value> = state.tweets.iter().map(|t| self.tweet_json(t)).collect();
                if !self.quirks.oldest_first {
                    items.reverse();
                }
                reply(200, Value::Array(items))
            }
            ("DELETE", ["tweets", id]) => {
                let Some(caller) = caller else {
                    return error(401, "Unauthorized");
                };
                match state.tweets.iter().position(|t| t.id == *id) {
                    Some(index) if state.tweets[index].author == caller => {
                        state.tweets.remove(index);
                        reply(200, json!({ "deleted": true }))
                    }
                    Some(_) => error(403, "Not your tweet"),
                    None => error(404, "Tweet not found"),
                }
            }
            (verb @ ("POST" | "DELETE"), ["tweets", id, "like"]) => {
                let Some(caller) = caller else {
                    return error(401, "Unauthorized");
                };
                if !state.tweets.iter().any(|t| t.id == *id) {
                    return error(404, "Tweet not found");
                }
                let key = (caller, id.to_string());
                if verb == "POST" {
                    state.likes.insert(key);
                    let status = if self.quirks.like_created_status { 201 } else { 200 };
                    reply(status, json!({ "liked": true }))
                } else {
                    state.likes.remove(&key);
                    reply(200, json!({ "liked": false }))
                }
            }
            ("POST", ["uploads"]) => {
                if self.quirks.require_auth_for_upload && caller.is_none() {
                    return error(401, "Unauthorized");
                }
                if !request.body.windows(9).any(|w| w == b"filename=") {
                    return error(400, "File upload failed");
                }
                state.uploads += 1;
                reply(
                    201,
                    json!({ "url": format!("{}/files/{}.png", self.base, state.uploads) }),
                )
            }
            ("HEAD", ["files", file]) => {
                let served = file
                    .trim_end_matches(".png")
                    .parse::<usize>()
                    .map(|n| n >= 1 && n <= state.uploads)
                    .unwrap_or(false);
                let exists = served && !self.quirks.missing_files;
                ResponseTemplate::new(if exists { 200 } else { 404 })
            }
            _ => error(404, &format!("Cannot {method} {path}")),
        }
    }
}
