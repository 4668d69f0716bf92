//! Contract scenarios. Each one is a straight-line Arrange, Act, Assert
//! script: the first failed check returns early and the runner proceeds
//! straight to teardown.

mod follow;
mod login;
mod profile;
mod signup;
mod tweets;
mod uploads;

use crate::cleanup::Teardown;
use crate::client::ApiClient;
use crate::config::HarnessConfig;
use crate::error::{HarnessError, HarnessResult};

/// What a scenario body gets to work with.
pub struct ScenarioContext<'a> {
    pub client: &'a ApiClient,
    pub config: &'a HarnessConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scenario {
    SignupDuplicateIdentity,
    LoginCredentials,
    ProfileCaseInsensitive,
    ProfileUpdateMedia,
    FollowSelfAndCounts,
    UnfollowRestoresCounts,
    PostWithMedia,
    FeedNewestFirst,
    LikeToggle,
    AnonymousUpload,
}

impl Scenario {
    pub const ALL: [Scenario; 10] = [
        Scenario::SignupDuplicateIdentity,
        Scenario::LoginCredentials,
        Scenario::ProfileCaseInsensitive,
        Scenario::ProfileUpdateMedia,
        Scenario::FollowSelfAndCounts,
        Scenario::UnfollowRestoresCounts,
        Scenario::PostWithMedia,
        Scenario::FeedNewestFirst,
        Scenario::LikeToggle,
        Scenario::AnonymousUpload,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Scenario::SignupDuplicateIdentity => "signup-duplicate-identity",
            Scenario::LoginCredentials => "login-credentials",
            Scenario::ProfileCaseInsensitive => "profile-case-insensitive",
            Scenario::ProfileUpdateMedia => "profile-update-media",
            Scenario::FollowSelfAndCounts => "follow-self-and-counts",
            Scenario::UnfollowRestoresCounts => "unfollow-restores-counts",
            Scenario::PostWithMedia => "post-with-media",
            Scenario::FeedNewestFirst => "feed-newest-first",
            Scenario::LikeToggle => "like-toggle",
            Scenario::AnonymousUpload => "anonymous-upload",
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Scenario::SignupDuplicateIdentity => "signup rejects a reused email or username",
            Scenario::LoginCredentials => "login issues a token for the right password and 401 otherwise",
            Scenario::ProfileCaseInsensitive => {
                "profile lookup ignores username case and reports the follow flag"
            }
            Scenario::ProfileUpdateMedia => "profile patch with uploaded avatar and cover persists",
            Scenario::FollowSelfAndCounts => "self-follow is rejected and follows bump the counter by one",
            Scenario::UnfollowRestoresCounts => "follow then unfollow restores the follower counter",
            Scenario::PostWithMedia => "post creation echoes text and the attached media",
            Scenario::FeedNewestFirst => "feed lists newer posts before older ones",
            Scenario::LikeToggle => "a post can be liked and unliked",
            Scenario::AnonymousUpload => "uploads work without a session and return a fetchable url",
        }
    }

    pub fn from_name(name: &str) -> Option<Scenario> {
        Scenario::ALL.into_iter().find(|scenario| scenario.name() == name)
    }

    /// Resolves scenario names; an empty selection means every scenario.
    pub fn select(names: &[String]) -> HarnessResult<Vec<Scenario>> {
        if names.is_empty() {
            return Ok(Scenario::ALL.to_vec());
        }
        names
            .iter()
            .map(|name| {
                Scenario::from_name(name)
                    .ok_or_else(|| HarnessError::InvalidConfig(format!("unknown scenario `{name}`")))
            })
            .collect()
    }

    pub async fn execute(self, ctx: &ScenarioContext<'_>, teardown: &mut Teardown) -> HarnessResult<()> {
        match self {
            Scenario::SignupDuplicateIdentity => signup::duplicate_identity(ctx).await,
            Scenario::LoginCredentials => login::credentials(ctx).await,
            Scenario::ProfileCaseInsensitive => profile::case_insensitive_lookup(ctx, teardown).await,
            Scenario::ProfileUpdateMedia => profile::update_with_media(ctx, teardown).await,
            Scenario::FollowSelfAndCounts => follow::self_follow_and_counts(ctx, teardown).await,
            Scenario::UnfollowRestoresCounts => follow::unfollow_restores_counts(ctx, teardown).await,
            Scenario::PostWithMedia => tweets::post_with_media(ctx, teardown).await,
            Scenario::FeedNewestFirst => tweets::feed_newest_first(ctx, teardown).await,
            Scenario::LikeToggle => tweets::like_toggle(ctx, teardown).await,
            Scenario::AnonymousUpload => uploads::anonymous_upload(ctx).await,
        }
    }
}
