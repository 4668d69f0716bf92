use tracing::info;

use crate::assertions::expect_status;
use crate::check;
use crate::cleanup::{CleanupAction, Teardown};
use crate::error::HarnessResult;
use crate::fixtures::{
    create_user, follow, require_profile, require_user_id, unfollow, user_with_session, SignupPolicy,
};
use crate::models::TestUser;

use super::ScenarioContext;

const SELF_FOLLOW_MARKERS: [&str; 2] = ["cannot follow yourself", "self"];

pub async fn self_follow_and_counts(ctx: &ScenarioContext<'_>, teardown: &mut Teardown) -> HarnessResult<()> {
    let client = ctx.client;
    let (follower, follower_session) = user_with_session(client, "follower").await?;
    let (followee, followee_session) = user_with_session(client, "followee").await?;

    let follower_profile = require_profile(client, &follower.username, &follower_session).await?;
    let follower_id = require_user_id(&follower_profile, &follower.username)?;
    let followee_profile = require_profile(client, &followee.username, &followee_session).await?;
    let followee_id = require_user_id(&followee_profile, &followee.username)?;

    let response = follow(client, &follower_id, &follower_session).await?;
    expect_status(&response, &[400, 403], "self-follow")?;
    let error_text = response.text.to_lowercase();
    check!(
        SELF_FOLLOW_MARKERS.iter().any(|marker| error_text.contains(marker)),
        "self-follow error does not mention self-follow: {}",
        response.text
    );

    let before = require_profile(client, &followee.username, &follower_session)
        .await?
        .followers_count();

    teardown.register(CleanupAction::Unfollow {
        session: follower_session.clone(),
        user_id: followee_id.clone(),
    });
    let response = follow(client, &followee_id, &follower_session).await?;
    expect_status(&response, &[200], "follow another account")?;

    let after = require_profile(client, &followee.username, &follower_session)
        .await?
        .followers_count();
    check!(
        after == before + 1,
        "follower count did not increment by one: before={before}, after={after}"
    );

    let following = require_profile(client, &follower.username, &follower_session)
        .await?
        .following_count();
    check!(
        following >= 1,
        "follower's following count is {following} after a successful follow"
    );

    info!(before, after, following, "follow counters consistent");
    Ok(())
}

pub async fn unfollow_restores_counts(ctx: &ScenarioContext<'_>, teardown: &mut Teardown) -> HarnessResult<()> {
    let client = ctx.client;
    let (_, follower_session) = user_with_session(client, "userfollower").await?;
    let followee = create_user(client, TestUser::generate("userfollowee"), SignupPolicy::RequireCreated).await?;

    let profile = require_profile(client, &followee.username, &follower_session).await?;
    let followee_id = require_user_id(&profile, &followee.username)?;
    let before = profile.followers_count();

    let edge = CleanupAction::Unfollow {
        session: follower_session.clone(),
        user_id: followee_id.clone(),
    };
    teardown.register(edge.clone());
    let response = follow(client, &followee_id, &follower_session).await?;
    expect_status(&response, &[200, 204], "follow")?;

    let after_follow = require_profile(client, &followee.username, &follower_session)
        .await?
        .followers_count();
    check!(
        after_follow == before + 1,
        "follower count after follow is {after_follow}, expected {}",
        before + 1
    );

    let response = unfollow(client, &followee_id, &follower_session).await?;
    expect_status(&response, &[200, 204], "unfollow")?;
    teardown.resolve(&edge);

    let after_unfollow = require_profile(client, &followee.username, &follower_session)
        .await?
        .followers_count();
    check!(
        after_unfollow == before,
        "follower count after unfollow is {after_unfollow}, expected the original {before}"
    );

    Ok(())
}
