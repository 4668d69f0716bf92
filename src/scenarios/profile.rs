use serde_json::{json, Value};
use tracing::info;

use crate::assertions::expect_status;
use crate::check;
use crate::cleanup::{CleanupAction, Teardown};
use crate::error::{HarnessError, HarnessResult};
use crate::fixtures::{
    authenticate, create_user, fetch_profile, follow, png_file, random_string, require_profile,
    require_user_id, upload_media, user_with_session, SignupPolicy,
};
use crate::models::{case_variants, Profile, TestUser};

use super::ScenarioContext;

pub async fn case_insensitive_lookup(ctx: &ScenarioContext<'_>, teardown: &mut Teardown) -> HarnessResult<()> {
    let client = ctx.client;
    // Mixed-case usernames so every case transform yields a distinct spelling.
    let viewer = create_user(
        client,
        TestUser::with_suffix("viewer", &random_string(10)),
        SignupPolicy::RequireCreated,
    )
    .await?;
    let target = create_user(
        client,
        TestUser::with_suffix("target", &random_string(10)),
        SignupPolicy::RequireCreated,
    )
    .await?;
    let session = authenticate(client, &viewer).await?;

    let viewer_profile = require_profile(client, &viewer.username, &session).await?;
    require_user_id(&viewer_profile, &viewer.username)?;
    let target_profile = require_profile(client, &target.username, &session).await?;
    let target_id = require_user_id(&target_profile, &target.username)?;

    teardown.register(CleanupAction::Unfollow {
        session: session.clone(),
        user_id: target_id.clone(),
    });
    follow(client, &target_id, &session)
        .await?
        .ensure_success("follow target")?;

    for variant in case_variants(&target.username) {
        let context = format!("get profile {variant}");
        let response = fetch_profile(client, &variant, Some(&session)).await?;
        expect_status(&response, &[200], &context)?;
        let profile = Profile(response.json_body(&context)?.clone());

        let username = profile.username().unwrap_or_default();
        check!(
            username.eq_ignore_ascii_case(&target.username),
            "lookup `{variant}` returned username `{username}`, expected `{}`",
            target.username
        );
        check!(
            profile.id().as_deref() == Some(target_id.as_str()),
            "lookup `{variant}` resolved to id {:?}, expected {target_id}",
            profile.id()
        );
        check!(
            profile.is_following() == Some(true),
            "lookup `{variant}` reported following = {:?} after an explicit follow",
            profile.is_following()
        );
    }

    let own_variant = viewer.username.to_uppercase();
    let response = fetch_profile(client, &own_variant, Some(&session)).await?;
    expect_status(&response, &[200], "get own profile")?;
    let own = Profile(response.json_body("get own profile")?.clone());
    check!(
        own.username().unwrap_or_default().eq_ignore_ascii_case(&viewer.username),
        "own profile lookup returned username {:?}",
        own.username()
    );
    check!(
        own.is_following() != Some(true),
        "own profile reports following itself"
    );

    Ok(())
}

pub async fn update_with_media(ctx: &ScenarioContext<'_>, teardown: &mut Teardown) -> HarnessResult<()> {
    let client = ctx.client;
    let (user, session) = user_with_session(client, "profile").await?;
    teardown.register(CleanupAction::DeleteProfile {
        session: session.clone(),
    });

    let avatar = upload_media(client, png_file("avatar.png"), Some(&session)).await?;
    let cover = upload_media(client, png_file("cover.png"), Some(&session)).await?;
    let avatar_url = avatar.url.ok_or(HarnessError::MissingField {
        context: "avatar upload".to_string(),
        fields: &["url"],
    })?;
    let cover_url = cover.url.ok_or(HarnessError::MissingField {
        context: "cover upload".to_string(),
        fields: &["url"],
    })?;
    check!(
        avatar_url != cover_url,
        "two uploads returned the same url {avatar_url}"
    );
    for url in [&avatar_url, &cover_url] {
        let status = client.head_absolute(url).await?;
        check!(
            status.as_u16() == 200,
            "uploaded file at {url} is not reachable: HEAD returned {status}"
        );
    }

    let update = json!({
        "name": format!("Updated {}", user.display_name),
        "bio": "Bio written by the profile contract scenario.",
        "location": "Test Location",
        "website": format!("https://example.com/{}", user.username),
        "avatar": avatar_url,
        "cover": cover_url,
    });

    let response = client
        .patch_json(&["users", "profile"], &update, Some(&session))
        .await?;
    expect_status(&response, &[200], "patch profile")?;
    assert_fields_match(&update, response.json_body("patch profile")?, "patched profile")?;

    let response = fetch_profile(client, &user.username, Some(&session)).await?;
    expect_status(&response, &[200], "get profile after patch")?;
    assert_fields_match(&update, response.json_body("get profile after patch")?, "persisted profile")?;

    info!(username = %user.username, "profile update persisted");
    Ok(())
}

fn assert_fields_match(expected: &Value, actual: &Value, what: &str) -> HarnessResult<()> {
    let Some(fields) = expected.as_object() else {
        return Ok(());
    };
    for (key, value) in fields {
        check!(
            actual.get(key) == Some(value),
            "{what} field `{key}` is {:?}, expected {value}",
            actual.get(key)
        );
    }
    Ok(())
}
