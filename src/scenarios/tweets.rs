use serde_json::Value;

use crate::assertions::expect_status;
use crate::check;
use crate::cleanup::{CleanupAction, Teardown};
use crate::error::{HarnessError, HarnessResult};
use crate::fixtures::{
    create_post, like_post, list_posts, png_file, require_post, unlike_post, upload_media,
    user_with_session,
};
use crate::models::{media_matches, Post, Session};

use super::ScenarioContext;

fn delete_later(teardown: &mut Teardown, session: &Session, post_id: &str) {
    teardown.register(CleanupAction::DeletePost {
        session: session.clone(),
        post_id: post_id.to_string(),
    });
}

pub async fn post_with_media(ctx: &ScenarioContext<'_>, teardown: &mut Teardown) -> HarnessResult<()> {
    let client = ctx.client;
    let (_, session) = user_with_session(client, "poster").await?;
    let media = upload_media(client, png_file("test-image.png"), Some(&session)).await?;

    let text = "This is a test tweet with text and image";
    let response = create_post(client, text, &[media.reference.clone()], &session).await?;
    let created = response.json.clone().map(Post);
    if let Some(id) = created.as_ref().and_then(Post::id) {
        delete_later(teardown, &session, &id);
    }

    expect_status(&response, &[201], "create post with media")?;
    let post = created.ok_or_else(|| {
        HarnessError::Assertion(format!("create post returned a non-JSON body: {}", response.text))
    })?;
    check!(post.id().is_some(), "created post has no id: {}", post.0);
    check!(
        post.text() == Some(text),
        "post text is {:?}, expected {text:?}",
        post.text()
    );

    let Some(refs) = post.media_refs() else {
        return Err(HarnessError::Assertion(format!(
            "created post carries no media field: {}",
            post.0
        )));
    };
    check!(
        refs.iter().any(|entry| media_matches(entry, &media.reference)),
        "media {} not found in post media {refs:?}",
        media.reference
    );

    Ok(())
}

pub async fn feed_newest_first(ctx: &ScenarioContext<'_>, teardown: &mut Teardown) -> HarnessResult<()> {
    let client = ctx.client;
    let (_, session) = user_with_session(client, "feed").await?;

    let (older, _) = require_post(client, "First tweet for ordering test", &session).await?;
    delete_later(teardown, &session, &older);
    tokio::time::sleep(ctx.config.feed_spacing).await;
    let (newer, _) = require_post(client, "Second tweet for ordering test", &session).await?;
    delete_later(teardown, &session, &newer);

    let response = list_posts(client, &session).await?;
    expect_status(&response, &[200], "list posts")?;
    let Some(Value::Array(items)) = response.json.as_ref() else {
        return Err(HarnessError::Assertion(format!(
            "feed is not a JSON array: {}",
            response.text
        )));
    };

    let ours: Vec<String> = items
        .iter()
        .filter_map(|item| Post(item.clone()).id())
        .filter(|id| *id == older || *id == newer)
        .collect();
    let position = |id: &str| ours.iter().position(|candidate| candidate == id);

    match (position(newer.as_str()), position(older.as_str())) {
        (Some(newer_at), Some(older_at)) => {
            check!(
                newer_at < older_at,
                "feed lists post {older} before the newer post {newer}"
            );
        }
        _ => {
            return Err(HarnessError::Assertion(format!(
                "feed is missing the scenario posts {older} and {newer}"
            )))
        }
    }

    Ok(())
}

pub async fn like_toggle(ctx: &ScenarioContext<'_>, teardown: &mut Teardown) -> HarnessResult<()> {
    let client = ctx.client;
    let (_, session) = user_with_session(client, "liker").await?;
    let (post_id, _) = require_post(client, "Test tweet for like/unlike functionality.", &session).await?;
    delete_later(teardown, &session, &post_id);

    let response = like_post(client, &post_id, &session).await?;
    expect_status(&response, &[200], "like post")?;
    if response.is_json_content() {
        check!(
            matches!(response.json, Some(Value::Object(_))),
            "like response is not a JSON object: {}",
            response.text
        );
    }

    let response = unlike_post(client, &post_id, &session).await?;
    expect_status(&response, &[200], "unlike post")?;
    if response.is_json_content() {
        check!(
            matches!(response.json, Some(Value::Object(_))),
            "unlike response is not a JSON object: {}",
            response.text
        );
    }

    Ok(())
}
