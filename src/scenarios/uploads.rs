use serde_json::Value;

use crate::assertions::expect_status;
use crate::check;
use crate::error::HarnessResult;
use crate::fixtures::{png_file, upload};

use super::ScenarioContext;

pub async fn anonymous_upload(ctx: &ScenarioContext<'_>) -> HarnessResult<()> {
    let response = upload(ctx.client, png_file("test.png"), None).await?;
    expect_status(&response, &[200, 201], "anonymous upload")?;

    let body = response.json_body("anonymous upload")?;
    check!(body.is_object(), "upload response is not a JSON object: {body}");
    let url = body.get("url").and_then(Value::as_str).unwrap_or_default();
    check!(
        url.starts_with("http"),
        "upload url {url:?} is missing or not absolute"
    );

    let status = ctx.client.head_absolute(url).await?;
    check!(
        status.as_u16() == 200,
        "uploaded file at {url} is not reachable: HEAD returned {status}"
    );

    Ok(())
}
