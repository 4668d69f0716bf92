use crate::assertions::expect_status;
use crate::check;
use crate::error::{HarnessError, HarnessResult};
use crate::fixtures::{create_user, login, token_from, SignupPolicy};
use crate::models::{TestUser, TOKEN_FIELDS};

use super::ScenarioContext;

const MIN_TOKEN_LEN: usize = 10;

pub async fn credentials(ctx: &ScenarioContext<'_>) -> HarnessResult<()> {
    // Fixed identity shared by every run; a 409 means an earlier run created it.
    let user = create_user(ctx.client, TestUser::login_fixture(), SignupPolicy::AllowExisting).await?;

    let response = login(ctx.client, &user.email, &user.password).await?;
    expect_status(&response, &[200], "login with correct credentials")?;
    let body = response.json_body("login with correct credentials")?;
    let token = token_from(body).ok_or(HarnessError::MissingField {
        context: "login with correct credentials".to_string(),
        fields: TOKEN_FIELDS,
    })?;
    check!(
        token.len() > MIN_TOKEN_LEN,
        "token `{token}` is too short to be a bearer credential"
    );

    let response = login(ctx.client, &user.email, "incorrect_password").await?;
    expect_status(&response, &[401], "login with incorrect password")?;

    Ok(())
}
