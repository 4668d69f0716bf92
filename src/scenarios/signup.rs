use tracing::info;

use crate::assertions::expect_status;
use crate::error::HarnessResult;
use crate::fixtures::signup;
use crate::models::TestUser;

use super::ScenarioContext;

// No account deletion endpoint exists, so nothing is torn down here.
pub async fn duplicate_identity(ctx: &ScenarioContext<'_>) -> HarnessResult<()> {
    let user = TestUser::generate("dup");

    let first = signup(ctx.client, &user).await?;
    expect_status(&first, &[200, 201], "first signup")?;
    info!(username = %user.username, "fresh identity accepted");

    let other = TestUser {
        password: "AnotherP@ssword123".to_string(),
        display_name: "Another User".to_string(),
        ..TestUser::generate("dupalt")
    };

    let same_email = TestUser {
        email: user.email.clone(),
        ..other.clone()
    };
    let response = signup(ctx.client, &same_email).await?;
    expect_status(&response, &[400, 409], "signup with duplicate email")?;

    let same_username = TestUser {
        username: user.username.clone(),
        ..other
    };
    let response = signup(ctx.client, &same_username).await?;
    expect_status(&response, &[400, 409], "signup with duplicate username")?;

    Ok(())
}
