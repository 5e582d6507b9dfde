//! Built-in scenarios run by `apiprobe run`.

use apiprobe_testing::prelude::*;

pub mod login;
pub mod users;

pub const LOGIN_PATH: &str = "/api/login";
pub const USERS_PATH: &str = "/api/users";

/// Every registered case, in execution order.
pub fn all() -> Vec<TestCase> {
    let mut cases = login::cases();
    cases.extend(users::cases());
    cases
}

/// Log in with the profile credentials and send the token on every later
/// request of this case.
pub async fn authenticate(ctx: &mut Context) -> Result<(), CaseError> {
    let credentials = ctx.profile().credentials.clone();
    let response = ctx
        .post(LOGIN_PATH)
        .json(&json!({
            "username": credentials.username,
            "password": credentials.password,
        }))
        .send()
        .await?;
    assertions::status_code(&response, 200)?;

    let token = response
        .json_body()
        .and_then(|body| body.pointer("/data/token"))
        .and_then(Value::as_str)
        .ok_or_else(|| CaseError::setup("login response carries no data.token"))?
        .to_string();

    ctx.dispatcher_mut()
        .add_header("Authorization", &format!("Bearer {}", token))?;
    Ok(())
}
