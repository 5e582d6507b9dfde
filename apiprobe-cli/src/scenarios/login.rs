//! Login endpoint scenarios.
//!
//! The service answers business errors with HTTP 200 and a `code` in the
//! envelope; only malformed requests get a 4xx status.

use apiprobe_testing::fixtures::random_string;
use apiprobe_testing::prelude::*;

use super::LOGIN_PATH;

pub fn cases() -> Vec<TestCase> {
    vec![
        TestCase::new("login_success", success).with_tags(["login", "smoke"]),
        TestCase::new("login_wrong_password", wrong_password).with_tag("login"),
        TestCase::new("login_unknown_user", unknown_user).with_tag("login"),
        TestCase::new("login_missing_username", missing_username).with_tag("login"),
        TestCase::new("login_missing_password", missing_password).with_tag("login"),
    ]
}

fn token_schema() -> Value {
    json!({
        "type": "object",
        "required": ["code", "message", "data"],
        "properties": {
            "code": {"type": "integer"},
            "message": {"type": "string"},
            "data": {
                "type": "object",
                "required": ["token"],
                "properties": {
                    "token": {"type": "string", "minLength": 1}
                }
            }
        }
    })
}

fn success(ctx: &mut Context) -> BoxFuture<'_, CaseResult> {
    Box::pin(async move {
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
        assertions::json_contains(&response, &json!({"code": 0, "message": "success"}))?;
        assertions::json_schema(&response, &token_schema())?;
        Ok(())
    })
}

fn wrong_password(ctx: &mut Context) -> BoxFuture<'_, CaseResult> {
    Box::pin(async move {
        let username = ctx.profile().credentials.username.clone();
        let response = ctx
            .post(LOGIN_PATH)
            .json(&json!({"username": username, "password": "wrong_password"}))
            .send()
            .await?;

        assertions::status_code(&response, 200)?;
        assertions::json_contains(
            &response,
            &json!({"code": 1001, "message": "用户名或密码错误"}),
        )?;
        Ok(())
    })
}

fn unknown_user(ctx: &mut Context) -> BoxFuture<'_, CaseResult> {
    Box::pin(async move {
        let response = ctx
            .post(LOGIN_PATH)
            .json(&json!({
                "username": random_string(10),
                "password": "any_password",
            }))
            .send()
            .await?;

        assertions::status_code(&response, 200)?;
        assertions::json_contains(&response, &json!({"code": 1002, "message": "用户不存在"}))?;
        Ok(())
    })
}

fn missing_username(ctx: &mut Context) -> BoxFuture<'_, CaseResult> {
    Box::pin(missing_parameter(ctx, "username"))
}

fn missing_password(ctx: &mut Context) -> BoxFuture<'_, CaseResult> {
    Box::pin(missing_parameter(ctx, "password"))
}

async fn missing_parameter(ctx: &mut Context, field: &'static str) -> CaseResult {
    let credentials = ctx.profile().credentials.clone();
    let mut body = json!({
        "username": credentials.username,
        "password": credentials.password,
    });
    if let Some(map) = body.as_object_mut() {
        map.remove(field);
    }

    let response = ctx
        .post(LOGIN_PATH)
        .json(&body)
        .allow_error_status()
        .send()
        .await?;

    assertions::status_code(&response, 400)?;
    assertions::json_contains(
        &response,
        &json!({"code": 1003, "message": format!("缺少参数: {}", field)}),
    )?;
    Ok(())
}
