//! User management scenarios; each case logs in first.

use apiprobe_report::Attachment;
use apiprobe_testing::fixtures::{random_email, random_string};
use apiprobe_testing::prelude::*;

use super::{USERS_PATH, authenticate};

pub fn cases() -> Vec<TestCase> {
    vec![
        TestCase::new("users_list", list).with_tags(["users", "smoke"]),
        TestCase::new("users_create", create).with_tag("users"),
        TestCase::new("users_delete", delete).with_tag("users"),
    ]
}

fn user_list_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "code": {"type": "integer"},
            "message": {"type": "string"},
            "data": {
                "type": "object",
                "properties": {
                    "total": {"type": "integer"},
                    "users": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "id": {"type": "integer"},
                                "username": {"type": "string"},
                                "email": {"type": "string"}
                            },
                            "required": ["id", "username", "email"]
                        }
                    }
                },
                "required": ["total", "users"]
            }
        },
        "required": ["code", "message", "data"]
    })
}

fn new_user() -> Value {
    json!({
        "username": random_string(8),
        "email": random_email(),
        "password": "Test123456",
    })
}

fn list(ctx: &mut Context) -> BoxFuture<'_, CaseResult> {
    Box::pin(async move {
        authenticate(ctx).await?;

        let response = ctx
            .get(USERS_PATH)
            .query("page", 1)
            .query("size", 10)
            .send()
            .await?;

        assertions::status_code(&response, 200)?;
        assertions::json_schema(&response, &user_list_schema())?;
        Ok(())
    })
}

fn create(ctx: &mut Context) -> BoxFuture<'_, CaseResult> {
    Box::pin(async move {
        authenticate(ctx).await?;

        let user = new_user();
        ctx.attach(Attachment::json("New user", &user));
        let response = ctx.post(USERS_PATH).json(&user).send().await?;

        assertions::status_code(&response, 201)?;
        let data = response
            .json_body()
            .map(|body| body["data"].clone())
            .unwrap_or(Value::Null);
        assertions::equal(&data["username"], &user["username"], "data.username")?;
        assertions::equal(&data["email"], &user["email"], "data.email")?;
        assertions::is_true(data.get("id").is_some(), "data.id present")?;
        Ok(())
    })
}

fn delete(ctx: &mut Context) -> BoxFuture<'_, CaseResult> {
    Box::pin(async move {
        authenticate(ctx).await?;

        let created = ctx.post(USERS_PATH).json(&new_user()).send().await?;
        let id = created
            .json_body()
            .and_then(|body| body["data"].get("id"))
            .and_then(Value::as_i64)
            .ok_or_else(|| CaseError::setup("created user has no data.id"))?;

        let response = ctx.delete(format!("{}/{}", USERS_PATH, id)).send().await?;

        assertions::status_code(&response, 200)?;
        assertions::json_contains(&response, &json!({"code": 0, "message": "用户删除成功"}))?;
        Ok(())
    })
}
