use std::sync::Arc;

use http::StatusCode;
use log::info;
use serde::{Deserialize, Serialize};

use crate::{
    controller::{
        body_text,
        cors::{CorsPolicy, WRITE_METHODS},
        json_response, Context, ErrorDetail, Request, Response, Route,
    },
    error::{Error, ErrorBody},
    model::user::{self, Upserted, User},
    webhook::{Webhook, WebhookHeaders, WebhookOperation},
};

pub const ROUTE: Route = Route {
    name: "users.webhook",
    cors: CorsPolicy::Fixed { methods: WRITE_METHODS },
    detail: ErrorDetail::Generic,
};

#[derive(Deserialize, Debug)]
struct UserEvent {
    #[serde(rename = "type", default)]
    event_type: Option<String>,
    #[serde(default)]
    data: Option<UserEventData>,
}

#[derive(Deserialize, Debug)]
struct UserEventData {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    username: Option<String>,
}

#[derive(Serialize)]
struct MessageResponse<'a> {
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    user: Option<&'a User>,
}

/// `POST /users/web-hook`
pub async fn create(req: Request, ctx: Arc<Context>) -> Result<Response, Error> {
    handle(req, ctx, WebhookOperation::Insert).await
}

/// `POST /users/update/web-hook`
pub async fn update(req: Request, ctx: Arc<Context>) -> Result<Response, Error> {
    handle(req, ctx, WebhookOperation::Update).await
}

/// `POST /users/delete/web-hook`
pub async fn delete(req: Request, ctx: Arc<Context>) -> Result<Response, Error> {
    handle(req, ctx, WebhookOperation::Delete).await
}

async fn handle(
    req: Request,
    ctx: Arc<Context>,
    operation: WebhookOperation,
) -> Result<Response, Error> {
    let payload = body_text(&req).ok_or(Error::BodyMissing)?;

    let secret = ctx
        .secrets
        .signing_secret(operation)
        .await?
        .ok_or_else(|| {
            Error::SignatureValidationError(format!("{} is not set", operation.env_key()))
        })?;
    Webhook::new(&secret)?.verify(payload, &WebhookHeaders::from_headers(req.headers()))?;

    let event: UserEvent = serde_json::from_str(payload)?;
    let data = event.data.ok_or(Error::BodyInvalid)?;
    let id = present(data.id).ok_or(Error::BodyInvalid)?;
    let username = present(data.username);
    if operation.requires_username() && username.is_none() {
        return Err(Error::BodyInvalid);
    }
    let event_type = present(event.event_type).ok_or(Error::BodyInvalid)?;

    if event_type != operation.event_type() {
        info!("Webhook {}: ignoring event {}", operation, event_type);
        return json_response(
            StatusCode::OK,
            &MessageResponse {
                message: "Event ignored",
                user: None,
            },
        );
    }
    info!("Webhook {}: verified {} for {}", operation, event_type, id);

    let username = username.unwrap_or_default();
    match operation {
        WebhookOperation::Insert => {
            let created = ctx
                .query(move |exec| user::create(exec, &id, &username))
                .await?;
            json_response(StatusCode::CREATED, &created)
        }
        WebhookOperation::Update => {
            let upserted = ctx
                .query(move |exec| user::upsert_username(exec, &id, &username))
                .await?;
            match upserted {
                Upserted::Updated(updated) => json_response(
                    StatusCode::OK,
                    &MessageResponse {
                        message: "Username updated",
                        user: Some(&updated),
                    },
                ),
                Upserted::Created(created) => json_response(
                    StatusCode::CREATED,
                    &MessageResponse {
                        message: "User created",
                        user: Some(&created),
                    },
                ),
            }
        }
        WebhookOperation::Delete => match ctx.query(move |exec| user::delete(exec, &id)).await? {
            Some(deleted) => json_response(
                StatusCode::OK,
                &MessageResponse {
                    message: "User deleted",
                    user: Some(&deleted),
                },
            ),
            None => Err(Error::NotFound(ErrorBody::bare("User not found"))),
        },
    }
}

fn present(field: Option<String>) -> Option<String> {
    field.filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Config,
        controller::{
            dispatch,
            test_support::{body_json, context_with_config, request},
        },
        model::{mock::MockExecutor, Param},
        webhook::{HEADER_ID, HEADER_SIGNATURE, HEADER_TIMESTAMP},
    };
    use chrono::Utc;
    use fake::{faker::internet::en::Username, Fake};
    use http::{header, Method};
    use serde_json::json;

    fn secret() -> String {
        "whsec_c2ltLWZlZWQtd2ViaG9vay10ZXN0".to_string()
    }

    fn config() -> Config {
        Config {
            signing_secret_insert: Some(secret()),
            signing_secret_update: Some(secret()),
            signing_secret_delete: Some(secret()),
            ..Default::default()
        }
    }

    fn signed(path: &str, payload: &str) -> Request {
        let now = Utc::now().timestamp();
        let signature = Webhook::new(&secret()).unwrap().sign("msg_1", now, payload);
        let mut req = request(Method::POST, path, Some(payload));
        let headers = req.headers_mut();
        headers.insert(HEADER_ID, "msg_1".parse().unwrap());
        headers.insert(HEADER_TIMESTAMP, now.to_string().parse().unwrap());
        headers.insert(HEADER_SIGNATURE, signature.parse().unwrap());
        req
    }

    fn event(event_type: &str, id: &str, username: &str) -> String {
        json!({"type": event_type, "data": {"id": id, "username": username}}).to_string()
    }

    fn user_row(id: &str, username: &str) -> serde_json::Value {
        json!({
            "id": id,
            "username": username,
            "bio": "",
            "created_at": "2024-05-05T10:00:00.5+00:00",
            "updated_at": "2024-05-05T10:00:00.5+00:00",
        })
    }

    #[tokio::test]
    async fn test_create() {
        let username: String = Username().fake();
        let exec = Arc::new(MockExecutor::new().returns(vec![user_row("user_1", &username)]));
        let resp = dispatch(
            signed("/users/web-hook", &event("user.created", "user_1", &username)),
            context_with_config(exec.clone(), config()),
        )
        .await
        .unwrap();

        assert_eq!(StatusCode::CREATED, resp.status());
        assert_eq!(username.as_str(), body_json(&resp)["username"]);
        assert_eq!(
            vec![
                Param::Text("user_1".into()),
                Param::Text(username.clone()),
                Param::Text("".into())
            ],
            exec.calls()[0].params
        );
        assert_eq!(
            "https://sim-feed.com",
            resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN]
        );
    }

    #[tokio::test]
    async fn test_update_existing() {
        let exec = Arc::new(MockExecutor::new().returns(vec![user_row("user_1", "renamed")]));
        let resp = dispatch(
            signed("/users/update/web-hook", &event("user.updated", "user_1", "renamed")),
            context_with_config(exec.clone(), config()),
        )
        .await
        .unwrap();

        assert_eq!(StatusCode::OK, resp.status());
        let body = body_json(&resp);
        assert_eq!("Username updated", body["message"]);
        assert_eq!("renamed", body["user"]["username"]);
        assert_eq!(1, exec.calls().len());
    }

    #[tokio::test]
    async fn test_update_falls_back_to_insert() {
        let exec = Arc::new(
            MockExecutor::new()
                .returns(vec![])
                .returns(vec![user_row("user_9", "newcomer")]),
        );
        let resp = dispatch(
            signed("/users/update/web-hook", &event("user.updated", "user_9", "newcomer")),
            context_with_config(exec.clone(), config()),
        )
        .await
        .unwrap();

        assert_eq!(StatusCode::CREATED, resp.status());
        let body = body_json(&resp);
        assert_eq!("User created", body["message"]);
        assert_eq!("", body["user"]["bio"]);

        let calls = exec.calls();
        assert_eq!(2, calls.len());
        assert!(calls[0].sql.contains("UPDATE users"));
        assert!(calls[1].sql.contains("INSERT INTO users"));
    }

    #[tokio::test]
    async fn test_update_fallback_failure() {
        let exec = MockExecutor::new()
            .returns(vec![])
            .fails("duplicate key value violates unique constraint");
        let resp = dispatch(
            signed("/users/update/web-hook", &event("user.updated", "user_9", "x")),
            context_with_config(exec, config()),
        )
        .await
        .unwrap();

        assert_eq!(StatusCode::INTERNAL_SERVER_ERROR, resp.status());
        assert_eq!(json!({"error": "Internal Server Error"}), body_json(&resp));
    }

    #[tokio::test]
    async fn test_delete() {
        let exec = MockExecutor::new().returns(vec![user_row("user_1", "bye")]);
        let payload = json!({"type": "user.deleted", "data": {"id": "user_1"}}).to_string();
        let resp = dispatch(
            signed("/users/delete/web-hook", &payload),
            context_with_config(exec, config()),
        )
        .await
        .unwrap();

        assert_eq!(StatusCode::OK, resp.status());
        assert_eq!("User deleted", body_json(&resp)["message"]);
    }

    #[tokio::test]
    async fn test_delete_unknown_user() {
        let exec = Arc::new(MockExecutor::new());
        let payload = json!({"type": "user.deleted", "data": {"id": "ghost"}}).to_string();
        let resp = dispatch(
            signed("/users/delete/web-hook", &payload),
            context_with_config(exec.clone(), config()),
        )
        .await
        .unwrap();

        assert_eq!(StatusCode::NOT_FOUND, resp.status());
        assert_eq!(json!({"error": "User not found"}), body_json(&resp));
        assert_eq!(1, exec.calls().len());
    }

    #[tokio::test]
    async fn test_other_event_ignored() {
        let exec = Arc::new(MockExecutor::new());
        let resp = dispatch(
            signed("/users/delete/web-hook", &event("user.created", "user_1", "a")),
            context_with_config(exec.clone(), config()),
        )
        .await
        .unwrap();

        assert_eq!(StatusCode::OK, resp.status());
        assert_eq!(json!({"message": "Event ignored"}), body_json(&resp));
        assert!(exec.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_body() {
        let resp = dispatch(
            request(Method::POST, "/users/web-hook", None),
            context_with_config(MockExecutor::new(), config()),
        )
        .await
        .unwrap();
        assert_eq!(StatusCode::BAD_REQUEST, resp.status());
        assert_eq!(json!({"error": "Missing request body"}), body_json(&resp));
    }

    #[tokio::test]
    async fn test_missing_fields() {
        let ctx = context_with_config(MockExecutor::new(), config());
        for payload in [
            json!({"type": "user.created"}),
            json!({"type": "user.created", "data": {"id": "user_1"}}),
            json!({"data": {"id": "user_1", "username": "a"}}),
        ] {
            let resp = dispatch(signed("/users/web-hook", &payload.to_string()), ctx.clone())
                .await
                .unwrap();
            assert_eq!(StatusCode::BAD_REQUEST, resp.status(), "{}", payload);
            assert_eq!(json!({"error": "Invalid request body"}), body_json(&resp));
        }
    }

    #[tokio::test]
    async fn test_bad_signature() {
        let exec = Arc::new(MockExecutor::new());
        let payload = event("user.created", "user_1", "a");
        let mut req = signed("/users/web-hook", &payload);
        req.headers_mut()
            .insert(HEADER_SIGNATURE, "v1,Zm9yZ2Vk".parse().unwrap());
        let resp = dispatch(req, context_with_config(exec.clone(), config()))
            .await
            .unwrap();

        assert_eq!(StatusCode::INTERNAL_SERVER_ERROR, resp.status());
        assert_eq!(json!({"error": "Internal Server Error"}), body_json(&resp));
        assert!(exec.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unsigned_request() {
        let payload = event("user.created", "user_1", "a");
        let resp = dispatch(
            request(Method::POST, "/users/web-hook", Some(&payload)),
            context_with_config(MockExecutor::new(), config()),
        )
        .await
        .unwrap();
        assert_eq!(StatusCode::INTERNAL_SERVER_ERROR, resp.status());
    }

    #[tokio::test]
    async fn test_secret_not_configured() {
        let payload = event("user.created", "user_1", "a");
        let resp = dispatch(
            signed("/users/web-hook", &payload),
            context_with_config(MockExecutor::new(), Config::default()),
        )
        .await
        .unwrap();
        assert_eq!(StatusCode::INTERNAL_SERVER_ERROR, resp.status());
    }

    #[tokio::test]
    async fn test_malformed_json() {
        let resp = dispatch(
            signed("/users/web-hook", "{not json"),
            context_with_config(MockExecutor::new(), config()),
        )
        .await
        .unwrap();
        assert_eq!(StatusCode::INTERNAL_SERVER_ERROR, resp.status());
    }

    #[tokio::test]
    async fn test_preflight() {
        let exec = Arc::new(MockExecutor::new());
        let resp = dispatch(
            request(Method::OPTIONS, "/users/update/web-hook", None),
            context_with_config(exec.clone(), config()),
        )
        .await
        .unwrap();

        assert_eq!(StatusCode::OK, resp.status());
        assert_eq!("", resp.body());
        assert_eq!(
            WRITE_METHODS,
            resp.headers()[header::ACCESS_CONTROL_ALLOW_METHODS]
        );
        assert!(exec.calls().is_empty());
    }
}
