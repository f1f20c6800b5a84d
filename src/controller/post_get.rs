use std::sync::Arc;

use http::StatusCode;

use crate::{
    controller::{
        cors::CorsPolicy, json_response, params, Context, ErrorDetail, Request, Response, Route,
    },
    error::{Error, ErrorBody},
    model::post,
};

pub const ROUTE: Route = Route {
    name: "posts.get",
    cors: CorsPolicy::Disabled,
    detail: ErrorDetail::Upstream,
};

/// A single post with its comments and like count.
pub async fn controller(req: Request, ctx: Arc<Context>) -> Result<Response, Error> {
    let post_id = params::integer(params::path_param(&req, "post_id"), 0..=i64::MAX, || {
        ErrorBody::bare("Invalid post ID")
    })?;

    let id = post_id.raw.to_string();
    match ctx.query(move |exec| post::find_with_comments(exec, &id)).await? {
        Some(found) => json_response(StatusCode::OK, &found),
        None => Err(Error::NotFound(ErrorBody::bare(format!(
            "Post ID {} not found",
            post_id.raw
        )))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        controller::{
            dispatch,
            test_support::{body_json, context, request},
        },
        model::{mock::MockExecutor, Param},
    };
    use http::Method;
    use serde_json::json;

    #[tokio::test]
    async fn test_post_with_comments() {
        let exec = Arc::new(MockExecutor::new().returns(vec![json!({
            "id": 5,
            "title": null,
            "body": "gm",
            "author": null,
            "user_author": "user_2x",
            "author_type": "user",
            "author_username": "alice",
            "created_at": "2024-03-01T12:00:00",
            "likes_count": 3,
            "comments": [{
                "id": 1,
                "body": "gm back",
                "author_id": 2,
                "user_author_id": null,
                "author_type": "persona",
                "author_username": "bot2",
                "created_at": "2024-03-01T12:05:00",
            }],
        })]));
        let resp = dispatch(request(Method::GET, "/posts/5", None), context(exec.clone()))
            .await
            .unwrap();

        assert_eq!(StatusCode::OK, resp.status());
        let body = body_json(&resp);
        assert_eq!(3, body["likes_count"]);
        assert_eq!("bot2", body["comments"][0]["author_username"]);
        assert_eq!(vec![Param::Text("5".into())], exec.calls()[0].params);
    }

    #[tokio::test]
    async fn test_not_found() {
        let resp = dispatch(request(Method::GET, "/posts/42", None), context(MockExecutor::new()))
            .await
            .unwrap();
        assert_eq!(StatusCode::NOT_FOUND, resp.status());
        assert_eq!(json!({"error": "Post ID 42 not found"}), body_json(&resp));
    }

    #[tokio::test]
    async fn test_invalid_id() {
        let resp = dispatch(request(Method::GET, "/posts/-3", None), context(MockExecutor::new()))
            .await
            .unwrap();
        assert_eq!(StatusCode::BAD_REQUEST, resp.status());
        assert_eq!(json!({"error": "Invalid post ID"}), body_json(&resp));
    }
}
