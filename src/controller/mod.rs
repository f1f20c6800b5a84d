pub mod cors;
mod healthz;
pub mod lambda;
pub mod params;
mod persona_info;
mod persona_list;
mod persona_most_active;
mod persona_posts;
mod persona_relations;
mod post_comments;
mod post_get;
mod post_most_liked;
mod post_pages;
mod post_pages_with_comments;
mod post_random;
pub mod standalone;
mod user_info;
mod user_webhook;

#[cfg(test)]
pub(crate) mod test_support;

use std::{collections::HashMap, future::Future, sync::Arc};

use http::{header, HeaderValue, Method, StatusCode};
use log::{error, info};
use percent_encoding::percent_decode_str;
use serde::Serialize;
use tokio::task::spawn_blocking;

use crate::{
    config::{Config, SecretResolver},
    controller::cors::{CorsHeaders, CorsPolicy},
    error::{Error, ErrorBody},
    model::Executor,
};

/// Normalized request shared by both adapters. `None` body means no body was sent.
pub type Request = http::Request<Option<String>>;
pub type Response = http::Response<String>;

/// Handles built once at startup and shared by every invocation.
pub struct Context {
    pub executor: Arc<dyn Executor>,
    pub secrets: SecretResolver,
    pub config: Config,
}

impl Context {
    pub fn new(executor: Arc<dyn Executor>, secrets: SecretResolver, config: Config) -> Self {
        Self {
            executor,
            secrets,
            config,
        }
    }

    /// Run model code on the blocking pool: pool checkout and diesel queries block.
    pub async fn query<T, F>(&self, f: F) -> Result<T, Error>
    where
        F: FnOnce(&dyn Executor) -> Result<T, Error> + Send + 'static,
        T: Send + 'static,
    {
        let executor = self.executor.clone();
        spawn_blocking(move || f(executor.as_ref())).await?
    }
}

/// Named segments captured from the request path, stored as a request extension.
#[derive(Debug, Clone, Default)]
pub struct PathParams(HashMap<String, String>);

impl PathParams {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(|v| v.as_str())
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for PathParams {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        PathParams(
            iter.into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }
}

/// What a 500 response body tells the caller.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorDetail {
    /// `{error: "Internal Server Error"}`
    Generic,
    /// Same, plus `message` holding the raw upstream error.
    Upstream,
}

/// Per-route response policy.
#[derive(Debug, Copy, Clone)]
pub struct Route {
    pub name: &'static str,
    pub cors: CorsPolicy,
    pub detail: ErrorDetail,
}

async fn entry<F>(
    req: Request,
    ctx: Arc<Context>,
    route: &Route,
    controller: fn(Request, Arc<Context>) -> F,
) -> Result<Response, Error>
where
    F: Future<Output = Result<Response, Error>>,
{
    let request_origin = req
        .headers()
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok());
    let cors = match route
        .cors
        .resolve(request_origin, ctx.config.allowed_origin())
    {
        Ok(cors) => cors,
        Err(_) => return Ok(forbidden_response()),
    };

    if req.method() == Method::OPTIONS && route.cors.is_enabled() {
        return preflight_response(cors.as_ref());
    }

    let mut resp = match controller(req, ctx).await {
        Ok(resp) => resp,
        Err(err) if err.is_fatal() => {
            error!("{}: {}", route.name, err);
            return Err(err);
        }
        Err(err) => error_response(&err, route.detail),
    };
    if let Some(cors) = cors {
        cors.apply(resp.headers_mut());
    }
    Ok(resp)
}

/// Bind path captures and run the route.
async fn bind<F>(
    mut req: Request,
    ctx: Arc<Context>,
    captures: &[(&str, &str)],
    route: &Route,
    controller: fn(Request, Arc<Context>) -> F,
) -> Result<Response, Error>
where
    F: Future<Output = Result<Response, Error>>,
{
    req.extensions_mut()
        .insert(captures.iter().copied().collect::<PathParams>());
    entry(req, ctx, route, controller).await
}

/// Percent-decoded path segments, without leading and trailing slashes.
fn path_segments(path: &str) -> Vec<String> {
    path.trim_matches('/')
        .split('/')
        .map(|segment| percent_decode_str(segment).decode_utf8_lossy().into_owned())
        .collect()
}

/// Route a normalized request. `Err` only for fatal errors.
///
/// A route whose last segment is a parameter also matches with that segment
/// missing, so the controller answers with its own rejection.
pub async fn dispatch(req: Request, ctx: Arc<Context>) -> Result<Response, Error> {
    info!("{} {}", req.method(), req.uri().path());

    let decoded = path_segments(req.uri().path());
    let segments: Vec<&str> = decoded.iter().map(String::as_str).collect();
    let read = matches!(*req.method(), Method::GET | Method::OPTIONS);
    let write = matches!(*req.method(), Method::POST | Method::OPTIONS);

    match segments.as_slice() {
        ["healthz"] if read => entry(req, ctx, &healthz::ROUTE, healthz::controller).await,

        ["personas"] if read => {
            entry(req, ctx, &persona_list::ROUTE, persona_list::controller).await
        }
        ["personas", "most-active"] if read => {
            let route = &persona_most_active::ROUTE;
            entry(req, ctx, route, persona_most_active::controller).await
        }
        ["personas", "most-active", limit] if read => {
            let route = &persona_most_active::ROUTE;
            bind(req, ctx, &[("limit", *limit)], route, persona_most_active::controller).await
        }
        ["personas", persona_id, "relations"] if read => {
            let route = &persona_relations::ROUTE;
            let captures = [("persona_id", *persona_id)];
            bind(req, ctx, &captures, route, persona_relations::controller).await
        }
        ["personas", persona_id] if read => {
            let captures = [("persona_id", *persona_id)];
            bind(req, ctx, &captures, &persona_info::ROUTE, persona_info::controller).await
        }

        ["posts", "pages"] if read => {
            entry(req, ctx, &post_pages::ROUTE, post_pages::controller).await
        }
        ["posts", "pages", page] if read => {
            bind(req, ctx, &[("page", *page)], &post_pages::ROUTE, post_pages::controller).await
        }
        ["posts", "comments"] if read => {
            let route = &post_pages_with_comments::ROUTE;
            entry(req, ctx, route, post_pages_with_comments::controller).await
        }
        ["posts", "comments", page] if read => {
            let route = &post_pages_with_comments::ROUTE;
            bind(req, ctx, &[("page", *page)], route, post_pages_with_comments::controller).await
        }
        ["posts", "most-liked"] if read => {
            entry(req, ctx, &post_most_liked::ROUTE, post_most_liked::controller).await
        }
        ["posts", "most-liked", limit] if read => {
            let route = &post_most_liked::ROUTE;
            bind(req, ctx, &[("limit", *limit)], route, post_most_liked::controller).await
        }
        ["posts", "random"] if read => {
            entry(req, ctx, &post_random::ROUTE, post_random::controller).await
        }
        ["posts", "random", num_posts] if read => {
            let captures = [("num_posts", *num_posts)];
            bind(req, ctx, &captures, &post_random::ROUTE, post_random::controller).await
        }
        ["posts", "personas", persona_id, "pages"] if read => {
            let captures = [("persona_id", *persona_id)];
            bind(req, ctx, &captures, &persona_posts::ROUTE, persona_posts::controller).await
        }
        ["posts", "personas", persona_id, "pages", page] if read => {
            let captures = [("persona_id", *persona_id), ("page", *page)];
            bind(req, ctx, &captures, &persona_posts::ROUTE, persona_posts::controller).await
        }
        ["posts", post_id, "comments"] if read => {
            let captures = [("post_id", *post_id)];
            bind(req, ctx, &captures, &post_comments::ROUTE, post_comments::controller).await
        }
        ["posts", post_id] if read => {
            let captures = [("post_id", *post_id)];
            bind(req, ctx, &captures, &post_get::ROUTE, post_get::controller).await
        }

        ["users", "web-hook"] if write => {
            entry(req, ctx, &user_webhook::ROUTE, user_webhook::create).await
        }
        ["users", "update", "web-hook"] if write => {
            entry(req, ctx, &user_webhook::ROUTE, user_webhook::update).await
        }
        ["users", "delete", "web-hook"] if write => {
            entry(req, ctx, &user_webhook::ROUTE, user_webhook::delete).await
        }
        ["users"] if read => entry(req, ctx, &user_info::ROUTE, user_info::controller).await,
        ["users", user_id] if read => {
            let captures = [("user_id", *user_id)];
            bind(req, ctx, &captures, &user_info::ROUTE, user_info::controller).await
        }

        _ => Ok(not_found_response()),
    }
}

/// Query string parameters, last value wins.
pub fn query_parse(req: &Request) -> HashMap<String, String> {
    req.uri()
        .query()
        .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default()
}

/// `Some(body)` unless the body is absent or empty.
pub fn body_text(req: &Request) -> Option<&str> {
    req.body().as_deref().filter(|b| !b.is_empty())
}

pub fn json_response<T>(status: StatusCode, resp: &T) -> Result<Response, Error>
where
    T: Serialize,
{
    let body = serde_json::to_string(resp)?;

    http::Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))
        .body(body)
        .map_err(|e| e.into())
}

/// Shape a recovered error according to the route's detail policy.
pub fn error_response(err: &Error, detail: ErrorDetail) -> Response {
    let status = err.http_status();
    let body = match err {
        Error::ParamError(body) | Error::NotFound(body) => body.clone(),
        Error::BodyMissing | Error::BodyInvalid => ErrorBody::bare(err.to_string()),
        Error::Forbidden => ErrorBody::bare("Forbidden"),
        _ => {
            error!("{}", err);
            match detail {
                ErrorDetail::Generic => ErrorBody::bare("Internal Server Error"),
                ErrorDetail::Upstream => {
                    ErrorBody::new("Internal Server Error", err.upstream_message())
                }
            }
        }
    };

    json_response(status, &body).unwrap_or_else(|_| fallback_response(status))
}

/// Disallowed origin: no headers at all, not even `Content-Type`.
fn forbidden_response() -> Response {
    let body = serde_json::to_string(&ErrorBody::bare("Forbidden")).unwrap_or_default();
    let mut resp = Response::new(body);
    *resp.status_mut() = StatusCode::FORBIDDEN;
    resp
}

fn preflight_response(cors: Option<&CorsHeaders>) -> Result<Response, Error> {
    let mut resp = http::Response::builder()
        .status(StatusCode::OK)
        .body(String::new())?;
    if let Some(cors) = cors {
        cors.apply(resp.headers_mut());
    }
    Ok(resp)
}

pub fn not_found_response() -> Response {
    json_response(StatusCode::NOT_FOUND, &ErrorBody::bare("Not Found"))
        .unwrap_or_else(|_| fallback_response(StatusCode::NOT_FOUND))
}

/// Response of the local adapter when a fatal error escapes a handler.
pub fn fatal_response() -> Response {
    json_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        &ErrorBody::bare("Internal server error"),
    )
    .unwrap_or_else(|_| fallback_response(StatusCode::INTERNAL_SERVER_ERROR))
}

fn fallback_response(status: StatusCode) -> Response {
    let mut resp = Response::new(String::new());
    *resp.status_mut() = status;
    resp
}
