use std::sync::Arc;

use http::Method;

use crate::{
    config::{Config, SecretResolver},
    controller::{Context, PathParams, Request, Response},
    model::mock::MockExecutor,
};

pub fn context(executor: impl Into<Arc<MockExecutor>>) -> Arc<Context> {
    context_with_config(executor, Config::default())
}

pub fn context_with_config(executor: impl Into<Arc<MockExecutor>>, config: Config) -> Arc<Context> {
    let executor: Arc<MockExecutor> = executor.into();
    Arc::new(Context::new(
        executor,
        SecretResolver::Environment(config.clone()),
        config,
    ))
}

pub fn request(method: Method, path: &str, body: Option<&str>) -> Request {
    ::http::Request::builder()
        .method(method)
        .uri(format!("http://localhost{}", path))
        .body(body.map(|b| b.to_string()))
        .unwrap()
}

/// GET request with path captures already bound, for calling a controller directly.
pub fn get_with_params(path: &str, params: &[(&str, &str)]) -> Request {
    let mut req = request(Method::GET, path, None);
    req.extensions_mut()
        .insert(params.iter().copied().collect::<PathParams>());
    req
}

pub fn body_json(resp: &Response) -> serde_json::Value {
    serde_json::from_str(resp.body()).unwrap()
}
