use std::sync::Arc;

use http::StatusCode;

use crate::{
    controller::{
        cors::{CorsPolicy, READ_METHODS},
        json_response, params, Context, ErrorDetail, Request, Response, Route,
    },
    error::{Error, ErrorBody},
    model::post,
};

pub const ROUTE: Route = Route {
    name: "posts.random",
    cors: CorsPolicy::Fixed { methods: READ_METHODS },
    detail: ErrorDetail::Generic,
};

/// Sampled posts; the count may come back lower than requested.
pub async fn controller(req: Request, ctx: Arc<Context>) -> Result<Response, Error> {
    let num_posts = params::integer(params::path_param(&req, "num_posts"), 0..=i64::MAX, || {
        ErrorBody::bare("Invalid number of posts requested")
    })?;

    let num_posts = num_posts.raw.to_string();
    let posts = ctx
        .query(move |exec| post::find_random(exec, &num_posts))
        .await?;
    json_response(StatusCode::OK, &posts)
}
