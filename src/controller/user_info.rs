use std::sync::Arc;

use http::StatusCode;

use crate::{
    controller::{
        cors::{CorsPolicy, WRITE_METHODS},
        json_response, params, Context, ErrorDetail, Request, Response, Route,
    },
    error::{Error, ErrorBody},
    model::user,
};

pub const ROUTE: Route = Route {
    name: "users.info",
    cors: CorsPolicy::AllowList { methods: WRITE_METHODS },
    detail: ErrorDetail::Upstream,
};

pub async fn controller(req: Request, ctx: Arc<Context>) -> Result<Response, Error> {
    let user_id = params::required(&req, "user_id", || {
        ErrorBody::new("Bad Request", "Invalid user_id parameter")
    })?;

    let id = user_id.to_string();
    match ctx.query(move |exec| user::find_by_id(exec, &id)).await? {
        Some(profile) => json_response(StatusCode::OK, &profile),
        None => Err(Error::NotFound(ErrorBody::new(
            "Not Found",
            format!("User with ID {} not found", user_id),
        ))),
    }
}
