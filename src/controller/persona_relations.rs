use std::sync::Arc;

use http::StatusCode;

use crate::{
    controller::{
        cors::{CorsPolicy, READ_METHODS},
        json_response, params, Context, ErrorDetail, Request, Response, Route,
    },
    error::Error,
    model::persona,
};

pub const ROUTE: Route = Route {
    name: "personas.relations",
    cors: CorsPolicy::Fixed { methods: READ_METHODS },
    detail: ErrorDetail::Upstream,
};

/// `?relation=follower` lists who the persona follows,
/// `?relation=followed` lists its followers.
pub async fn controller(req: Request, ctx: Arc<Context>) -> Result<Response, Error> {
    let persona_id = params::persona_id(&req, 0)?;
    let relation = params::relation(&req)?;

    let id = persona_id.raw.to_string();
    let related = ctx
        .query(move |exec| persona::find_relations(exec, &id, relation))
        .await?;
    json_response(StatusCode::OK, &related)
}
