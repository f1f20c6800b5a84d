use std::sync::Arc;

use lambda_http::{
    Body as LambdaBody, Error as LambdaError, Request as LambdaRequest,
    Response as LambdaResponse,
};

use crate::controller::{dispatch, Context, Request, Response};

/// Translate `lambda_http` `Body` into our optional text body.
fn into_request(req: LambdaRequest) -> Request {
    let (parts, body) = req.into_parts();
    let body = match body {
        LambdaBody::Empty => None,
        LambdaBody::Text(text) => Some(text),
        LambdaBody::Binary(bin) => Some(String::from_utf8_lossy(&bin).into_owned()),
    };
    http::Request::from_parts(parts, body)
}

fn into_response(resp: Response) -> LambdaResponse<LambdaBody> {
    let (parts, body) = resp.into_parts();
    let body = if body.is_empty() {
        LambdaBody::Empty
    } else {
        LambdaBody::Text(body)
    };
    LambdaResponse::from_parts(parts, body)
}

/// Main entrypoint for `lambda_http`.
/// A fatal error fails the invocation and is reported by the runtime.
pub async fn entrypoint(
    req: LambdaRequest,
    ctx: Arc<Context>,
) -> Result<LambdaResponse<LambdaBody>, LambdaError> {
    let resp = dispatch(into_request(req), ctx).await?;
    Ok(into_response(resp))
}
