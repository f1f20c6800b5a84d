//! Path / query parameter validation. A failure is always `Error::ParamError`
//! carrying the exact body the route answers with.

use std::{ops::RangeInclusive, str::FromStr};

use crate::{
    controller::{query_parse, PathParams, Request},
    error::{Error, ErrorBody},
    model::page_offset,
    model::persona::Relation,
};

pub const LIMIT_RANGE: RangeInclusive<i64> = 1..=100;

/// A validated integer with its raw text, since some queries bind the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Numeric<'a> {
    pub raw: &'a str,
    pub value: i64,
}

pub fn path_param<'a>(req: &'a Request, name: &str) -> Option<&'a str> {
    req.extensions()
        .get::<PathParams>()
        .and_then(|params| params.get(name))
}

/// Integer within `range`. Absent, empty, decimal or out-of-range input is rejected.
pub fn integer<'a>(
    raw: Option<&'a str>,
    range: RangeInclusive<i64>,
    rejection: impl FnOnce() -> ErrorBody,
) -> Result<Numeric<'a>, Error> {
    raw.and_then(|raw| {
        raw.parse::<i64>()
            .ok()
            .filter(|value| range.contains(value))
            .map(|value| Numeric { raw, value })
    })
    .ok_or_else(|| Error::ParamError(rejection()))
}

/// `{limit}` in [1, 100].
pub fn limit(req: &Request) -> Result<Numeric<'_>, Error> {
    integer(path_param(req, "limit"), LIMIT_RANGE, || {
        ErrorBody::bare("Invalid limit. Must be between 1 and 100")
    })
}

/// `{page}` ≥ 1, returned as the row offset of that page.
pub fn page_offset_of(req: &Request) -> Result<i64, Error> {
    let rejection = || ErrorBody::new("Bad Request", "Invalid page parameter");
    let page = integer(path_param(req, "page"), 1..=i64::MAX, rejection)?;
    page_offset(page.value).ok_or_else(|| Error::ParamError(rejection()))
}

/// `{persona_id}` ≥ `min`.
pub fn persona_id(req: &Request, min: i64) -> Result<Numeric<'_>, Error> {
    integer(path_param(req, "persona_id"), min..=i64::MAX, || {
        ErrorBody::new("Bad Request", "Invalid persona_id parameter")
    })
}

/// `?relation=follower|followed`.
pub fn relation(req: &Request) -> Result<Relation, Error> {
    query_parse(req)
        .get("relation")
        .and_then(|raw| Relation::from_str(raw).ok())
        .ok_or_else(|| {
            Error::ParamError(ErrorBody::new("Bad Request", "Invalid relation parameter"))
        })
}

/// Non-empty path segment.
pub fn required<'a>(
    req: &'a Request,
    name: &str,
    rejection: impl FnOnce() -> ErrorBody,
) -> Result<&'a str, Error> {
    path_param(req, name)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| Error::ParamError(rejection()))
}
