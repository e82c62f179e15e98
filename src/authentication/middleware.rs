use std::convert::Infallible;

use warp::{reject::Rejection, Filter, Reply};

use crate::error::ApiError;

use super::jwt::{verify_jwt_session, SessionData};

pub fn with_auth() -> impl Filter<Extract = ((),), Error = Rejection> + Copy {
    warp::cookie::<String>("session").and_then(|session: String| async move {
        if verify_jwt_session(session).is_ok() {
            Ok(())
        } else {
            Err(warp::reject::custom(ApiError::Unauthorized))
        }
    })
}

pub fn with_session() -> impl Filter<Extract = (SessionData,), Error = Rejection> + Copy {
    warp::cookie::<String>("session").and_then(|session: String| async move {
        match verify_jwt_session(session) {
            Ok(data) => Ok(SessionData::from(data)),
            Err(_) => Err(warp::reject::custom(ApiError::Unauthorized)),
        }
    })
}

/// Anonymous callers pass through with no session instead of rejecting;
/// listing endpoints use this to serve public content.
pub fn with_possible_session(
) -> impl Filter<Extract = (Option<SessionData>,), Error = Infallible> + Copy {
    warp::filters::cookie::optional::<String>("session").map(|session: Option<String>| {
        session
            .and_then(|s| verify_jwt_session(s).ok())
            .map(SessionData::from)
    })
}

/// Maps rejections carrying an [`ApiError`] onto their status and body;
/// composed at the end of the consuming server's filter chain.
pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    if let Some(e) = err.find::<ApiError>() {
        return Ok(warp::reply::with_status(
            warp::reply::json(&e.to_body()),
            e.status_code(),
        ));
    }

    if err.is_not_found() {
        return Ok(warp::reply::with_status(
            warp::reply::json(&serde_json::json!({"message": "not found"})),
            warp::http::StatusCode::NOT_FOUND,
        ));
    }

    log::error!("unhandled rejection: {err:?}");
    Ok(warp::reply::with_status(
        warp::reply::json(&serde_json::json!({"message": "internal server error"})),
        warp::http::StatusCode::INTERNAL_SERVER_ERROR,
    ))
}
