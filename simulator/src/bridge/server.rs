use crate::bridge::model::ReducedStatus;
use crate::workflow::runner::SharedSession;
use crate::workflow::session::CommandError;
use log::{info, warn};
use percent_encoding::percent_decode_str;
use racecore::protocol::{PenaltyAction, StatusSnapshot};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use warp::{http::StatusCode, reply::Response, Filter, Rejection, Reply};

/// Everything a route handler needs.
#[derive(Clone)]
struct BridgeState {
    session: SharedSession,
    secret: Arc<str>,
    allow_simplified: bool,
}

impl BridgeState {
    /// `raw_secret` is the path segment as received, still percent-encoded.
    fn authorised(&self, raw_secret: &str) -> bool {
        match percent_decode_str(raw_secret).decode_utf8() {
            Ok(secret) => *self.secret == *secret,
            Err(_) => false,
        }
    }

    fn snapshot(&self) -> Option<StatusSnapshot> {
        self.session.read().ok().map(|session| session.snapshot())
    }
}

/// HTTP surface of the simulator.
///
/// * `GET /status/{secret}` full snapshot
/// * `GET /penalty/{secret}/{driver}/{code}` apply a command
/// * `GET /status` and `GET /penalty/{driver}/{code}` when the simplified
///   variant is enabled
pub fn routes(
    session: SharedSession,
    secret: &str,
    allow_simplified: bool,
) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    let state = BridgeState {
        session,
        secret: Arc::from(secret),
        allow_simplified,
    };
    let state_filter = warp::any().map(move || state.clone());

    let status = warp::path!("status" / String)
        .and(warp::get())
        .and(state_filter.clone())
        .map(|secret: String, state: BridgeState| {
            if !state.authorised(&secret) {
                return forbidden();
            }
            match state.snapshot() {
                Some(snapshot) => json_response(&snapshot, StatusCode::OK),
                None => poisoned(),
            }
        });

    let reduced_status = warp::path!("status")
        .and(warp::get())
        .and(state_filter.clone())
        .map(|state: BridgeState| {
            if !state.allow_simplified {
                return not_found("simplified endpoints are disabled");
            }
            match state.snapshot() {
                Some(snapshot) => json_response(&ReducedStatus::from(snapshot), StatusCode::OK),
                None => poisoned(),
            }
        });

    let penalty = warp::path!("penalty" / String / String / String)
        .and(warp::get())
        .and(state_filter.clone())
        .map(
            |secret: String, driver: String, code: String, state: BridgeState| {
                if !state.authorised(&secret) {
                    return forbidden();
                }
                apply_command(&state, &driver, &code)
            },
        );

    let open_penalty = warp::path!("penalty" / String / String)
        .and(warp::get())
        .and(state_filter)
        .map(|driver: String, code: String, state: BridgeState| {
            if !state.allow_simplified {
                return not_found("simplified endpoints are disabled");
            }
            apply_command(&state, &driver, &code)
        });

    status
        .or(reduced_status)
        .unify()
        .or(penalty)
        .unify()
        .or(open_penalty)
        .unify()
}

fn apply_command(state: &BridgeState, raw_driver: &str, raw_code: &str) -> Response {
    let driver = match percent_decode_str(raw_driver).decode_utf8() {
        Ok(driver) => driver.into_owned(),
        Err(_) => return bad_request(format!("driver {raw_driver:?} is not valid UTF-8")),
    };
    let action = match raw_code
        .parse::<u8>()
        .map_err(|err| err.to_string())
        .and_then(|code| PenaltyAction::from_code(code).map_err(|err| err.to_string()))
    {
        Ok(action) => action,
        Err(err) => return bad_request(format!("code {raw_code:?}: {err}")),
    };

    let mut session = match state.session.write() {
        Ok(session) => session,
        Err(_) => return poisoned(),
    };
    match session.apply(&driver, action) {
        Ok(()) => json_response(&json!({ "status": "ok" }), StatusCode::OK),
        Err(err @ CommandError::UnknownDriver(_)) => {
            warn!("rejected {} for {:?}: {}", action, driver, err);
            not_found(&err.to_string())
        }
    }
}

fn json_response<T: Serialize>(body: &T, status: StatusCode) -> Response {
    warp::reply::with_status(warp::reply::json(body), status).into_response()
}

fn forbidden() -> Response {
    info!("request with wrong secret rejected");
    json_response(&json!({ "error": "forbidden" }), StatusCode::FORBIDDEN)
}

fn not_found(message: &str) -> Response {
    json_response(&json!({ "error": message }), StatusCode::NOT_FOUND)
}

fn bad_request(message: String) -> Response {
    json_response(&json!({ "error": message }), StatusCode::BAD_REQUEST)
}

fn poisoned() -> Response {
    json_response(
        &json!({ "error": "race session unavailable" }),
        StatusCode::INTERNAL_SERVER_ERROR,
    )
}
