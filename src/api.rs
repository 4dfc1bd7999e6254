//! The calculator's routes.
use super::{
    eval::{self, EvalError, Segments},
    handler::Ctx,
    history::{StoreError, LATEST},
    path,
    reply::{self, Html},
    route::PathSpec,
    view, Response,
};

/// `GET /`
pub fn index_path() -> PathSpec {
    path![]
}

/// `GET /history`
pub fn history_path() -> PathSpec {
    path!["history"]
}

/// `GET /:num1/:operation/:num2/:operation2?/:num3?`
pub fn compute_path() -> PathSpec {
    path![num1 / operation / num2 / operation2? / num3?]
}

/// Evaluate the expression in the path and reply with it as json. The expression is written to
/// history before replying, but the reply never depends on whether that write succeeds.
pub async fn compute(cx: Ctx) -> Result<Response, EvalError> {
    let ps = &cx.params;

    let expr = eval::evaluate(&Segments {
        num1: ps.get("num1").unwrap_or_default(),
        operation: ps.get("operation").unwrap_or_default(),
        num2: ps.get("num2").unwrap_or_default(),
        operation2: ps.get("operation2"),
        num3: ps.get("num3"),
    })?;

    let resp = reply::json(&expr);
    cx.state.recorder.record(expr).await;

    Ok(resp)
}

/// Every stored expression, in store order.
pub async fn index(cx: Ctx) -> Result<Html, StoreError> {
    let entries = (cx.state.store.list_all().await)
        .map_err(|e| log_read_failure("all expressions", e))?;

    Ok(view::all(&entries))
}

/// The latest stored expressions, newest first.
pub async fn history(cx: Ctx) -> Result<Html, StoreError> {
    let entries = (cx.state.store.list_latest(LATEST).await)
        .map_err(|e| log_read_failure("latest expressions", e))?;

    Ok(view::latest(&entries))
}

fn log_read_failure(what: &str, e: StoreError) -> StoreError {
    tracing::error!("failed to fetch {}: {}", what, e);
    e
}
