//! Liveness probe. Does not touch the row store.

use axum::{routing::get, Json, Router};
use serde::Serialize;

#[derive(Serialize)]
pub struct Liveness {
    pub service: &'static str,
    pub status: &'static str,
    pub version: &'static str,
}

async fn liveness() -> Json<Liveness> {
    Json(Liveness {
        service: "jobbook",
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/health", get(liveness))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reports_service_and_version() {
        let Json(body) = liveness().await;
        assert_eq!(body.service, "jobbook");
        assert_eq!(body.status, "ok");
        assert_eq!(body.version, env!("CARGO_PKG_VERSION"));
    }
}
