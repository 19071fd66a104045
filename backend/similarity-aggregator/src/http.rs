//! Admin HTTP surface: health checks, metrics, state inspection and reset

use crate::metrics;
use crate::services::{AggregatorEngine, EngineStats, SharedEngine};
use actix_web::dev::Server;
use actix_web::{web, App, HttpResponse, HttpServer};
use serde::Serialize;
use std::net::ToSocketAddrs;
use tokio::sync::Mutex;
use tracing::warn;

type EngineData = web::Data<Mutex<AggregatorEngine>>;

#[derive(Debug, Serialize)]
struct ResetResponse {
    cleared: EngineStats,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(|| async { "OK" }))
        .route("/ready", web::get().to(|| async { "READY" }))
        .route("/metrics", web::get().to(metrics::serve_metrics))
        .service(
            web::scope("/admin")
                .route("/stats", web::get().to(stats))
                .route("/reset", web::post().to(reset)),
        );
}

/// Bind the admin server without starting it
///
/// Signal handling is left to the caller, which owns the shutdown sequence.
pub fn bind_admin_server(
    engine: SharedEngine,
    addr: impl ToSocketAddrs,
) -> std::io::Result<Server> {
    let engine_data = web::Data::from(engine);
    let server = HttpServer::new(move || {
        App::new()
            .app_data(engine_data.clone())
            .configure(configure)
    })
    .disable_signals()
    .workers(1)
    .bind(addr)?
    .run();

    Ok(server)
}

async fn stats(engine: EngineData) -> HttpResponse {
    let stats = engine.lock().await.stats();
    HttpResponse::Ok().json(stats)
}

/// Clears all aggregate state. Waits for any `apply` in progress.
async fn reset(engine: EngineData) -> HttpResponse {
    let (cleared, after) = {
        let mut engine = engine.lock().await;
        let cleared = engine.reset();
        (cleared, engine.stats())
    };
    metrics::record_engine_size(&after);

    warn!(
        events = cleared.events,
        users = cleared.users,
        pairs = cleared.pairs,
        "Aggregate state reset"
    );

    HttpResponse::Ok().json(ResetResponse { cleared })
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test;
    use std::net::TcpListener;
    use chrono::Utc;
    use event_schema::{ActionKind, UserAction};

    fn seeded_engine() -> web::Data<Mutex<AggregatorEngine>> {
        let mut engine = AggregatorEngine::default();
        for (event_id, kind) in [(100, ActionKind::View), (200, ActionKind::Like)] {
            engine.apply(&UserAction {
                event_id,
                user_id: 1,
                action_type: kind,
                timestamp: Utc::now(),
            });
        }
        web::Data::from(engine.into_shared())
    }

    #[actix_web::test]
    async fn test_health() {
        let app = test::init_service(App::new().configure(configure)).await;
        let req = test::TestRequest::get().uri("/health").to_request();
        let body = test::call_and_read_body(&app, req).await;

        assert_eq!(body, "OK");
    }

    #[actix_web::test]
    async fn test_stats() {
        let app = test::init_service(
            App::new()
                .app_data(seeded_engine())
                .configure(configure),
        )
        .await;
        let req = test::TestRequest::get().uri("/admin/stats").to_request();
        let stats: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(stats["events"], 2);
        assert_eq!(stats["users"], 1);
        assert_eq!(stats["pairs"], 1);
        assert_eq!(stats["actions_applied"], 2);
    }

    #[actix_web::test]
    async fn test_reset_clears_engine() {
        let engine = seeded_engine();
        let app = test::init_service(
            App::new()
                .app_data(engine.clone())
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post().uri("/admin/reset").to_request();
        let response: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(response["cleared"]["events"], 2);
        assert_eq!(engine.lock().await.stats(), EngineStats::default());
    }

    #[actix_web::test]
    async fn test_reset_requires_post() {
        let app = test::init_service(
            App::new()
                .app_data(seeded_engine())
                .configure(configure),
        )
        .await;
        let req = test::TestRequest::get().uri("/admin/reset").to_request();
        let response = test::call_service(&app, req).await;

        assert!(response.status().is_client_error());
    }

    #[actix_web::test]
    async fn test_bind_fails_on_occupied_port() {
        let occupied = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = occupied.local_addr().unwrap().port();

        let engine = AggregatorEngine::default().into_shared();
        let result = bind_admin_server(engine, ("127.0.0.1", port));

        assert!(result.is_err());
    }

    #[actix_web::test]
    async fn test_bound_server_stops_on_request() {
        let engine = AggregatorEngine::default().into_shared();
        let server = bind_admin_server(engine, ("127.0.0.1", 0)).unwrap();
        let handle = server.handle();
        let running = actix_rt::spawn(server);

        handle.stop(true).await;

        assert!(running.await.unwrap().is_ok());
    }
}
