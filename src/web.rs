use std::sync::{Mutex, MutexGuard};

use actix_web::{http::header, middleware, web, App, HttpResponse, HttpServer, Result};
use serde::Serialize;
use tracing::info;

use crate::display::write_unplaceable_csv;
use crate::parser::{read_bookings, read_rooms};
use crate::simulation::{simulate, Booking, RoomRegistry, Selection, SimulationReport};

/// Tables and the last report for the single operator session.
#[derive(Default)]
pub struct AppState {
    pub rooms: Mutex<Option<RoomRegistry>>,
    pub bookings: Mutex<Option<Vec<Booking>>>,
    pub report: Mutex<Option<SimulationReport>>,
}

#[derive(Serialize)]
pub struct OptionsResponse {
    buildings: Vec<String>,
    rooms: Vec<String>,
}

fn lock<T>(slot: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    slot.lock()
        .map_err(|_| actix_web::error::ErrorInternalServerError("state lock poisoned"))
}

fn failure(status: actix_web::http::StatusCode, error: impl std::fmt::Display) -> HttpResponse {
    HttpResponse::build(status)
        .json(serde_json::json!({"success": false, "error": error.to_string()}))
}

fn options_of(registry: &RoomRegistry) -> OptionsResponse {
    OptionsResponse {
        buildings: registry.buildings(),
        rooms: registry.room_ids(),
    }
}

// Room table upload
async fn upload_rooms(body: web::Bytes, state: web::Data<AppState>) -> Result<HttpResponse> {
    match read_rooms(&body) {
        Ok(registry) => {
            let response = serde_json::json!({
                "success": true,
                "count": registry.len(),
                "options": options_of(&registry),
            });
            *lock(&state.rooms)? = Some(registry);
            *lock(&state.report)? = None;
            Ok(HttpResponse::Ok().json(response))
        }
        Err(e) => Ok(failure(
            actix_web::http::StatusCode::BAD_REQUEST,
            format!("Failed to process room table: {}", e),
        )),
    }
}

// Booking table upload
async fn upload_bookings(body: web::Bytes, state: web::Data<AppState>) -> Result<HttpResponse> {
    match read_bookings(&body) {
        Ok(bookings) => {
            let count = bookings.len();
            *lock(&state.bookings)? = Some(bookings);
            *lock(&state.report)? = None;
            Ok(HttpResponse::Ok().json(serde_json::json!({"success": true, "count": count})))
        }
        Err(e) => Ok(failure(
            actix_web::http::StatusCode::BAD_REQUEST,
            format!("Failed to process booking table: {}", e),
        )),
    }
}

async fn get_options(state: web::Data<AppState>) -> Result<HttpResponse> {
    match lock(&state.rooms)?.as_ref() {
        Some(registry) => Ok(HttpResponse::Ok().json(options_of(registry))),
        None => Ok(failure(actix_web::http::StatusCode::NOT_FOUND, "No room table loaded")),
    }
}

async fn run_simulation(
    selection: web::Json<Selection>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let report = {
        let rooms = lock(&state.rooms)?;
        let bookings = lock(&state.bookings)?;
        let (Some(registry), Some(bookings)) = (rooms.as_ref(), bookings.as_ref()) else {
            return Ok(failure(
                actix_web::http::StatusCode::BAD_REQUEST,
                "Upload both the room table and the booking table first",
            ));
        };
        simulate(registry, bookings, &selection)
    };
    let response = HttpResponse::Ok().json(&report);
    *lock(&state.report)? = Some(report);
    Ok(response)
}

async fn get_report(state: web::Data<AppState>) -> Result<HttpResponse> {
    match lock(&state.report)?.as_ref() {
        Some(report) => Ok(HttpResponse::Ok().json(report)),
        None => Ok(failure(actix_web::http::StatusCode::NOT_FOUND, "No simulation has been run")),
    }
}

async fn download_unplaceable(state: web::Data<AppState>) -> Result<HttpResponse> {
    let report = lock(&state.report)?;
    let Some(report) = report.as_ref() else {
        return Ok(failure(actix_web::http::StatusCode::NOT_FOUND, "No simulation has been run"));
    };
    let mut csv = Vec::new();
    write_unplaceable_csv(&mut csv, &report.unplaceable)
        .map_err(actix_web::error::ErrorInternalServerError)?;
    Ok(HttpResponse::Ok()
        .content_type("text/csv")
        .insert_header((
            header::CONTENT_DISPOSITION,
            "attachment; filename=\"unplaceable.csv\"",
        ))
        .body(csv))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/upload/rooms", web::post().to(upload_rooms))
        .route("/api/upload/bookings", web::post().to(upload_bookings))
        .route("/api/options", web::get().to(get_options))
        .route("/api/simulate", web::post().to(run_simulation))
        .route("/api/report", web::get().to(get_report))
        .route("/api/unplaceable.csv", web::get().to(download_unplaceable));
}

pub async fn start_server(port: u16) -> std::io::Result<()> {
    let app_state = web::Data::new(AppState::default());
    info!(port, "starting web server");

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .app_data(web::PayloadConfig::new(64 * 1024 * 1024))
            .wrap(middleware::Logger::default())
            .configure(configure)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test};

    const ROOMS: &str = "ruimte,capaciteit\nX1,30\nX2,20\nX3,40\n";
    const BOOKINGS: &str = "activiteit,ruimte,startdatum,einddatum,groepgrootte\n\
        Lecture,X1,2025-03-03 09:00,2025-03-03 11:00,25\n\
        Huge,X1,2025-03-03 13:00,2025-03-03 15:00,400\n";

    macro_rules! app {
        ($state:expr) => {
            test::init_service(App::new().app_data($state.clone()).configure(configure)).await
        };
    }

    #[actix_web::test]
    async fn test_simulate_requires_uploads() {
        let state = web::Data::new(AppState::default());
        let app = app!(state);
        let req = test::TestRequest::post()
            .uri("/api/simulate")
            .set_json(serde_json::json!({"rooms": ["X1"], "from": "2025-03-01"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_full_session() {
        let state = web::Data::new(AppState::default());
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/api/upload/rooms")
            .set_payload(ROOMS)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = test::TestRequest::get().uri("/api/options").to_request();
        let options: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(options["buildings"], serde_json::json!(["X"]));
        assert_eq!(options["rooms"], serde_json::json!(["X1", "X2", "X3"]));

        let req = test::TestRequest::post()
            .uri("/api/upload/bookings")
            .set_payload(BOOKINGS)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = test::TestRequest::post()
            .uri("/api/simulate")
            .set_json(serde_json::json!({"rooms": ["X1"], "from": "2025-03-01"}))
            .to_request();
        let report: SimulationReport = test::call_and_read_body_json(&app, req).await;
        assert_eq!(report.summary.total_conflicts, 2);
        assert_eq!(report.same_time.len(), 1);
        assert_eq!(report.same_time[0].new_room, "X3");
        assert_eq!(report.unplaceable.len(), 1);

        let req = test::TestRequest::get().uri("/api/unplaceable.csv").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = test::read_body(resp).await;
        let text = std::str::from_utf8(&body).unwrap();
        assert!(text.starts_with("activity,room,start,end,group_size\n"));
        assert!(text.contains("Huge,X1,2025-03-03 13:00:00,2025-03-03 15:00:00,400"));
    }

    #[actix_web::test]
    async fn test_broken_workbook_upload_is_rejected() {
        let state = web::Data::new(AppState::default());
        let app = app!(state);
        let req = test::TestRequest::post()
            .uri("/api/upload/rooms")
            .set_payload(b"PK\x03\x04truncated".to_vec())
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
        assert!(state.rooms.lock().unwrap().is_none());
    }

    #[actix_web::test]
    async fn test_report_missing_before_run() {
        let state = web::Data::new(AppState::default());
        let app = app!(state);
        let req = test::TestRequest::get().uri("/api/report").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }
}
