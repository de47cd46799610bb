use actix_web::{middleware, web, App, HttpRequest, HttpResponse, HttpServer, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::Settings;
use crate::display::{format_ids, RosterSummary};
use crate::parser::read_records;
use crate::roster::SharedRoster;

/// The roster also holds the last generated schedule
pub struct AppState {
    pub roster: SharedRoster,
    pub settings: Settings,
    pub admin_password: String,
}

impl AppState {
    pub fn new(settings: Settings, admin_password: String) -> Self {
        AppState {
            roster: SharedRoster::default(),
            settings,
            admin_password,
        }
    }
}

#[derive(Deserialize)]
pub struct LoginRequest {
    password: String,
}

#[derive(Serialize)]
pub struct ScheduleResponse {
    classes: Vec<ScheduleRow>,
    warnings: Vec<String>,
}

#[derive(Serialize)]
pub struct ScheduleRow {
    class_time: String,
    instructors: String,
    students: Vec<String>,
    student_count: usize,
    status: &'static str,
}

fn is_admin(req: &HttpRequest, state: &AppState) -> bool {
    req.headers()
        .get("X-Admin-Password")
        .and_then(|v| v.to_str().ok())
        .map(|password| password == state.admin_password)
        .unwrap_or(false)
}

fn unauthorized() -> HttpResponse {
    HttpResponse::Unauthorized().json(serde_json::json!({
        "success": false,
        "error": "Unauthorized"
    }))
}

// Admin login endpoint
async fn admin_login(
    req: web::Json<LoginRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    if req.password == state.admin_password {
        Ok(HttpResponse::Ok().json(serde_json::json!({"success": true})))
    } else {
        Ok(HttpResponse::Unauthorized().json(serde_json::json!({
            "success": false,
            "error": "Invalid password"
        })))
    }
}

#[derive(Clone, Copy)]
enum Roster {
    Students,
    Instructors,
}

fn import_roster(
    req: &HttpRequest,
    body: &web::Bytes,
    state: &AppState,
    which: Roster,
) -> HttpResponse {
    if !is_admin(req, state) {
        return unauthorized();
    }

    let records = match read_records(body.as_ref()) {
        Ok(records) => records,
        Err(e) => {
            warn!("Rejected roster upload: {}", e);
            return HttpResponse::BadRequest().json(serde_json::json!({
                "success": false,
                "error": format!("Failed to process CSV: {}", e)
            }));
        }
    };

    let count = records.len();
    match which {
        Roster::Students => state.roster.replace_students(&records),
        Roster::Instructors => state.roster.replace_instructors(&records),
    }

    HttpResponse::Ok().json(serde_json::json!({"success": true, "imported": count}))
}

async fn upload_students(
    req: HttpRequest,
    body: web::Bytes,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    Ok(import_roster(&req, &body, &state, Roster::Students))
}

async fn upload_instructors(
    req: HttpRequest,
    body: web::Bytes,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    Ok(import_roster(&req, &body, &state, Roster::Instructors))
}

// Runs the allocation over the current roster and keeps the result
async fn generate_schedule(req: HttpRequest, state: web::Data<AppState>) -> Result<HttpResponse> {
    if !is_admin(&req, &state) {
        return Ok(unauthorized());
    }

    match state.roster.generate(&state.settings) {
        Ok(schedule) => {
            let scheduled = schedule.len();
            Ok(HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "scheduled": scheduled,
                "message": "Schedule generated successfully"
            })))
        }
        Err(e) => {
            warn!("Schedule generation failed: {}", e);
            Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "success": false,
                "error": e.to_string()
            })))
        }
    }
}

async fn clear_roster(
    req: HttpRequest,
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    if !is_admin(&req, &state) {
        return Ok(unauthorized());
    }

    match path.as_str() {
        "students" => state.roster.clear_students(),
        "instructors" => state.roster.clear_instructors(),
        "periods" => state.roster.clear_periods(),
        other => {
            return Ok(HttpResponse::NotFound().json(serde_json::json!({
                "success": false,
                "error": format!("Unknown roster: {}", other)
            })))
        }
    }
    info!("Cleared {}", path.as_str());

    Ok(HttpResponse::Ok().json(serde_json::json!({"success": true})))
}

async fn get_schedule(state: web::Data<AppState>) -> Result<HttpResponse> {
    let Some(schedule) = state.roster.current_schedule() else {
        return Ok(HttpResponse::NotFound().json(serde_json::json!({
            "error": "Schedule not generated yet"
        })));
    };

    let classes = schedule
        .assignments
        .iter()
        .map(|a| ScheduleRow {
            class_time: a.label.clone(),
            instructors: format_ids(&a.instructors),
            students: a.students.iter().map(|s| s.to_string()).collect(),
            student_count: a.students.len(),
            status: a.status.label(),
        })
        .collect();
    let warnings = schedule.warnings.iter().map(|w| w.to_string()).collect();

    Ok(HttpResponse::Ok().json(ScheduleResponse { classes, warnings }))
}

async fn get_classes(state: web::Data<AppState>) -> Result<HttpResponse> {
    let report = state
        .roster
        .with(|roster, _| roster.readiness(&state.settings));
    Ok(HttpResponse::Ok().json(report))
}

async fn get_stats(state: web::Data<AppState>) -> Result<HttpResponse> {
    let summary = state.roster.with(RosterSummary::new);
    Ok(HttpResponse::Ok().json(summary))
}

/// Registers every route; shared by the server and the handler tests
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/admin/login", web::post().to(admin_login))
        .route("/api/admin/students", web::post().to(upload_students))
        .route("/api/admin/instructors", web::post().to(upload_instructors))
        .route("/api/admin/schedule", web::post().to(generate_schedule))
        .route("/api/admin/{roster}", web::delete().to(clear_roster))
        .route("/api/schedule", web::get().to(get_schedule))
        .route("/api/classes", web::get().to(get_classes))
        .route("/api/stats", web::get().to(get_stats));
}

pub async fn start_server(
    port: u16,
    settings: Settings,
    admin_password: String,
) -> std::io::Result<()> {
    let app_state = web::Data::new(AppState::new(settings, admin_password));

    info!("Listening on http://0.0.0.0:{}", port);
    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(middleware::Logger::default())
            .configure(configure)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
