use crate::{models::{DiagnosticsResponse, ErrorResponse}, presence::registry::USERS_COLLECTION, state::AppState};
use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use std::sync::{Mutex, OnceLock};
use sysinfo::System;
use tracing::info;

static SYSTEM_MONITOR: OnceLock<Mutex<System>> = OnceLock::new();

/// Process and session counters
pub async fn diagnostics(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<DiagnosticsResponse>), (StatusCode, Json<ErrorResponse>)> {

    // Session counters
    let n_conn = state.ws_connections() as u32;
    let n_users = state.realtime.watch(USERS_COLLECTION).borrow().len() as u32;
    let n_presence_records = state.realtime.record_count() as u32;
    let n_state_subscribers = state.documents.subscriber_count() as u32;
    let (deck_len, cursor_index) = {
        let slides = state.slides.lock().await;
        (
            slides.cursor().deck_len() as u32,
            slides.cursor().index().map(|i| i as u32),
        )
    };

    // System stats
    let (cpu_usage, memory_alloc, memory_free, memory_total) = {
        let sys_lock = SYSTEM_MONITOR.get_or_init(|| {
            Mutex::new(System::new_all())
        });
        match sys_lock.lock() {
            Ok(mut sys) => {
                sys.refresh_cpu();
                sys.refresh_memory();
                (
                    sys.global_cpu_info().cpu_usage(),
                    sys.used_memory(),
                    sys.free_memory(),
                    sys.total_memory(),
                )
            }
            Err(_) => (0.0, 0, 0, 0)
        }
    };

    info!(
        "Diagnostics: CPU: {:.2}%, Mem: {}/{} MB (Free: {} MB), Conn: {}, Users: {}",
        cpu_usage,
        memory_alloc / 1024 / 1024,
        memory_total / 1024 / 1024,
        memory_free / 1024 / 1024,
        n_conn,
        n_users
    );

    Ok((
        StatusCode::OK,
        Json(DiagnosticsResponse {
            n_conn,
            n_users,
            n_presence_records,
            n_state_subscribers,
            deck_len,
            cursor_index,
            cpu_usage,
            memory_alloc,
            memory_total,
            memory_free,
            generated_at: Utc::now(),
        }),
    ))
}
