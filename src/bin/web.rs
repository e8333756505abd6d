//! Single binary web server: HTML from templates/, static from /static, API via REST.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default. Override with env: HOST, PORT, DATA_DIR,
//! INACTIVITY_TIMEOUT_HOURS, SESSION_KEY (see `club_cup_web::config`).

use actix_files::Files;
use actix_session::{storage::CookieSessionStore, Session, SessionMiddleware};
use actix_web::{
    cookie::Key,
    delete, get, post, put,
    web::{self, Data, Json, Path},
    App, HttpResponse, HttpServer, Responder,
};
use club_cup_web::{
    assign_clubs, club_assignments, config::ServerConfig, draw_first_round, generate_pairs,
    record_score, reveal_next_club, reveal_next_match, reveal_next_pair, stats_csv,
    store::{load_tournament, save_tournament, FileStore},
    submit_round, visible_matches, Entrant, MatchId, RevealMode, StandingRow, Tournament,
    TournamentError, TournamentId, TournamentMode,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Instant;

/// Per-tournament entry: tournament data + last activity time (for auto-cleanup).
struct TournamentEntry {
    tournament: Tournament,
    last_activity: Instant,
}

/// In-memory state: many tournaments by ID. Idle entries are evicted by a background task.
type AppState = Data<RwLock<HashMap<TournamentId, TournamentEntry>>>;
type AppConfig = Data<ServerConfig>;

/// Session key holding the id of the tournament this browser created last.
const SESSION_TOURNAMENT_ID: &str = "tournament_id";

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

#[derive(Deserialize)]
struct CreateTournamentBody {
    #[serde(default)]
    mode: TournamentMode,
}

#[derive(Deserialize)]
struct SetModeBody {
    mode: TournamentMode,
}

#[derive(Deserialize)]
struct NameBody {
    name: String,
}

#[derive(Default, Deserialize)]
struct RevealBody {
    #[serde(default)]
    reveal: RevealMode,
}

#[derive(Deserialize)]
struct ScoreBody {
    match_id: MatchId,
    score_a: u32,
    score_b: u32,
}

/// Path segment: tournament id (e.g. /api/tournaments/{id})
#[derive(Deserialize)]
struct TournamentPath {
    id: TournamentId,
}

/// Path segments: tournament id and a participant or club name.
#[derive(Deserialize)]
struct TournamentNamePath {
    id: TournamentId,
    name: String,
}

/// Result of a "reveal next" call plus the updated tournament.
#[derive(Serialize)]
struct RevealResponse<'a, T: Serialize> {
    revealed: Option<T>,
    done: bool,
    tournament: &'a Tournament,
}

#[derive(Serialize)]
struct StatsResponse<'a> {
    champion: Option<&'a Entrant>,
    standings: Vec<StandingRow>,
}

fn error_response(e: &TournamentError) -> HttpResponse {
    HttpResponse::BadRequest().json(serde_json::json!({ "error": e.to_string(), "kind": e.kind() }))
}

fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(serde_json::json!({ "error": "No tournament" }))
}

fn lock_error() -> HttpResponse {
    HttpResponse::InternalServerError().body("lock error")
}

/// Load a tournament from DATA_DIR if it is configured and holds one with this id.
fn load_from_disk(config: &ServerConfig, id: TournamentId) -> Option<Tournament> {
    let path = config.tournament_path(id).filter(|p| p.exists())?;
    match FileStore::open(&path).and_then(|store| load_tournament(&store)) {
        Ok(t) => {
            log::info!("Loaded tournament {} from {}", id, path.display());
            Some(t)
        }
        Err(e) => {
            log::error!("Failed to load tournament {}: {}", id, e);
            None
        }
    }
}

fn persist(config: &ServerConfig, t: &Tournament) -> Result<(), HttpResponse> {
    let Some(path) = config.tournament_path(t.id) else {
        return Ok(());
    };
    FileStore::open(&path)
        .and_then(|mut store| save_tournament(&mut store, t))
        .map_err(|e| {
            log::error!("Failed to save tournament {}: {}", t.id, e);
            HttpResponse::InternalServerError().json(serde_json::json!({ "error": e.to_string() }))
        })
}

/// Look up tournament `id` (loading it from DATA_DIR if needed), refresh its activity time
/// and hand it to `f`.
fn with_entry(
    state: &AppState,
    config: &ServerConfig,
    id: TournamentId,
    f: impl FnOnce(&mut Tournament) -> HttpResponse,
) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    if !g.contains_key(&id) {
        match load_from_disk(config, id) {
            Some(tournament) => {
                g.insert(
                    id,
                    TournamentEntry {
                        tournament,
                        last_activity: Instant::now(),
                    },
                );
            }
            None => return not_found(),
        }
    }
    match g.get_mut(&id) {
        Some(entry) => {
            entry.last_activity = Instant::now();
            f(&mut entry.tournament)
        }
        None => not_found(),
    }
}

/// Run `op` on tournament `id`, persist it on success and build the response from the
/// op's output. If the save fails the tournament is rolled back to its state before `op`.
fn apply<R>(
    state: &AppState,
    config: &ServerConfig,
    id: TournamentId,
    op: impl FnOnce(&mut Tournament) -> Result<R, TournamentError>,
    respond: impl FnOnce(R, &Tournament) -> HttpResponse,
) -> HttpResponse {
    with_entry(state, config, id, |t| {
        let before = t.clone();
        match op(t) {
            Ok(out) => match persist(config, t) {
                Ok(()) => respond(out, t),
                Err(resp) => {
                    *t = before;
                    resp
                }
            },
            Err(e) => error_response(&e),
        }
    })
}

/// `apply` for operations whose response is the whole tournament.
fn mutate(
    state: &AppState,
    config: &ServerConfig,
    id: TournamentId,
    op: impl FnOnce(&mut Tournament) -> Result<(), TournamentError>,
) -> HttpResponse {
    apply(state, config, id, op, |(), t| HttpResponse::Ok().json(t))
}

fn reveal<T: Serialize>(
    state: &AppState,
    config: &ServerConfig,
    id: TournamentId,
    op: impl FnOnce(&mut Tournament) -> Result<Option<T>, TournamentError>,
) -> HttpResponse {
    apply(state, config, id, op, |revealed, t| {
        HttpResponse::Ok().json(RevealResponse {
            done: revealed.is_none(),
            revealed,
            tournament: t,
        })
    })
}

/// Read-only access: nothing is persisted.
fn read(
    state: &AppState,
    config: &ServerConfig,
    id: TournamentId,
    respond: impl FnOnce(&Tournament) -> HttpResponse,
) -> HttpResponse {
    with_entry(state, config, id, |t| respond(t))
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "club-cup-web",
    })
}

/// Avoid 404 in browser tab: favicon not required for app logic.
#[get("/favicon.ico")]
async fn favicon() -> HttpResponse {
    HttpResponse::NoContent().finish()
}

/// Create a new tournament (returns it with id; the id is also kept in the session cookie).
#[post("/api/tournaments")]
async fn api_create_tournament(
    state: AppState,
    config: AppConfig,
    session: Session,
    body: Option<Json<CreateTournamentBody>>,
) -> HttpResponse {
    let mode = body.map(|b| b.mode).unwrap_or_default();
    let tournament = Tournament::new(mode);
    let id = tournament.id;
    if let Err(resp) = persist(&config, &tournament) {
        return resp;
    }
    if let Err(e) = session.insert(SESSION_TOURNAMENT_ID, id) {
        log::warn!("Could not store tournament id in session: {}", e);
    }
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    log::info!("Created tournament {} ({})", id, mode.as_str());
    let resp = HttpResponse::Ok().json(&tournament);
    g.insert(
        id,
        TournamentEntry {
            tournament,
            last_activity: Instant::now(),
        },
    );
    resp
}

/// Tournament remembered by this browser's session (404 if none).
#[get("/api/session/tournament")]
async fn api_session_tournament(state: AppState, config: AppConfig, session: Session) -> HttpResponse {
    match session.get::<TournamentId>(SESSION_TOURNAMENT_ID) {
        Ok(Some(id)) => read(&state, &config, id, |t| HttpResponse::Ok().json(t)),
        Ok(None) => not_found(),
        Err(e) => {
            log::warn!("Unreadable session: {}", e);
            not_found()
        }
    }
}

/// Get a tournament by id (404 if not found). Touching it refreshes last_activity.
#[get("/api/tournaments/{id}")]
async fn api_get_tournament(state: AppState, config: AppConfig, path: Path<TournamentPath>) -> HttpResponse {
    read(&state, &config, path.id, |t| HttpResponse::Ok().json(t))
}

/// Switch individual / pairs mode (registration only).
#[put("/api/tournaments/{id}/mode")]
async fn api_set_mode(
    state: AppState,
    config: AppConfig,
    path: Path<TournamentPath>,
    body: Json<SetModeBody>,
) -> HttpResponse {
    mutate(&state, &config, path.id, |t| t.set_mode(body.mode))
}

#[post("/api/tournaments/{id}/participants")]
async fn api_add_participant(
    state: AppState,
    config: AppConfig,
    path: Path<TournamentPath>,
    body: Json<NameBody>,
) -> HttpResponse {
    mutate(&state, &config, path.id, |t| t.add_participant(body.name.trim()))
}

#[delete("/api/tournaments/{id}/participants/{name}")]
async fn api_remove_participant(
    state: AppState,
    config: AppConfig,
    path: Path<TournamentNamePath>,
) -> HttpResponse {
    mutate(&state, &config, path.id, |t| t.remove_participant(&path.name))
}

/// Shuffle the roster into pairs (pairs mode).
#[post("/api/tournaments/{id}/pairs")]
async fn api_generate_pairs(
    state: AppState,
    config: AppConfig,
    path: Path<TournamentPath>,
    body: Option<Json<RevealBody>>,
) -> HttpResponse {
    let mode = body.map(|b| b.reveal).unwrap_or_default();
    mutate(&state, &config, path.id, |t| generate_pairs(t, mode))
}

#[post("/api/tournaments/{id}/pairs/reveal")]
async fn api_reveal_pair(state: AppState, config: AppConfig, path: Path<TournamentPath>) -> HttpResponse {
    reveal(&state, &config, path.id, reveal_next_pair)
}

#[post("/api/tournaments/{id}/clubs")]
async fn api_add_club(
    state: AppState,
    config: AppConfig,
    path: Path<TournamentPath>,
    body: Json<NameBody>,
) -> HttpResponse {
    mutate(&state, &config, path.id, |t| t.add_club(body.name.trim()))
}

#[delete("/api/tournaments/{id}/clubs/{name}")]
async fn api_remove_club(state: AppState, config: AppConfig, path: Path<TournamentNamePath>) -> HttpResponse {
    mutate(&state, &config, path.id, |t| t.remove_club(&path.name))
}

/// Draw clubs for pairs or players. The full draw is stored before any reveal.
#[post("/api/tournaments/{id}/clubs/assign")]
async fn api_assign_clubs(
    state: AppState,
    config: AppConfig,
    path: Path<TournamentPath>,
    body: Option<Json<RevealBody>>,
) -> HttpResponse {
    let mode = body.map(|b| b.reveal).unwrap_or_default();
    apply(
        &state,
        &config,
        path.id,
        |t| assign_clubs(t, mode),
        |(), t| {
            HttpResponse::Ok().json(serde_json::json!({
                "assignments": t.club_reveal.visible(&club_assignments(t)),
                "tournament": t,
            }))
        },
    )
}

#[post("/api/tournaments/{id}/clubs/reveal")]
async fn api_reveal_club(state: AppState, config: AppConfig, path: Path<TournamentPath>) -> HttpResponse {
    reveal(&state, &config, path.id, reveal_next_club)
}

/// Draw the first round (or re-draw it while unscored).
#[post("/api/tournaments/{id}/rounds")]
async fn api_draw_round(
    state: AppState,
    config: AppConfig,
    path: Path<TournamentPath>,
    body: Option<Json<RevealBody>>,
) -> HttpResponse {
    let mode = body.map(|b| b.reveal).unwrap_or_default();
    apply(
        &state,
        &config,
        path.id,
        |t| draw_first_round(t, mode),
        |(), t| {
            HttpResponse::Ok().json(serde_json::json!({
                "visible_matches": visible_matches(t),
                "tournament": t,
            }))
        },
    )
}

#[post("/api/tournaments/{id}/rounds/reveal")]
async fn api_reveal_match(state: AppState, config: AppConfig, path: Path<TournamentPath>) -> HttpResponse {
    reveal(&state, &config, path.id, reveal_next_match)
}

/// Record both scores of one match of the current round.
#[put("/api/tournaments/{id}/matches/score")]
async fn api_record_score(
    state: AppState,
    config: AppConfig,
    path: Path<TournamentPath>,
    body: Json<ScoreBody>,
) -> HttpResponse {
    mutate(&state, &config, path.id, |t| {
        record_score(t, body.match_id, body.score_a, body.score_b)
    })
}

/// Resolve the current round: next round is drawn from the winners, or the champion is set.
#[post("/api/tournaments/{id}/rounds/submit")]
async fn api_submit_round(
    state: AppState,
    config: AppConfig,
    path: Path<TournamentPath>,
    body: Option<Json<RevealBody>>,
) -> HttpResponse {
    let mode = body.map(|b| b.reveal).unwrap_or_default();
    mutate(&state, &config, path.id, |t| submit_round(t, mode))
}

#[get("/api/tournaments/{id}/stats")]
async fn api_stats(state: AppState, config: AppConfig, path: Path<TournamentPath>) -> HttpResponse {
    read(&state, &config, path.id, |t| {
        HttpResponse::Ok().json(StatsResponse {
            champion: t.champion.as_ref(),
            standings: t.stats.standings(),
        })
    })
}

/// Standings as a CSV download.
#[get("/api/tournaments/{id}/stats.csv")]
async fn api_stats_csv(state: AppState, config: AppConfig, path: Path<TournamentPath>) -> HttpResponse {
    read(&state, &config, path.id, |t| match stats_csv(&t.stats) {
        Ok(csv) => {
            let filename = format!("stats-{}.csv", chrono::Utc::now().format("%Y%m%d"));
            HttpResponse::Ok()
                .content_type("text/csv; charset=utf-8")
                .insert_header((
                    "Content-Disposition",
                    format!("attachment; filename=\"{filename}\""),
                ))
                .body(csv)
        }
        Err(e) => {
            log::error!("CSV export failed for {}: {}", t.id, e);
            HttpResponse::InternalServerError().json(serde_json::json!({ "error": e.to_string() }))
        }
    })
}

/// New tournament with the same roster, pairs and clubs.
#[post("/api/tournaments/{id}/reset")]
async fn api_reset(state: AppState, config: AppConfig, path: Path<TournamentPath>) -> HttpResponse {
    mutate(&state, &config, path.id, |t| {
        t.reset();
        Ok(())
    })
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = ServerConfig::from_env();
    let bind = (config.host.clone(), config.port);
    log::info!("Starting server at http://{}:{}", bind.0, bind.1);
    if let Some(dir) = &config.data_dir {
        log::info!("Persisting tournaments under {}", dir.display());
    }

    let session_key = match &config.session_key {
        Some(bytes) => Key::from(bytes.as_slice()),
        None => Key::generate(),
    };
    let state = Data::new(RwLock::new(HashMap::<TournamentId, TournamentEntry>::new()));
    let config = Data::new(config);

    // Background task: periodically drop tournaments idle past the timeout (disk copies stay).
    let state_cleanup = state.clone();
    let (cleanup_interval, timeout) = (config.cleanup_interval, config.inactivity_timeout);
    actix_web::rt::spawn(async move {
        let mut interval = tokio::time::interval(cleanup_interval);
        loop {
            interval.tick().await;
            let mut g = match state_cleanup.write() {
                Ok(guard) => guard,
                Err(_) => continue,
            };
            let before = g.len();
            g.retain(|_, entry| entry.last_activity.elapsed() < timeout);
            let removed = before - g.len();
            if removed > 0 {
                log::info!("Cleaned up {} inactive tournament(s)", removed);
            }
        }
    });

    HttpServer::new(move || {
        App::new()
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), session_key.clone())
                    .cookie_secure(false)
                    .build(),
            )
            .app_data(state.clone())
            .app_data(config.clone())
            .route("/", web::get().to(serve_index_async))
            .service(api_health)
            .service(favicon)
            .service(api_create_tournament)
            .service(api_session_tournament)
            .service(api_get_tournament)
            .service(api_set_mode)
            .service(api_add_participant)
            .service(api_remove_participant)
            .service(api_generate_pairs)
            .service(api_reveal_pair)
            .service(api_add_club)
            .service(api_remove_club)
            .service(api_assign_clubs)
            .service(api_reveal_club)
            .service(api_draw_round)
            .service(api_reveal_match)
            .service(api_record_score)
            .service(api_submit_round)
            .service(api_stats)
            .service(api_stats_csv)
            .service(api_reset)
            .service(Files::new("/static", "static"))
    })
    .bind(bind)?
    .run()
    .await
}

async fn serve_index_async() -> HttpResponse {
    let html = include_str!("../../templates/index.html");
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(html)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;

    fn state_with(tournament: Tournament) -> AppState {
        let state: AppState = Data::new(RwLock::new(HashMap::new()));
        state.write().unwrap().insert(
            tournament.id,
            TournamentEntry {
                tournament,
                last_activity: Instant::now(),
            },
        );
        state
    }

    #[test]
    fn failed_save_rolls_the_tournament_back() {
        // A regular file where DATA_DIR should be makes every save fail.
        let blocker = std::env::temp_dir().join(format!("club-cup-blocker-{}", uuid::Uuid::new_v4()));
        std::fs::write(&blocker, b"").unwrap();
        let config = ServerConfig {
            data_dir: Some(blocker.clone()),
            ..ServerConfig::default()
        };
        let tournament = Tournament::new(TournamentMode::Individual);
        let id = tournament.id;
        let state = state_with(tournament);

        let resp = mutate(&state, &config, id, |t| t.add_participant("Ana"));
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(state.read().unwrap()[&id].tournament.participants().is_empty());
        let _ = std::fs::remove_file(&blocker);
    }

    #[test]
    fn mutation_is_kept_without_data_dir() {
        let tournament = Tournament::new(TournamentMode::Individual);
        let id = tournament.id;
        let state = state_with(tournament);

        let resp = mutate(&state, &ServerConfig::default(), id, |t| t.add_participant("Ana"));
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(state.read().unwrap()[&id].tournament.participants(), ["Ana"]);
    }
}
