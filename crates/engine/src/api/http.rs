//! HTTP routes.
//!
//! Thin JSON handlers: resolve the team from the `X-Team-Code` header, call
//! one use case, and map the result onto the shared wire types.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use scanquest_domain::{
    Block, BlockId, BlockInput, DomainError, Instance, InstanceId, InstanceSettings, Location,
    LocationId, NavigationMethod, Team, TeamBlockState, TeamCode,
};
use scanquest_shared::{
    AddTeamsRequest, BlockInputRequest, BlockResponse, BlockStateResponse, CheckInResponse,
    CheckOutResponse, CreateBlockRequest, CreateInstanceRequest, ErrorResponse, FlashLevel,
    FlashMessageDto, GameStatusResponse, HistoryEntry, InstanceResponse, InstanceSettingsDto,
    LocationRequest, LocationResponse, LocationSummary, NextLocationsResponse,
    ReorderBlocksRequest, ResetTeamsRequest, ScanRequest, ScheduleInstanceRequest,
    StartPlayingRequest, TeamResponse, UpdateBlockRequest,
};

use super::TeamCodeHeader;
use crate::app::App;
use crate::infrastructure::ports::RepoError;
use crate::use_cases::blocks::BlockServiceError;
use crate::use_cases::gameplay::{ErrorClass, GameplayError, NextLocations};
use crate::use_cases::management::{LocationInput, ManagementError};
use crate::use_cases::teams::TeamProvisioningError;

/// Create all HTTP routes.
pub fn routes() -> Router<Arc<App>> {
    Router::new()
        .route("/", get(health))
        .route("/api/health", get(health))
        // Player
        .route("/api/play/start", post(start_playing))
        .route("/api/play/status", get(game_status))
        .route("/api/play/next", get(next_locations))
        .route("/api/play/check-in", post(check_in))
        .route("/api/play/check-out", post(check_out))
        .route("/api/play/blocks/validate", post(validate_block))
        .route("/api/play/history", get(history))
        // Organiser
        .route("/api/admin/instances", post(create_instance))
        .route(
            "/api/admin/instances/{id}",
            get(get_instance).delete(delete_instance),
        )
        .route("/api/admin/instances/{id}/settings", put(update_settings))
        .route("/api/admin/instances/{id}/schedule", post(schedule_instance))
        .route("/api/admin/instances/{id}/start", post(start_instance))
        .route(
            "/api/admin/instances/{id}/locations",
            get(list_locations).post(create_location),
        )
        .route(
            "/api/admin/locations/{id}",
            put(update_location).delete(delete_location),
        )
        .route("/api/admin/blocks/preview", post(preview_block))
        .route(
            "/api/admin/locations/{id}/blocks",
            get(list_blocks).post(create_block),
        )
        .route(
            "/api/admin/locations/{id}/blocks/order",
            post(reorder_blocks),
        )
        .route(
            "/api/admin/blocks/{id}",
            get(get_block).put(update_block).delete(delete_block),
        )
        .route(
            "/api/admin/instances/{id}/teams",
            get(list_teams).post(add_teams),
        )
        .route("/api/admin/instances/{id}/teams/reset", post(reset_teams))
        .route(
            "/api/admin/instances/{id}/teams/{code}",
            delete(delete_team),
        )
        .route(
            "/api/admin/instances/{id}/statistics/recompute",
            post(recompute_statistics),
        )
}

async fn health() -> &'static str {
    "OK"
}

// =============================================================================
// Player
// =============================================================================

async fn current_team(app: &App, code: &TeamCodeHeader) -> Result<Team, ApiError> {
    Ok(app.use_cases.gameplay.team_by_code(&code.0).await?)
}

async fn start_playing(
    State(app): State<Arc<App>>,
    code: TeamCodeHeader,
    Json(req): Json<StartPlayingRequest>,
) -> Result<Json<TeamResponse>, ApiError> {
    let team = app
        .use_cases
        .gameplay
        .start_playing(&code.0, Some(req.team_name.as_str()))
        .await?;
    Ok(Json(team_response(&app, team).await?))
}

async fn game_status(
    State(app): State<Arc<App>>,
    code: TeamCodeHeader,
) -> Result<Json<GameStatusResponse>, ApiError> {
    let team = current_team(&app, &code).await?;
    let status = app.use_cases.gameplay.game_status(&team).await?;
    Ok(Json(GameStatusResponse {
        status: status.to_string(),
    }))
}

async fn next_locations(
    State(app): State<Arc<App>>,
    code: TeamCodeHeader,
) -> Result<Json<NextLocationsResponse>, ApiError> {
    let team = current_team(&app, &code).await?;
    let next = app.use_cases.gameplay.suggest_next_locations(&team).await?;

    let response = match next {
        NextLocations::Suggestions {
            navigation_method,
            locations,
        } => {
            let reveal_clues = navigation_method == NavigationMethod::ShowClues;
            NextLocationsResponse::Suggestions {
                navigation_method: navigation_method.as_str().to_string(),
                locations: locations
                    .iter()
                    .map(|l| location_summary(l, reveal_clues))
                    .collect(),
            }
        }
        NextLocations::Finished => NextLocationsResponse::Finished,
        NextLocations::CheckOutFirst(location) => NextLocationsResponse::CheckOutFirst {
            location: location_summary(&location, false),
        },
    };
    Ok(Json(response))
}

async fn check_in(
    State(app): State<Arc<App>>,
    code: TeamCodeHeader,
    Json(req): Json<ScanRequest>,
) -> Result<Json<CheckInResponse>, ApiError> {
    let team = current_team(&app, &code).await?;
    let outcome = app
        .use_cases
        .gameplay
        .check_in(&team, &req.marker_code)
        .await?;

    Ok(Json(CheckInResponse {
        location: location_summary(&outcome.location, false),
        must_check_out: outcome.check_in.must_check_out,
        blocks_completed: outcome.check_in.blocks_completed,
        flash: outcome.flash.into_iter().map(Into::into).collect(),
    }))
}

async fn check_out(
    State(app): State<Arc<App>>,
    code: TeamCodeHeader,
    Json(req): Json<ScanRequest>,
) -> Result<Json<CheckOutResponse>, ApiError> {
    let team = current_team(&app, &code).await?;
    let outcome = app
        .use_cases
        .gameplay
        .check_out(&team, &req.marker_code)
        .await?;

    Ok(Json(CheckOutResponse {
        location: location_summary(&outcome.location, false),
        flash: outcome.flash.into_iter().map(Into::into).collect(),
    }))
}

async fn validate_block(
    State(app): State<Arc<App>>,
    code: TeamCodeHeader,
    Json(req): Json<BlockInputRequest>,
) -> Result<Json<BlockStateResponse>, ApiError> {
    let team = current_team(&app, &code).await?;
    let input = BlockInput::from(req.input);
    let outcome = app
        .use_cases
        .gameplay
        .validate_and_update_block_state(&team, BlockId::from_uuid(req.block_id), &input)
        .await?;
    Ok(Json(block_state_response(&outcome.state)))
}

async fn history(
    State(app): State<Arc<App>>,
    code: TeamCodeHeader,
) -> Result<Json<Vec<HistoryEntry>>, ApiError> {
    let team = current_team(&app, &code).await?;
    let visits = app.use_cases.gameplay.history(&team).await?;

    let entries = visits
        .into_iter()
        .map(|visit| HistoryEntry {
            location: location_summary(&visit.location, false),
            time_in: visit.check_in.time_in.to_rfc3339(),
            time_out: visit.check_in.time_out.map(|t| t.to_rfc3339()),
            blocks_completed: visit.check_in.blocks_completed,
            points: visit.check_in.points,
        })
        .collect();
    Ok(Json(entries))
}

// =============================================================================
// Organiser
// =============================================================================

async fn create_instance(
    State(app): State<Arc<App>>,
    Json(req): Json<CreateInstanceRequest>,
) -> Result<(StatusCode, Json<InstanceResponse>), ApiError> {
    let settings = match req.settings {
        Some(dto) => settings_from_dto(dto)?,
        None => InstanceSettings::default(),
    };
    let instance = app
        .use_cases
        .management
        .instance
        .create(&req.name, settings)
        .await?;
    Ok((StatusCode::CREATED, Json(instance_response(&app, &instance))))
}

async fn get_instance(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
) -> Result<Json<InstanceResponse>, ApiError> {
    let instance = app
        .use_cases
        .management
        .instance
        .get(InstanceId::from_uuid(id))
        .await?;
    Ok(Json(instance_response(&app, &instance)))
}

async fn update_settings(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
    Json(req): Json<InstanceSettingsDto>,
) -> Result<Json<InstanceResponse>, ApiError> {
    let instance = app
        .use_cases
        .management
        .instance
        .update_settings(InstanceId::from_uuid(id), settings_from_dto(req)?)
        .await?;
    Ok(Json(instance_response(&app, &instance)))
}

async fn schedule_instance(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
    Json(req): Json<ScheduleInstanceRequest>,
) -> Result<Json<InstanceResponse>, ApiError> {
    let start = parse_time("startTime", req.start_time)?;
    let end = parse_time("endTime", req.end_time)?;
    let instance = app
        .use_cases
        .management
        .instance
        .schedule(InstanceId::from_uuid(id), start, end)
        .await?;
    Ok(Json(instance_response(&app, &instance)))
}

async fn start_instance(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
) -> Result<Json<InstanceResponse>, ApiError> {
    let instance = app
        .use_cases
        .management
        .instance
        .start_now(InstanceId::from_uuid(id))
        .await?;
    Ok(Json(instance_response(&app, &instance)))
}

async fn delete_instance(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    app.use_cases
        .management
        .instance
        .delete(InstanceId::from_uuid(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_locations(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<LocationResponse>>, ApiError> {
    let locations = app
        .use_cases
        .management
        .location
        .list(InstanceId::from_uuid(id))
        .await?;
    Ok(Json(locations.iter().map(location_response).collect()))
}

async fn create_location(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
    Json(req): Json<LocationRequest>,
) -> Result<(StatusCode, Json<LocationResponse>), ApiError> {
    let location = app
        .use_cases
        .management
        .location
        .create(InstanceId::from_uuid(id), location_input(req))
        .await?;
    Ok((StatusCode::CREATED, Json(location_response(&location))))
}

async fn update_location(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
    Json(req): Json<LocationRequest>,
) -> Result<Json<LocationResponse>, ApiError> {
    let location = app
        .use_cases
        .management
        .location
        .update(LocationId::from_uuid(id), location_input(req))
        .await?;
    Ok(Json(location_response(&location)))
}

async fn delete_location(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    app.use_cases
        .management
        .location
        .delete(LocationId::from_uuid(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn preview_block(
    State(app): State<Arc<App>>,
    Json(req): Json<BlockInputRequest>,
) -> Result<Json<BlockStateResponse>, ApiError> {
    let input = BlockInput::from(req.input);
    let outcome = app
        .use_cases
        .gameplay
        .preview_block(BlockId::from_uuid(req.block_id), &input)
        .await?;
    Ok(Json(block_state_response(&outcome.state)))
}

async fn list_blocks(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<BlockResponse>>, ApiError> {
    let blocks = app
        .use_cases
        .blocks
        .list(LocationId::from_uuid(id))
        .await?;
    let response = blocks
        .iter()
        .map(|b| block_response(b.as_ref()))
        .collect::<Result<Vec<_>, ApiError>>()?;
    Ok(Json(response))
}

async fn create_block(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
    Json(req): Json<CreateBlockRequest>,
) -> Result<(StatusCode, Json<BlockResponse>), ApiError> {
    let block = app
        .use_cases
        .blocks
        .create(LocationId::from_uuid(id), &req.block_type)
        .await?;
    Ok((StatusCode::CREATED, Json(block_response(block.as_ref())?)))
}

async fn get_block(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
) -> Result<Json<BlockResponse>, ApiError> {
    let block = app.use_cases.blocks.get(BlockId::from_uuid(id)).await?;
    Ok(Json(block_response(block.as_ref())?))
}

async fn update_block(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateBlockRequest>,
) -> Result<Json<BlockResponse>, ApiError> {
    let block = app
        .use_cases
        .blocks
        .update(BlockId::from_uuid(id), &BlockInput::from(req.input))
        .await?;
    Ok(Json(block_response(block.as_ref())?))
}

async fn reorder_blocks(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
    Json(req): Json<ReorderBlocksRequest>,
) -> Result<StatusCode, ApiError> {
    let ids = req.block_ids.into_iter().map(BlockId::from_uuid).collect();
    app.use_cases
        .blocks
        .reorder(LocationId::from_uuid(id), ids)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_block(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    app.use_cases
        .blocks
        .delete(BlockId::from_uuid(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_teams(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<TeamResponse>>, ApiError> {
    let teams = app
        .use_cases
        .teams
        .list(InstanceId::from_uuid(id))
        .await?;

    let mut response = Vec::with_capacity(teams.len());
    for team in teams {
        response.push(team_response(&app, team).await?);
    }
    Ok(Json(response))
}

async fn add_teams(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
    Json(req): Json<AddTeamsRequest>,
) -> Result<(StatusCode, Json<Vec<TeamResponse>>), ApiError> {
    if req.count == 0 {
        return Err(ApiError::BadRequest("count must be positive".to_string()));
    }
    let teams = app
        .use_cases
        .teams
        .add_teams(InstanceId::from_uuid(id), req.count)
        .await?;

    let response = teams
        .into_iter()
        .map(|team| TeamResponse {
            code: team.code.to_string(),
            name: None,
            points: 0,
            has_started: false,
            must_check_out: None,
        })
        .collect();
    Ok((StatusCode::CREATED, Json(response)))
}

async fn reset_teams(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
    Json(req): Json<ResetTeamsRequest>,
) -> Result<StatusCode, ApiError> {
    let codes = req
        .codes
        .iter()
        .map(|raw| TeamCode::new(raw).map_err(|e| ApiError::BadRequest(e.to_string())))
        .collect::<Result<Vec<_>, _>>()?;
    if codes.is_empty() {
        return Err(ApiError::BadRequest("no teams selected".to_string()));
    }
    app.use_cases
        .teams
        .reset(InstanceId::from_uuid(id), codes)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_team(
    State(app): State<Arc<App>>,
    Path((id, code)): Path<(Uuid, String)>,
) -> Result<StatusCode, ApiError> {
    let code = TeamCode::new(&code).map_err(|_| ApiError::NotFound)?;
    app.use_cases
        .teams
        .delete(InstanceId::from_uuid(id), &code)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn recompute_statistics(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    app.use_cases
        .management
        .location
        .recompute_statistics(InstanceId::from_uuid(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Mapping
// =============================================================================

fn settings_from_dto(dto: InstanceSettingsDto) -> Result<InstanceSettings, ApiError> {
    let invalid = |e: DomainError| ApiError::BadRequest(e.to_string());
    Ok(InstanceSettings::default()
        .with_navigation_mode(dto.navigation_mode.parse().map_err(invalid)?)
        .with_navigation_method(dto.navigation_method.parse().map_err(invalid)?)
        .with_completion_method(dto.completion_method.parse().map_err(invalid)?)
        .with_max_next_locations(dto.max_next_locations)
        .with_points(dto.enable_points))
}

fn settings_dto(settings: &InstanceSettings) -> InstanceSettingsDto {
    InstanceSettingsDto {
        navigation_mode: settings.navigation_mode.as_str().to_string(),
        navigation_method: settings.navigation_method.as_str().to_string(),
        completion_method: settings.completion_method.as_str().to_string(),
        max_next_locations: settings.max_next_locations(),
        enable_points: settings.enable_points,
    }
}

/// Blank means unset
fn parse_time(field: &str, raw: Option<String>) -> Result<Option<DateTime<Utc>>, ApiError> {
    raw.filter(|s| !s.trim().is_empty())
        .map(|s| {
            DateTime::parse_from_rfc3339(s.trim())
                .map(|t| t.with_timezone(&Utc))
                .map_err(|e| ApiError::BadRequest(format!("{field}: {e}")))
        })
        .transpose()
}

fn instance_response(app: &App, instance: &Instance) -> InstanceResponse {
    InstanceResponse {
        id: instance.id.to_uuid(),
        name: instance.name.to_string(),
        status: app
            .use_cases
            .management
            .instance
            .status(instance)
            .to_string(),
        start_time: instance.start_time.map(|t| t.to_rfc3339()),
        end_time: instance.end_time.map(|t| t.to_rfc3339()),
        settings: settings_dto(&instance.settings),
    }
}

fn location_input(req: LocationRequest) -> LocationInput {
    LocationInput {
        name: req.name,
        marker_code: req.marker_code,
        order: req.order,
        points: req.points,
        clue: req.clue,
    }
}

fn location_response(location: &Location) -> LocationResponse {
    LocationResponse {
        id: location.id.to_uuid(),
        instance_id: location.instance_id.to_uuid(),
        name: location.name.to_string(),
        marker_code: location.marker_code.to_string(),
        order: location.order,
        points: location.points,
        clue: location.clue.clone(),
        total_visits: location.stats.total_visits,
        current_count: location.stats.current_count,
        avg_duration: location.stats.avg_duration,
    }
}

fn location_summary(location: &Location, reveal_clue: bool) -> LocationSummary {
    LocationSummary {
        id: location.id.to_uuid(),
        name: location.name.to_string(),
        points: location.points,
        clue: reveal_clue.then(|| location.clue.clone()).flatten(),
    }
}

fn block_response(block: &dyn Block) -> Result<BlockResponse, ApiError> {
    Ok(BlockResponse {
        id: block.id().to_uuid(),
        location_id: block.location_id().to_uuid(),
        block_type: block.block_type().to_string(),
        display_name: block.display_name().to_string(),
        requires_validation: block.requires_validation(),
        order: block.order(),
        points: block.points(),
        data: block.data().map_err(|e| ApiError::Internal(e.to_string()))?,
    })
}

fn block_state_response(state: &TeamBlockState) -> BlockStateResponse {
    BlockStateResponse {
        block_id: state.block_id.to_uuid(),
        is_complete: state.is_complete,
        points_awarded: state.points_awarded,
        player_data: state.player_data.clone(),
    }
}

async fn team_response(app: &App, team: Team) -> Result<TeamResponse, ApiError> {
    let must_check_out = match &team.must_check_out {
        Some(marker) => Some(
            app.repositories
                .location
                .find_by_marker(team.instance_id, marker)
                .await?
                .map(|l| l.name.to_string())
                .unwrap_or_else(|| marker.to_string()),
        ),
        None => None,
    };

    Ok(TeamResponse {
        code: team.code.to_string(),
        name: team.name.map(|n| n.to_string()),
        points: team.points,
        has_started: team.has_started,
        must_check_out,
    })
}

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug)]
pub enum ApiError {
    NotFound,
    BadRequest(String),
    Conflict(String),
    MissingTeamCode,
    Play(GameplayError),
    Internal(String),
}

fn error_response(status: StatusCode, code: &str, flash: FlashMessageDto) -> Response {
    (
        status,
        Json(ErrorResponse {
            code: code.to_string(),
            flash,
        }),
    )
        .into_response()
}

fn plain_flash(level: FlashLevel, title: &str, message: impl Into<String>) -> FlashMessageDto {
    FlashMessageDto {
        level,
        title: title.to_string(),
        message: message.into(),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound => error_response(
                StatusCode::NOT_FOUND,
                "not_found",
                plain_flash(FlashLevel::Warning, "Not found", ""),
            ),
            ApiError::BadRequest(msg) => error_response(
                StatusCode::BAD_REQUEST,
                "bad_request",
                plain_flash(FlashLevel::Error, "Bad request", msg),
            ),
            ApiError::Conflict(msg) => error_response(
                StatusCode::CONFLICT,
                "conflict",
                plain_flash(FlashLevel::Error, "Conflict", msg),
            ),
            ApiError::MissingTeamCode => error_response(
                StatusCode::UNAUTHORIZED,
                "missing_team_code",
                plain_flash(
                    FlashLevel::Warning,
                    "No team",
                    "Enter your team code to start playing.",
                ),
            ),
            ApiError::Play(e) => {
                let status = match e.class() {
                    ErrorClass::NotFound => StatusCode::NOT_FOUND,
                    ErrorClass::Occupancy | ErrorClass::Terminal => StatusCode::CONFLICT,
                    ErrorClass::IneligibleMove => StatusCode::FORBIDDEN,
                    ErrorClass::Invalid => StatusCode::UNPROCESSABLE_ENTITY,
                    ErrorClass::Persistence => StatusCode::INTERNAL_SERVER_ERROR,
                };
                error_response(status, e.code(), e.flash().into())
            }
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "Request failed");
                error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal",
                    plain_flash(
                        FlashLevel::Error,
                        "Error",
                        "Something went wrong. Please try again.",
                    ),
                )
            }
        }
    }
}

impl From<GameplayError> for ApiError {
    fn from(e: GameplayError) -> Self {
        ApiError::Play(e)
    }
}

impl From<RepoError> for ApiError {
    fn from(e: RepoError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl From<BlockServiceError> for ApiError {
    fn from(e: BlockServiceError) -> Self {
        match e {
            BlockServiceError::BlockNotFound(_) => ApiError::NotFound,
            BlockServiceError::Block(e) => ApiError::BadRequest(e.to_string()),
            BlockServiceError::Repo(e) => e.into(),
        }
    }
}

impl From<TeamProvisioningError> for ApiError {
    fn from(e: TeamProvisioningError) -> Self {
        match e {
            TeamProvisioningError::InstanceNotFound | TeamProvisioningError::TeamNotFound => {
                ApiError::NotFound
            }
            TeamProvisioningError::CodeSpaceExhausted(_) => ApiError::Conflict(e.to_string()),
            TeamProvisioningError::Domain(e) => ApiError::BadRequest(e.to_string()),
            TeamProvisioningError::Repo(e) => e.into(),
        }
    }
}

impl From<ManagementError> for ApiError {
    fn from(e: ManagementError) -> Self {
        match e {
            ManagementError::NotFound { .. } => ApiError::NotFound,
            ManagementError::DuplicateMarker(_) => ApiError::Conflict(e.to_string()),
            ManagementError::Domain(e) => ApiError::BadRequest(e.to_string()),
            ManagementError::Repo(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::AppConfig;
    use crate::infrastructure::sqlite::SqliteRepositories;
    use crate::use_cases::management::LocationInput;
    use axum::body::Body;
    use axum::http::Request;
    use scanquest_domain::{InstanceSettings, NavigationMode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    struct Harness {
        _dir: tempfile::TempDir,
        router: Router,
        team_code: String,
        instance: Uuid,
        lighthouse: Uuid,
    }

    async fn harness() -> Harness {
        let dir = tempfile::tempdir().expect("tempdir");
        let url = format!("sqlite:{}", dir.path().join("api.db").display());
        let repos = SqliteRepositories::connect(&url).await.expect("connect");
        let app = Arc::new(App::new(repos, AppConfig::default()));

        let management = &app.use_cases.management;
        let settings = InstanceSettings::default()
            .with_navigation_mode(NavigationMode::Ordered)
            .with_navigation_method(NavigationMethod::ShowClues);
        let instance = management
            .instance
            .create("Harbour Hunt", settings)
            .await
            .expect("instance");
        management
            .instance
            .start_now(instance.id)
            .await
            .expect("start");
        let mut location_ids = Vec::new();
        for (name, marker, order, points, clue) in [
            ("Lighthouse", "AAA1", 1, 10, Some("Follow the beam")),
            ("Boathouse", "BBB2", 2, 20, None),
        ] {
            let location = management
                .location
                .create(
                    instance.id,
                    LocationInput {
                        name: name.to_string(),
                        marker_code: marker.to_string(),
                        order,
                        points,
                        clue: clue.map(str::to_string),
                    },
                )
                .await
                .expect("location");
            location_ids.push(location.id.to_uuid());
        }
        let teams = app
            .use_cases
            .teams
            .add_teams(instance.id, 1)
            .await
            .expect("teams");

        Harness {
            _dir: dir,
            router: routes().with_state(app),
            team_code: teams[0].code.to_string(),
            instance: instance.id.to_uuid(),
            lighthouse: location_ids[0],
        }
    }

    async fn send(
        router: &Router,
        method: &str,
        uri: &str,
        team_code: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(code) = team_code {
            builder = builder.header(crate::api::TEAM_CODE_HEADER, code);
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");

        let response = router.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn health_is_ok() {
        let h = harness().await;
        let response = h
            .router
            .clone()
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn requests_without_team_code_are_unauthorized() {
        let h = harness().await;
        let (status, body) = send(&h.router, "GET", "/api/play/next", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "missing_team_code");
    }

    #[tokio::test]
    async fn unknown_team_gets_double_check_message() {
        let h = harness().await;
        let (status, body) = send(&h.router, "GET", "/api/play/next", Some("NOPE"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "team_not_found");
        assert_eq!(
            body["flash"]["message"],
            "Please double check the code and try again."
        );
    }

    #[tokio::test]
    async fn ordered_game_walks_through_locations() {
        let h = harness().await;
        let code = Some(h.team_code.as_str());

        let (status, body) = send(&h.router, "GET", "/api/play/next", code, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"], "suggestions");
        assert_eq!(body["locations"][0]["name"], "Lighthouse");
        assert_eq!(body["locations"][0]["clue"], "Follow the beam");

        let (status, body) = send(
            &h.router,
            "POST",
            "/api/play/check-in",
            code,
            Some(json!({ "markerCode": "bbb2" })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "invalid_next_location");

        let (status, body) = send(
            &h.router,
            "POST",
            "/api/play/check-in",
            code,
            Some(json!({ "markerCode": "aaa1" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["location"]["name"], "Lighthouse");
        assert_eq!(body["flash"][0]["title"], "Checked in");
        assert_eq!(body["mustCheckOut"], false);

        let (_, body) = send(&h.router, "GET", "/api/play/next", code, None).await;
        assert_eq!(body["locations"][0]["name"], "Boathouse");

        let (status, body) = send(&h.router, "GET", "/api/play/history", code, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["location"]["name"], "Lighthouse");
        assert_eq!(body[0]["points"], 10);
    }

    #[tokio::test]
    async fn unnecessary_check_out_is_rejected() {
        let h = harness().await;
        let (status, body) = send(
            &h.router,
            "POST",
            "/api/play/check-out",
            Some(h.team_code.as_str()),
            Some(json!({ "markerCode": "AAA1" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "unnecessary_check_out");
    }

    #[tokio::test]
    async fn start_playing_sets_team_name() {
        let h = harness().await;
        let (status, body) = send(
            &h.router,
            "POST",
            "/api/play/start",
            Some(h.team_code.as_str()),
            Some(json!({ "teamName": "  Gulls " })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Gulls");
        assert_eq!(body["hasStarted"], true);

        let (_, body) = send(
            &h.router,
            "GET",
            "/api/play/status",
            Some(h.team_code.as_str()),
            None,
        )
        .await;
        assert_eq!(body["status"], "active");
    }

    #[tokio::test]
    async fn adding_zero_teams_is_a_bad_request() {
        let h = harness().await;
        let uri = format!("/api/admin/instances/{}/teams", Uuid::new_v4());
        let (status, _) = send(&h.router, "POST", &uri, None, Some(json!({ "count": 0 }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn adding_teams_to_unknown_instance_is_not_found() {
        let h = harness().await;
        let uri = format!("/api/admin/instances/{}/teams", Uuid::new_v4());
        let (status, _) = send(&h.router, "POST", &uri, None, Some(json!({ "count": 2 }))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn organiser_block_gates_the_visit_until_solved() {
        let h = harness().await;
        let code = Some(h.team_code.as_str());

        let uri = format!("/api/admin/locations/{}/blocks", h.lighthouse);
        let (status, block) = send(
            &h.router,
            "POST",
            &uri,
            None,
            Some(json!({ "blockType": "password" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(block["requiresValidation"], true);
        let block_id = block["id"].as_str().expect("block id").to_string();

        let (status, block) = send(
            &h.router,
            "PUT",
            &format!("/api/admin/blocks/{block_id}"),
            None,
            Some(json!({ "input": {
                "content": ["Read the plaque"],
                "block-passphrase": ["anchor"],
                "points": ["5"]
            } })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(block["points"], 5);

        let (_, body) = send(
            &h.router,
            "POST",
            "/api/play/check-in",
            code,
            Some(json!({ "markerCode": "AAA1" })),
        )
        .await;
        assert_eq!(body["blocksCompleted"], false);

        let (status, state) = send(
            &h.router,
            "POST",
            "/api/play/blocks/validate",
            code,
            Some(json!({ "blockId": block_id, "input": { "password": ["rudder"] } })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(state["isComplete"], false);

        let (_, state) = send(
            &h.router,
            "POST",
            "/api/play/blocks/validate",
            code,
            Some(json!({ "blockId": block_id, "input": { "password": ["anchor"] } })),
        )
        .await;
        assert_eq!(state["isComplete"], true);
        assert_eq!(state["pointsAwarded"], 5);

        let (_, history) = send(&h.router, "GET", "/api/play/history", code, None).await;
        assert_eq!(history[0]["blocksCompleted"], true);
    }

    #[tokio::test]
    async fn unknown_block_type_is_a_bad_request() {
        let h = harness().await;
        let uri = format!("/api/admin/locations/{}/blocks", h.lighthouse);
        let (status, _) = send(
            &h.router,
            "POST",
            &uri,
            None,
            Some(json!({ "blockType": "hologram" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn organiser_sets_up_and_tears_down_a_game() {
        let h = harness().await;

        let (status, instance) = send(
            &h.router,
            "POST",
            "/api/admin/instances",
            None,
            Some(json!({
                "name": "Campus Dash",
                "settings": {
                    "navigationMode": "free_roam",
                    "navigationMethod": "show_names",
                    "completionMethod": "check_in_only",
                    "maxNextLocations": 0,
                    "enablePoints": true
                }
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(instance["status"], "closed");
        assert_eq!(instance["settings"]["navigationMode"], "free_roam");
        assert_eq!(instance["settings"]["maxNextLocations"], 1);
        let id = instance["id"].as_str().expect("instance id").to_string();

        let (status, instance) = send(
            &h.router,
            "POST",
            &format!("/api/admin/instances/{id}/start"),
            None,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(instance["status"], "active");

        let locations = format!("/api/admin/instances/{id}/locations");
        let (status, library) = send(
            &h.router,
            "POST",
            &locations,
            None,
            Some(json!({ "name": "Library", "markerCode": "lib1", "points": 7 })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(library["markerCode"], "LIB1");
        assert_eq!(library["totalVisits"], 0);
        let library_id = library["id"].as_str().expect("location id").to_string();

        let (status, body) = send(
            &h.router,
            "POST",
            &locations,
            None,
            Some(json!({ "name": "Annex", "markerCode": "LIB1" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "conflict");

        let (status, renamed) = send(
            &h.router,
            "PUT",
            &format!("/api/admin/locations/{library_id}"),
            None,
            Some(json!({ "name": "Main Library", "markerCode": "LIB1", "points": 8 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(renamed["name"], "Main Library");

        let (status, listed) = send(&h.router, "GET", &locations, None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed.as_array().map(Vec::len), Some(1));

        let (status, teams) = send(
            &h.router,
            "POST",
            &format!("/api/admin/instances/{id}/teams"),
            None,
            Some(json!({ "count": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let code = teams[0]["code"].as_str().expect("code").to_string();

        let (status, body) = send(
            &h.router,
            "POST",
            "/api/play/check-in",
            Some(code.as_str()),
            Some(json!({ "markerCode": "LIB1" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["location"]["name"], "Main Library");

        let (status, _) = send(
            &h.router,
            "DELETE",
            &format!("/api/admin/locations/{library_id}"),
            None,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let instance_uri = format!("/api/admin/instances/{id}");
        let (status, _) = send(&h.router, "DELETE", &instance_uri, None, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&h.router, "GET", &instance_uri, None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn instance_edits_are_validated() {
        let h = harness().await;
        let id = h.instance;

        let (status, _) = send(
            &h.router,
            "PUT",
            &format!("/api/admin/instances/{id}/settings"),
            None,
            Some(json!({
                "navigationMode": "teleport",
                "navigationMethod": "show_names",
                "completionMethod": "check_in_only",
                "maxNextLocations": 3,
                "enablePoints": true
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let schedule = format!("/api/admin/instances/{id}/schedule");
        let (status, _) = send(
            &h.router,
            "POST",
            &schedule,
            None,
            Some(json!({ "startTime": "next tuesday" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &h.router,
            "POST",
            &schedule,
            None,
            Some(json!({
                "startTime": "2026-06-01T10:00:00Z",
                "endTime": "2026-06-01T09:00:00Z"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, instance) = send(
            &h.router,
            "POST",
            &schedule,
            None,
            Some(json!({ "startTime": "" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(instance["status"], "closed");

        let (status, body) = send(
            &h.router,
            "POST",
            "/api/play/check-in",
            Some(h.team_code.as_str()),
            Some(json!({ "markerCode": "AAA1" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "game_not_active");
    }

    #[tokio::test]
    async fn organiser_resets_and_deletes_teams() {
        let h = harness().await;
        let code = Some(h.team_code.as_str());
        let teams = format!("/api/admin/instances/{}/teams", h.instance);

        send(
            &h.router,
            "POST",
            "/api/play/check-in",
            code,
            Some(json!({ "markerCode": "AAA1" })),
        )
        .await;
        let (_, listed) = send(&h.router, "GET", &teams, None, None).await;
        assert_eq!(listed[0]["points"], 10);

        let (status, _) = send(
            &h.router,
            "POST",
            &format!("{teams}/reset"),
            None,
            Some(json!({ "codes": [h.team_code.to_lowercase()] })),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (_, listed) = send(&h.router, "GET", &teams, None, None).await;
        assert_eq!(listed[0]["points"], 0);
        let (_, history) = send(&h.router, "GET", "/api/play/history", code, None).await;
        assert_eq!(history.as_array().map(Vec::len), Some(0));

        let (status, _) = send(
            &h.router,
            "POST",
            &format!("{teams}/reset"),
            None,
            Some(json!({ "codes": ["ZZZZ"] })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let team_uri = format!("{teams}/{}", h.team_code);
        let (status, _) = send(&h.router, "DELETE", &team_uri, None, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&h.router, "DELETE", &team_uri, None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&h.router, "GET", "/api/play/next", code, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn simultaneous_correct_answers_pay_block_points_once() {
        let h = harness().await;
        let code = Some(h.team_code.as_str());

        let (_, block) = send(
            &h.router,
            "POST",
            &format!("/api/admin/locations/{}/blocks", h.lighthouse),
            None,
            Some(json!({ "blockType": "password" })),
        )
        .await;
        let block_id = block["id"].as_str().expect("block id").to_string();
        send(
            &h.router,
            "PUT",
            &format!("/api/admin/blocks/{block_id}"),
            None,
            Some(json!({ "input": {
                "content": ["Read the plaque"],
                "block-passphrase": ["anchor"],
                "points": ["5"]
            } })),
        )
        .await;
        send(
            &h.router,
            "POST",
            "/api/play/check-in",
            code,
            Some(json!({ "markerCode": "AAA1" })),
        )
        .await;

        let answer = json!({ "blockId": block_id, "input": { "password": ["anchor"] } });
        let (first, second) = tokio::join!(
            send(
                &h.router,
                "POST",
                "/api/play/blocks/validate",
                code,
                Some(answer.clone()),
            ),
            send(
                &h.router,
                "POST",
                "/api/play/blocks/validate",
                code,
                Some(answer.clone()),
            ),
        );
        assert_eq!(first.0, StatusCode::OK);
        assert_eq!(second.0, StatusCode::OK);

        // 10 for the location, 5 for the block
        let (_, teams) = send(
            &h.router,
            "GET",
            &format!("/api/admin/instances/{}/teams", h.instance),
            None,
            None,
        )
        .await;
        assert_eq!(teams[0]["points"], 15);
    }
}
