use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
};
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use ward_core::{
    BedId, BedStatus, CoreConfig, Patient, PatientId, PreemptionEvent, Priority, WardError,
    WardService, config,
};

/// Application state shared across REST API handlers
///
/// Holds the ward service (the single-writer boundary around the allocation
/// engine) plus the bed count used when the ward is reset.
#[derive(Clone)]
struct AppState {
    ward: WardService,
    default_beds: u32,
}

#[derive(serde::Serialize, ToSchema)]
struct HealthRes {
    ok: bool,
    message: String,
}

#[derive(serde::Serialize, ToSchema)]
struct PatientDto {
    id: u32,
    name: String,
    age: u32,
    history: String,
    priority: String,
    status: String,
    bed: Option<u32>,
    admitted_on: Option<String>,
}

impl From<&Patient> for PatientDto {
    fn from(patient: &Patient) -> Self {
        Self {
            id: patient.id.0,
            name: patient.name.to_string(),
            age: patient.age.years(),
            history: patient.history.clone(),
            priority: patient.priority.to_string(),
            status: patient.status.to_string(),
            bed: patient.bed.map(|b| b.0),
            admitted_on: patient.admitted_on.map(|d| d.to_string()),
        }
    }
}

#[derive(serde::Serialize, ToSchema)]
struct PreemptionEventDto {
    patient: u32,
    name: String,
    priority: String,
    freed_bed: u32,
}

impl From<PreemptionEvent> for PreemptionEventDto {
    fn from(event: PreemptionEvent) -> Self {
        Self {
            patient: event.patient.0,
            name: event.name,
            priority: event.priority.to_string(),
            freed_bed: event.freed_bed.0,
        }
    }
}

#[derive(serde::Deserialize, ToSchema)]
struct AdmitReq {
    name: String,
    age: u32,
    #[serde(default)]
    history: String,
    /// Triage priority: Emergency, Medium or Low
    priority: String,
}

#[derive(serde::Serialize, ToSchema)]
struct AdmitRes {
    id: u32,
    events: Vec<PreemptionEventDto>,
}

#[derive(serde::Serialize, ToSchema)]
struct AllocationRes {
    events: Vec<PreemptionEventDto>,
}

#[derive(serde::Serialize, ToSchema)]
struct DischargeRes {
    freed_bed: u32,
    events: Vec<PreemptionEventDto>,
}

#[derive(serde::Deserialize, ToSchema)]
struct BedUpdateReq {
    /// New bed status: Available or Occupied
    status: String,
}

#[derive(serde::Serialize, ToSchema)]
struct BedUpdateRes {
    /// Patient discharged by the override, if the bed was occupied
    displaced: Option<u32>,
    events: Vec<PreemptionEventDto>,
}

#[derive(serde::Serialize, ToSchema)]
struct BedDto {
    id: u32,
    status: String,
}

#[derive(serde::Serialize, ToSchema)]
struct BedsRes {
    beds: Vec<BedDto>,
    available: u32,
    occupied: u32,
}

#[derive(serde::Serialize, ToSchema)]
struct PatientsRes {
    patients: Vec<PatientDto>,
}

#[derive(serde::Serialize, ToSchema)]
struct DailySummaryDto {
    date: String,
    total: u32,
    admitted: u32,
    discharged: u32,
}

#[derive(serde::Serialize, ToSchema)]
struct StatsRes {
    total: u32,
    waiting: u32,
    admitted: u32,
    discharged: u32,
    today: DailySummaryDto,
    age_distribution: std::collections::BTreeMap<String, u32>,
}

#[derive(serde::Deserialize, ToSchema)]
struct ResetReq {
    beds: Option<u32>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        create_patient,
        run_allocation,
        discharge_patient,
        update_bed,
        list_queue,
        list_admitted,
        list_beds,
        get_stats,
        reset_ward
    ),
    components(schemas(
        HealthRes,
        PatientDto,
        PreemptionEventDto,
        AdmitReq,
        AdmitRes,
        AllocationRes,
        DischargeRes,
        BedUpdateReq,
        BedUpdateRes,
        BedDto,
        BedsRes,
        PatientsRes,
        DailySummaryDto,
        StatsRes,
        ResetReq
    ))
)]
struct ApiDoc;

/// Main entry point for the ward application
///
/// Starts the REST server exposing the bed allocation engine.
///
/// # Environment Variables
/// - `WARD_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `WARD_DATA_DIR`: Directory for the ward snapshot (default: "/ward_data")
/// - `WARD_BEDS`: Bed pool size for a fresh ward (default: 20)
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("ward=info".parse()?))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("WARD_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let data_dir = config::ward_data_dir_from_env_value(std::env::var("WARD_DATA_DIR").ok());
    let default_beds = config::bed_count_from_env_value(std::env::var("WARD_BEDS").ok())?;
    let core_config = CoreConfig::new(data_dir, default_beds)?;
    let ward = WardService::open(&core_config)?;

    tracing::info!("++ Starting Ward REST on {}", rest_addr);

    let app = Router::new()
        .route("/health", get(health))
        .route("/patients", post(create_patient))
        .route("/allocations", post(run_allocation))
        .route("/patients/:id/discharge", post(discharge_patient))
        .route("/beds/:id", put(update_bed))
        .route("/queue", get(list_queue))
        .route("/admitted", get(list_admitted))
        .route("/beds", get(list_beds))
        .route("/stats", get(get_stats))
        .route("/reset", post(reset_ward))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(AppState { ward, default_beds });

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Map an engine error to the HTTP status the caller should see.
fn reject(err: WardError) -> (StatusCode, String) {
    let status = match &err {
        WardError::Validation(_) => StatusCode::BAD_REQUEST,
        WardError::Precondition(_) => StatusCode::CONFLICT,
        WardError::NotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!("Ward error: {:?}", err);
    }
    (status, err.to_string())
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "Ward is alive".into(),
    })
}

#[utoipa::path(
    post,
    path = "/patients",
    request_body = AdmitReq,
    responses(
        (status = 200, description = "Patient queued, allocation pass run", body = AdmitRes),
        (status = 400, description = "Invalid name, age or priority")
    )
)]
/// Add a patient to the queue
///
/// Appends a new waiting patient, then runs an allocation pass so an
/// emergency arrival takes effect immediately. Any preemptions the pass
/// performed are returned for the caller to surface.
async fn create_patient(
    State(state): State<AppState>,
    Json(req): Json<AdmitReq>,
) -> Result<Json<AdmitRes>, (StatusCode, String)> {
    let priority: Priority = req.priority.parse().map_err(reject)?;
    let id = state
        .ward
        .submit_request(&req.name, req.age, req.history, priority)
        .map_err(reject)?;
    let events = state.ward.run_allocation_pass().map_err(reject)?;
    Ok(Json(AdmitRes {
        id: id.0,
        events: events.into_iter().map(Into::into).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/allocations",
    responses(
        (status = 200, description = "Allocation pass complete", body = AllocationRes)
    )
)]
/// Run an allocation pass over the current queue
///
/// Idempotent: with no intervening state change a second call performs no
/// further mutation and returns an empty event list.
async fn run_allocation(
    State(state): State<AppState>,
) -> Result<Json<AllocationRes>, (StatusCode, String)> {
    let events = state.ward.run_allocation_pass().map_err(reject)?;
    Ok(Json(AllocationRes {
        events: events.into_iter().map(Into::into).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/patients/{id}/discharge",
    params(("id" = u32, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Patient discharged", body = DischargeRes),
        (status = 404, description = "Unknown patient id"),
        (status = 409, description = "Patient is not admitted")
    )
)]
/// Discharge an admitted patient
///
/// Frees the patient's bed and runs an allocation pass so the next waiting
/// patient can take it.
async fn discharge_patient(
    State(state): State<AppState>,
    Path(id): Path<u32>,
) -> Result<Json<DischargeRes>, (StatusCode, String)> {
    let freed = state.ward.discharge(PatientId(id)).map_err(reject)?;
    let events = state.ward.run_allocation_pass().map_err(reject)?;
    Ok(Json(DischargeRes {
        freed_bed: freed.0,
        events: events.into_iter().map(Into::into).collect(),
    }))
}

#[utoipa::path(
    put,
    path = "/beds/{id}",
    params(("id" = u32, Path, description = "Bed id")),
    request_body = BedUpdateReq,
    responses(
        (status = 200, description = "Bed status updated", body = BedUpdateRes),
        (status = 400, description = "Invalid status"),
        (status = 404, description = "Unknown bed id")
    )
)]
/// Override a bed's status directly
///
/// Marking an occupied bed available force-discharges the patient holding it
/// and runs an allocation pass over the freed capacity; marking an available
/// bed occupied takes it out of service.
async fn update_bed(
    State(state): State<AppState>,
    Path(id): Path<u32>,
    Json(req): Json<BedUpdateReq>,
) -> Result<Json<BedUpdateRes>, (StatusCode, String)> {
    let status: BedStatus = req.status.parse().map_err(reject)?;
    let displaced = state
        .ward
        .set_bed_status(BedId(id), status)
        .map_err(reject)?;
    let events = if status == BedStatus::Available {
        state.ward.run_allocation_pass().map_err(reject)?
    } else {
        Vec::new()
    };
    Ok(Json(BedUpdateRes {
        displaced: displaced.map(|p| p.0),
        events: events.into_iter().map(Into::into).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/queue",
    responses(
        (status = 200, description = "Waiting patients in submission order", body = PatientsRes)
    )
)]
/// List waiting patients
async fn list_queue(State(state): State<AppState>) -> Json<PatientsRes> {
    let patients = state.ward.list_waiting();
    Json(PatientsRes {
        patients: patients.iter().map(Into::into).collect(),
    })
}

#[utoipa::path(
    get,
    path = "/admitted",
    responses(
        (status = 200, description = "Admitted patients", body = PatientsRes)
    )
)]
/// List admitted patients
async fn list_admitted(State(state): State<AppState>) -> Json<PatientsRes> {
    let patients = state.ward.list_admitted();
    Json(PatientsRes {
        patients: patients.iter().map(Into::into).collect(),
    })
}

#[utoipa::path(
    get,
    path = "/beds",
    responses(
        (status = 200, description = "Bed pool with occupancy counts", body = BedsRes)
    )
)]
/// Show the bed pool
async fn list_beds(State(state): State<AppState>) -> Json<BedsRes> {
    let beds = state
        .ward
        .beds()
        .iter()
        .map(|b| BedDto {
            id: b.id.0,
            status: b.status.to_string(),
        })
        .collect();
    let summary = state.ward.pool_summary();
    Json(BedsRes {
        beds,
        available: summary.available,
        occupied: summary.occupied,
    })
}

#[utoipa::path(
    get,
    path = "/stats",
    responses(
        (status = 200, description = "Ward statistics", body = StatsRes)
    )
)]
/// Ward statistics for the dashboard
///
/// Status counts across the registry, today's admission summary and the age
/// distribution chart data.
async fn get_stats(State(state): State<AppState>) -> Json<StatsRes> {
    let stats = state.ward.stats();
    let today = chrono::Utc::now().date_naive();
    let daily = state.ward.daily_summary(today);
    let age_distribution = state
        .ward
        .age_distribution()
        .into_iter()
        .map(|(age, count)| (age.to_string(), count))
        .collect();
    Json(StatsRes {
        total: stats.total,
        waiting: stats.waiting,
        admitted: stats.admitted,
        discharged: stats.discharged,
        today: DailySummaryDto {
            date: daily.date.to_string(),
            total: daily.total,
            admitted: daily.admitted,
            discharged: daily.discharged,
        },
        age_distribution,
    })
}

#[utoipa::path(
    post,
    path = "/reset",
    request_body = ResetReq,
    responses(
        (status = 204, description = "Ward data reset")
    )
)]
/// Reset all ward data (demo only)
///
/// Drops every patient record and rebuilds the bed pool, using the request's
/// bed count or the deployment default.
async fn reset_ward(
    State(state): State<AppState>,
    req: Option<Json<ResetReq>>,
) -> Result<StatusCode, (StatusCode, String)> {
    let beds = req
        .and_then(|Json(r)| r.beds)
        .unwrap_or(state.default_beds);
    state.ward.reset(beds).map_err(reject)?;
    Ok(StatusCode::NO_CONTENT)
}
