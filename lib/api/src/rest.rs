use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer, Result as ActixResult};
use casebase_core::{CaseId, DatasetLoader, Error, MetricQuery, Record, SkippedRow};
use casebase_similarity::{
    Casebase, EngineConfig, SearchResponse, SimilarityMode, WeightVector,
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Shared server state
///
/// The prepared casebase is swapped as a whole on reload; handlers clone the
/// `Arc` and never hold the lock while scoring. `None` means the dataset had
/// no usable cases.
pub struct AppState {
    casebase: RwLock<Option<Arc<Casebase>>>,
    config: EngineConfig,
    loader: DatasetLoader,
    source: Option<PathBuf>,
}

impl AppState {
    pub fn new(casebase: Option<Arc<Casebase>>, config: EngineConfig) -> Self {
        Self {
            casebase: RwLock::new(casebase),
            config,
            loader: DatasetLoader::default(),
            source: None,
        }
    }

    /// Load and prepare the dataset at `path`, remembering it for reloads
    pub fn load(path: PathBuf, loader: DatasetLoader, config: EngineConfig) -> casebase_core::Result<Self> {
        let casebase = prepare(&loader, &path, &config)?;
        Ok(Self {
            casebase: RwLock::new(casebase),
            config,
            loader,
            source: Some(path),
        })
    }

    pub fn current(&self) -> Option<Arc<Casebase>> {
        self.casebase.read().clone()
    }

    /// Re-read the dataset source and swap in the new casebase.
    /// Returns the number of cases now served.
    pub fn reload(&self) -> casebase_core::Result<usize> {
        let path = self
            .source
            .as_ref()
            .ok_or_else(|| Error::InvalidConfig("no dataset source configured".to_string()))?;
        let casebase = prepare(&self.loader, path, &self.config)?;
        let count = casebase.as_ref().map_or(0, |c| c.len());
        *self.casebase.write() = casebase;
        Ok(count)
    }
}

fn prepare(
    loader: &DatasetLoader,
    path: &Path,
    config: &EngineConfig,
) -> casebase_core::Result<Option<Arc<Casebase>>> {
    let dataset = loader.load_path(path)?;
    match Casebase::prepare(dataset, config.clone()) {
        Ok(casebase) => {
            for warning in casebase.warnings() {
                warn!("{}", warning);
            }
            Ok(Some(Arc::new(casebase)))
        }
        Err(Error::EmptyDataset) => {
            warn!("Dataset {:?} has no complete cases; searches will return empty results", path);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

#[derive(Deserialize)]
struct SearchRequest {
    query: MetricQuery,
    /// Overrides applied on top of the configured default weights
    weights: Option<WeightVector>,
    mode: Option<SimilarityMode>,
    page: Option<usize>,
    page_size: Option<usize>,
}

#[derive(Serialize)]
struct CaseView {
    id: CaseId,
    gestation: f64,
    parity: f64,
    age: f64,
    height_cm: f64,
    weight_kg: f64,
    smoke: bool,
    birth_weight_g: f64,
}

impl From<&Record> for CaseView {
    fn from(record: &Record) -> Self {
        Self {
            id: record.id,
            gestation: record.features.gestation,
            parity: record.features.parity,
            age: record.features.age,
            height_cm: record.height_cm(),
            weight_kg: record.weight_kg(),
            smoke: record.is_smoker(),
            birth_weight_g: record.birth_weight,
        }
    }
}

#[derive(Serialize)]
struct CasebaseInfo<'a> {
    records: usize,
    skipped: &'a [SkippedRow],
    ranges: Option<&'a casebase_similarity::NormalizationParams>,
    warnings: Vec<casebase_similarity::Warning>,
    config: &'a EngineConfig,
}

pub struct RestApi;

impl RestApi {
    pub async fn start(state: Arc<AppState>, port: u16) -> std::io::Result<()> {
        HttpServer::new(move || {
            let cors = Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600);

            App::new()
                .wrap(cors)
                .app_data(web::Data::new(state.clone()))
                .configure(RestApi::configure)
        })
        .bind(("0.0.0.0", port))?
        .run()
        .await
    }

    /// Register every route; `web::Data<Arc<AppState>>` must be provided
    pub fn configure(cfg: &mut web::ServiceConfig) {
        cfg.route("/health", web::get().to(health))
            .route("/casebase", web::get().to(casebase_info))
            .route("/casebase/reload", web::post().to(reload_casebase))
            .route("/cases/{id}", web::get().to(get_case))
            .route("/search", web::post().to(search));
    }
}

fn error_response(err: &Error) -> HttpResponse {
    let body = serde_json::json!({ "error": err.to_string() });
    match err {
        Error::InvalidWeights(_) | Error::InvalidQuery(_) | Error::InvalidConfig(_) => {
            HttpResponse::BadRequest().json(body)
        }
        _ => HttpResponse::InternalServerError().json(body),
    }
}

async fn health() -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(serde_json::json!({ "status": "ok" })))
}

async fn casebase_info(state: web::Data<Arc<AppState>>) -> ActixResult<HttpResponse> {
    let current = state.current();
    let info = match current.as_deref() {
        Some(casebase) => CasebaseInfo {
            records: casebase.len(),
            skipped: casebase.dataset().skipped(),
            ranges: Some(casebase.params()),
            warnings: casebase.warnings(),
            config: casebase.config(),
        },
        None => CasebaseInfo {
            records: 0,
            skipped: &[],
            ranges: None,
            warnings: Vec::new(),
            config: &state.config,
        },
    };
    Ok(HttpResponse::Ok().json(serde_json::json!({ "result": info })))
}

async fn reload_casebase(state: web::Data<Arc<AppState>>) -> ActixResult<HttpResponse> {
    match state.reload() {
        Ok(records) => {
            info!("Casebase reloaded: {} cases", records);
            Ok(HttpResponse::Ok().json(serde_json::json!({ "result": { "records": records } })))
        }
        Err(e) => {
            warn!("Casebase reload failed: {}", e);
            Ok(error_response(&e))
        }
    }
}

async fn get_case(
    state: web::Data<Arc<AppState>>,
    path: web::Path<u64>,
) -> ActixResult<HttpResponse> {
    let id = CaseId(path.into_inner());

    match state.current().as_deref().and_then(|c| c.get(id)) {
        Some(record) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "result": CaseView::from(record)
        }))),
        None => Ok(HttpResponse::NotFound().json(serde_json::json!({
            "error": "Case not found"
        }))),
    }
}

async fn search(
    state: web::Data<Arc<AppState>>,
    req: web::Json<SearchRequest>,
) -> ActixResult<HttpResponse> {
    let req = req.into_inner();

    let page_size = match req.page_size {
        Some(n) => match NonZeroUsize::new(n) {
            Some(size) => Some(size),
            None => {
                return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                    "error": "page_size must be positive"
                })));
            }
        },
        None => None,
    };

    let Some(casebase) = state.current() else {
        let mode = req.mode.unwrap_or(state.config.mode);
        let size = page_size.map_or(state.config.page_size, NonZeroUsize::get);
        return Ok(HttpResponse::Ok().json(SearchResponse::empty(mode, req.page.unwrap_or(1), size)));
    };

    let weights = match &req.weights {
        Some(overrides) => casebase.config().default_weights.merged(overrides),
        None => casebase.config().default_weights.clone(),
    };

    let mut ctx = casebase.context(req.query.to_query(), weights);
    if let Some(mode) = req.mode {
        ctx = ctx.with_mode(mode);
    }
    if let Some(page) = req.page {
        ctx = ctx.with_page(page);
    }
    if let Some(size) = page_size {
        ctx = ctx.with_page_size(size);
    }

    match casebase.evaluate(&ctx) {
        Ok(result) => Ok(HttpResponse::Ok().json(SearchResponse::from_result(&result))),
        Err(e) => Ok(error_response(&e)),
    }
}
