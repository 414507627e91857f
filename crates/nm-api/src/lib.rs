use std::net::{IpAddr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::connect_info::ConnectInfo,
    extract::DefaultBodyLimit,
    extract::State,
    http::header::{HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    http::Method,
    http::Request,
    middleware,
    middleware::Next,
    response::Response,
    routing::{get, post},
    Router,
};
use clap::Parser;
use dotenvy::dotenv;
use governor::{
    clock::DefaultClock, middleware::NoOpMiddleware, state::keyed::DashMapStateStore, Quota,
    RateLimiter,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;

pub mod auth;
pub mod error;
pub mod handlers;

use auth::AuthConfig;
use error::ApiError;
use handlers::{conversations, health, interview_requests, matches, shortlists};
use nm_common::logging::install_tracing_panic_hook;
use nm_common::matching::SelectionConfig;
use nm_common::notify::Notifier;
use nm_common::scheduling::{FreeBusyLookup, HttpFreeBusyClient};
use nm_common::store::{ProfileStore, StoreConfig};

const SHUTDOWN_DRAIN_GRACE: std::time::Duration = std::time::Duration::from_millis(200);

#[derive(Debug, Clone, Parser)]
#[command(name = "nm-api", about = "HTTP API for the nestmatch matchmaking service")]
struct Cli {
    /// Server port
    #[arg(long, env = "PORT", default_value_t = 3001)]
    port: u16,

    /// Profile store base id
    #[arg(long, env = "NM_STORE_BASE_ID")]
    store_base_id: String,

    /// Profile store API token
    #[arg(long, env = "NM_STORE_API_TOKEN")]
    store_api_token: String,

    /// Profile store API url
    #[arg(long, env = "NM_STORE_API_URL", default_value = nm_common::store::client::DEFAULT_API_URL)]
    store_api_url: String,

    /// Secret for session bearer tokens
    #[arg(long, env = "NM_SESSION_SECRET")]
    session_secret: String,

    /// Secret for emailed link tokens
    #[arg(long, env = "NM_LINK_SECRET")]
    link_secret: String,

    /// Base url used when building emailed links
    #[arg(long, env = "NM_APP_BASE_URL", default_value = "http://localhost:3000")]
    app_base_url: String,

    /// Comma separated list of allowed CORS origins
    #[arg(long, env = "NM_CORS_ORIGINS", default_value = "http://localhost:3000")]
    cors_origins: String,

    /// Minimum total score a candidate needs to enter a shortlist
    #[arg(long, env = "NM_MIN_MATCH_SCORE", default_value_t = 60.0)]
    min_match_score: f64,

    /// Number of candidates per generated shortlist
    #[arg(long, env = "NM_SHORTLIST_SIZE", default_value_t = 10)]
    shortlist_size: usize,

    /// Concierge calendar id for VIP slot filtering
    #[arg(long, env = "NM_CONCIERGE_CALENDAR_ID")]
    concierge_calendar_id: Option<String>,

    /// Free/busy endpoint of the calendar provider
    #[arg(long, env = "NM_CALENDAR_FREEBUSY_URL")]
    calendar_freebusy_url: Option<String>,

    /// Access token for the calendar provider
    #[arg(long, env = "NM_CALENDAR_TOKEN")]
    calendar_token: Option<String>,

    /// Notification delivery endpoint (unset disables delivery)
    #[arg(long, env = "NM_NOTIFY_ENDPOINT")]
    notify_endpoint: Option<String>,

    /// API key for the notification endpoint
    #[arg(long, env = "NM_NOTIFY_API_KEY")]
    notify_api_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub auth: AuthConfig,
    pub app_base_url: String,
    pub shortlist_size: usize,
    pub min_match_score: f64,
    pub concierge_calendar_id: Option<String>,
}

type IpRateLimiter = RateLimiter<IpAddr, DashMapStateStore<IpAddr>, DefaultClock, NoOpMiddleware>;

#[derive(Clone)]
pub struct RateLimits {
    global: Arc<IpRateLimiter>,
    decision: Arc<IpRateLimiter>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub global_per_sec: u64,
    pub global_burst: u32,
    pub decision_per_sec: u64,
    pub decision_burst: u32,
}

impl RateLimitConfig {
    fn parse_env_u64(name: &str) -> Option<u64> {
        std::env::var(name)
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .filter(|value| *value > 0)
    }

    fn parse_env_u32(name: &str) -> Option<u32> {
        std::env::var(name)
            .ok()
            .and_then(|value| value.parse::<u32>().ok())
            .filter(|value| *value > 0)
    }

    fn from_env() -> Self {
        Self {
            global_per_sec: Self::parse_env_u64("NM_RATE_LIMIT_GLOBAL_PER_SEC").unwrap_or(20),
            global_burst: Self::parse_env_u32("NM_RATE_LIMIT_GLOBAL_BURST").unwrap_or(40),
            decision_per_sec: Self::parse_env_u64("NM_RATE_LIMIT_DECISION_PER_SEC").unwrap_or(2),
            decision_burst: Self::parse_env_u32("NM_RATE_LIMIT_DECISION_BURST").unwrap_or(5),
        }
    }
}

impl AppConfig {
    fn from_cli(cli: &Cli) -> Result<Self, ApiError> {
        let cors_origins = cli
            .cors_origins
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect::<Vec<_>>();

        if cors_origins.iter().any(|origin| origin == "*") {
            return Err(ApiError::BadRequest(
                "NM_CORS_ORIGINS must list explicit origins when credentials are enabled".into(),
            ));
        }

        if cli.session_secret.trim().is_empty() || cli.link_secret.trim().is_empty() {
            return Err(ApiError::BadRequest(
                "NM_SESSION_SECRET and NM_LINK_SECRET must be non-empty".into(),
            ));
        }

        if cli.shortlist_size == 0 {
            return Err(ApiError::BadRequest("NM_SHORTLIST_SIZE must be positive".into()));
        }

        Ok(Self {
            port: cli.port,
            cors_origins,
            auth: AuthConfig {
                session_secret: cli.session_secret.clone(),
                link_secret: cli.link_secret.clone(),
            },
            app_base_url: cli.app_base_url.trim_end_matches('/').to_string(),
            shortlist_size: cli.shortlist_size,
            min_match_score: cli.min_match_score,
            concierge_calendar_id: cli.concierge_calendar_id.clone(),
        })
    }

    pub fn for_tests(auth: AuthConfig) -> Self {
        Self {
            port: 3001,
            cors_origins: vec!["http://localhost:3000".into()],
            auth,
            app_base_url: "http://localhost:3000".into(),
            shortlist_size: 10,
            min_match_score: 60.0,
            concierge_calendar_id: None,
        }
    }

    pub fn selection(&self) -> SelectionConfig {
        SelectionConfig {
            min_score: self.min_match_score,
            max_candidates: self.shortlist_size,
        }
    }
}

pub struct AppState {
    pub store: ProfileStore,
    pub config: AppConfig,
    pub notifier: Notifier,
    /// Present only when the calendar provider is configured; the VIP
    /// overlap filter degrades to all-slots without it.
    pub calendar: Option<Arc<dyn FreeBusyLookup>>,
    pub(crate) rate_limits: RateLimits,
    pub readiness: Arc<std::sync::atomic::AtomicBool>,
}

pub type SharedState = Arc<AppState>;

impl axum::extract::FromRef<SharedState> for AuthConfig {
    fn from_ref(input: &SharedState) -> AuthConfig {
        input.config.auth.clone()
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed = origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect::<Vec<_>>();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .allow_credentials(true)
}

fn build_ip_limiter(per_second: u64, burst_size: u32) -> Arc<IpRateLimiter> {
    let nanos_per_token = 1_000_000_000u64 / per_second.max(1);
    let quota = Quota::with_period(Duration::from_nanos(nanos_per_token.max(1)))
        .unwrap()
        .allow_burst(NonZeroU32::new(burst_size.max(1)).unwrap());

    Arc::new(RateLimiter::keyed(quota))
}

pub fn default_rate_limits() -> RateLimits {
    let cfg = RateLimitConfig::from_env();
    RateLimits {
        global: build_ip_limiter(cfg.global_per_sec, cfg.global_burst),
        decision: build_ip_limiter(cfg.decision_per_sec, cfg.decision_burst),
    }
}

fn request_ip<B>(req: &Request<B>) -> Option<IpAddr> {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip())
}

fn enforce_rate_limit(limiter: &IpRateLimiter, ip: Option<IpAddr>) -> Result<(), ApiError> {
    if let Some(client_ip) = ip {
        if limiter.check_key(&client_ip).is_err() {
            return Err(ApiError::TooManyRequests("rate limit exceeded".into()));
        }
    }

    Ok(())
}

async fn global_rate_limit(
    State(state): State<SharedState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    enforce_rate_limit(&state.rate_limits.global, request_ip(&req))?;
    Ok(next.run(req).await)
}

async fn decision_rate_limit(
    State(state): State<SharedState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    enforce_rate_limit(&state.rate_limits.decision, request_ip(&req))?;
    Ok(next.run(req).await)
}

async fn attach_request_id_context(req: Request<Body>, next: Next) -> Result<Response, ApiError> {
    let request_id = req
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string());

    Ok(error::with_request_id(request_id, next.run(req)).await)
}

pub fn create_router(state: SharedState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    let request_id_header = HeaderName::from_static("x-request-id");
    let trace_header = request_id_header.clone();

    let trace = TraceLayer::new_for_http().make_span_with(move |request: &Request<Body>| {
        let request_id = request
            .headers()
            .get(&trace_header)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("");

        tracing::info_span!(
            "http_request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = %request_id,
            status = tracing::field::Empty,
        )
    });

    let api_routes = Router::new()
        .route("/shortlists/generate", post(shortlists::generate_shortlist))
        .route("/shortlists/:id", get(shortlists::get_shortlist))
        .route(
            "/matches/proceed-pass",
            post(matches::proceed_pass).route_layer(middleware::from_fn_with_state(
                state.clone(),
                decision_rate_limit,
            )),
        )
        .route("/matches/:id/score", post(matches::override_score))
        .route("/interview-requests", post(interview_requests::create))
        .route("/interview-requests/:id", get(interview_requests::view))
        .route(
            "/interview-requests/:id/select-slot",
            post(interview_requests::select_slot).route_layer(middleware::from_fn_with_state(
                state.clone(),
                decision_rate_limit,
            )),
        )
        .route(
            "/interview-requests/:id/meeting",
            post(interview_requests::create_meeting),
        )
        .route(
            "/conversations/:id/messages",
            get(conversations::list).post(conversations::append),
        );

    Router::new()
        .route("/health", get(health::readyz))
        .route("/livez", get(health::livez))
        .route("/readyz", get(health::readyz))
        .nest("/api", api_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            global_rate_limit,
        ))
        .layer(middleware::from_fn(attach_request_id_context))
        .layer(DefaultBodyLimit::max(256 * 1024))
        .layer(trace)
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(SetRequestIdLayer::new(
            request_id_header,
            MakeRequestUuid::default(),
        ))
        .layer(cors)
        .with_state(state)
}

pub fn test_state(session_secret: &str, link_secret: &str) -> SharedState {
    let store = ProfileStore::new(StoreConfig::new("appTestBase", "test-token"));

    let auth = AuthConfig {
        session_secret: session_secret.to_string(),
        link_secret: link_secret.to_string(),
    };

    Arc::new(AppState {
        store,
        config: AppConfig::for_tests(auth),
        notifier: Notifier::disabled(),
        calendar: None,
        rate_limits: default_rate_limits(),
        readiness: Arc::new(std::sync::atomic::AtomicBool::new(true)),
    })
}

pub async fn run() -> Result<(), ApiError> {
    dotenv().ok();
    nm_common::logging::init_tracing_subscriber("nm-api");
    install_tracing_panic_hook("nm-api");

    let cli = Cli::parse();
    let config = AppConfig::from_cli(&cli)?;

    let store = ProfileStore::new(StoreConfig {
        api_url: cli.store_api_url.clone(),
        base_id: cli.store_base_id.clone(),
        api_token: cli.store_api_token.clone(),
    });

    let calendar: Option<Arc<dyn FreeBusyLookup>> =
        match (cli.calendar_freebusy_url.as_deref(), cli.calendar_token.as_deref()) {
            (Some(url), Some(token)) => Some(Arc::new(HttpFreeBusyClient::new(url, token))),
            _ => None,
        };

    let state = Arc::new(AppState {
        store,
        config: config.clone(),
        notifier: Notifier::new(cli.notify_endpoint.clone(), cli.notify_api_key.clone()),
        calendar,
        rate_limits: default_rate_limits(),
        readiness: Arc::new(std::sync::atomic::AtomicBool::new(true)),
    });

    let addr: SocketAddr = ([0, 0, 0, 0], config.port).into();
    let app = create_router(state.clone());

    info!(%addr, "nm-api listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?;

    let service = app.into_make_service_with_connect_info::<SocketAddr>();

    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal(state.clone()))
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?;

    Ok(())
}

async fn shutdown_signal(state: SharedState) {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
            let _ = sigterm.recv().await;
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    state
        .readiness
        .store(false, std::sync::atomic::Ordering::SeqCst);

    // Give load balancers a brief window to observe /readyz as not ready
    // before axum stops accepting new connections.
    tokio::time::sleep(SHUTDOWN_DRAIN_GRACE).await;
}
