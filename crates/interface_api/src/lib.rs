//! HTTP API for the HMO core
//!
//! `/health` and `/health/ready` are public. Everything under `/api/v1`
//! except token issuance requires a bearer token and is written to the audit
//! log.

pub mod config;
pub mod error;
pub mod middleware;
pub mod handlers;
pub mod dto;
pub mod auth;

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use domain_billing::{InMemoryPaymentBatchPort, PaymentBatchPort, PaymentBatchService};
use domain_claims::{BenefitSchedule, ClaimsPort, ClaimsService, InMemoryClaimsPort};
use domain_enrollment::{EnrolleePort, EnrollmentService, InMemoryEnrolleePort};
use domain_provider::{InMemoryProviderPort, ProviderPort};
use infra_db::adapters::{
    PostgresClaimsAdapter, PostgresEnrolleeAdapter, PostgresPaymentBatchAdapter,
    PostgresProviderAdapter,
};

use crate::config::ApiConfig;
use crate::handlers::{billing, claims, dashboard, enrollment, health, providers};
use crate::middleware::{audit_middleware, auth_middleware};

/// One adapter per domain port
#[derive(Clone)]
pub struct Ports {
    pub enrollees: Arc<dyn EnrolleePort>,
    pub providers: Arc<dyn ProviderPort>,
    pub claims: Arc<dyn ClaimsPort>,
    pub batches: Arc<dyn PaymentBatchPort>,
}

impl Ports {
    pub fn in_memory() -> Self {
        Self {
            enrollees: Arc::new(InMemoryEnrolleePort::new()),
            providers: Arc::new(InMemoryProviderPort::new()),
            claims: Arc::new(InMemoryClaimsPort::new()),
            batches: Arc::new(InMemoryPaymentBatchPort::new()),
        }
    }

    pub fn postgres(pool: PgPool) -> Self {
        Self {
            enrollees: Arc::new(PostgresEnrolleeAdapter::new(pool.clone())),
            providers: Arc::new(PostgresProviderAdapter::new(pool.clone())),
            claims: Arc::new(PostgresClaimsAdapter::new(pool.clone())),
            batches: Arc::new(PostgresPaymentBatchAdapter::new(pool)),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub ports: Ports,
    pub enrollment: EnrollmentService,
    pub claims: ClaimsService,
    pub billing: PaymentBatchService,
}

impl AppState {
    pub fn new(config: ApiConfig, ports: Ports, benefits: BenefitSchedule) -> Self {
        let enrollment = EnrollmentService::new(ports.enrollees.clone());
        let claims = ClaimsService::new(
            ports.claims.clone(),
            ports.enrollees.clone(),
            ports.providers.clone(),
            Arc::new(benefits),
        );
        let billing = PaymentBatchService::new(ports.batches.clone(), ports.claims.clone());
        Self {
            config,
            ports,
            enrollment,
            claims,
            billing,
        }
    }

    /// State backed by in-memory ports and the built-in benefit schedule
    pub fn in_memory(config: ApiConfig) -> Self {
        Self::new(config, Ports::in_memory(), BenefitSchedule::default())
    }
}

pub fn create_router(state: AppState) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    let enrollee_routes = Router::new()
        .route("/", get(enrollment::list_enrollees).post(enrollment::register_enrollee))
        .route("/upload", post(enrollment::upload_enrollees))
        .route("/:id", get(enrollment::get_enrollee))
        .route("/:id/plan", put(enrollment::change_plan))
        .route("/:id/status", post(enrollment::set_status))
        .route("/:id/eligibility", get(enrollment::check_eligibility));

    let provider_routes = Router::new()
        .route("/", get(providers::list_providers).post(providers::create_provider))
        .route("/:id", get(providers::get_provider))
        .route("/:id/renew", post(providers::renew_contract))
        .route("/:id/status", post(providers::set_status));

    let authorization_routes = Router::new()
        .route("/", post(claims::issue_authorization))
        .route("/:code", get(claims::get_authorization));

    let claims_routes = Router::new()
        .route("/", get(claims::list_claims).post(claims::submit_claim))
        .route("/:id", get(claims::get_claim))
        .route("/:id/treatments", post(claims::add_treatment))
        .route("/:id/treatments/:line_id", put(claims::update_treatment))
        .route("/:id/vetting/pick", post(claims::pick))
        .route("/:id/vetting/forward", post(claims::forward))
        .route("/:id/vetting/release", post(claims::release))
        .route("/:id/vetting/approve", post(claims::approve))
        .route("/:id/vetting/reject", post(claims::reject));

    let batch_routes = Router::new()
        .route("/", get(billing::list_batches).post(billing::create_batch))
        .route("/:id", get(billing::get_batch))
        .route("/:id/approve", post(billing::approve_batch))
        .route("/:id/pay", post(billing::pay_batch))
        .route("/:id/cancel", post(billing::cancel_batch));

    // Protected API routes
    let protected_routes = Router::new()
        .nest("/enrollees", enrollee_routes)
        .nest("/providers", provider_routes)
        .nest("/authorizations", authorization_routes)
        .nest("/claims", claims_routes)
        .nest("/payment-batches", batch_routes)
        .route("/dashboard", get(dashboard::dashboard))
        .layer(axum_middleware::from_fn_with_state(state.clone(), audit_middleware))
        .layer(axum_middleware::from_fn_with_state(state.clone(), auth_middleware));

    let api_routes = Router::new()
        .route("/auth/token", post(auth::issue_token))
        .merge(protected_routes);

    // Combine all routes
    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
