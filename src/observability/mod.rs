//! 可观测性模块
//!
//! 提供结构化日志初始化、进程内计数器和健康检查。

use axum::{
    Json, Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::config::LoggingConfig;
use crate::error::{AppError, Result};
use crate::storage::StorageInstance;

// ===== Metrics =====

/// 应用指标
#[derive(Debug, Default)]
pub struct AppMetrics {
    pub characters_created: AtomicU64,
    pub sessions_started: AtomicU64,
    pub choices_applied: AtomicU64,
    pub generation_failures: AtomicU64,
    pub http_requests_total: AtomicU64,
    pub http_request_duration_sum: AtomicU64,
}

impl AppMetrics {
    pub fn record_character_created(&self) {
        self.characters_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_session_started(&self) {
        self.sessions_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_choice_applied(&self) {
        self.choices_applied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_generation_failure(&self) {
        self.generation_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// 记录 HTTP 请求
    pub fn record_http_request(&self, duration_ms: u64) {
        self.http_requests_total.fetch_add(1, Ordering::Relaxed);
        self.http_request_duration_sum
            .fetch_add(duration_ms, Ordering::Relaxed);
    }

    /// 生成 Prometheus 格式指标
    pub fn gather(&self) -> String {
        let requests = self.http_requests_total.load(Ordering::Relaxed);
        format!(
            r#"# HELP characters_created_total Characters created
# TYPE characters_created_total counter
characters_created_total {}
# HELP sessions_started_total Game sessions started
# TYPE sessions_started_total counter
sessions_started_total {}
# HELP choices_applied_total Player choices committed
# TYPE choices_applied_total counter
choices_applied_total {}
# HELP generation_failures_total Failed generator exchanges
# TYPE generation_failures_total counter
generation_failures_total {}
# HELP http_requests_total Total HTTP requests
# TYPE http_requests_total counter
http_requests_total {}
# HELP http_request_duration_seconds HTTP request duration in seconds
# TYPE http_request_duration_seconds summary
http_request_duration_seconds_sum {}
http_request_duration_seconds_count {}
"#,
            self.characters_created.load(Ordering::Relaxed),
            self.sessions_started.load(Ordering::Relaxed),
            self.choices_applied.load(Ordering::Relaxed),
            self.generation_failures.load(Ordering::Relaxed),
            requests,
            self.http_request_duration_sum.load(Ordering::Relaxed) as f64 / 1000.0,
            requests,
        )
    }
}

// ===== Health Check =====

/// 健康检查状态
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: String,
    pub version: String,
    pub uptime_seconds: f64,
    pub checks: Vec<HealthCheck>,
}

/// 单个健康检查项
#[derive(Debug, Serialize)]
pub struct HealthCheck {
    pub name: String,
    pub status: String,
    pub message: Option<String>,
    pub latency_ms: Option<u64>,
}

/// 健康检查与指标端点共享的状态
#[derive(Clone)]
pub struct ObservabilityState {
    pub metrics: Arc<AppMetrics>,
    pub storage: Arc<StorageInstance>,
    pub start_time: DateTime<Utc>,
    pub version: String,
}

impl ObservabilityState {
    pub fn new(metrics: Arc<AppMetrics>, storage: Arc<StorageInstance>) -> Self {
        Self {
            metrics,
            storage,
            start_time: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// 获取应用正常运行时间
    pub fn uptime_seconds(&self) -> f64 {
        (Utc::now() - self.start_time).num_milliseconds() as f64 / 1000.0
    }
}

/// 获取完整健康状态
pub async fn health_check(State(state): State<ObservabilityState>) -> impl IntoResponse {
    let started = Instant::now();
    let probe = state.storage.health_check().await;
    let storage_check = HealthCheck {
        name: format!("storage:{}", state.storage.backend_name()),
        status: if probe.is_ok() { "healthy" } else { "unhealthy" }.to_string(),
        message: probe.as_ref().err().map(|e| e.to_string()),
        latency_ms: Some(started.elapsed().as_millis() as u64),
    };

    let healthy = probe.is_ok();
    let health_status = HealthStatus {
        status: if healthy { "healthy" } else { "unhealthy" }.to_string(),
        timestamp: Utc::now().to_rfc3339(),
        version: state.version.clone(),
        uptime_seconds: state.uptime_seconds(),
        checks: vec![storage_check],
    };

    let status_code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(health_status))
}

/// 简单存活检查
pub async fn liveness() -> impl IntoResponse {
    "OK"
}

/// Prometheus 指标端点
pub async fn metrics(State(state): State<ObservabilityState>) -> impl IntoResponse {
    (StatusCode::OK, state.metrics.gather())
}

/// 创建可观测性路由
pub fn create_observability_router(state: ObservabilityState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/live", get(liveness))
        .route("/metrics", get(metrics))
        .with_state(state)
}

// ===== Request Metrics Middleware =====

/// 记录请求指标的中间件
pub async fn metrics_middleware(
    State(metrics): State<Arc<AppMetrics>>,
    req: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let response = next.run(req).await;
    metrics.record_http_request(start.elapsed().as_millis() as u64);
    response
}

// ===== Structured Logging =====

/// 初始化日志
///
/// `RUST_LOG` 优先于配置中的级别。配置了日志目录时额外按天滚动写入
/// JSON 文件，返回的 guard 必须保留到进程退出，否则缓冲区日志会丢失。
pub fn init_tracing(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| AppError::Config(format!("invalid log level '{}': {}", config.level, e)))?;

    let stdout_layer = if config.structured {
        fmt::layer().json().with_target(true).boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_line_number(true)
            .boxed()
    };

    let (file_layer, guard) = match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "darkquest.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(writer)
                .boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| AppError::Internal(format!("failed to install tracing subscriber: {}", e)))?;

    Ok(guard)
}
