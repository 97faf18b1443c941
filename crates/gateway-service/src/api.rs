//! HTTP API for the router gateway.
//!
//! Mutating routes act as the account bound to the request's bearer token
//! (`Authorization: Bearer <token>`, see `api.keys`); the gateway's
//! authorization gate then decides what that account may do. Amounts are
//! decimal strings.

use axum::{
	extract::{FromRequestParts, Path, State},
	http::{header::AUTHORIZATION, request::Parts, StatusCode},
	response::{IntoResponse, Json, Response},
	routing::{delete, get, post},
	Router,
};
use gateway_config::{ApiConfig, ApiKey};
use gateway_core::{AddLiquidity, ErrorKind, Gateway, GatewayError, RemoveLiquidity};
use gateway_types::{
	AddLiquidityRequest, Address, ErrorResponse, FeeStatusResponse, LiquidityResponse, Quote,
	QuoteRequest, RemoveLiquidityRequest, RoutersResponse, SetFeeRequest, SetPausedRequest,
	SwapRequest, SwapResponse, WithdrawFeesRequest, WithdrawFeesResponse, MAX_FEE_BPS,
};
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};

/// Shared application state for the API server.
///
/// Gateway operations take `&mut self`, so requests are serialized through a
/// single lock.
#[derive(Clone)]
pub struct AppState {
	gateway: Arc<Mutex<Gateway>>,
	keys: Arc<HashMap<String, Address>>,
}

impl AppState {
	pub fn new(gateway: Gateway, keys: &[ApiKey]) -> Self {
		let keys = keys
			.iter()
			.map(|key| (key.token.clone(), key.account))
			.collect();
		Self {
			gateway: Arc::new(Mutex::new(gateway)),
			keys: Arc::new(keys),
		}
	}
}

/// Account authenticated by the request's bearer token.
pub struct Caller(pub Address);

impl FromRequestParts<AppState> for Caller {
	type Rejection = ApiError;

	async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
		let token = parts
			.headers
			.get(AUTHORIZATION)
			.and_then(|value| value.to_str().ok())
			.and_then(|value| value.strip_prefix("Bearer "))
			.map(str::trim)
			.ok_or(ApiError::Unauthenticated)?;

		state
			.keys
			.get(token)
			.copied()
			.map(Caller)
			.ok_or(ApiError::Unauthenticated)
	}
}

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health_check))
		.route("/api/routers", get(list_routers))
		.route("/api/quote", post(handle_quote))
		.route("/api/swap", post(handle_swap))
		.route("/api/liquidity/add", post(handle_add_liquidity))
		.route("/api/liquidity/remove", post(handle_remove_liquidity))
		.route("/api/fees", get(fee_status))
		.route("/api/fees/{asset}", get(held_fees))
		.route("/api/admin/fee", post(handle_set_fee))
		.route("/api/admin/pause", post(handle_set_paused))
		.route("/api/admin/withdraw", post(handle_withdraw_fees))
		.route("/api/admin/routers/{address}", delete(handle_deregister))
		.with_state(state)
		.layer(TraceLayer::new_for_http())
		.layer(CorsLayer::permissive())
}

/// Serves the API until `shutdown` resolves.
pub async fn start_server(
	config: ApiConfig,
	state: AppState,
	shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
	let bind_address = format!("{}:{}", config.host, config.port);
	let listener = tokio::net::TcpListener::bind(&bind_address).await?;

	info!("API server listening on {}", bind_address);

	axum::serve(listener, router(state))
		.with_graceful_shutdown(shutdown)
		.await?;

	Ok(())
}

/// A request failure rendered as an [`ErrorResponse`].
pub enum ApiError {
	/// Missing or unknown bearer token.
	Unauthenticated,
	Gateway(GatewayError),
	/// The operation's task died without producing a result.
	Internal(String),
}

impl From<GatewayError> for ApiError {
	fn from(err: GatewayError) -> Self {
		Self::Gateway(err)
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let (status, code, message) = match self {
			Self::Unauthenticated => (
				StatusCode::UNAUTHORIZED,
				"UNAUTHENTICATED",
				"Missing or unknown bearer token".to_string(),
			),
			Self::Gateway(err) => {
				let (status, code) = match err.kind() {
					ErrorKind::Configuration => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
					ErrorKind::Routing => (StatusCode::UNPROCESSABLE_ENTITY, "NO_ROUTE"),
					ErrorKind::Slippage => (StatusCode::UNPROCESSABLE_ENTITY, "SLIPPAGE"),
					ErrorKind::State => (StatusCode::CONFLICT, "INVALID_STATE"),
					ErrorKind::Authorization => (StatusCode::FORBIDDEN, "UNAUTHORIZED"),
					ErrorKind::External => (StatusCode::BAD_REQUEST, "EXECUTION_FAILED"),
				};
				(status, code, err.to_string())
			}
			Self::Internal(reason) => {
				error!(%reason, "Gateway task failed");
				(
					StatusCode::INTERNAL_SERVER_ERROR,
					"INTERNAL_ERROR",
					"Internal server error".to_string(),
				)
			}
		};
		warn!(%status, "Request failed: {}", message);

		let body = ErrorResponse {
			error: code.to_string(),
			message,
		};
		(status, Json(body)).into_response()
	}
}

/// Runs a ledger-mutating operation on its own task.
///
/// The task owns the gateway lock, so a client hanging up mid-request cannot
/// drop the operation between its checkpoint and its settlement.
async fn detached<T>(
	operation: impl Future<Output = Result<T, GatewayError>> + Send + 'static,
) -> Result<T, ApiError>
where
	T: Send + 'static,
{
	tokio::spawn(operation)
		.await
		.map_err(|e| ApiError::Internal(e.to_string()))?
		.map_err(ApiError::from)
}

type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Serialize)]
struct HealthResponse {
	status: &'static str,
	routers: usize,
	paused: bool,
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
	let gateway = state.gateway.lock().await;
	Json(HealthResponse {
		status: "ok",
		routers: gateway.router_count(),
		paused: gateway.is_paused(),
	})
}

async fn list_routers(State(state): State<AppState>) -> Json<RoutersResponse> {
	let gateway = state.gateway.lock().await;
	Json(RoutersResponse {
		routers: gateway.routers(),
	})
}

async fn handle_quote(
	State(state): State<AppState>,
	Json(request): Json<QuoteRequest>,
) -> Json<Quote> {
	let gateway = state.gateway.lock().await;
	Json(gateway.best_quote(request.amount_in, &request.path).await)
}

async fn handle_swap(
	State(state): State<AppState>,
	Caller(caller): Caller,
	Json(request): Json<SwapRequest>,
) -> ApiResult<SwapResponse> {
	let mut gateway = state.gateway.clone().lock_owned().await;
	let amount_out = detached(async move {
		gateway
			.swap(
				caller,
				request.amount_in,
				request.min_amount_out,
				&request.path,
				request.deadline,
			)
			.await
	})
	.await?;
	Ok(Json(SwapResponse { amount_out }))
}

async fn handle_add_liquidity(
	State(state): State<AppState>,
	Caller(caller): Caller,
	Json(request): Json<AddLiquidityRequest>,
) -> ApiResult<LiquidityResponse> {
	let params = AddLiquidity {
		amount_in: request.amount_in,
		min_amount_out: request.min_amount_out,
		path: request.path,
		min_amount_a: request.min_amount_a,
		min_amount_b: request.min_amount_b,
		deadline: request.deadline,
	};

	let mut gateway = state.gateway.clone().lock_owned().await;
	let receipt = detached(async move { gateway.add_liquidity(caller, &params).await }).await?;
	Ok(Json(LiquidityResponse {
		amount_a: receipt.amount_a,
		amount_b: receipt.amount_b,
		shares: receipt.shares,
	}))
}

async fn handle_remove_liquidity(
	State(state): State<AppState>,
	Caller(caller): Caller,
	Json(request): Json<RemoveLiquidityRequest>,
) -> ApiResult<LiquidityResponse> {
	let params = RemoveLiquidity {
		token_a: request.token_a,
		token_b: request.token_b,
		liquidity: request.liquidity,
		min_amount_a: request.min_amount_a,
		min_amount_b: request.min_amount_b,
		recipient: request.recipient,
		deadline: request.deadline,
	};

	let mut gateway = state.gateway.clone().lock_owned().await;
	let receipt = detached(async move { gateway.remove_liquidity(caller, &params).await }).await?;
	Ok(Json(LiquidityResponse {
		amount_a: receipt.amount_a,
		amount_b: receipt.amount_b,
		shares: request.liquidity,
	}))
}

async fn fee_status(State(state): State<AppState>) -> Json<FeeStatusResponse> {
	let gateway = state.gateway.lock().await;
	Json(FeeStatusResponse {
		fee_bps: gateway.fee_rate(),
		max_fee_bps: MAX_FEE_BPS,
		paused: gateway.is_paused(),
	})
}

async fn held_fees(
	State(state): State<AppState>,
	Path(asset): Path<Address>,
) -> ApiResult<WithdrawFeesResponse> {
	let gateway = state.gateway.lock().await;
	let amount = gateway.held_fees(asset).await?;
	Ok(Json(WithdrawFeesResponse { amount }))
}

async fn handle_set_fee(
	State(state): State<AppState>,
	Caller(caller): Caller,
	Json(request): Json<SetFeeRequest>,
) -> ApiResult<FeeStatusResponse> {
	let mut gateway = state.gateway.lock().await;
	gateway.set_fee_rate(caller, request.fee_bps)?;
	Ok(Json(FeeStatusResponse {
		fee_bps: gateway.fee_rate(),
		max_fee_bps: MAX_FEE_BPS,
		paused: gateway.is_paused(),
	}))
}

async fn handle_set_paused(
	State(state): State<AppState>,
	Caller(caller): Caller,
	Json(request): Json<SetPausedRequest>,
) -> ApiResult<FeeStatusResponse> {
	let mut gateway = state.gateway.lock().await;
	gateway.set_paused(caller, request.paused)?;
	Ok(Json(FeeStatusResponse {
		fee_bps: gateway.fee_rate(),
		max_fee_bps: MAX_FEE_BPS,
		paused: gateway.is_paused(),
	}))
}

async fn handle_withdraw_fees(
	State(state): State<AppState>,
	Caller(caller): Caller,
	Json(request): Json<WithdrawFeesRequest>,
) -> ApiResult<WithdrawFeesResponse> {
	let mut gateway = state.gateway.clone().lock_owned().await;
	let amount = detached(async move { gateway.withdraw_fees(caller, request.asset).await }).await?;
	Ok(Json(WithdrawFeesResponse { amount }))
}

async fn handle_deregister(
	State(state): State<AppState>,
	Caller(caller): Caller,
	Path(address): Path<Address>,
) -> ApiResult<RoutersResponse> {
	let mut gateway = state.gateway.lock().await;
	gateway.deregister_router(caller, address)?;
	Ok(Json(RoutersResponse {
		routers: gateway.routers(),
	}))
}
