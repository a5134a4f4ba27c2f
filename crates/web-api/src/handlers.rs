use arb_engine_core::{
    WithdrawalConfig, WithdrawalConfigUpdate, WithdrawalHistoryEntry, WithdrawalRequest,
};
use arb_engine_orchestrator::{
    EngineError, EngineHandle, EngineStatus, ManualWithdrawal, WithdrawalRefused,
};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Engine error mapped onto an HTTP status with a JSON body.
#[derive(Debug)]
pub struct ApiError(EngineError);

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        Self(err)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    refusal: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, refusal) = match &self.0 {
            EngineError::Refused(refusal) => {
                (StatusCode::CONFLICT, serde_json::to_value(refusal).ok())
            }
            EngineError::Config(_) => (StatusCode::UNPROCESSABLE_ENTITY, None),
            EngineError::Withdrawal(refusal) => {
                let status = match refusal {
                    WithdrawalRefused::InvalidAmount { .. }
                    | WithdrawalRefused::InvalidPercentage { .. }
                    | WithdrawalRefused::BelowMinimum { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                    WithdrawalRefused::NoDestination
                    | WithdrawalRefused::InsufficientBalance { .. }
                    | WithdrawalRefused::DailyLimitReached { .. } => StatusCode::CONFLICT,
                };
                (status, serde_json::to_value(refusal).ok())
            }
            EngineError::Closed => (StatusCode::SERVICE_UNAVAILABLE, None),
        };
        let body = ErrorBody {
            error: self.0.to_string(),
            refusal,
        };
        (status, Json(body)).into_response()
    }
}

#[derive(Serialize, Deserialize)]
pub struct TransitionResponse {
    pub accepted: bool,
}

#[derive(Deserialize)]
pub struct AdjustBalanceRequest {
    pub delta: Decimal,
}

#[derive(Serialize, Deserialize)]
pub struct BalanceResponse {
    pub smart_balance: Decimal,
}

#[derive(Deserialize)]
pub struct ManualWithdrawalRequest {
    pub amount: Decimal,
}

#[derive(Deserialize)]
pub struct EmergencyWithdrawalRequest {
    /// Share of the smart balance, in percent.
    pub percentage: Decimal,
}

/// Latest published status. Never touches the actor.
pub async fn get_status(State(engine): State<EngineHandle>) -> Json<EngineStatus> {
    Json(engine.latest_status())
}

/// Full withdrawal ledger, oldest first.
///
/// # Errors
/// Returns `503` if the engine is gone.
pub async fn list_withdrawals(
    State(engine): State<EngineHandle>,
) -> Result<Json<Vec<WithdrawalHistoryEntry>>, ApiError> {
    Ok(Json(engine.withdrawal_history().await?))
}

/// # Errors
/// Returns `409` when preflight cannot start in the current state.
pub async fn run_preflight(
    State(engine): State<EngineHandle>,
) -> Result<(StatusCode, Json<TransitionResponse>), ApiError> {
    engine.run_preflight().await?;
    Ok((StatusCode::ACCEPTED, Json(TransitionResponse { accepted: true })))
}

/// # Errors
/// Returns `409` when the latest verdict does not allow SIM.
pub async fn start_sim(
    State(engine): State<EngineHandle>,
) -> Result<(StatusCode, Json<TransitionResponse>), ApiError> {
    engine.start_sim().await?;
    Ok((StatusCode::ACCEPTED, Json(TransitionResponse { accepted: true })))
}

/// # Errors
/// Returns `409` unless in SIM with confidence at the gate.
pub async fn start_live(
    State(engine): State<EngineHandle>,
) -> Result<(StatusCode, Json<TransitionResponse>), ApiError> {
    engine.start_live().await?;
    Ok((StatusCode::ACCEPTED, Json(TransitionResponse { accepted: true })))
}

/// `accepted` is false when the engine was already idle.
///
/// # Errors
/// Returns `503` if the engine is gone.
pub async fn stop(
    State(engine): State<EngineHandle>,
) -> Result<Json<TransitionResponse>, ApiError> {
    let accepted = engine.stop().await?;
    Ok(Json(TransitionResponse { accepted }))
}

/// # Errors
/// Returns `422` when the update fails validation.
pub async fn update_withdrawal_config(
    State(engine): State<EngineHandle>,
    Json(update): Json<WithdrawalConfigUpdate>,
) -> Result<Json<WithdrawalConfig>, ApiError> {
    Ok(Json(engine.update_withdrawal_config(update).await?))
}

/// # Errors
/// Returns `503` if the engine is gone.
pub async fn adjust_balance(
    State(engine): State<EngineHandle>,
    Json(req): Json<AdjustBalanceRequest>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let smart_balance = engine.adjust_balance(req.delta).await?;
    Ok(Json(BalanceResponse { smart_balance }))
}

/// Withdraws a fixed amount now, outside the threshold and cooldown.
///
/// # Errors
/// Returns `422` for a non-positive amount or one below the minimum, `409`
/// when there is no wallet address or the balance or daily limit cannot
/// cover it.
pub async fn request_manual_withdrawal(
    State(engine): State<EngineHandle>,
    Json(req): Json<ManualWithdrawalRequest>,
) -> Result<(StatusCode, Json<WithdrawalRequest>), ApiError> {
    let request = engine
        .request_withdrawal(ManualWithdrawal::Amount { amount: req.amount })
        .await?;
    Ok((StatusCode::ACCEPTED, Json(request)))
}

/// Withdraws a share of the balance now, past the minimum and daily limit.
///
/// # Errors
/// Returns `422` for a percentage outside (0, 100], `409` when there is no
/// wallet address or nothing to withdraw.
pub async fn request_emergency_withdrawal(
    State(engine): State<EngineHandle>,
    Json(req): Json<EmergencyWithdrawalRequest>,
) -> Result<(StatusCode, Json<WithdrawalRequest>), ApiError> {
    let request = engine
        .request_withdrawal(ManualWithdrawal::Emergency {
            percentage: req.percentage,
        })
        .await?;
    Ok((StatusCode::ACCEPTED, Json(request)))
}
