//! `/lights/*` route handlers.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::Response,
};

use crate::http::request::RequestContext;
use crate::http::response::{json_response, parse_json, ApiError, StatusMessage};
use crate::http::server::AppState;
use crate::lights::command::{
    BrightnessRequest, ColorTemperatureRequest, Command, NamedColor, RgbRequest,
};
use crate::registry::DeviceStatus;

/// Fan `command` out and turn the aggregate into a response.
async fn run_command(
    state: &AppState,
    ctx: &RequestContext,
    command: Command,
) -> Result<Response, ApiError> {
    let result = state.executor.execute(ctx, &command).await;
    if !result.overall_succeeded {
        tracing::warn!(
            request_id = %ctx.request_id(),
            operation = result.operation,
            failed = ?result.failed_devices().collect::<Vec<_>>(),
            "Light operation failed on some devices"
        );
        return Err(ApiError::DeviceOperation {
            operation: result.operation,
        });
    }

    json_response(
        ctx,
        StatusCode::OK,
        &StatusMessage {
            status: command.success_message(),
        },
    )
}

pub async fn turn_on(State(state): State<AppState>, ctx: RequestContext) -> Result<Response, ApiError> {
    run_command(&state, &ctx, Command::Power(true)).await
}

pub async fn turn_off(State(state): State<AppState>, ctx: RequestContext) -> Result<Response, ApiError> {
    run_command(&state, &ctx, Command::Power(false)).await
}

async fn named(state: AppState, ctx: RequestContext, color: NamedColor) -> Result<Response, ApiError> {
    run_command(&state, &ctx, Command::named_color(color)).await
}

pub async fn red(State(state): State<AppState>, ctx: RequestContext) -> Result<Response, ApiError> {
    named(state, ctx, NamedColor::Red).await
}

pub async fn yellow(State(state): State<AppState>, ctx: RequestContext) -> Result<Response, ApiError> {
    named(state, ctx, NamedColor::Yellow).await
}

pub async fn orange(State(state): State<AppState>, ctx: RequestContext) -> Result<Response, ApiError> {
    named(state, ctx, NamedColor::Orange).await
}

pub async fn dark_red(State(state): State<AppState>, ctx: RequestContext) -> Result<Response, ApiError> {
    named(state, ctx, NamedColor::DarkRed).await
}

pub async fn rgb(
    State(state): State<AppState>,
    ctx: RequestContext,
    body: Bytes,
) -> Result<Response, ApiError> {
    let request: RgbRequest = parse_json(&ctx, &body, "RGB")?;
    let command = request.validate().inspect_err(|e| {
        tracing::warn!(
            request_id = %ctx.request_id(),
            r = request.r, g = request.g, b = request.b,
            error = %e,
            "Invalid RGB values"
        );
    })?;
    run_command(&state, &ctx, command).await
}

pub async fn brightness(
    State(state): State<AppState>,
    ctx: RequestContext,
    body: Bytes,
) -> Result<Response, ApiError> {
    let request: BrightnessRequest = parse_json(&ctx, &body, "brightness")?;
    let command = request.validate().inspect_err(|e| {
        tracing::warn!(
            request_id = %ctx.request_id(),
            brightness = request.brightness,
            error = %e,
            "Invalid brightness value"
        );
    })?;
    run_command(&state, &ctx, command).await
}

pub async fn color_temperature(
    State(state): State<AppState>,
    ctx: RequestContext,
    body: Bytes,
) -> Result<Response, ApiError> {
    let request: ColorTemperatureRequest = parse_json(&ctx, &body, "color temperature")?;
    let command = request.validate().inspect_err(|e| {
        tracing::warn!(
            request_id = %ctx.request_id(),
            temperature = request.temperature,
            error = %e,
            "Invalid color temperature"
        );
    })?;
    run_command(&state, &ctx, command).await
}

/// Read every device's state; devices that fail to answer are left out.
pub async fn status(State(state): State<AppState>, ctx: RequestContext) -> Result<Response, ApiError> {
    tracing::info!(request_id = %ctx.request_id(), "Getting lights status");

    let mut statuses: Vec<DeviceStatus> = Vec::new();
    for device in state.registry.devices() {
        match device.status().await {
            Ok(status) => statuses.push(status),
            Err(e) => {
                tracing::error!(
                    request_id = %ctx.request_id(),
                    device = device.id(),
                    error = %e,
                    "Failed to request status"
                );
            }
        }
    }

    json_response(&ctx, StatusCode::OK, &statuses)
}
