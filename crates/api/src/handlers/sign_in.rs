//! Handlers for issuing and redeeming sign-in codes.

use axum::extract::State;
use axum::Json;
use chrono::{Duration, Utc};
use radar_core::digest::PRODUCT_NAME;
use radar_core::error::CoreError;
use radar_core::fingerprint::sign_in_code_digest;
use radar_core::types::{DbId, Timestamp};
use radar_db::models::sign_in_code::SignInCode;
use radar_db::repositories::{SignInCodeRepo, UserRepo};
use radar_events::delivery::email::OutgoingMail;
use rand::Rng;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// How long a sign-in code stays valid.
const CODE_TTL_MINUTES: i64 = 15;

const CODE_LENGTH: usize = 6;

/// Returned whether or not an account exists for the address.
const UNIFORM_MESSAGE: &str = "If an account exists for this address, a sign-in code has been sent.";

/// Returned for every failed redemption, whatever the cause.
pub const INVALID_CODE_MESSAGE: &str = "Invalid code, please try again.";

/// Request body for `POST /auth/sign-in-code`.
#[derive(Debug, Deserialize, Validate)]
pub struct SignInCodeRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
}

impl SignInCodeRequest {
    fn trimmed(self) -> Self {
        Self {
            email: self.email.trim().to_owned(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SignInCodeResponse {
    pub success: bool,
    pub message: &'static str,
}

/// Request body for `POST /auth/sign-in`.
#[derive(Debug, Deserialize, Validate)]
pub struct SignInRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    pub code: String,
}

impl SignInRequest {
    fn trimmed(self) -> Self {
        Self {
            email: self.email.trim().to_owned(),
            code: self.code.trim().to_owned(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInResponse {
    pub success: bool,
    pub user_id: DbId,
}

/// POST /api/v1/auth/sign-in-code
///
/// Issue a one-time sign-in code to an existing account. The response does
/// not reveal whether the address is registered.
pub async fn request_sign_in_code(
    State(state): State<AppState>,
    Json(input): Json<SignInCodeRequest>,
) -> AppResult<Json<SignInCodeResponse>> {
    let input = input.trimmed();
    validate(&input)?;

    if let Some(user) = UserRepo::find_by_email(&state.pool, &input.email).await? {
        let code = generate_code();
        let expires_at = Utc::now() + Duration::minutes(CODE_TTL_MINUTES);

        SignInCodeRepo::delete_expired_for_user(&state.pool, user.id).await?;
        SignInCodeRepo::create(&state.pool, user.id, &sign_in_code_digest(&code), expires_at)
            .await?;

        match &state.mail {
            Some(mail) => {
                let outgoing = OutgoingMail {
                    from: mail.from.clone(),
                    to: user.email.clone(),
                    subject: format!("Your {PRODUCT_NAME} sign-in code"),
                    text: code_mail_text(&code),
                };
                if let Err(e) = mail.queue.enqueue(outgoing) {
                    tracing::error!(user_id = user.id, error = %e, "Failed to queue sign-in code mail");
                }
            }
            None => tracing::warn!(user_id = user.id, "Email not configured, sign-in code not sent"),
        }

        tracing::info!(user_id = user.id, "Sign-in code issued");
    }

    Ok(Json(SignInCodeResponse {
        success: true,
        message: UNIFORM_MESSAGE,
    }))
}

/// POST /api/v1/auth/sign-in
///
/// Redeem a sign-in code. On success every outstanding code for the account
/// is deleted. A malformed, wrong or expired code and an unknown address all
/// fail with the same 401.
pub async fn redeem_sign_in_code(
    State(state): State<AppState>,
    Json(input): Json<SignInRequest>,
) -> AppResult<Json<SignInResponse>> {
    let input = input.trimmed();
    validate(&input)?;

    if !is_well_formed_code(&input.code) {
        return Err(invalid_code());
    }

    let Some(user) = UserRepo::find_by_email(&state.pool, &input.email).await? else {
        return Err(invalid_code());
    };

    let codes = SignInCodeRepo::list_unexpired_for_user(&state.pool, user.id).await?;
    check_code(&codes, &input.code, Utc::now())?;

    let removed = SignInCodeRepo::delete_for_user(&state.pool, user.id).await?;
    tracing::info!(user_id = user.id, removed, "Sign-in code redeemed");

    Ok(Json(SignInResponse {
        success: true,
        user_id: user.id,
    }))
}

fn validate(input: &impl Validate) -> Result<(), AppError> {
    input
        .validate()
        .map_err(|e| AppError::Core(CoreError::Validation(e.to_string())))
}

fn invalid_code() -> AppError {
    AppError::Core(CoreError::Unauthorized(INVALID_CODE_MESSAGE.into()))
}

fn is_well_formed_code(code: &str) -> bool {
    code.len() == CODE_LENGTH && code.bytes().all(|b| b.is_ascii_digit())
}

/// Succeeds if any of `codes` redeems `code` at `now`.
fn check_code(codes: &[SignInCode], code: &str, now: Timestamp) -> Result<(), AppError> {
    let digest = sign_in_code_digest(code);
    if codes.iter().any(|row| row.redeems(&digest, now)) {
        Ok(())
    } else {
        Err(invalid_code())
    }
}

/// A uniformly random six-digit code, zero-padded.
fn generate_code() -> String {
    let n: u32 = rand::rng().random_range(0..1_000_000);
    format!("{n:06}")
}

fn code_mail_text(code: &str) -> String {
    format!(
        "Hi there,\n\nyour sign-in code is:\n\n  {code}\n\n\
         It expires in {CODE_TTL_MINUTES} minutes. If you did not request it, \
         you can ignore this email.\n\nCheers,\n{PRODUCT_NAME}"
    )
}
