use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use password_hash::rand_core::OsRng;
use uuid::Uuid;

use crate::{
    audit,
    dto::auth::{Claims, LoginRequest, LoginResponse, RegisterRequest},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Profile, ROLE_CUSTOMER},
    response::{ApiResponse, Meta},
    state::AppState,
};

pub const MIN_PASSWORD_LEN: usize = 8;
const TOKEN_TTL_HOURS: i64 = 24;

#[derive(Debug, sqlx::FromRow)]
struct ProfileRow {
    id: Uuid,
    email: String,
    password_hash: String,
    full_name: Option<String>,
    phone: Option<String>,
    role: String,
    created_at: DateTime<Utc>,
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        Profile {
            id: row.id,
            email: row.email,
            full_name: row.full_name,
            phone: row.phone,
            role: row.role,
            created_at: row.created_at,
        }
    }
}

pub async fn register(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<Profile>> {
    let email = normalize_email(&payload.email)?;
    if payload.password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let exist: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM profiles WHERE email = $1")
        .bind(email.as_str())
        .fetch_optional(&state.pool)
        .await?;
    if exist.is_some() {
        return Err(AppError::Conflict("Email is already registered".into()));
    }

    let password_hash = hash_password(&payload.password)?;
    let row: ProfileRow = sqlx::query_as(
        r#"
        INSERT INTO profiles (id, email, password_hash, full_name, phone, role)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, email, password_hash, full_name, phone, role, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email.as_str())
    .bind(password_hash)
    .bind(payload.full_name.as_deref().map(str::trim).filter(|s| !s.is_empty()))
    .bind(payload.phone.as_deref().map(str::trim).filter(|s| !s.is_empty()))
    .bind(ROLE_CUSTOMER)
    .fetch_one(&state.pool)
    .await?;

    tracing::info!(user_id = %row.id, "profile registered");
    Ok(ApiResponse::success(
        "Registered",
        Profile::from(row),
        Some(Meta::empty()),
    ))
}

pub async fn login(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let email = payload.email.trim().to_lowercase();
    let row: Option<ProfileRow> = sqlx::query_as(
        r#"
        SELECT id, email, password_hash, full_name, phone, role, created_at
        FROM profiles WHERE email = $1
        "#,
    )
    .bind(email.as_str())
    .fetch_optional(&state.pool)
    .await?;

    let Some(row) = row else {
        return Err(AppError::BadRequest("Invalid email or password".into()));
    };
    if !verify_password(&payload.password, &row.password_hash)? {
        return Err(AppError::BadRequest("Invalid email or password".into()));
    }

    let token = issue_token(row.id, &row.role, &state.config.jwt_secret)?;

    if row.role != ROLE_CUSTOMER {
        audit::record(
            &state.pool,
            row.id,
            "admin_login",
            "profiles",
            Some(row.id),
            serde_json::json!({ "email": row.email }),
        )
        .await;
    }

    Ok(ApiResponse::success(
        "Logged in",
        LoginResponse {
            token,
            profile: Profile::from(row),
        },
        Some(Meta::empty()),
    ))
}

pub async fn me(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Profile>> {
    let row: ProfileRow = sqlx::query_as(
        r#"
        SELECT id, email, password_hash, full_name, phone, role, created_at
        FROM profiles WHERE id = $1
        "#,
    )
    .bind(user.user_id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Profile", Profile::from(row), None))
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

fn verify_password(password: &str, stored: &str) -> AppResult<bool> {
    let parsed = PasswordHash::new(stored)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

pub fn issue_token(user_id: Uuid, role: &str, secret: &str) -> AppResult<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(TOKEN_TTL_HOURS))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;
    let claims = Claims {
        sub: user_id.to_string(),
        role: role.to_string(),
        exp: expiration.timestamp() as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

fn normalize_email(raw: &str) -> AppResult<String> {
    let email = raw.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(AppError::BadRequest("Invalid email address".into())),
    }
}
