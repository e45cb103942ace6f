use axum::{extract::State, Extension, Json};
use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tracing::info;

use crate::db::entities::user;
use crate::db::services::{self as db_services, NewUser};
use crate::security::Role;
use crate::server::config::ServerConfig;
use crate::web::error::AppError;
use crate::web::models::{
    AuthenticatedUser, Claims, LoginRequest, LoginResponse, RegisterRequest, UserResponse,
};
use crate::web::AppState;

/// Sessions last a day.
const TOKEN_LIFETIME_HOURS: i64 = 24;
const MIN_PASSWORD_LENGTH: usize = 8;

pub fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    hash(password, cost).map_err(|e| AppError::PasswordHashingError(e.to_string()))
}

pub fn validate_password(password: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AppError::InvalidInput(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters long."
        )));
    }
    Ok(())
}

pub fn validate_profile(first_name: &str, surname: &str, email: &str) -> Result<(), AppError> {
    if first_name.trim().is_empty() || surname.trim().is_empty() {
        return Err(AppError::InvalidInput("First name and surname are required.".to_string()));
    }
    let email = email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::InvalidInput("A valid email address is required.".to_string()));
    }
    Ok(())
}

pub async fn register_user(
    pool: &DatabaseConnection,
    req: RegisterRequest,
    password_cost: u32,
) -> Result<UserResponse, AppError> {
    validate_profile(&req.first_name, &req.surname, &req.email)?;
    validate_password(&req.password)?;

    let email = req.email.trim().to_string();
    if db_services::find_user_by_email(pool, &email).await?.is_some() {
        return Err(AppError::UserAlreadyExists("Email is already registered.".to_string()));
    }

    let password_hash = hash_password(&req.password, password_cost)?;
    let roles = [Role::DEFAULT];
    let user_model = db_services::create_user(
        pool,
        NewUser {
            first_name: req.first_name.trim().to_string(),
            surname: req.surname.trim().to_string(),
            address: req.address.trim().to_string(),
            email,
            password_hash,
        },
        &roles,
    )
    .await?;

    info!(user_id = user_model.id, "User registered.");
    Ok(UserResponse::from_user(user_model, &roles))
}

/// Checks email and password. Unknown emails, disabled accounts and wrong
/// passwords all answer `InvalidCredentials`.
pub async fn authenticate(
    pool: &DatabaseConnection,
    req: &LoginRequest,
) -> Result<user::Model, AppError> {
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(AppError::InvalidInput("Email and password are required.".to_string()));
    }

    let user = db_services::find_user_by_email(pool, req.email.trim())
        .await?
        .ok_or(AppError::UserNotFound)?;

    if !user.enabled {
        return Err(AppError::InvalidCredentials);
    }

    let valid_password = verify(&req.password, &user.password_hash)
        .map_err(|e| AppError::InternalServerError(format!("Password verification failed: {e}")))?;
    if !valid_password {
        return Err(AppError::InvalidCredentials);
    }

    Ok(user)
}

pub async fn login_user(
    pool: &DatabaseConnection,
    req: LoginRequest,
    jwt_secret: &str,
) -> Result<LoginResponse, AppError> {
    let user = authenticate(pool, &req).await?;
    create_jwt_for_user(&user, jwt_secret)
}

pub fn create_jwt_for_user(user: &user::Model, jwt_secret: &str) -> Result<LoginResponse, AppError> {
    let expiration = (Utc::now() + Duration::hours(TOKEN_LIFETIME_HOURS)).timestamp() as usize;

    let claims = Claims {
        sub: user.email.clone(),
        user_id: user.id,
        exp: expiration,
    };

    let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(jwt_secret.as_ref()))
        .map_err(|e| AppError::TokenCreationError(e.to_string()))?;

    Ok(LoginResponse {
        token,
        user_id: user.id,
        email: user.email.clone(),
    })
}

pub fn decode_token(token: &str, jwt_secret: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_secret.as_ref()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::InvalidCredentials)
}

/// Reloads the token's user so disabled accounts and role changes take
/// effect on the next request.
pub async fn load_authenticated_user(
    pool: &DatabaseConnection,
    claims: &Claims,
) -> Result<AuthenticatedUser, AppError> {
    let user = db_services::find_user_by_id(pool, claims.user_id)
        .await?
        .ok_or(AppError::InvalidCredentials)?;
    if !user.enabled || user.email != claims.sub {
        return Err(AppError::InvalidCredentials);
    }
    let roles = db_services::find_user_roles(pool, &user).await?;

    Ok(AuthenticatedUser {
        id: user.id,
        email: user.email,
        first_name: user.first_name,
        surname: user.surname,
        roles,
    })
}

/// Creates the configured administrator unless an account with that email
/// already exists.
pub async fn bootstrap_admin(pool: &DatabaseConnection, config: &ServerConfig) -> Result<(), AppError> {
    let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) else {
        return Ok(());
    };
    if db_services::find_user_by_email(pool, email).await?.is_some() {
        return Ok(());
    }
    validate_password(password)?;

    let admin = db_services::create_user(
        pool,
        NewUser {
            first_name: "Admin".to_string(),
            surname: "Account".to_string(),
            address: String::new(),
            email: email.clone(),
            password_hash: hash_password(password, config.password_cost)?,
        },
        &[Role::Client, Role::Admin],
    )
    .await?;
    info!(user_id = admin.id, email = %admin.email, "Bootstrap administrator created.");
    Ok(())
}

pub async fn me(
    State(app_state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<UserResponse>, AppError> {
    let model = db_services::find_user_by_id(&app_state.db_pool, user.id)
        .await?
        .ok_or(AppError::UserNotFound)?;
    Ok(Json(UserResponse::from_user(model, &user.roles)))
}
