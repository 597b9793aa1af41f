// src/services/accounts.rs

use uuid::Uuid;

use crate::{
    config::Config,
    error::AppError,
    models::user::{AuthResponse, LoginRequest, NewUser, RegisterRequest, Role, User},
    repositories::UserRepository,
    utils::{
        hash::{hash_password, verify_password},
        jwt::sign_jwt,
    },
};

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn issue(user: User, config: &Config) -> Result<AuthResponse, AppError> {
    let token = sign_jwt(user.id, user.role, &config.jwt_secret, config.jwt_expiration)?;
    Ok(AuthResponse { user, token })
}

pub async fn register(
    users: &dyn UserRepository,
    config: &Config,
    req: RegisterRequest,
) -> Result<AuthResponse, AppError> {
    let user = users
        .create_user(NewUser {
            name: req.name.trim().to_string(),
            email: normalize_email(&req.email),
            password: hash_password(&req.password)?,
            role: req.role,
        })
        .await?;

    tracing::info!(user_id = %user.id, role = ?user.role, "User registered");
    issue(user, config)
}

/// Unknown email and wrong password are indistinguishable to the caller.
pub async fn login(
    users: &dyn UserRepository,
    config: &Config,
    req: LoginRequest,
) -> Result<AuthResponse, AppError> {
    let invalid = || AppError::AuthError("Invalid credentials".to_string());

    let user = users
        .find_user_by_email(&normalize_email(&req.email))
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(&req.password, &user.password)? {
        return Err(invalid());
    }

    issue(user, config)
}

pub async fn me(users: &dyn UserRepository, id: Uuid) -> Result<User, AppError> {
    users
        .find_user_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

/// Creates the configured admin account on first boot.
pub async fn seed_admin(users: &dyn UserRepository, config: &Config) -> Result<(), AppError> {
    let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) else {
        return Ok(());
    };

    let email = normalize_email(email);
    if users.find_user_by_email(&email).await?.is_some() {
        return Ok(());
    }

    tracing::info!("Seeding admin user: {}", email);
    users
        .create_user(NewUser {
            name: config.admin_name.clone().unwrap_or_else(|| "Administrator".to_string()),
            email,
            password: hash_password(password)?,
            role: Role::Admin,
        })
        .await?;
    tracing::info!("Admin user created successfully.");
    Ok(())
}
