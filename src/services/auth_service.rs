use axum::Extension;
use bcrypt::{DEFAULT_COST, hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
};

use crate::db::entities::user;
use crate::web::error::AppError;
use crate::web::models::{
    Claims, CurrentUser, LoginRequest, LoginResponse, RegisterRequest, UserResponse,
};

pub async fn register_user(
    db: &DatabaseConnection,
    req: RegisterRequest,
) -> Result<UserResponse, AppError> {
    if req.username.is_empty() || req.password.len() < 8 {
        return Err(AppError::InvalidInput(
            "Username must not be empty and the password needs at least 8 characters.".to_string(),
        ));
    }

    let existing: Option<user::Model> = user::Entity::find()
        .filter(user::Column::Username.eq(&req.username))
        .one(db)
        .await
        .map_err(|e: DbErr| AppError::DatabaseError(format!("Failed to check username: {e}")))?;

    if existing.is_some() {
        return Err(AppError::UserAlreadyExists(
            "Username is already taken.".to_string(),
        ));
    }

    let password_hash = hash(&req.password, DEFAULT_COST)
        .map_err(|e| AppError::PasswordHashingError(e.to_string()))?;

    let now = Utc::now();
    let new_user = user::ActiveModel {
        username: Set(req.username.clone()),
        password_hash: Set(password_hash),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    match new_user.insert(db).await {
        Ok(user_model) => Ok(UserResponse {
            id: user_model.id,
            username: user_model.username,
        }),
        Err(e) => Err(AppError::DatabaseError(format!("Failed to create user: {e}"))),
    }
}

pub async fn login_user(
    db: &DatabaseConnection,
    req: LoginRequest,
    jwt_secret: &str,
) -> Result<LoginResponse, AppError> {
    if req.username.is_empty() || req.password.is_empty() {
        return Err(AppError::InvalidInput(
            "Username and password must not be empty.".to_string(),
        ));
    }

    let user = user::Entity::find()
        .filter(user::Column::Username.eq(&req.username))
        .one(db)
        .await
        .map_err(|e: DbErr| AppError::DatabaseError(format!("Failed to look up user: {e}")))?
        .ok_or(AppError::InvalidCredentials)?;

    let valid_password = verify(&req.password, &user.password_hash)
        .map_err(|e| AppError::InternalServerError(format!("Password verification failed: {e}")))?;

    if !valid_password {
        return Err(AppError::InvalidCredentials);
    }

    create_jwt_for_user(&user, jwt_secret)
}

pub fn create_jwt_for_user(
    user: &user::Model,
    jwt_secret: &str,
) -> Result<LoginResponse, AppError> {
    let now = Utc::now();
    // Tokens are valid for 24 hours.
    let expiration = (now + Duration::hours(24)).timestamp() as usize;

    let claims = Claims {
        sub: user.username.clone(),
        user_id: user.id,
        exp: expiration,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_ref()),
    )
    .map_err(|e| AppError::TokenCreationError(e.to_string()))?;

    Ok(LoginResponse {
        token,
        user_id: user.id,
        username: user.username.clone(),
    })
}

pub async fn me(Extension(user): Extension<CurrentUser>) -> Result<axum::Json<UserResponse>, AppError> {
    Ok(axum::Json(UserResponse {
        id: user.id,
        username: user.username,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{DecodingKey, Validation, decode};

    fn sample_user() -> user::Model {
        user::Model {
            id: 42,
            username: "alice".to_string(),
            password_hash: "irrelevant".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn issued_token_decodes_back_to_the_user() {
        let secret = "test-secret";
        let login = create_jwt_for_user(&sample_user(), secret).unwrap();
        assert_eq!(login.user_id, 42);
        assert_eq!(login.username, "alice");

        let decoded = decode::<Claims>(
            &login.token,
            &DecodingKey::from_secret(secret.as_ref()),
            &Validation::default(),
        )
        .unwrap();
        assert_eq!(decoded.claims.user_id, 42);
        assert_eq!(decoded.claims.sub, "alice");
    }

    #[test]
    fn token_does_not_validate_with_another_secret() {
        let login = create_jwt_for_user(&sample_user(), "secret-a").unwrap();
        let result = decode::<Claims>(
            &login.token,
            &DecodingKey::from_secret("secret-b".as_ref()),
            &Validation::default(),
        );
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn register_rejects_short_passwords() {
        let db = sea_orm::MockDatabase::new(sea_orm::DatabaseBackend::Postgres).into_connection();
        let result = register_user(
            &db,
            RegisterRequest {
                username: "bob".to_string(),
                password: "short".to_string(),
            },
        )
        .await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }
}
