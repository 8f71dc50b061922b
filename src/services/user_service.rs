use std::time::SystemTime;

use indexmap::{IndexMap, IndexSet};
use tracing::{debug, info};
use validator::Validate;

use crate::{
    dao::{id::EntityId, models::UserEntity},
    dto::user::{
        LoginRequest, LoginResponse, ProfileResponse, RegisterRequest, RegisterResponse,
        UserResponse,
    },
    error::ServiceError,
    services::{collection_service::resolve_games, parse_id, required},
    state::SharedState,
};

fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

/// Create an account after checking that neither the email nor the user name is taken.
pub async fn register(
    state: &SharedState,
    request: RegisterRequest,
) -> Result<RegisterResponse, ServiceError> {
    request.validate()?;
    let name = required(request.name, "name")?.trim().to_owned();
    let email = normalize_email(&required(request.email, "email")?);
    let password = required(request.password, "password")?;
    let user_name = required(request.user_name, "user_name")?.trim().to_owned();

    let store = state.require_catalog_store().await?;
    if store.find_user_by_email(email.clone()).await?.is_some() {
        return Err(ServiceError::Conflict("email is already registered".into()));
    }
    if store
        .find_user_by_user_name(user_name.clone())
        .await?
        .is_some()
    {
        return Err(ServiceError::Conflict(
            "user_name is already registered".into(),
        ));
    }

    let password_hash = state.credentials().hash(&password)?;
    let avatar = request
        .avatar
        .filter(|avatar| !avatar.trim().is_empty())
        .unwrap_or_else(|| state.config().default_avatar.clone());
    let now = SystemTime::now();

    // The store enforces uniqueness too, so a concurrent registration still ends in a conflict.
    let user = store
        .insert_user(UserEntity {
            id: EntityId::generate(),
            name,
            email,
            password_hash,
            user_name,
            avatar,
            wishlist: IndexSet::new(),
            favorites: IndexSet::new(),
            completed_games: IndexSet::new(),
            played_hours: IndexMap::new(),
            created_at: now,
            updated_at: now,
        })
        .await?;
    info!(user_id = %user.id, user_name = %user.user_name, "user registered");

    Ok(RegisterResponse {
        message: "user registered".into(),
        user: user.into(),
    })
}

/// Check the credentials and issue a session token.
pub async fn login(state: &SharedState, request: LoginRequest) -> Result<LoginResponse, ServiceError> {
    request.validate()?;
    let email = normalize_email(&required(request.email, "email")?);
    let password = required(request.password, "password")?;

    let store = state.require_catalog_store().await?;
    let Some(user) = store.find_user_by_email(email).await? else {
        return Err(ServiceError::NotFound("user not found".into()));
    };

    if !state.credentials().verify(&password, &user.password_hash)? {
        debug!(user_id = %user.id, "login rejected");
        return Err(ServiceError::Unauthorized("invalid password".into()));
    }

    let token = state.tokens().issue(&user.id)?;
    info!(user_id = %user.id, "user logged in");

    Ok(LoginResponse {
        message: "login successful".into(),
        token,
        user: UserResponse::from(user),
    })
}

/// User with the three collections resolved to games.
pub async fn profile_data(state: &SharedState, id: &str) -> Result<ProfileResponse, ServiceError> {
    let id = parse_id(id)?;
    let store = state.require_catalog_store().await?;
    let Some(user) = store.find_user(id.clone()).await? else {
        return Err(ServiceError::NotFound(format!("user `{id}` not found")));
    };

    let wishlist = resolve_games(store.as_ref(), &user.wishlist).await?;
    let favorites = resolve_games(store.as_ref(), &user.favorites).await?;
    let completed_games = resolve_games(store.as_ref(), &user.completed_games).await?;

    Ok(ProfileResponse {
        id: user.id.to_string(),
        name: user.name,
        email: user.email,
        user_name: user.user_name,
        avatar: user.avatar,
        wishlist,
        favorites,
        completed_games,
        played_hours: user
            .played_hours
            .into_iter()
            .map(|(game_id, hours)| (String::from(game_id), hours))
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use jsonwebtoken::{DecodingKey, Validation, decode};

    use super::*;
    use crate::{
        config::DEFAULT_AVATAR_URL,
        dao::catalog_store::CatalogStore,
        services::auth::SessionClaims,
        state::test_support::memory_state,
    };

    fn registration(email: &str, user_name: &str) -> RegisterRequest {
        RegisterRequest {
            name: Some("Ana".into()),
            email: Some(email.into()),
            password: Some("secret".into()),
            confirm_password: Some("secret".into()),
            user_name: Some(user_name.into()),
            avatar: None,
        }
    }

    fn credentials(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: Some(email.into()),
            password: Some(password.into()),
        }
    }

    #[tokio::test]
    async fn registration_hashes_password_and_defaults_avatar() {
        let (state, store) = memory_state().await;
        let response = register(&state, registration("ana@example.com", "ana"))
            .await
            .unwrap();
        assert_eq!(response.user.avatar, DEFAULT_AVATAR_URL);

        let stored = store
            .find_user_by_email("ana@example.com".into())
            .await
            .unwrap()
            .unwrap();
        assert_ne!(stored.password_hash, "secret");
        assert!(stored.wishlist.is_empty());
    }

    #[tokio::test]
    async fn duplicate_email_or_user_name_conflicts() {
        let (state, _store) = memory_state().await;
        register(&state, registration("ana@example.com", "ana"))
            .await
            .unwrap();

        let same_email = register(&state, registration("ANA@example.com", "other")).await;
        assert!(matches!(same_email, Err(ServiceError::Conflict(_))));

        let same_name = register(&state, registration("other@example.com", "ana")).await;
        assert!(matches!(same_name, Err(ServiceError::Conflict(_))));
    }

    #[tokio::test]
    async fn mismatched_passwords_are_invalid() {
        let (state, _store) = memory_state().await;
        let request = RegisterRequest {
            confirm_password: Some("different".into()),
            ..registration("ana@example.com", "ana")
        };
        assert!(matches!(
            register(&state, request).await,
            Err(ServiceError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn login_issues_token_for_valid_credentials() {
        let (state, _store) = memory_state().await;
        let registered = register(&state, registration("ana@example.com", "ana"))
            .await
            .unwrap();

        let response = login(&state, credentials("ana@example.com", "secret"))
            .await
            .unwrap();
        let claims = decode::<SessionClaims>(
            &response.token,
            &DecodingKey::from_secret(state.config().jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .unwrap()
        .claims;
        assert_eq!(claims.sub, registered.user.id);
    }

    #[tokio::test]
    async fn login_failures_are_distinguished() {
        let (state, _store) = memory_state().await;
        register(&state, registration("ana@example.com", "ana"))
            .await
            .unwrap();

        let unknown = login(&state, credentials("bob@example.com", "secret")).await;
        assert!(matches!(unknown, Err(ServiceError::NotFound(_))));

        let wrong = login(&state, credentials("ana@example.com", "nope")).await;
        assert!(matches!(wrong, Err(ServiceError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn profile_of_unknown_user_is_not_found() {
        let (state, _store) = memory_state().await;
        let missing = profile_data(&state, EntityId::generate().as_str()).await;
        assert!(matches!(missing, Err(ServiceError::NotFound(_))));
    }
}
