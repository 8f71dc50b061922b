use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
};

use crate::{
    dto::{
        game::GameResponse,
        user::{
            CollectionRemoveResponse, CollectionToggleRequest, CollectionToggleResponse, ListName,
            LoginRequest, LoginResponse, PlayedHoursRequest, PlayedHoursResponse, ProfileResponse,
            RegisterRequest, RegisterResponse,
        },
    },
    error::AppError,
    routes::json::ApiJson,
    services::{collection_service, user_service},
    state::SharedState,
};

/// Account, profile and collection endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/users/register", post(register))
        .route("/users/login", post(login))
        .route("/users/{id}/profile-data", get(profile_data))
        .route("/users/{id}/hours", post(set_played_hours))
        .route("/users/{id}/hours/{game_id}", get(get_played_hours))
        .route(
            "/users/{id}/{list}",
            get(list_collection).post(toggle_collection),
        )
        .route("/users/{id}/{list}/{game_id}", delete(remove_from_collection))
}

/// Create an account.
#[utoipa::path(
    post,
    path = "/api/users/register",
    tag = "users",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = RegisterResponse),
        (status = 400, description = "Missing field or password mismatch"),
        (status = 409, description = "Email or user name already registered")
    )
)]
pub async fn register(
    State(state): State<SharedState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let registered = user_service::register(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(registered)))
}

/// Exchange credentials for a session token.
#[utoipa::path(
    post,
    path = "/api/users/login",
    tag = "users",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 401, description = "Wrong password"),
        (status = 404, description = "Unknown email")
    )
)]
pub async fn login(
    State(state): State<SharedState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    Ok(Json(user_service::login(&state, payload).await?))
}

/// User profile with every collection resolved to games.
#[utoipa::path(
    get,
    path = "/api/users/{id}/profile-data",
    tag = "users",
    params(("id" = String, Path, description = "Identifier of the user")),
    responses(
        (status = 200, description = "Profile with resolved collections", body = ProfileResponse),
        (status = 404, description = "Unknown user")
    )
)]
pub async fn profile_data(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<ProfileResponse>, AppError> {
    Ok(Json(user_service::profile_data(&state, &id).await?))
}

/// Games in one of the user's collections.
#[utoipa::path(
    get,
    path = "/api/users/{id}/{list}",
    tag = "collections",
    params(
        ("id" = String, Path, description = "Identifier of the user"),
        ("list" = ListName, Path, description = "wishlist, favorites or completed")
    ),
    responses(
        (status = 200, description = "Games of the collection", body = [GameResponse]),
        (status = 404, description = "Unknown user")
    )
)]
pub async fn list_collection(
    State(state): State<SharedState>,
    Path((id, list)): Path<(String, ListName)>,
) -> Result<Json<Vec<GameResponse>>, AppError> {
    Ok(Json(
        collection_service::list_games(&state, &id, list.into()).await?,
    ))
}

/// Add a game to the collection, or remove it when already present.
#[utoipa::path(
    post,
    path = "/api/users/{id}/{list}",
    tag = "collections",
    params(
        ("id" = String, Path, description = "Identifier of the user"),
        ("list" = ListName, Path, description = "wishlist, favorites or completed")
    ),
    request_body = CollectionToggleRequest,
    responses(
        (status = 200, description = "Membership after the toggle", body = CollectionToggleResponse),
        (status = 400, description = "Missing or malformed game id"),
        (status = 404, description = "Unknown user")
    )
)]
pub async fn toggle_collection(
    State(state): State<SharedState>,
    Path((id, list)): Path<(String, ListName)>,
    ApiJson(payload): ApiJson<CollectionToggleRequest>,
) -> Result<Json<CollectionToggleResponse>, AppError> {
    Ok(Json(
        collection_service::toggle_membership(&state, &id, list.into(), payload).await?,
    ))
}

/// Remove a game from a collection. Removing an absent game is not an error.
#[utoipa::path(
    delete,
    path = "/api/users/{id}/{list}/{game_id}",
    tag = "collections",
    params(
        ("id" = String, Path, description = "Identifier of the user"),
        ("list" = ListName, Path, description = "wishlist, favorites or completed"),
        ("game_id" = String, Path, description = "Identifier of the game to remove")
    ),
    responses(
        (status = 200, description = "Collection after the removal", body = CollectionRemoveResponse),
        (status = 404, description = "Unknown user")
    )
)]
pub async fn remove_from_collection(
    State(state): State<SharedState>,
    Path((id, list, game_id)): Path<(String, ListName, String)>,
) -> Result<Json<CollectionRemoveResponse>, AppError> {
    Ok(Json(
        collection_service::remove_from_list(&state, &id, list.into(), &game_id).await?,
    ))
}

/// Record hours played on a game, replacing the previous value.
#[utoipa::path(
    post,
    path = "/api/users/{id}/hours",
    tag = "collections",
    params(("id" = String, Path, description = "Identifier of the user")),
    request_body = PlayedHoursRequest,
    responses(
        (status = 200, description = "Hours recorded", body = PlayedHoursResponse),
        (status = 400, description = "Negative or missing hours"),
        (status = 404, description = "Unknown user")
    )
)]
pub async fn set_played_hours(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<PlayedHoursRequest>,
) -> Result<Json<PlayedHoursResponse>, AppError> {
    Ok(Json(
        collection_service::set_played_hours(&state, &id, payload).await?,
    ))
}

/// Hours played on a game; zero when none were recorded.
#[utoipa::path(
    get,
    path = "/api/users/{id}/hours/{game_id}",
    tag = "collections",
    params(
        ("id" = String, Path, description = "Identifier of the user"),
        ("game_id" = String, Path, description = "Identifier of the game")
    ),
    responses(
        (status = 200, description = "Hours played", body = PlayedHoursResponse),
        (status = 404, description = "Unknown user")
    )
)]
pub async fn get_played_hours(
    State(state): State<SharedState>,
    Path((id, game_id)): Path<(String, String)>,
) -> Result<Json<PlayedHoursResponse>, AppError> {
    Ok(Json(
        collection_service::get_played_hours(&state, &id, &game_id).await?,
    ))
}
