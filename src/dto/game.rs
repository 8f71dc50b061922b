//! DTOs for the game catalogue routes.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dao::models::{GameEntity, GamePatch, ReviewEntity},
    dto::{format_system_time, review::ReviewResponse, validation::validate_not_blank},
};

/// Payload used to register a new game. Only `title` is required.
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct CreateGameRequest {
    #[validate(required, custom(function = "validate_not_blank"))]
    pub title: Option<String>,
    pub genre: Option<String>,
    pub platform: Option<String>,
    pub image: Option<String>,
    pub banner: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 0.0))]
    pub price: Option<f64>,
    pub downloads: Option<u64>,
    pub completed: Option<bool>,
}

/// Partial update of a game. Rating and review references are derived and cannot be set.
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct UpdateGameRequest {
    #[validate(custom(function = "validate_not_blank"))]
    pub title: Option<String>,
    pub genre: Option<String>,
    pub platform: Option<String>,
    pub image: Option<String>,
    pub banner: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 0.0))]
    pub price: Option<f64>,
    pub downloads: Option<u64>,
    pub completed: Option<bool>,
}

impl From<UpdateGameRequest> for GamePatch {
    fn from(request: UpdateGameRequest) -> Self {
        Self {
            title: request.title.map(|title| title.trim().to_owned()),
            genre: request.genre,
            platform: request.platform,
            image: request.image,
            banner: request.banner,
            description: request.description,
            price: request.price,
            downloads: request.downloads,
            completed: request.completed,
        }
    }
}

/// Scalar fields of a game shared by every projection.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GameSummary {
    pub id: String,
    pub title: String,
    pub genre: Option<String>,
    pub platform: Option<String>,
    pub image: Option<String>,
    pub banner: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub downloads: Option<u64>,
    pub completed: bool,
    /// Mean review score, 0 without reviews.
    pub rating: f64,
    pub created_at: String,
    pub updated_at: String,
}

/// Game as returned by list, create and update.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GameResponse {
    #[serde(flatten)]
    pub summary: GameSummary,
    /// Review ids, oldest first.
    pub reviews: Vec<String>,
}

/// Game with its reviews resolved, as returned by `GET /api/games/{id}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct GameDetailResponse {
    #[serde(flatten)]
    pub summary: GameSummary,
    pub reviews: Vec<ReviewResponse>,
}

impl From<&GameEntity> for GameSummary {
    fn from(game: &GameEntity) -> Self {
        Self {
            id: game.id.to_string(),
            title: game.title.clone(),
            genre: game.genre.clone(),
            platform: game.platform.clone(),
            image: game.image.clone(),
            banner: game.banner.clone(),
            description: game.description.clone(),
            price: game.price,
            downloads: game.downloads,
            completed: game.completed,
            rating: game.rating,
            created_at: format_system_time(game.created_at),
            updated_at: format_system_time(game.updated_at),
        }
    }
}

impl From<GameEntity> for GameResponse {
    fn from(game: GameEntity) -> Self {
        Self {
            summary: GameSummary::from(&game),
            reviews: game.reviews.iter().map(ToString::to_string).collect(),
        }
    }
}

impl From<(GameEntity, Vec<ReviewEntity>)> for GameDetailResponse {
    fn from((game, reviews): (GameEntity, Vec<ReviewEntity>)) -> Self {
        Self {
            summary: GameSummary::from(&game),
            reviews: reviews.into_iter().map(Into::into).collect(),
        }
    }
}
