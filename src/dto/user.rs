//! DTOs for registration, login, profile and collection routes.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, de};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::{
    dao::models::{CollectionList, UserEntity},
    dto::{
        format_system_time,
        game::GameResponse,
        validation::{validate_entity_id, validate_not_blank},
    },
};

/// Registration form.
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
#[validate(schema(function = "validate_passwords_match"))]
pub struct RegisterRequest {
    #[validate(required, custom(function = "validate_not_blank"))]
    pub name: Option<String>,
    #[validate(required, email)]
    pub email: Option<String>,
    #[validate(required, length(min = 1))]
    pub password: Option<String>,
    #[validate(required)]
    #[serde(alias = "confirmPassword")]
    pub confirm_password: Option<String>,
    #[validate(required, custom(function = "validate_not_blank"))]
    #[serde(alias = "userName")]
    pub user_name: Option<String>,
    pub avatar: Option<String>,
}

/// Rejects a registration whose confirmation differs from the password.
fn validate_passwords_match(request: &RegisterRequest) -> Result<(), ValidationError> {
    match (&request.password, &request.confirm_password) {
        (Some(password), Some(confirm)) if password != confirm => {
            let mut err = ValidationError::new("password_mismatch");
            err.message = Some("passwords do not match".into());
            Err(err)
        }
        _ => Ok(()),
    }
}

/// Login form.
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct LoginRequest {
    #[validate(required, custom(function = "validate_not_blank"))]
    pub email: Option<String>,
    #[validate(required, length(min = 1))]
    pub password: Option<String>,
}

/// Public projection of a user. The credential hash is never exposed.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub user_name: String,
    pub avatar: String,
    pub wishlist: Vec<String>,
    pub favorites: Vec<String>,
    pub completed_games: Vec<String>,
    /// Hours per game id; games without an entry count as zero.
    pub played_hours: IndexMap<String, f64>,
    pub created_at: String,
}

/// Newly created account.
#[derive(Debug, Serialize, ToSchema)]
pub struct RegisterResponse {
    pub message: String,
    pub user: UserResponse,
}

/// Successful login: a signed session token and the user it belongs to.
#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub user: UserResponse,
}

/// User profile with every collection resolved to game records.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub user_name: String,
    pub avatar: String,
    pub wishlist: Vec<GameResponse>,
    pub favorites: Vec<GameResponse>,
    pub completed_games: Vec<GameResponse>,
    pub played_hours: IndexMap<String, f64>,
}

/// Collection name as it appears in URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ListName {
    Wishlist,
    Favorites,
    #[serde(alias = "completed_games")]
    Completed,
}

impl From<ListName> for CollectionList {
    fn from(name: ListName) -> Self {
        match name {
            ListName::Wishlist => CollectionList::Wishlist,
            ListName::Favorites => CollectionList::Favorites,
            ListName::Completed => CollectionList::CompletedGames,
        }
    }
}

/// Game to toggle in one of the user's collections.
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct CollectionToggleRequest {
    #[validate(required, custom(function = "validate_entity_id"))]
    #[serde(alias = "gameId")]
    pub game_id: Option<String>,
}

/// Membership of the toggled game and the resulting collection.
#[derive(Debug, Serialize, ToSchema)]
pub struct CollectionToggleResponse {
    /// Whether the game is in the collection after the toggle.
    pub member: bool,
    pub list: Vec<String>,
}

/// Collection after an explicit removal.
#[derive(Debug, Serialize, ToSchema)]
pub struct CollectionRemoveResponse {
    /// Whether the game was in the collection before the removal.
    pub removed: bool,
    pub list: Vec<String>,
}

/// Hours played on one game.
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct PlayedHoursRequest {
    #[validate(required, custom(function = "validate_entity_id"))]
    #[serde(alias = "gameId")]
    pub game_id: Option<String>,
    /// Finite, non-negative number of hours. Numeric strings such as `"12.5"` are accepted.
    #[validate(required, range(min = 0.0))]
    #[serde(alias = "hoursPlayed", default, deserialize_with = "number_or_numeric_string")]
    pub hours: Option<f64>,
}

fn number_or_numeric_string<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawHours {
        Number(f64),
        Text(String),
    }

    match Option::<RawHours>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawHours::Number(hours)) => Ok(Some(hours)),
        Some(RawHours::Text(text)) => text
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("`{text}` is not a number of hours"))),
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PlayedHoursResponse {
    pub game_id: String,
    pub hours: f64,
}

impl From<UserEntity> for UserResponse {
    fn from(user: UserEntity) -> Self {
        Self {
            id: user.id.to_string(),
            name: user.name,
            email: user.email,
            user_name: user.user_name,
            avatar: user.avatar,
            wishlist: user.wishlist.iter().map(ToString::to_string).collect(),
            favorites: user.favorites.iter().map(ToString::to_string).collect(),
            completed_games: user
                .completed_games
                .iter()
                .map(ToString::to_string)
                .collect(),
            played_hours: user
                .played_hours
                .into_iter()
                .map(|(game_id, hours)| (String::from(game_id), hours))
                .collect(),
            created_at: format_system_time(user.created_at),
        }
    }
}
