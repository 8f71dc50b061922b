use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the GameVault backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::games::list_games,
        crate::routes::games::create_game,
        crate::routes::games::get_game,
        crate::routes::games::update_game,
        crate::routes::games::delete_game,
        crate::routes::reviews::list_reviews,
        crate::routes::reviews::create_review,
        crate::routes::reviews::get_review,
        crate::routes::reviews::update_review,
        crate::routes::reviews::delete_review,
        crate::routes::reviews::list_reviews_for_game,
        crate::routes::reviews::toggle_like,
        crate::routes::reviews::dislike,
        crate::routes::reviews::add_comment,
        crate::routes::users::register,
        crate::routes::users::login,
        crate::routes::users::profile_data,
        crate::routes::users::list_collection,
        crate::routes::users::toggle_collection,
        crate::routes::users::remove_from_collection,
        crate::routes::users::set_played_hours,
        crate::routes::users::get_played_hours,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::game::GameSummary,
            crate::dto::review::CommentResponse,
            crate::dto::user::UserResponse,
            crate::dto::user::ListName,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "games", description = "Game catalogue"),
        (name = "reviews", description = "Reviews, likes and comments"),
        (name = "users", description = "Registration, login and profiles"),
        (name = "collections", description = "Wishlist, favorites, completed games and played hours"),
    )
)]
pub struct ApiDoc;
