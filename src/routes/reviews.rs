use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};

use crate::{
    dto::review::{
        CommentAddedResponse, CommentRequest, CreateReviewRequest, DislikeResponse, LikeRequest,
        LikeResponse, ReviewDeletedResponse, ReviewListQuery, ReviewResponse, ReviewWriteResponse,
        UpdateReviewRequest,
    },
    error::AppError,
    routes::json::ApiJson,
    services::review_service,
    state::SharedState,
};

/// Review endpoints, including reactions and comments.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/reviews", get(list_reviews).post(create_review))
        .route(
            "/reviews/{id}",
            get(get_review).put(update_review).delete(delete_review),
        )
        .route("/reviews/game/{game_id}", get(list_reviews_for_game))
        .route("/reviews/{id}/like", post(toggle_like))
        .route("/reviews/{id}/dislike", post(dislike))
        .route("/reviews/{id}/comment", post(add_comment))
}

/// List reviews, newest first, optionally restricted to one game.
#[utoipa::path(
    get,
    path = "/api/reviews",
    tag = "reviews",
    params(ReviewListQuery),
    responses((status = 200, description = "Reviews", body = [ReviewResponse]))
)]
pub async fn list_reviews(
    State(state): State<SharedState>,
    Query(query): Query<ReviewListQuery>,
) -> Result<Json<Vec<ReviewResponse>>, AppError> {
    Ok(Json(review_service::list_reviews(&state, query).await?))
}

/// Publish a review and fold its score into the game's rating.
///
/// Secondary updates on the game that failed are listed in `sync_warnings`.
#[utoipa::path(
    post,
    path = "/api/reviews",
    tag = "reviews",
    request_body = CreateReviewRequest,
    responses(
        (status = 201, description = "Review created", body = ReviewWriteResponse),
        (status = 400, description = "Missing or invalid field"),
        (status = 404, description = "Unknown game")
    )
)]
pub async fn create_review(
    State(state): State<SharedState>,
    ApiJson(payload): ApiJson<CreateReviewRequest>,
) -> Result<(StatusCode, Json<ReviewWriteResponse>), AppError> {
    let synced = review_service::create_review(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(synced.into())))
}

/// Retrieve a review with its comments.
#[utoipa::path(
    get,
    path = "/api/reviews/{id}",
    tag = "reviews",
    params(("id" = String, Path, description = "Identifier of the review")),
    responses(
        (status = 200, description = "Review", body = ReviewResponse),
        (status = 404, description = "Unknown review")
    )
)]
pub async fn get_review(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<ReviewResponse>, AppError> {
    Ok(Json(review_service::get_review(&state, &id).await?))
}

/// Edit a review. Changing the score refreshes the game's rating.
#[utoipa::path(
    put,
    path = "/api/reviews/{id}",
    tag = "reviews",
    params(("id" = String, Path, description = "Identifier of the review")),
    request_body = UpdateReviewRequest,
    responses(
        (status = 200, description = "Review updated", body = ReviewWriteResponse),
        (status = 404, description = "Unknown review")
    )
)]
pub async fn update_review(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<UpdateReviewRequest>,
) -> Result<Json<ReviewWriteResponse>, AppError> {
    let synced = review_service::update_review(&state, &id, payload).await?;
    Ok(Json(synced.into()))
}

/// Delete a review and drop it from its game.
#[utoipa::path(
    delete,
    path = "/api/reviews/{id}",
    tag = "reviews",
    params(("id" = String, Path, description = "Identifier of the review")),
    responses(
        (status = 200, description = "Review deleted", body = ReviewDeletedResponse),
        (status = 404, description = "Unknown review")
    )
)]
pub async fn delete_review(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<ReviewDeletedResponse>, AppError> {
    let synced = review_service::delete_review(&state, &id).await?;
    Ok(Json(synced.into()))
}

/// Reviews of one game, newest first.
#[utoipa::path(
    get,
    path = "/api/reviews/game/{game_id}",
    tag = "reviews",
    params(("game_id" = String, Path, description = "Identifier of the game")),
    responses((status = 200, description = "Reviews of the game, newest first", body = [ReviewResponse]))
)]
pub async fn list_reviews_for_game(
    State(state): State<SharedState>,
    Path(game_id): Path<String>,
) -> Result<Json<Vec<ReviewResponse>>, AppError> {
    Ok(Json(
        review_service::list_reviews_for_game(&state, &game_id).await?,
    ))
}

/// Like a review, or withdraw the like when the user already gave one.
#[utoipa::path(
    post,
    path = "/api/reviews/{id}/like",
    tag = "reviews",
    params(("id" = String, Path, description = "Identifier of the review")),
    request_body = LikeRequest,
    responses(
        (status = 200, description = "Like toggled", body = LikeResponse),
        (status = 404, description = "Unknown review")
    )
)]
pub async fn toggle_like(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<LikeRequest>,
) -> Result<Json<LikeResponse>, AppError> {
    Ok(Json(review_service::toggle_like(&state, &id, payload).await?))
}

/// Add one dislike to a review.
#[utoipa::path(
    post,
    path = "/api/reviews/{id}/dislike",
    tag = "reviews",
    params(("id" = String, Path, description = "Identifier of the review")),
    responses(
        (status = 200, description = "Dislike recorded", body = DislikeResponse),
        (status = 404, description = "Unknown review")
    )
)]
pub async fn dislike(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<DislikeResponse>, AppError> {
    Ok(Json(review_service::dislike(&state, &id).await?))
}

/// Append a comment to a review.
#[utoipa::path(
    post,
    path = "/api/reviews/{id}/comment",
    tag = "reviews",
    params(("id" = String, Path, description = "Identifier of the review")),
    request_body = CommentRequest,
    responses(
        (status = 201, description = "Comment added", body = CommentAddedResponse),
        (status = 400, description = "Missing author or text"),
        (status = 404, description = "Unknown review")
    )
)]
pub async fn add_comment(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<CommentRequest>,
) -> Result<(StatusCode, Json<CommentAddedResponse>), AppError> {
    let added = review_service::add_comment(&state, &id, payload).await?;
    Ok((StatusCode::CREATED, Json(added)))
}
