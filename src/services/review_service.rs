//! Business logic behind the review routes.
//!
//! A review is written first; the parent game's review references and rating
//! are secondary updates applied afterwards under the game's lock. Failures of
//! the secondary updates never fail the request: they are logged and returned
//! as [`SyncWarning`]s next to the primary result.

use std::time::SystemTime;

use indexmap::IndexSet;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::{
        catalog_store::CatalogStore,
        id::EntityId,
        models::{CommentEntity, ReviewEntity, ReviewFilter},
    },
    dto::review::{
        CommentAddedResponse, CommentRequest, CreateReviewRequest, DislikeResponse, LikeRequest,
        LikeResponse, ReviewDeletedResponse, ReviewListQuery, ReviewResponse, ReviewWriteResponse,
        UpdateReviewRequest,
    },
    error::ServiceError,
    services::{parse_id, required},
    state::{LockScope, SharedState},
};

/// Secondary update on the parent game that could not be applied.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SyncWarning {
    /// The review points at a game that has been deleted.
    #[error("game {game_id} no longer exists")]
    GameMissing { game_id: EntityId },
    /// The review was stored but the game does not reference it.
    #[error("failed to link review {review_id} to game {game_id}: {reason}")]
    LinkFailed {
        game_id: EntityId,
        review_id: EntityId,
        reason: String,
    },
    /// The review was deleted but the game still references it.
    #[error("failed to unlink review {review_id} from game {game_id}: {reason}")]
    UnlinkFailed {
        game_id: EntityId,
        review_id: EntityId,
        reason: String,
    },
    /// The game's rating may be stale.
    #[error("failed to recompute rating of game {game_id}: {reason}")]
    RatingFailed { game_id: EntityId, reason: String },
}

/// Result of a primary write together with the secondary updates that failed.
#[derive(Debug)]
pub struct Synced<T> {
    /// Outcome of the primary write.
    pub value: T,
    pub warnings: Vec<SyncWarning>,
}

impl<T> Synced<T> {
    /// Pair a primary result with the warnings collected while syncing the game.
    pub fn new(value: T, warnings: Vec<SyncWarning>) -> Self {
        Self { value, warnings }
    }

    /// True when every secondary update went through.
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    fn warning_messages(&self) -> Vec<String> {
        self.warnings.iter().map(ToString::to_string).collect()
    }
}

impl From<Synced<ReviewResponse>> for ReviewWriteResponse {
    fn from(synced: Synced<ReviewResponse>) -> Self {
        let sync_warnings = synced.warning_messages();
        Self {
            review: synced.value,
            sync_warnings,
        }
    }
}

impl From<Synced<()>> for ReviewDeletedResponse {
    fn from(synced: Synced<()>) -> Self {
        Self {
            message: "review deleted".into(),
            sync_warnings: synced.warning_messages(),
        }
    }
}

/// Arithmetic mean of the scores, or 0 when there are no reviews.
pub fn average_score(reviews: &[ReviewEntity]) -> f64 {
    if reviews.is_empty() {
        return 0.0;
    }
    reviews.iter().map(|review| review.score).sum::<f64>() / reviews.len() as f64
}

/// Newest first; ids break ties so the order is stable.
fn sort_newest_first(reviews: &mut [ReviewEntity]) {
    reviews.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}

fn log_warnings(warnings: &[SyncWarning]) {
    for warning in warnings {
        warn!(warning = %warning, "review/game sync incomplete");
    }
}

/// Recompute the game's rating from every review pointing at it.
async fn refresh_rating(store: &dyn CatalogStore, game_id: &EntityId) -> Result<f64, SyncWarning> {
    let rating_failed = |reason: String| SyncWarning::RatingFailed {
        game_id: game_id.clone(),
        reason,
    };

    let reviews = store
        .find_reviews(ReviewFilter::for_game(game_id.clone()))
        .await
        .map_err(|err| rating_failed(err.to_string()))?;
    let rating = average_score(&reviews);

    match store.set_game_rating(game_id.clone(), rating).await {
        Ok(true) => {
            debug!(game_id = %game_id, rating, reviews = reviews.len(), "game rating refreshed");
            Ok(rating)
        }
        Ok(false) => Err(SyncWarning::GameMissing {
            game_id: game_id.clone(),
        }),
        Err(err) => Err(rating_failed(err.to_string())),
    }
}

/// Reference a freshly created review from its game and refresh the rating.
async fn link_review(
    store: &dyn CatalogStore,
    game_id: &EntityId,
    review_id: &EntityId,
) -> Vec<SyncWarning> {
    let mut warnings = Vec::new();
    match store
        .push_game_review(game_id.clone(), review_id.clone())
        .await
    {
        Ok(true) => {
            if let Err(warning) = refresh_rating(store, game_id).await {
                warnings.push(warning);
            }
        }
        Ok(false) => warnings.push(SyncWarning::GameMissing {
            game_id: game_id.clone(),
        }),
        Err(err) => {
            warnings.push(SyncWarning::LinkFailed {
                game_id: game_id.clone(),
                review_id: review_id.clone(),
                reason: err.to_string(),
            });
            if let Err(warning) = refresh_rating(store, game_id).await {
                warnings.push(warning);
            }
        }
    }
    warnings
}

/// Drop the reference to a deleted review and refresh the rating.
async fn unlink_review(
    store: &dyn CatalogStore,
    game_id: &EntityId,
    review_id: &EntityId,
) -> Vec<SyncWarning> {
    let mut warnings = Vec::new();
    match store
        .pull_game_review(game_id.clone(), review_id.clone())
        .await
    {
        Ok(true) => {
            if let Err(warning) = refresh_rating(store, game_id).await {
                warnings.push(warning);
            }
        }
        Ok(false) => warnings.push(SyncWarning::GameMissing {
            game_id: game_id.clone(),
        }),
        Err(err) => {
            warnings.push(SyncWarning::UnlinkFailed {
                game_id: game_id.clone(),
                review_id: review_id.clone(),
                reason: err.to_string(),
            });
            if let Err(warning) = refresh_rating(store, game_id).await {
                warnings.push(warning);
            }
        }
    }
    warnings
}

// ---------------------------------------------------------------------------
// Read-only projections
// ---------------------------------------------------------------------------

/// All reviews, or those of `query.game_id`, newest first.
pub async fn list_reviews(
    state: &SharedState,
    query: ReviewListQuery,
) -> Result<Vec<ReviewResponse>, ServiceError> {
    let filter = match query.game_id.as_deref() {
        Some(raw) => ReviewFilter::for_game(parse_id(raw)?),
        None => ReviewFilter::default(),
    };
    let store = state.require_catalog_store().await?;
    let mut reviews = store.find_reviews(filter).await?;
    sort_newest_first(&mut reviews);
    Ok(reviews.into_iter().map(Into::into).collect())
}

/// Reviews of one game, newest first. An unknown game simply has no reviews.
pub async fn list_reviews_for_game(
    state: &SharedState,
    game_id: &str,
) -> Result<Vec<ReviewResponse>, ServiceError> {
    list_reviews(
        state,
        ReviewListQuery {
            game_id: Some(game_id.to_owned()),
        },
    )
    .await
}

/// Load one review with its comments.
pub async fn get_review(state: &SharedState, id: &str) -> Result<ReviewResponse, ServiceError> {
    let id = parse_id(id)?;
    let store = state.require_catalog_store().await?;
    store
        .find_review(id.clone())
        .await?
        .map(Into::into)
        .ok_or_else(|| ServiceError::NotFound(format!("review `{id}` not found")))
}

// ---------------------------------------------------------------------------
// Review–game sync
// ---------------------------------------------------------------------------

/// Persist a review, then reference it from its game and refresh the game's rating.
pub async fn create_review(
    state: &SharedState,
    request: CreateReviewRequest,
) -> Result<Synced<ReviewResponse>, ServiceError> {
    request.validate()?;
    let game_id = parse_id(&required(request.game_id, "game_id")?)?;
    let user_name = required(request.user_name, "user_name")?.trim().to_owned();
    let score = required(request.score, "score")?;

    let store = state.require_catalog_store().await?;
    if store.find_game(game_id.clone()).await?.is_none() {
        return Err(ServiceError::NotFound(format!("game `{game_id}` not found")));
    }

    let now = SystemTime::now();
    let review = store
        .insert_review(ReviewEntity {
            id: EntityId::generate(),
            game_id: game_id.clone(),
            user_name,
            title: request.title.unwrap_or_default(),
            body: request.body.unwrap_or_default(),
            score,
            likes: 0,
            dislikes: 0,
            liked_by: IndexSet::new(),
            comments: Vec::new(),
            created_at: now,
            updated_at: now,
        })
        .await?;
    info!(review_id = %review.id, game_id = %game_id, score, "review created");

    let warnings = {
        let _guard = state.locks().lock(LockScope::Game, &game_id).await;
        link_review(store.as_ref(), &game_id, &review.id).await
    };
    log_warnings(&warnings);

    Ok(Synced::new(review.into(), warnings))
}

/// Delete a review, then drop its reference from the game and refresh the game's rating.
pub async fn delete_review(state: &SharedState, id: &str) -> Result<Synced<()>, ServiceError> {
    let id = parse_id(id)?;
    let store = state.require_catalog_store().await?;

    let Some(review) = store.delete_review(id.clone()).await? else {
        return Err(ServiceError::NotFound(format!("review `{id}` not found")));
    };
    info!(review_id = %id, game_id = %review.game_id, "review deleted");

    let warnings = {
        let _guard = state.locks().lock(LockScope::Game, &review.game_id).await;
        unlink_review(store.as_ref(), &review.game_id, &id).await
    };
    log_warnings(&warnings);

    Ok(Synced::new((), warnings))
}

/// Edit title, body or score. A score change refreshes the game's rating.
pub async fn update_review(
    state: &SharedState,
    id: &str,
    request: UpdateReviewRequest,
) -> Result<Synced<ReviewResponse>, ServiceError> {
    request.validate()?;
    let id = parse_id(id)?;
    let store = state.require_catalog_store().await?;

    let _guard = state.locks().lock(LockScope::Review, &id).await;
    let Some(mut review) = store.find_review(id.clone()).await? else {
        return Err(ServiceError::NotFound(format!("review `{id}` not found")));
    };

    let score_changed = request.score.is_some_and(|score| score != review.score);
    if let Some(title) = request.title {
        review.title = title;
    }
    if let Some(body) = request.body {
        review.body = body;
    }
    if let Some(score) = request.score {
        review.score = score;
    }
    review.updated_at = SystemTime::now();

    if !store.save_review(review.clone()).await? {
        return Err(ServiceError::NotFound(format!("review `{id}` not found")));
    }
    debug!(review_id = %id, score_changed, "review updated");

    let mut warnings = Vec::new();
    if score_changed {
        let _game_guard = state.locks().lock(LockScope::Game, &review.game_id).await;
        if let Err(warning) = refresh_rating(store.as_ref(), &review.game_id).await {
            warnings.push(warning);
        }
    }
    log_warnings(&warnings);

    Ok(Synced::new(review.into(), warnings))
}

// ---------------------------------------------------------------------------
// Reactions
// ---------------------------------------------------------------------------

/// Like the review for `user_name`, or withdraw the like when already given.
pub async fn toggle_like(
    state: &SharedState,
    id: &str,
    request: LikeRequest,
) -> Result<LikeResponse, ServiceError> {
    request.validate()?;
    let id = parse_id(id)?;
    let user_name = required(request.user_name, "user_name")?.trim().to_owned();
    let store = state.require_catalog_store().await?;

    let _guard = state.locks().lock(LockScope::Review, &id).await;
    let Some(mut review) = store.find_review(id.clone()).await? else {
        return Err(ServiceError::NotFound(format!("review `{id}` not found")));
    };

    let liked = review.toggle_like(&user_name);
    review.updated_at = SystemTime::now();
    if !store.save_review(review.clone()).await? {
        return Err(ServiceError::NotFound(format!("review `{id}` not found")));
    }
    debug!(review_id = %id, user_name = %user_name, liked, likes = review.likes, "review like toggled");

    Ok(LikeResponse {
        liked,
        likes: review.likes,
        liked_by: review.liked_by.into_iter().collect(),
    })
}

/// Increment the dislike counter. Dislikes are anonymous and not toggled.
pub async fn dislike(state: &SharedState, id: &str) -> Result<DislikeResponse, ServiceError> {
    let id = parse_id(id)?;
    let store = state.require_catalog_store().await?;

    let _guard = state.locks().lock(LockScope::Review, &id).await;
    let Some(mut review) = store.find_review(id.clone()).await? else {
        return Err(ServiceError::NotFound(format!("review `{id}` not found")));
    };

    review.dislikes += 1;
    review.updated_at = SystemTime::now();
    if !store.save_review(review.clone()).await? {
        return Err(ServiceError::NotFound(format!("review `{id}` not found")));
    }

    Ok(DislikeResponse {
        dislikes: review.dislikes,
    })
}

/// Append a comment to the review's thread.
pub async fn add_comment(
    state: &SharedState,
    id: &str,
    request: CommentRequest,
) -> Result<CommentAddedResponse, ServiceError> {
    request.validate()?;
    let id = parse_id(id)?;
    let user_name = required(request.user_name, "user_name")?.trim().to_owned();
    let text = required(request.text, "text")?;
    let store = state.require_catalog_store().await?;

    let _guard = state.locks().lock(LockScope::Review, &id).await;
    let Some(mut review) = store.find_review(id.clone()).await? else {
        return Err(ServiceError::NotFound(format!("review `{id}` not found")));
    };

    let now = SystemTime::now();
    let comment = CommentEntity {
        id: Uuid::new_v4(),
        user_name,
        user_avatar: request.user_avatar,
        text,
        created_at: now,
    };
    review.comments.push(comment.clone());
    review.updated_at = now;
    if !store.save_review(review.clone()).await? {
        return Err(ServiceError::NotFound(format!("review `{id}` not found")));
    }
    debug!(review_id = %id, comment_id = %comment.id, "comment added");

    Ok(CommentAddedResponse {
        comment: comment.into(),
        comments: review.comments.into_iter().map(Into::into).collect(),
    })
}
