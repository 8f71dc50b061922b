//! DTOs for review routes, including likes, dislikes and comments.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{CommentEntity, ReviewEntity},
    dto::{
        format_system_time,
        validation::{validate_entity_id, validate_not_blank},
    },
};

/// Payload used to publish a review for a game.
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct CreateReviewRequest {
    #[validate(required, custom(function = "validate_entity_id"))]
    #[serde(alias = "gameId")]
    pub game_id: Option<String>,
    #[validate(required, custom(function = "validate_not_blank"))]
    #[serde(alias = "userName")]
    pub user_name: Option<String>,
    /// Score between 0 and 5.
    #[validate(required, range(min = 0.0, max = 5.0))]
    pub score: Option<f64>,
    pub title: Option<String>,
    #[serde(alias = "text")]
    pub body: Option<String>,
}

/// Partial update of a review. The parent game cannot be changed.
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct UpdateReviewRequest {
    pub title: Option<String>,
    #[serde(alias = "text")]
    pub body: Option<String>,
    #[validate(range(min = 0.0, max = 5.0))]
    pub score: Option<f64>,
}

/// Identifies who is liking a review.
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct LikeRequest {
    #[validate(required, custom(function = "validate_not_blank"))]
    #[serde(alias = "userName")]
    pub user_name: Option<String>,
}

/// Comment appended under a review.
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct CommentRequest {
    #[validate(required, custom(function = "validate_not_blank"))]
    #[serde(alias = "userName")]
    pub user_name: Option<String>,
    #[validate(required, custom(function = "validate_not_blank"))]
    pub text: Option<String>,
    #[serde(alias = "userAvatar")]
    pub user_avatar: Option<String>,
}

/// Optional filter for `GET /api/reviews`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReviewListQuery {
    /// Only return the reviews of this game.
    pub game_id: Option<String>,
}

/// Public projection of a comment.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CommentResponse {
    pub id: Uuid,
    pub user_name: String,
    pub user_avatar: Option<String>,
    pub text: String,
    pub created_at: String,
}

/// Public projection of a review.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReviewResponse {
    pub id: String,
    pub game_id: String,
    pub user_name: String,
    pub title: String,
    pub body: String,
    pub score: f64,
    pub likes: u64,
    pub dislikes: u64,
    pub liked_by: Vec<String>,
    pub comments: Vec<CommentResponse>,
    pub created_at: String,
    pub updated_at: String,
}

/// Review returned by create/update, with the secondary updates that could not be applied.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewWriteResponse {
    #[serde(flatten)]
    pub review: ReviewResponse,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sync_warnings: Vec<String>,
}

/// Acknowledgement of a review deletion.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewDeletedResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sync_warnings: Vec<String>,
}

/// Like state after a toggle.
#[derive(Debug, Serialize, ToSchema)]
pub struct LikeResponse {
    /// Whether the caller likes the review now.
    pub liked: bool,
    pub likes: u64,
    pub liked_by: Vec<String>,
}

/// Dislike count after the increment.
#[derive(Debug, Serialize, ToSchema)]
pub struct DislikeResponse {
    pub dislikes: u64,
}

/// The new comment and the full thread it was appended to.
#[derive(Debug, Serialize, ToSchema)]
pub struct CommentAddedResponse {
    pub comment: CommentResponse,
    pub comments: Vec<CommentResponse>,
}

impl From<CommentEntity> for CommentResponse {
    fn from(comment: CommentEntity) -> Self {
        Self {
            id: comment.id,
            user_name: comment.user_name,
            user_avatar: comment.user_avatar,
            text: comment.text,
            created_at: format_system_time(comment.created_at),
        }
    }
}

impl From<ReviewEntity> for ReviewResponse {
    fn from(review: ReviewEntity) -> Self {
        Self {
            id: review.id.to_string(),
            game_id: review.game_id.to_string(),
            user_name: review.user_name,
            title: review.title,
            body: review.body,
            score: review.score,
            likes: review.likes,
            dislikes: review.dislikes,
            liked_by: review.liked_by.into_iter().collect(),
            comments: review.comments.into_iter().map(Into::into).collect(),
            created_at: format_system_time(review.created_at),
            updated_at: format_system_time(review.updated_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_review_requires_game_author_and_score() {
        assert!(CreateReviewRequest::default().validate().is_err());

        let valid = CreateReviewRequest {
            game_id: Some("65a1f0c2e4b0a1b2c3d4e5f6".into()),
            user_name: Some("ana".into()),
            score: Some(4.5),
            ..Default::default()
        };
        assert!(valid.validate().is_ok());
    }

    #[test]
    fn score_outside_range_is_rejected() {
        let request = CreateReviewRequest {
            game_id: Some("65a1f0c2e4b0a1b2c3d4e5f6".into()),
            user_name: Some("ana".into()),
            score: Some(5.5),
            ..Default::default()
        };
        assert!(request.validate().is_err());

        let update = UpdateReviewRequest {
            score: Some(-0.5),
            ..Default::default()
        };
        assert!(update.validate().is_err());
    }

    #[test]
    fn malformed_game_id_is_rejected() {
        let request = CreateReviewRequest {
            game_id: Some("not-an-id".into()),
            user_name: Some("ana".into()),
            score: Some(3.0),
            ..Default::default()
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn legacy_field_names_are_accepted() {
        let request: CreateReviewRequest = serde_json::from_str(
            r#"{"gameId": "65a1f0c2e4b0a1b2c3d4e5f6", "userName": "ana", "score": 2, "text": "ok"}"#,
        )
        .unwrap();
        assert_eq!(request.user_name.as_deref(), Some("ana"));
        assert_eq!(request.body.as_deref(), Some("ok"));
    }
}
