use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::Id;

pub mod db;

pub static RATING_COLLECTION_NAME: &str = "ratingandreviews";

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RatingAndReview {
    #[serde(rename = "_id")]
    pub id: Id,
    pub user: Id,
    pub rating: u8,
    pub review: String,
    pub course: Id,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Reviewer {
    #[serde(rename = "_id")]
    pub id: Id,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub image: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewedCourse {
    #[serde(rename = "_id")]
    pub id: Id,
    pub course_name: String,
}

/// A review with its author and course populated.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewDetails {
    #[serde(rename = "_id")]
    pub id: Id,
    pub rating: u8,
    pub review: String,
    pub user: Option<Reviewer>,
    pub course: Option<ReviewedCourse>,
}

/// Mean of the given ratings, 0 when there are none.
pub fn average(ratings: &[RatingAndReview]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }
    let sum: u64 = ratings.iter().map(|r| r.rating as u64).sum();
    sum as f64 / ratings.len() as f64
}
