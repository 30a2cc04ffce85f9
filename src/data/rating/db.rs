use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{average, RatingAndReview, ReviewDetails, MAX_RATING, MIN_RATING};
use crate::context::Context;
use crate::data::Id;
use crate::resp::problem::{problems, Problem};
use crate::store::views;

pub mod problem {
    use crate::data::rating::{MAX_RATING, MIN_RATING};
    use crate::resp::problem::Problem;
    use rocket::http::Status;

    #[inline]
    pub fn not_enrolled() -> Problem {
        Problem::new_untyped(Status::NotFound, "Student is not enrolled in this course")
    }

    #[inline]
    pub fn already_reviewed() -> Problem {
        Problem::new_untyped(Status::Forbidden, "Course already reviewed by user")
    }

    #[inline]
    pub fn bad_rating(rating: u8) -> Problem {
        Problem::new_untyped(
            Status::BadRequest,
            format!("Rating must be between {} and {}", MIN_RATING, MAX_RATING),
        )
        .insert("rating", rating)
        .clone()
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRatingData {
    pub rating: Option<u8>,
    #[serde(default)]
    pub review: String,
    #[schema(value_type = Option<String>)]
    pub course_id: Option<Id>,
}

impl CreateRatingData {
    pub fn validate(&self) -> Result<(u8, Id), Problem> {
        let (Some(rating), Some(course)) = (self.rating, self.course_id) else {
            return Err(problems::missing_fields());
        };
        if self.review.trim().is_empty() {
            return Err(problems::missing_fields());
        }
        if !(MIN_RATING..=MAX_RATING).contains(&rating) {
            return Err(problem::bad_rating(rating));
        }
        Ok((rating, course))
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AverageRating {
    pub average_rating: f64,
}

pub trait RatingDbExt {
    async fn create_rating(
        &self,
        user: &Id,
        data: CreateRatingData,
    ) -> Result<RatingAndReview, Problem>;

    async fn average_rating(&self, course: &Id) -> Result<AverageRating, Problem>;

    async fn all_ratings(&self) -> Result<Vec<ReviewDetails>, Problem>;
}

impl RatingDbExt for Context {
    #[tracing::instrument(skip(self))]
    async fn create_rating(
        &self,
        user: &Id,
        data: CreateRatingData,
    ) -> Result<RatingAndReview, Problem> {
        let (rating, course) = data.validate()?;
        let store = self.store();

        match store.find_course(&course).await? {
            Some(it) if it.is_enrolled(user) => {}
            _ => return Err(problem::not_enrolled()),
        }
        if store.find_rating(user, &course).await?.is_some() {
            return Err(problem::already_reviewed());
        }

        let review = RatingAndReview {
            id: Id::new(),
            user: *user,
            rating,
            review: data.review.trim().to_string(),
            course,
        };
        store.insert_rating(&review).await?;
        store.push_course_rating(&course, &review.id).await?;

        tracing::info!("user {} rated course {} with {}", user, course, rating);
        Ok(review)
    }

    async fn average_rating(&self, course: &Id) -> Result<AverageRating, Problem> {
        let ratings = self.store().course_ratings(course).await?;
        Ok(AverageRating {
            average_rating: average(&ratings),
        })
    }

    async fn all_ratings(&self) -> Result<Vec<ReviewDetails>, Problem> {
        let store = self.store();
        let ratings = store.all_ratings().await?;
        Ok(views::review_details(store, ratings).await?)
    }
}
