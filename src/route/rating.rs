use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use serde::Serialize;

use crate::context::Context;
use crate::data::course::db::CourseIdData;
use crate::data::rating::db::{AverageRating, CreateRatingData, RatingDbExt};
use crate::data::rating::{RatingAndReview, ReviewDetails};
use crate::resp::jwt::Student;
use crate::resp::problem::Problem;
use crate::resp::{Data, Reply};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedRating {
    pub rating_review: RatingAndReview,
}

/// Review an enrolled course
#[utoipa::path(
    request_body = CreateRatingData,
    responses(
        (status = 201, description = "Review created", body = RatingAndReview),
        (status = 400, description = "Missing fields or rating out of range", body = Problem),
        (status = 403, description = "Course already reviewed", body = Problem),
        (status = 404, description = "Not enrolled in the course", body = Problem),
    ),
    security(("jwt" = []), ("token_cookie" = []))
)]
#[post("/ratings", format = "json", data = "<data>")]
#[tracing::instrument(skip(ctx))]
pub async fn rating_create(
    data: Json<CreateRatingData>,
    student: Student,
    ctx: &State<Context>,
) -> Result<(Status, Json<Reply<CreatedRating>>), Problem> {
    let rating_review = ctx.create_rating(&student.0.id, data.into_inner()).await?;
    Ok((
        Status::Created,
        Json(
            Reply::new(CreatedRating { rating_review })
                .message("Rating and Review created Successfully"),
        ),
    ))
}

/// Average rating of a course
#[utoipa::path(
    request_body = CourseIdData,
    responses((status = 200, description = "Average of every rating, 0 without any", body = AverageRating))
)]
#[post("/ratings/average", format = "json", data = "<data>")]
#[tracing::instrument(skip(ctx))]
pub async fn rating_average(
    data: Json<CourseIdData>,
    ctx: &State<Context>,
) -> Result<Json<Reply<AverageRating>>, Problem> {
    let course = data.validate()?;
    let average = ctx.average_rating(&course).await?;
    let unrated = average.average_rating == 0.0;
    let reply = Reply::new(average);
    if unrated {
        return Ok(Json(
            reply.message("Average Rating is 0, no ratings given till now"),
        ));
    }
    Ok(Json(reply))
}

/// Every review, best first
#[utoipa::path(responses((status = 200, description = "All reviews with author and course")))]
#[get("/ratings")]
#[tracing::instrument(skip(ctx))]
pub async fn rating_list(
    ctx: &State<Context>,
) -> Result<Json<Reply<Data<Vec<ReviewDetails>>>>, Problem> {
    Ok(Json(
        Reply::data(ctx.all_ratings().await?).message("All reviews fetched successfully"),
    ))
}
