use rocket::form::Form;
use rocket::fs::TempFile;
use rocket::serde::json::Json;
use rocket::State;

use super::read_upload;
use crate::context::Context;
use crate::data::course::db::problem as course_problem;
use crate::data::course::db::{
    CourseData, CourseDbExt, CourseDetailsPage, CourseIdData, EnrollData, FullCourseDetailsPage,
    ProgressData,
};
use crate::data::course::{Course, CourseDetails, CourseSummary};
use crate::data::progress::CourseProgress;
use crate::data::Id;
use crate::resp::jwt::{AuthToken, Instructor, Student};
use crate::resp::problem::{problems, Problem};
use crate::resp::{Data, Empty, Reply};

/// Multipart course form shared by creation and editing.
#[derive(Debug, FromForm)]
pub struct CourseForm<'r> {
    #[field(name = "courseId")]
    pub course_id: Option<String>,
    #[field(name = "courseName")]
    pub course_name: Option<String>,
    #[field(name = "courseDescription")]
    pub course_description: Option<String>,
    #[field(name = "whatYouWillLearn")]
    pub what_you_will_learn: Option<String>,
    pub price: Option<String>,
    pub tag: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
    pub instructions: Option<String>,
    #[field(name = "thumbnailImage")]
    pub thumbnail_image: Option<TempFile<'r>>,
}

impl CourseForm<'_> {
    async fn into_data(self) -> Result<CourseData, Problem> {
        let thumbnail = read_upload(self.thumbnail_image.as_ref()).await?;
        Ok(CourseData {
            course_name: self.course_name,
            course_description: self.course_description,
            what_you_will_learn: self.what_you_will_learn,
            price: self.price,
            tag: self.tag,
            category: self.category,
            status: self.status,
            instructions: self.instructions,
            thumbnail,
        })
    }
}

/// Create a course
#[utoipa::path(
    responses(
        (status = 200, description = "Created course"),
        (status = 400, description = "Missing or malformed fields", body = Problem),
        (status = 401, description = "Not an instructor", body = Problem),
        (status = 404, description = "Unknown category", body = Problem),
    ),
    security(("jwt" = []), ("token_cookie" = []))
)]
#[post("/courses", data = "<form>")]
#[tracing::instrument(skip(ctx))]
pub async fn course_create(
    form: Form<CourseForm<'_>>,
    instructor: Instructor,
    ctx: &State<Context>,
) -> Result<Json<Reply<Data<Course>>>, Problem> {
    let data = form.into_inner().into_data().await?;
    let course = ctx.create_course(&instructor.0.id, data).await?;
    Ok(Json(
        Reply::data(course).message("Course Created Successfully"),
    ))
}

/// List published courses
#[utoipa::path(responses((status = 200, description = "Published courses")))]
#[get("/courses")]
#[tracing::instrument(skip(ctx))]
pub async fn course_list(
    ctx: &State<Context>,
) -> Result<Json<Reply<Data<Vec<CourseSummary>>>>, Problem> {
    Ok(Json(Reply::data(ctx.list_published_courses().await?)))
}

/// Public details of a published course
#[utoipa::path(
    request_body = CourseIdData,
    responses(
        (status = 200, description = "Course with its outline and total duration"),
        (status = 403, description = "Course is a draft", body = Problem),
        (status = 404, description = "Unknown course", body = Problem),
    )
)]
#[post("/courses/details", format = "json", data = "<data>")]
#[tracing::instrument(skip(ctx))]
pub async fn course_details(
    data: Json<CourseIdData>,
    ctx: &State<Context>,
) -> Result<Json<Reply<Data<CourseDetailsPage>>>, Problem> {
    let id = data.validate()?;
    Ok(Json(Reply::data(ctx.course_details(&id).await?)))
}

/// Course details with lesson videos and the caller's progress
#[utoipa::path(
    request_body = CourseIdData,
    responses(
        (status = 200, description = "Full course content"),
        (status = 401, description = "Missing or invalid token", body = Problem),
        (status = 404, description = "Unknown course", body = Problem),
    ),
    security(("jwt" = []), ("token_cookie" = []))
)]
#[post("/courses/full-details", format = "json", data = "<data>")]
#[tracing::instrument(skip(ctx))]
pub async fn course_full_details(
    data: Json<CourseIdData>,
    auth: AuthToken,
    ctx: &State<Context>,
) -> Result<Json<Reply<Data<FullCourseDetailsPage>>>, Problem> {
    let id = data.validate()?;
    Ok(Json(Reply::data(ctx.full_course_details(&id, &auth).await?)))
}

/// Edit an owned course
#[utoipa::path(
    responses(
        (status = 200, description = "Updated course"),
        (status = 403, description = "Course owned by another instructor", body = Problem),
        (status = 404, description = "Unknown course", body = Problem),
    ),
    security(("jwt" = []), ("token_cookie" = []))
)]
#[post("/courses/edit", data = "<form>")]
#[tracing::instrument(skip(ctx))]
pub async fn course_edit(
    form: Form<CourseForm<'_>>,
    instructor: Instructor,
    ctx: &State<Context>,
) -> Result<Json<Reply<Data<CourseDetails>>>, Problem> {
    let form = form.into_inner();
    let id = match form.course_id.as_deref().map(str::parse::<Id>) {
        Some(Ok(id)) => id,
        Some(Err(e)) => return Err(course_problem::bad_field("courseId", e)),
        None => return Err(problems::missing_fields()),
    };
    let data = form.into_data().await?;

    let course = ctx.edit_course(&instructor.0.id, &id, data).await?;
    Ok(Json(
        Reply::data(course).message("Course updated successfully"),
    ))
}

/// Courses authored by the caller
#[utoipa::path(
    responses(
        (status = 200, description = "Instructor's courses, newest first"),
        (status = 401, description = "Not an instructor", body = Problem),
    ),
    security(("jwt" = []), ("token_cookie" = []))
)]
#[get("/courses/instructor")]
#[tracing::instrument(skip(ctx))]
pub async fn course_instructor_list(
    instructor: Instructor,
    ctx: &State<Context>,
) -> Result<Json<Reply<Data<Vec<Course>>>>, Problem> {
    Ok(Json(Reply::data(
        ctx.instructor_courses(&instructor.0.id).await?,
    )))
}

/// Delete an owned course with its content
#[utoipa::path(
    request_body = CourseIdData,
    responses(
        (status = 200, description = "Course deleted"),
        (status = 403, description = "Course owned by another instructor", body = Problem),
        (status = 404, description = "Unknown course", body = Problem),
    ),
    security(("jwt" = []), ("token_cookie" = []))
)]
#[delete("/courses", format = "json", data = "<data>")]
#[tracing::instrument(skip(ctx))]
pub async fn course_delete(
    data: Json<CourseIdData>,
    instructor: Instructor,
    ctx: &State<Context>,
) -> Result<Json<Reply<Empty>>, Problem> {
    let id = data.validate()?;
    ctx.delete_course(&instructor.0.id, &id).await?;
    Ok(Json(Reply::ok("Course deleted successfully")))
}

/// Enroll the caller into paid courses
#[utoipa::path(
    request_body = EnrollData,
    responses(
        (status = 200, description = "Student enrolled"),
        (status = 400, description = "No courses or already enrolled", body = Problem),
        (status = 403, description = "Course is a draft", body = Problem),
        (status = 404, description = "Unknown course", body = Problem),
    ),
    security(("jwt" = []), ("token_cookie" = []))
)]
#[post("/courses/enroll", format = "json", data = "<data>")]
#[tracing::instrument(skip(ctx))]
pub async fn course_enroll(
    data: Json<EnrollData>,
    student: Student,
    ctx: &State<Context>,
) -> Result<Json<Reply<Empty>>, Problem> {
    ctx.enroll_students(&student.0.id, &data.courses).await?;
    Ok(Json(Reply::ok("Student Enrolled Successfully")))
}

/// Mark a lesson as completed
#[utoipa::path(
    request_body = ProgressData,
    responses(
        (status = 200, description = "Progress updated"),
        (status = 400, description = "Lesson already completed", body = Problem),
        (status = 404, description = "Unknown lesson or not enrolled", body = Problem),
    ),
    security(("jwt" = []), ("token_cookie" = []))
)]
#[post("/courses/progress", format = "json", data = "<data>")]
#[tracing::instrument(skip(ctx))]
pub async fn course_progress(
    data: Json<ProgressData>,
    student: Student,
    ctx: &State<Context>,
) -> Result<Json<Reply<Data<CourseProgress>>>, Problem> {
    let (course, sub_section) = data.validate()?;
    let progress = ctx
        .update_course_progress(&student.0.id, &course, &sub_section)
        .await?;
    Ok(Json(
        Reply::data(progress).message("Course progress updated"),
    ))
}
