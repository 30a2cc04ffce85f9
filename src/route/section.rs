use rocket::form::Form;
use rocket::fs::TempFile;
use rocket::serde::json::Json;
use rocket::State;

use super::read_upload;
use crate::context::Context;
use crate::data::course::CourseDetails;
use crate::data::section::db::{
    CreateSectionData, DeleteSectionData, DeleteSubSectionData, SectionDbExt, SubSectionData,
    UpdateSectionData,
};
use crate::data::section::SectionContent;
use crate::resp::jwt::Instructor;
use crate::resp::problem::Problem;
use crate::resp::{Data, Reply};

/// Create a section at the end of a course
#[utoipa::path(
    request_body = CreateSectionData,
    responses(
        (status = 200, description = "Course with the new section"),
        (status = 400, description = "Missing fields", body = Problem),
        (status = 404, description = "Unknown course", body = Problem),
    ),
    security(("jwt" = []), ("token_cookie" = []))
)]
#[post("/sections", format = "json", data = "<data>")]
#[tracing::instrument(skip(ctx))]
pub async fn section_create(
    data: Json<CreateSectionData>,
    instructor: Instructor,
    ctx: &State<Context>,
) -> Result<Json<Reply<Data<CourseDetails>>>, Problem> {
    let course = ctx.create_section(&instructor.0.id, data.into_inner()).await?;
    Ok(Json(
        Reply::data(course).message("Section created successfully"),
    ))
}

/// Rename a section
#[utoipa::path(
    request_body = UpdateSectionData,
    responses(
        (status = 200, description = "Course with the renamed section"),
        (status = 404, description = "Unknown section", body = Problem),
    ),
    security(("jwt" = []), ("token_cookie" = []))
)]
#[put("/sections", format = "json", data = "<data>")]
#[tracing::instrument(skip(ctx))]
pub async fn section_update(
    data: Json<UpdateSectionData>,
    instructor: Instructor,
    ctx: &State<Context>,
) -> Result<Json<Reply<Data<CourseDetails>>>, Problem> {
    let course = ctx.update_section(&instructor.0.id, data.into_inner()).await?;
    Ok(Json(
        Reply::data(course).message("Section updated successfully"),
    ))
}

/// Delete a section and its lessons
#[utoipa::path(
    request_body = DeleteSectionData,
    responses(
        (status = 200, description = "Course without the section"),
        (status = 404, description = "Unknown section", body = Problem),
    ),
    security(("jwt" = []), ("token_cookie" = []))
)]
#[delete("/sections", format = "json", data = "<data>")]
#[tracing::instrument(skip(ctx))]
pub async fn section_delete(
    data: Json<DeleteSectionData>,
    instructor: Instructor,
    ctx: &State<Context>,
) -> Result<Json<Reply<Data<CourseDetails>>>, Problem> {
    let course = ctx.delete_section(&instructor.0.id, data.into_inner()).await?;
    Ok(Json(
        Reply::data(course).message("Section deleted successfully"),
    ))
}

/// Multipart lesson form shared by creation and updates.
#[derive(Debug, FromForm)]
pub struct SubSectionForm<'r> {
    #[field(name = "sectionId")]
    pub section_id: Option<String>,
    #[field(name = "subSectionId")]
    pub sub_section_id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub video: Option<TempFile<'r>>,
}

impl SubSectionForm<'_> {
    async fn into_data(self) -> Result<SubSectionData, Problem> {
        let video = read_upload(self.video.as_ref()).await?;
        Ok(SubSectionData {
            section_id: self.section_id,
            sub_section_id: self.sub_section_id,
            title: self.title,
            description: self.description,
            video,
        })
    }
}

/// Upload a lesson video into a section
#[utoipa::path(
    responses(
        (status = 200, description = "Section with the new lesson"),
        (status = 404, description = "Missing fields or unknown section", body = Problem),
    ),
    security(("jwt" = []), ("token_cookie" = []))
)]
#[post("/subsections", data = "<form>")]
#[tracing::instrument(skip(ctx))]
pub async fn sub_section_create(
    form: Form<SubSectionForm<'_>>,
    instructor: Instructor,
    ctx: &State<Context>,
) -> Result<Json<Reply<Data<SectionContent>>>, Problem> {
    let data = form.into_inner().into_data().await?;
    let section = ctx.create_sub_section(&instructor.0.id, data).await?;
    Ok(Json(Reply::data(section)))
}

/// Change a lesson's title, description or video
#[utoipa::path(
    responses(
        (status = 200, description = "Section with the updated lesson"),
        (status = 404, description = "Unknown lesson", body = Problem),
    ),
    security(("jwt" = []), ("token_cookie" = []))
)]
#[put("/subsections", data = "<form>")]
#[tracing::instrument(skip(ctx))]
pub async fn sub_section_update(
    form: Form<SubSectionForm<'_>>,
    instructor: Instructor,
    ctx: &State<Context>,
) -> Result<Json<Reply<Data<SectionContent>>>, Problem> {
    let data = form.into_inner().into_data().await?;
    let section = ctx.update_sub_section(&instructor.0.id, data).await?;
    Ok(Json(
        Reply::data(section).message("SubSection updated successfully"),
    ))
}

/// Delete a lesson
#[utoipa::path(
    request_body = DeleteSubSectionData,
    responses(
        (status = 200, description = "Section without the lesson"),
        (status = 404, description = "Unknown lesson", body = Problem),
    ),
    security(("jwt" = []), ("token_cookie" = []))
)]
#[delete("/subsections", format = "json", data = "<data>")]
#[tracing::instrument(skip(ctx))]
pub async fn sub_section_delete(
    data: Json<DeleteSubSectionData>,
    instructor: Instructor,
    ctx: &State<Context>,
) -> Result<Json<Reply<Data<SectionContent>>>, Problem> {
    let section = ctx
        .delete_sub_section(&instructor.0.id, data.into_inner())
        .await?;
    Ok(Json(
        Reply::data(section).message("SubSection deleted successfully"),
    ))
}
