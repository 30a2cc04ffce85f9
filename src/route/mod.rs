use std::collections::BTreeMap;

use rocket::fs::TempFile;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{Build, Catcher, Request, Rocket, Route};

pub mod category;
pub mod course;
pub mod profile;
pub mod rating;
pub mod section;

use category::*;
use course::*;
use profile::*;
use rating::*;
use section::*;

use utoipa::OpenApi;

use crate::{
    data::{
        category as cd, course as cod, progress as pd, rating as rd, section as sd, user as ud,
        Id,
    },
    media::MediaFile,
    resp::{
        jwt::{doc::JWTAuth, AuthFailure},
        problem::{problems, Problem},
    },
    role::AccountType,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        category_create,
        category_list,
        category_page,
        course_create,
        course_list,
        course_details,
        course_full_details,
        course_edit,
        course_instructor_list,
        course_delete,
        course_enroll,
        course_progress,
        section_create,
        section_update,
        section_delete,
        sub_section_create,
        sub_section_update,
        sub_section_delete,
        rating_create,
        rating_average,
        rating_list,
        profile_get,
        profile_update,
        profile_delete,
        profile_display_picture,
        profile_enrolled_courses,
        profile_instructor_dashboard
    ),
    components(schemas(
        Id,
        AccountType,
        cd::Category,
        cd::db::CreateCategoryData,
        cd::db::CategoryPageData,
        cod::Course,
        cod::CourseStatus,
        cod::CourseStats,
        cod::db::CourseIdData,
        cod::db::EnrollData,
        cod::db::ProgressData,
        pd::CourseProgress,
        sd::Section,
        sd::SubSection,
        sd::db::CreateSectionData,
        sd::db::UpdateSectionData,
        sd::db::DeleteSectionData,
        sd::db::DeleteSubSectionData,
        rd::RatingAndReview,
        rd::Reviewer,
        rd::ReviewedCourse,
        rd::ReviewDetails,
        rd::db::CreateRatingData,
        rd::db::AverageRating,
        ud::User,
        ud::Profile,
        ud::UserDetails,
        ud::db::UpdateProfileData,
        Problem
    )),
    modifiers(&JWTAuth, &V1_PREFIX)
)]
pub struct ApiDocV1;

pub struct PathPrefix(pub &'static str);
static V1_PREFIX: PathPrefix = PathPrefix("/api/v1");

impl utoipa::Modify for PathPrefix {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let mut new_paths = BTreeMap::new();

        for (path, item) in std::mem::take(&mut openapi.paths.paths) {
            new_paths.insert(self.0.to_string() + path.as_ref(), item);
        }

        openapi.paths.paths = new_paths;
    }
}

/// Reads an optional multipart upload. Empty file parts count as missing.
pub(crate) async fn read_upload(file: Option<&TempFile<'_>>) -> Result<Option<MediaFile>, Problem> {
    match file {
        Some(it) if it.len() > 0 => Ok(Some(MediaFile::read(it).await?)),
        _ => Ok(None),
    }
}

#[get("/openapi.json")]
pub fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDocV1::openapi())
}

#[catch(401)]
fn unauthorized(req: &Request) -> Problem {
    req.local_cache(|| AuthFailure(Problem::new_untyped(Status::Unauthorized, "Unauthorized")))
        .0
        .clone()
}

#[catch(404)]
fn not_found(req: &Request) -> Problem {
    Problem::new_untyped(Status::NotFound, "Resource not found")
        .insert_str("path", req.uri().path())
        .clone()
}

#[catch(400)]
fn bad_request() -> Problem {
    problems::parse_problem()
}

#[catch(422)]
fn unprocessable() -> Problem {
    let mut problem = problems::parse_problem();
    problem.status = Status::UnprocessableEntity;
    problem
}

#[catch(default)]
fn fallback(status: Status, _req: &Request) -> Problem {
    Problem::new_untyped(status, status.reason().unwrap_or("Request failed"))
}

pub fn api_v1() -> Vec<Route> {
    routes![
        openapi_json,
        category_create,
        category_list,
        category_page,
        course_create,
        course_list,
        course_details,
        course_full_details,
        course_edit,
        course_instructor_list,
        course_delete,
        course_enroll,
        course_progress,
        section_create,
        section_update,
        section_delete,
        sub_section_create,
        sub_section_update,
        sub_section_delete,
        rating_create,
        rating_average,
        rating_list,
        profile_get,
        profile_update,
        profile_delete,
        profile_display_picture,
        profile_enrolled_courses,
        profile_instructor_dashboard
    ]
}

pub fn catchers() -> Vec<Catcher> {
    catchers![unauthorized, not_found, bad_request, unprocessable, fallback]
}

pub fn mount_api(rocket: Rocket<Build>) -> Rocket<Build> {
    rocket
        .mount("/api/v1", api_v1())
        .register("/", catchers())
}
