use rocket::form::Form;
use rocket::fs::TempFile;
use rocket::http::{Cookie, CookieJar};
use rocket::serde::json::Json;
use rocket::State;
use serde::Serialize;

use super::read_upload;
use crate::context::Context;
use crate::data::course::{CourseStats, EnrolledCourse};
use crate::data::user::db::{ProfileDbExt, UpdateProfileData};
use crate::data::user::{User, UserDetails};
use crate::resp::jwt::{AuthToken, Instructor, AUTH_COOKIE_NAME};
use crate::resp::problem::Problem;
use crate::resp::{Data, Empty, Reply};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatedProfile {
    pub updated_user_details: UserDetails,
}

/// Account of the caller with its profile
#[utoipa::path(
    responses(
        (status = 200, description = "User with populated profile"),
        (status = 401, description = "Missing or invalid token", body = Problem),
        (status = 404, description = "Account no longer exists", body = Problem),
    ),
    security(("jwt" = []), ("token_cookie" = []))
)]
#[get("/profile")]
#[tracing::instrument(skip(ctx))]
pub async fn profile_get(
    auth: AuthToken,
    ctx: &State<Context>,
) -> Result<Json<Reply<Data<UserDetails>>>, Problem> {
    Ok(Json(
        Reply::data(ctx.user_details(&auth.id).await?).message("User Data fetched successfully"),
    ))
}

/// Update names and profile fields
#[utoipa::path(
    request_body = UpdateProfileData,
    responses(
        (status = 200, description = "Updated user with populated profile"),
        (status = 404, description = "Account no longer exists", body = Problem),
    ),
    security(("jwt" = []), ("token_cookie" = []))
)]
#[put("/profile", format = "json", data = "<data>")]
#[tracing::instrument(skip(ctx))]
pub async fn profile_update(
    data: Json<UpdateProfileData>,
    auth: AuthToken,
    ctx: &State<Context>,
) -> Result<Json<Reply<UpdatedProfile>>, Problem> {
    let updated_user_details = ctx.update_profile(&auth.id, data.into_inner()).await?;
    Ok(Json(
        Reply::new(UpdatedProfile {
            updated_user_details,
        })
        .message("Profile updated successfully"),
    ))
}

/// Delete the caller's account
#[utoipa::path(
    responses(
        (status = 200, description = "Account, profile and enrollments removed"),
        (status = 404, description = "Account no longer exists", body = Problem),
    ),
    security(("jwt" = []), ("token_cookie" = []))
)]
#[delete("/profile")]
#[tracing::instrument(skip(ctx, cookies))]
pub async fn profile_delete(
    auth: AuthToken,
    cookies: &CookieJar<'_>,
    ctx: &State<Context>,
) -> Result<Json<Reply<Empty>>, Problem> {
    ctx.delete_account(&auth.id).await?;
    cookies.remove(Cookie::new(AUTH_COOKIE_NAME, ""));
    Ok(Json(Reply::ok("User deleted successfully")))
}

#[derive(Debug, FromForm)]
pub struct DisplayPictureForm<'r> {
    #[field(name = "displayPicture")]
    pub display_picture: Option<TempFile<'r>>,
}

/// Replace the caller's avatar
#[utoipa::path(
    responses(
        (status = 200, description = "User with the new image URL"),
        (status = 400, description = "No picture uploaded", body = Problem),
    ),
    security(("jwt" = []), ("token_cookie" = []))
)]
#[put("/profile/display-picture", data = "<form>")]
#[tracing::instrument(skip(ctx))]
pub async fn profile_display_picture(
    form: Form<DisplayPictureForm<'_>>,
    auth: AuthToken,
    ctx: &State<Context>,
) -> Result<Json<Reply<Data<User>>>, Problem> {
    let picture = read_upload(form.display_picture.as_ref()).await?;
    let user = ctx.update_display_picture(&auth.id, picture).await?;
    Ok(Json(
        Reply::data(user).message("Image Updated successfully"),
    ))
}

/// Courses the caller is enrolled in, with progress
#[utoipa::path(
    responses((status = 200, description = "Enrolled courses with duration and completion")),
    security(("jwt" = []), ("token_cookie" = []))
)]
#[get("/profile/enrolled-courses")]
#[tracing::instrument(skip(ctx))]
pub async fn profile_enrolled_courses(
    auth: AuthToken,
    ctx: &State<Context>,
) -> Result<Json<Reply<Data<Vec<EnrolledCourse>>>>, Problem> {
    Ok(Json(Reply::data(ctx.enrolled_courses(&auth.id).await?)))
}

/// Enrollment and revenue figures per authored course
#[utoipa::path(
    responses(
        (status = 200, description = "Per-course statistics", body = Vec<CourseStats>),
        (status = 401, description = "Not an instructor", body = Problem),
    ),
    security(("jwt" = []), ("token_cookie" = []))
)]
#[get("/profile/instructor-dashboard")]
#[tracing::instrument(skip(ctx))]
pub async fn profile_instructor_dashboard(
    instructor: Instructor,
    ctx: &State<Context>,
) -> Result<Json<Reply<Data<Vec<CourseStats>>>>, Problem> {
    Ok(Json(Reply::data(
        ctx.instructor_dashboard(&instructor.0.id).await?,
    )))
}

#[cfg(test)]
mod profile_endpoints {
    use rocket::http::{ContentType, Status};
    use serde_json::{json, Value};

    use crate::data::course::CourseStatus;
    use crate::role::AccountType;
    use crate::testing::{auth_cookie, client, multipart, Fixture};

    #[rocket::async_test]
    async fn v1_profile_get_and_update() {
        let fx = Fixture::new();
        let client = client(&fx).await;
        let user = fx.user(AccountType::Student);

        let response = client
            .put("/api/v1/profile")
            .header(ContentType::JSON)
            .cookie(auth_cookie(&user))
            .body(json!({"about": "Rustacean", "gender": "  "}).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let body: Value = response.into_json().await.expect("json body");
        let details = &body["updatedUserDetails"];
        assert_eq!(details["additionalDetails"]["about"], "Rustacean");
        assert_eq!(details["additionalDetails"]["gender"], Value::Null);

        let response = client
            .get("/api/v1/profile")
            .cookie(auth_cookie(&user))
            .dispatch()
            .await;
        let body: Value = response.into_json().await.expect("json body");
        assert_eq!(body["data"]["email"], user.email.as_str());
    }

    #[rocket::async_test]
    async fn v1_profile_accepts_bearer_tokens() {
        let fx = Fixture::new();
        let client = client(&fx).await;
        let user = fx.user(AccountType::Student);
        let token = auth_cookie(&user).value().to_string();

        let response = client
            .get("/api/v1/profile")
            .header(rocket::http::Header::new(
                "Authorization",
                format!("Bearer {}", token),
            ))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);

        let response = client
            .get("/api/v1/profile")
            .header(rocket::http::Header::new("Authorization", "Bearer nonsense"))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Unauthorized);
        let body: Value = response.into_json().await.expect("json problem");
        assert_eq!(body["message"], "Token is invalid");
    }

    #[rocket::async_test]
    async fn v1_profile_display_picture_upload() {
        let fx = Fixture::new();
        let client = client(&fx).await;
        let user = fx.user(AccountType::Student);

        let (content_type, body) = multipart(&[], Some(("displayPicture", "me.png", "image/png")));
        let response = client
            .put("/api/v1/profile/display-picture")
            .header(content_type)
            .cookie(auth_cookie(&user))
            .body(body)
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let body: Value = response.into_json().await.expect("json body");
        let image = body["data"]["image"].as_str().expect("image url");
        assert!(image.starts_with("https://media.test/"));
    }

    #[rocket::async_test]
    async fn v1_profile_delete_removes_account() {
        let fx = Fixture::new();
        let client = client(&fx).await;
        let user = fx.user(AccountType::Student);

        let response = client
            .delete("/api/v1/profile")
            .cookie(auth_cookie(&user))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        assert!(fx.store.users().iter().all(|u| u.id != user.id));

        let response = client
            .get("/api/v1/profile")
            .cookie(auth_cookie(&user))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::NotFound);
    }

    #[rocket::async_test]
    async fn v1_profile_dashboard_is_for_instructors() {
        let fx = Fixture::new();
        let client = client(&fx).await;
        let instructor = fx.user(AccountType::Instructor);
        let student = fx.user(AccountType::Student);
        let category = fx.category("Web").await;
        let course = fx
            .course(&instructor, &category, CourseStatus::Published)
            .await;
        fx.enroll(&course.id, &student).await;

        let response = client
            .get("/api/v1/profile/instructor-dashboard")
            .cookie(auth_cookie(&student))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Unauthorized);

        let response = client
            .get("/api/v1/profile/instructor-dashboard")
            .cookie(auth_cookie(&instructor))
            .dispatch()
            .await;
        let body: Value = response.into_json().await.expect("json body");
        assert_eq!(body["data"][0]["totalAmountGenerated"], 1000);

        let response = client
            .get("/api/v1/profile/enrolled-courses")
            .cookie(auth_cookie(&student))
            .dispatch()
            .await;
        let body: Value = response.into_json().await.expect("json body");
        assert_eq!(body["data"][0]["progressPercentage"], 100.0);
    }
}
