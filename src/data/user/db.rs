use serde::Deserialize;
use utoipa::ToSchema;

use super::{ProfilePatch, User, UserDetails, UserPatch};
use crate::context::Context;
use crate::data::course::{CourseFields, CourseQuery, CourseStats, EnrolledCourse};
use crate::data::progress::{completion_percentage, content_totals};
use crate::data::Id;
use crate::duration::format_duration;
use crate::media::MediaFile;
use crate::resp::problem::Problem;
use crate::store::views;
use crate::util::order_by_ids;

pub mod problem {
    use crate::data::Id;
    use crate::resp::problem::Problem;
    use rocket::http::Status;

    #[inline]
    pub fn not_found(id: &Id) -> Problem {
        Problem::new_untyped(Status::NotFound, "User not found")
            .insert_str("id", id)
            .clone()
    }

    #[inline]
    pub fn missing_picture() -> Problem {
        Problem::new_untyped(Status::BadRequest, "Display picture is required")
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileData {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<String>,
    pub about: Option<String>,
    pub contact_number: Option<String>,
    pub gender: Option<String>,
}

impl UpdateProfileData {
    /// Splits the request into account and profile changes, dropping blank values.
    pub fn into_patches(self) -> (UserPatch, ProfilePatch) {
        (
            UserPatch {
                first_name: non_blank(self.first_name),
                last_name: non_blank(self.last_name),
                image: None,
            },
            ProfilePatch {
                gender: non_blank(self.gender),
                date_of_birth: non_blank(self.date_of_birth),
                about: non_blank(self.about),
                contact_number: non_blank(self.contact_number),
            },
        )
    }
}

pub trait ProfileDbExt {
    async fn update_profile(
        &self,
        user: &Id,
        data: UpdateProfileData,
    ) -> Result<UserDetails, Problem>;

    async fn delete_account(&self, user: &Id) -> Result<User, Problem>;

    async fn user_details(&self, user: &Id) -> Result<UserDetails, Problem>;

    async fn update_display_picture(
        &self,
        user: &Id,
        picture: Option<MediaFile>,
    ) -> Result<User, Problem>;

    async fn enrolled_courses(&self, user: &Id) -> Result<Vec<EnrolledCourse>, Problem>;

    async fn instructor_dashboard(&self, instructor: &Id) -> Result<Vec<CourseStats>, Problem>;
}

impl ProfileDbExt for Context {
    #[tracing::instrument(skip(self))]
    async fn update_profile(
        &self,
        user: &Id,
        data: UpdateProfileData,
    ) -> Result<UserDetails, Problem> {
        let store = self.store();
        let (user_patch, profile_patch) = data.into_patches();

        let updated = store
            .update_user(user, user_patch)
            .await?
            .ok_or_else(|| problem::not_found(user))?;
        store
            .update_profile(&updated.additional_details, profile_patch)
            .await?;

        self.user_details(user).await
    }

    #[tracing::instrument(skip(self))]
    async fn delete_account(&self, user: &Id) -> Result<User, Problem> {
        let store = self.store();
        let account = store
            .find_user(user)
            .await?
            .ok_or_else(|| problem::not_found(user))?;

        store.delete_profile(&account.additional_details).await?;
        let unenrolled = store.pull_student_from_courses(user).await?;
        let progress = store.delete_user_progress(user).await?;
        tracing::debug!(
            "removed user {} from {} courses and {} progress records",
            user,
            unenrolled,
            progress
        );

        let deleted = store
            .delete_user(user)
            .await?
            .ok_or_else(|| problem::not_found(user))?;
        tracing::info!("deleted account {}", user);
        Ok(deleted)
    }

    async fn user_details(&self, user: &Id) -> Result<UserDetails, Problem> {
        views::user_details(self.store(), user)
            .await?
            .ok_or_else(|| problem::not_found(user))
    }

    #[tracing::instrument(skip(self))]
    async fn update_display_picture(
        &self,
        user: &Id,
        picture: Option<MediaFile>,
    ) -> Result<User, Problem> {
        let picture = picture.ok_or_else(problem::missing_picture)?;
        let uploaded = self.upload(picture).await?;

        self.store()
            .update_user(
                user,
                UserPatch {
                    image: Some(uploaded.secure_url),
                    ..Default::default()
                },
            )
            .await?
            .ok_or_else(|| problem::not_found(user))
    }

    #[tracing::instrument(skip(self))]
    async fn enrolled_courses(&self, user: &Id) -> Result<Vec<EnrolledCourse>, Problem> {
        let store = self.store();
        let account = store
            .find_user(user)
            .await?
            .ok_or_else(|| problem::not_found(user))?;

        let courses = store
            .find_courses(&CourseQuery::ids(&account.courses))
            .await?;
        let courses = order_by_ids(&account.courses, courses, |c| c.id);

        let mut enrolled = Vec::with_capacity(courses.len());
        for course in courses {
            let content = views::course_content(store, &course.course_content).await?;
            let (seconds, total) = content_totals(&content);
            let completed = store
                .find_progress(user, &course.id)
                .await?
                .map_or(0, |p| p.completed_videos.len());

            enrolled.push(EnrolledCourse {
                course: CourseFields::from(&course),
                instructor: course.instructor,
                category: course.category,
                course_content: content,
                total_duration: format_duration(seconds),
                progress_percentage: completion_percentage(completed, total),
            });
        }
        Ok(enrolled)
    }

    async fn instructor_dashboard(&self, instructor: &Id) -> Result<Vec<CourseStats>, Problem> {
        let courses = self
            .store()
            .find_courses(&CourseQuery {
                instructor: Some(*instructor),
                ..Default::default()
            })
            .await?;
        Ok(courses.iter().map(CourseStats::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::course::CourseStatus;
    use crate::role::AccountType;
    use crate::store::Store;
    use crate::testing::{media_file, Fixture};

    #[rocket::async_test]
    async fn update_only_changes_present_fields() {
        let fx = Fixture::new();
        let user = fx.user(AccountType::Student);

        let details = fx
            .ctx
            .update_profile(
                &user.id,
                UpdateProfileData {
                    first_name: Some("Grace".to_string()),
                    contact_number: Some("5550100".to_string()),
                    gender: Some("".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(details.first_name, "Grace");
        assert_eq!(details.last_name, user.last_name);
        let profile = details.additional_details.expect("populated profile");
        assert_eq!(profile.contact_number.as_deref(), Some("5550100"));
        assert_eq!(profile.about.as_deref(), Some("Hello"));
        assert_eq!(profile.gender, None);
    }

    #[rocket::async_test]
    async fn account_deletion_cleans_up_everything() {
        let fx = Fixture::new();
        let instructor = fx.user(AccountType::Instructor);
        let student = fx.user(AccountType::Student);
        let bystander = fx.user(AccountType::Student);
        let category = fx.category("Web").await;
        let first = fx.course(&instructor, &category, CourseStatus::Published).await;
        let second = fx.course(&instructor, &category, CourseStatus::Published).await;
        fx.enroll(&first.id, &student).await;
        fx.enroll(&second.id, &student).await;
        fx.enroll(&second.id, &bystander).await;

        fx.ctx.delete_account(&student.id).await.unwrap();

        assert!(fx.store.find_user(&student.id).await.unwrap().is_none());
        assert!(fx
            .store
            .profiles()
            .iter()
            .all(|p| p.id != student.additional_details));
        assert!(fx.store.progress().iter().all(|p| p.user_id != student.id));
        assert_eq!(fx.store.progress().len(), 1);
        for course in fx.store.courses() {
            assert!(!course.is_enrolled(&student.id));
        }
        let second = fx.store.find_course(&second.id).await.unwrap().unwrap();
        assert_eq!(second.students_enrolled, vec![bystander.id]);

        let problem = fx.ctx.delete_account(&student.id).await.unwrap_err();
        assert_eq!(problem.status.code, 404);
    }

    #[rocket::async_test]
    async fn display_picture_replaces_the_avatar() {
        let fx = Fixture::new();
        let user = fx.user(AccountType::Student);

        let updated = fx
            .ctx
            .update_display_picture(&user.id, Some(media_file("me.jpeg", "image/jpeg")))
            .await
            .unwrap();
        assert_eq!(updated.image, "https://media.test/me.jpeg");

        let problem = fx
            .ctx
            .update_display_picture(&user.id, None)
            .await
            .unwrap_err();
        assert_eq!(problem.status.code, 400);
    }

    #[rocket::async_test]
    async fn enrolled_courses_report_progress() {
        let fx = Fixture::new();
        let instructor = fx.user(AccountType::Instructor);
        let student = fx.user(AccountType::Student);
        let category = fx.category("Web").await;
        let course = fx.course(&instructor, &category, CourseStatus::Published).await;
        let empty = fx.course(&instructor, &category, CourseStatus::Published).await;
        let (_, subs) = fx.section(&course.id, &["600", "1200", "1800", "3600"]).await;
        let progress = fx.enroll(&course.id, &student).await;
        fx.enroll(&empty.id, &student).await;
        fx.store
            .push_completed_video(&progress.id, &subs[0].id)
            .await
            .unwrap();

        let enrolled = fx.ctx.enrolled_courses(&student.id).await.unwrap();

        assert_eq!(enrolled.len(), 2);
        assert_eq!(enrolled[0].course.id, course.id);
        assert_eq!(enrolled[0].total_duration, "2h 0m");
        assert_eq!(enrolled[0].progress_percentage, 25.0);
        assert_eq!(enrolled[1].course.id, empty.id);
        assert_eq!(enrolled[1].total_duration, "0s");
        assert_eq!(enrolled[1].progress_percentage, 100.0);
    }

    #[rocket::async_test]
    async fn dashboard_sums_revenue_per_course() {
        let fx = Fixture::new();
        let instructor = fx.user(AccountType::Instructor);
        let student = fx.user(AccountType::Student);
        let category = fx.category("Web").await;
        let course = fx.course(&instructor, &category, CourseStatus::Published).await;
        fx.enroll(&course.id, &student).await;

        let stats = fx.ctx.instructor_dashboard(&instructor.id).await.unwrap();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].total_students_enrolled, 1);
        assert_eq!(stats[0].total_amount_generated, 1000);
    }
}
