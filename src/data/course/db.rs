use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{Course, CourseDetails, CourseQuery, CourseStatus, CourseSummary};
use crate::context::Context;
use crate::data::category::db::problem as category_problem;
use crate::data::progress::{content_totals, CourseProgress};
use crate::data::Id;
use crate::duration::format_duration;
use crate::mail::templates;
use crate::media::MediaFile;
use crate::resp::jwt::AuthToken;
use crate::resp::problem::{problems, Problem};
use crate::role::AccountType;
use crate::store::{views, Store};

pub mod problem {
    use crate::data::Id;
    use crate::resp::problem::Problem;
    use rocket::http::Status;

    #[inline]
    pub fn not_found(id: &Id) -> Problem {
        Problem::new_untyped(
            Status::NotFound,
            format!("Could not find course with id: {}", id),
        )
        .insert_str("courseId", id)
        .clone()
    }

    #[inline]
    pub fn draft_forbidden() -> Problem {
        Problem::new_untyped(Status::Forbidden, "Accessing a draft course is forbidden")
    }

    #[inline]
    pub fn not_owner(id: &Id) -> Problem {
        Problem::new_untyped(
            Status::Forbidden,
            "Only the instructor of this course can change it",
        )
        .insert_str("courseId", id)
        .clone()
    }

    #[inline]
    pub fn instructor_not_found() -> Problem {
        Problem::new_untyped(Status::NotFound, "Instructor Details Not Found")
    }

    #[inline]
    pub fn bad_field(field: &str, detail: impl ToString) -> Problem {
        Problem::new_untyped(Status::BadRequest, format!("Invalid value for '{}'", field))
            .insert_str("field", field)
            .detail(detail)
            .clone()
    }

    #[inline]
    pub fn already_enrolled(id: &Id) -> Problem {
        Problem::new_untyped(Status::BadRequest, "Student is already Enrolled")
            .insert_str("courseId", id)
            .clone()
    }

    #[inline]
    pub fn sub_section_not_found(id: &Id) -> Problem {
        Problem::new_untyped(Status::NotFound, "Invalid subsection")
            .insert_str("subsectionId", id)
            .clone()
    }

    #[inline]
    pub fn progress_not_found() -> Problem {
        Problem::new_untyped(Status::NotFound, "Course progress Does Not Exist")
    }

    #[inline]
    pub fn already_completed() -> Problem {
        Problem::new_untyped(Status::BadRequest, "Subsection already completed")
    }
}

/// Course fields as submitted by the authoring forms. `tag` and
/// `instructions` are JSON-encoded string arrays.
#[derive(Debug, Clone, Default)]
pub struct CourseData {
    pub course_name: Option<String>,
    pub course_description: Option<String>,
    pub what_you_will_learn: Option<String>,
    pub price: Option<String>,
    pub tag: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
    pub instructions: Option<String>,
    pub thumbnail: Option<MediaFile>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_list(field: &str, raw: &str) -> Result<Vec<String>, Problem> {
    serde_json::from_str::<Vec<String>>(raw).map_err(|e| problem::bad_field(field, e))
}

fn parse_price(raw: &str) -> Result<u64, Problem> {
    raw.parse::<u64>()
        .map_err(|e| problem::bad_field("price", e))
}

fn parse_id(field: &str, raw: &str) -> Result<Id, Problem> {
    raw.parse::<Id>().map_err(|e| problem::bad_field(field, e))
}

fn parse_status(raw: &str) -> Result<CourseStatus, Problem> {
    raw.parse::<CourseStatus>()
        .map_err(|e| problem::bad_field("status", e))
}

/// Validated fields of a course that doesn't exist yet.
#[derive(Debug, Clone)]
pub struct NewCourse {
    pub course_name: String,
    pub course_description: String,
    pub what_you_will_learn: String,
    pub price: u64,
    pub tag: Vec<String>,
    pub category: Id,
    pub status: CourseStatus,
    pub instructions: Vec<String>,
    pub thumbnail: MediaFile,
}

impl CourseData {
    pub fn validate(self) -> Result<NewCourse, Problem> {
        let tag = match present(&self.tag) {
            Some(raw) => parse_list("tag", raw)?,
            None => vec![],
        };
        let instructions = match present(&self.instructions) {
            Some(raw) => parse_list("instructions", raw)?,
            None => vec![],
        };

        let (
            Some(course_name),
            Some(course_description),
            Some(what_you_will_learn),
            Some(price),
            Some(category),
            Some(thumbnail),
        ) = (
            present(&self.course_name),
            present(&self.course_description),
            present(&self.what_you_will_learn),
            present(&self.price),
            present(&self.category),
            self.thumbnail.clone(),
        )
        else {
            return Err(problems::missing_fields());
        };
        if tag.is_empty() || instructions.is_empty() {
            return Err(problems::missing_fields());
        }

        let price = parse_price(price)?;
        if price == 0 {
            return Err(problems::missing_fields());
        }

        let status = match present(&self.status) {
            Some(raw) => parse_status(raw)?,
            None => CourseStatus::Draft,
        };

        Ok(NewCourse {
            course_name: course_name.to_string(),
            course_description: course_description.to_string(),
            what_you_will_learn: what_you_will_learn.to_string(),
            price,
            tag,
            category: parse_id("category", category)?,
            status,
            instructions,
            thumbnail,
        })
    }

    /// Copies every present field onto the course. Returns the new category
    /// if it changed.
    pub fn apply(&self, course: &mut Course) -> Result<Option<Id>, Problem> {
        if let Some(it) = present(&self.course_name) {
            course.course_name = it.to_string();
        }
        if let Some(it) = present(&self.course_description) {
            course.course_description = it.to_string();
        }
        if let Some(it) = present(&self.what_you_will_learn) {
            course.what_you_will_learn = it.to_string();
        }
        if let Some(it) = present(&self.price) {
            course.price = parse_price(it)?;
        }
        if let Some(it) = present(&self.tag) {
            course.tag = parse_list("tag", it)?;
        }
        if let Some(it) = present(&self.instructions) {
            course.instructions = parse_list("instructions", it)?;
        }
        if let Some(it) = present(&self.status) {
            course.status = parse_status(it)?;
        }

        let mut moved = None;
        if let Some(it) = present(&self.category) {
            let category = parse_id("category", it)?;
            if category != course.category {
                course.category = category;
                moved = Some(category);
            }
        }
        Ok(moved)
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseIdData {
    #[schema(value_type = Option<String>)]
    pub course_id: Option<Id>,
}

impl CourseIdData {
    pub fn validate(&self) -> Result<Id, Problem> {
        self.course_id.ok_or_else(problems::missing_fields)
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnrollData {
    #[serde(default)]
    #[schema(value_type = Vec<String>)]
    pub courses: Vec<Id>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProgressData {
    #[schema(value_type = Option<String>)]
    pub course_id: Option<Id>,
    #[schema(value_type = Option<String>)]
    pub subsection_id: Option<Id>,
}

impl ProgressData {
    pub fn validate(&self) -> Result<(Id, Id), Problem> {
        match (self.course_id, self.subsection_id) {
            (Some(course), Some(sub)) => Ok((course, sub)),
            _ => Err(problems::missing_fields()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseDetailsPage {
    pub course_details: CourseDetails,
    pub total_duration: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FullCourseDetailsPage {
    pub course_details: CourseDetails,
    pub total_duration: String,
    pub completed_videos: Vec<Id>,
}

fn total_duration(details: &CourseDetails) -> String {
    format_duration(content_totals(&details.course_content).0)
}

async fn link_instructor(store: &dyn Store, course: &Course) -> Result<(), Problem> {
    if !store
        .push_user_course(&course.instructor, &course.id, None)
        .await?
    {
        return Err(problem::instructor_not_found());
    }
    Ok(())
}

async fn link_category(store: &dyn Store, course: &Course) -> Result<(), Problem> {
    if !store
        .push_category_course(&course.category, &course.id)
        .await?
    {
        return Err(category_problem::not_found(&course.category));
    }
    Ok(())
}

/// Compensation for a partially linked course.
async fn unlink_course(store: &dyn Store, course: &Course, instructor_linked: bool) {
    if instructor_linked {
        if let Err(e) = store
            .pull_user_course(&course.instructor, &course.id)
            .await
        {
            tracing::error!("unable to unlink course {} from instructor: {}", course.id, e);
        }
    }
    match store.delete_course(&course.id).await {
        Ok(_) => tracing::warn!("rolled back creation of course {}", course.id),
        Err(e) => tracing::error!("unable to roll back course {}: {}", course.id, e),
    }
}

pub trait CourseDbExt {
    async fn create_course(&self, instructor: &Id, data: CourseData) -> Result<Course, Problem>;

    async fn list_published_courses(&self) -> Result<Vec<CourseSummary>, Problem>;

    async fn course_details(&self, id: &Id) -> Result<CourseDetailsPage, Problem>;

    async fn full_course_details(
        &self,
        id: &Id,
        user: &AuthToken,
    ) -> Result<FullCourseDetailsPage, Problem>;

    async fn edit_course(
        &self,
        instructor: &Id,
        id: &Id,
        data: CourseData,
    ) -> Result<CourseDetails, Problem>;

    async fn instructor_courses(&self, instructor: &Id) -> Result<Vec<Course>, Problem>;

    async fn delete_course(&self, instructor: &Id, id: &Id) -> Result<(), Problem>;

    async fn enroll_students(&self, student: &Id, courses: &[Id]) -> Result<(), Problem>;

    async fn update_course_progress(
        &self,
        student: &Id,
        course: &Id,
        sub_section: &Id,
    ) -> Result<CourseProgress, Problem>;
}

impl Context {
    pub(crate) async fn owned_course(&self, instructor: &Id, id: &Id) -> Result<Course, Problem> {
        let course = self
            .store()
            .find_course(id)
            .await?
            .ok_or_else(|| problem::not_found(id))?;
        if course.instructor != *instructor {
            return Err(problem::not_owner(id));
        }
        Ok(course)
    }
}

impl CourseDbExt for Context {
    #[tracing::instrument(skip(self))]
    async fn create_course(&self, instructor: &Id, data: CourseData) -> Result<Course, Problem> {
        let new = data.validate()?;
        let store = self.store();

        match store.find_user(instructor).await? {
            Some(user) if user.account_type == AccountType::Instructor => {}
            _ => return Err(problem::instructor_not_found()),
        }
        if store.find_category(&new.category).await?.is_none() {
            return Err(Problem::new_untyped(
                rocket::http::Status::NotFound,
                "Category Details Not Found",
            ));
        }

        let thumbnail = self.upload(new.thumbnail).await?;

        let course = Course {
            id: Id::new(),
            course_name: new.course_name,
            course_description: new.course_description,
            instructor: *instructor,
            what_you_will_learn: new.what_you_will_learn,
            course_content: vec![],
            rating_and_reviews: vec![],
            price: new.price,
            thumbnail: thumbnail.secure_url,
            tag: new.tag,
            category: new.category,
            students_enrolled: vec![],
            instructions: new.instructions,
            status: new.status,
            sold: 0,
            created_at: chrono::Utc::now(),
        };

        store.insert_course(&course).await?;
        if let Err(problem) = link_instructor(store, &course).await {
            unlink_course(store, &course, false).await;
            return Err(problem);
        }
        if let Err(problem) = link_category(store, &course).await {
            unlink_course(store, &course, true).await;
            return Err(problem);
        }

        tracing::info!("created course '{}' ({})", course.course_name, course.id);
        Ok(course)
    }

    async fn list_published_courses(&self) -> Result<Vec<CourseSummary>, Problem> {
        let store = self.store();
        let courses = store.find_courses(&CourseQuery::published()).await?;
        Ok(views::course_summaries(store, courses).await?)
    }

    #[tracing::instrument(skip(self))]
    async fn course_details(&self, id: &Id) -> Result<CourseDetailsPage, Problem> {
        let store = self.store();
        let course = store
            .find_course(id)
            .await?
            .ok_or_else(|| problem::not_found(id))?;
        if !course.is_published() {
            return Err(problem::draft_forbidden());
        }

        let course_details = views::course_details(store, course).await?.without_videos();
        Ok(CourseDetailsPage {
            total_duration: total_duration(&course_details),
            course_details,
        })
    }

    #[tracing::instrument(skip(self))]
    async fn full_course_details(
        &self,
        id: &Id,
        user: &AuthToken,
    ) -> Result<FullCourseDetailsPage, Problem> {
        let store = self.store();
        let course = store
            .find_course(id)
            .await?
            .ok_or_else(|| problem::not_found(id))?;
        if !course.is_published() && course.instructor != user.id {
            return Err(problem::draft_forbidden());
        }

        let completed_videos = store
            .find_progress(&user.id, id)
            .await?
            .map(|p| p.completed_videos)
            .unwrap_or_default();
        let course_details = views::course_details(store, course).await?;

        Ok(FullCourseDetailsPage {
            total_duration: total_duration(&course_details),
            course_details,
            completed_videos,
        })
    }

    #[tracing::instrument(skip(self))]
    async fn edit_course(
        &self,
        instructor: &Id,
        id: &Id,
        data: CourseData,
    ) -> Result<CourseDetails, Problem> {
        let store = self.store();
        let mut course = self.owned_course(instructor, id).await?;
        let previous_category = course.category;

        let moved_to = data.apply(&mut course)?;
        if let Some(category) = &moved_to {
            if store.find_category(category).await?.is_none() {
                return Err(category_problem::not_found(category));
            }
        }
        if let Some(thumbnail) = data.thumbnail {
            course.thumbnail = self.upload(thumbnail).await?.secure_url;
        }

        if !store.replace_course(&course).await? {
            return Err(problem::not_found(id));
        }
        if let Some(category) = &moved_to {
            store.pull_category_course(&previous_category, id).await?;
            store.push_category_course(category, id).await?;
        }

        tracing::info!("updated course {}", id);
        Ok(views::course_details(store, course).await?)
    }

    async fn instructor_courses(&self, instructor: &Id) -> Result<Vec<Course>, Problem> {
        let mut courses = self
            .store()
            .find_courses(&CourseQuery {
                instructor: Some(*instructor),
                ..Default::default()
            })
            .await?;
        courses.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(courses)
    }

    #[tracing::instrument(skip(self))]
    async fn delete_course(&self, instructor: &Id, id: &Id) -> Result<(), Problem> {
        let store = self.store();
        let course = self.owned_course(instructor, id).await?;

        let unenrolled = store.pull_course_from_users(id).await?;
        tracing::debug!("removed course {} from {} users", id, unenrolled);
        store.pull_category_course(&course.category, id).await?;

        for section in store.find_sections(&course.course_content).await? {
            store.delete_sub_sections(&section.sub_section).await?;
        }
        store.delete_sections(&course.course_content).await?;
        store.delete_course(id).await?;

        tracing::info!("deleted course {}", id);
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn enroll_students(&self, student: &Id, courses: &[Id]) -> Result<(), Problem> {
        if courses.is_empty() {
            return Err(Problem::new_untyped(
                rocket::http::Status::BadRequest,
                "Please Provide Course ID",
            ));
        }
        let store = self.store();
        let user = store.find_user(student).await?.ok_or_else(|| {
            Problem::new_untyped(rocket::http::Status::NotFound, "User not found")
        })?;

        let mut unique: Vec<Id> = Vec::with_capacity(courses.len());
        for id in courses {
            if !unique.contains(id) {
                unique.push(*id);
            }
        }

        for id in &unique {
            let course = store
                .find_course(id)
                .await?
                .ok_or_else(|| problem::not_found(id))?;
            if !course.is_published() {
                return Err(problem::draft_forbidden());
            }
            if course.is_enrolled(student) {
                return Err(problem::already_enrolled(id));
            }
        }

        for id in &unique {
            let course = store
                .enroll_student(id, student)
                .await?
                .ok_or_else(|| problem::not_found(id))?;

            let progress = CourseProgress::new(*student, *id);
            store.insert_progress(&progress).await?;
            store
                .push_user_course(student, id, Some(&progress.id))
                .await?;

            tracing::info!("enrolled {} into course {}", student, id);
            self.notify(templates::course_enrollment(
                &user.email,
                &course.course_name,
                &format!("{} {}", user.first_name, user.last_name),
            ))
            .await;
        }
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn update_course_progress(
        &self,
        student: &Id,
        course: &Id,
        sub_section: &Id,
    ) -> Result<CourseProgress, Problem> {
        let store = self.store();
        if store.find_sub_section(sub_section).await?.is_none() {
            return Err(problem::sub_section_not_found(sub_section));
        }

        let mut progress = store
            .find_progress(student, course)
            .await?
            .ok_or_else(problem::progress_not_found)?;
        if progress.completed_videos.contains(sub_section) {
            return Err(problem::already_completed());
        }

        store.push_completed_video(&progress.id, sub_section).await?;
        progress.completed_videos.push(*sub_section);
        Ok(progress)
    }
}
