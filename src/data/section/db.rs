use serde::Deserialize;
use utoipa::ToSchema;

use super::{Section, SectionContent, SubSection};
use crate::context::Context;
use crate::data::course::db::problem as course_problem;
use crate::data::course::{Course, CourseDetails, CourseQuery};
use crate::data::Id;
use crate::media::MediaFile;
use crate::resp::problem::{problems, Problem};
use crate::store::views;

pub mod problem {
    use crate::data::Id;
    use crate::resp::problem::Problem;
    use rocket::http::Status;

    #[inline]
    pub fn not_found(id: &Id) -> Problem {
        Problem::new_untyped(Status::NotFound, "Section not found")
            .insert_str("sectionId", id)
            .clone()
    }

    #[inline]
    pub fn sub_section_not_found(id: &Id) -> Problem {
        Problem::new_untyped(Status::NotFound, "SubSection not found")
            .insert_str("subSectionId", id)
            .clone()
    }

    #[inline]
    pub fn sub_section_fields() -> Problem {
        Problem::new_untyped(Status::NotFound, "All Fields are Required")
    }

    #[inline]
    pub fn bad_id(field: &str, detail: impl ToString) -> Problem {
        Problem::new_untyped(Status::BadRequest, format!("Invalid value for '{}'", field))
            .insert_str("field", field)
            .detail(detail)
            .clone()
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSectionData {
    #[serde(default)]
    pub section_name: String,
    #[schema(value_type = Option<String>)]
    pub course_id: Option<Id>,
}

impl CreateSectionData {
    pub fn validate(&self) -> Result<Id, Problem> {
        match self.course_id {
            Some(course) if !self.section_name.trim().is_empty() => Ok(course),
            _ => Err(problems::missing_fields()),
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSectionData {
    #[serde(default)]
    pub section_name: String,
    #[schema(value_type = Option<String>)]
    pub section_id: Option<Id>,
    #[schema(value_type = Option<String>)]
    pub course_id: Option<Id>,
}

impl UpdateSectionData {
    pub fn validate(&self) -> Result<(Id, Id), Problem> {
        match (self.section_id, self.course_id) {
            (Some(section), Some(course)) if !self.section_name.trim().is_empty() => {
                Ok((section, course))
            }
            _ => Err(problems::missing_fields()),
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteSectionData {
    #[schema(value_type = Option<String>)]
    pub section_id: Option<Id>,
    #[schema(value_type = Option<String>)]
    pub course_id: Option<Id>,
}

impl DeleteSectionData {
    pub fn validate(&self) -> Result<(Id, Id), Problem> {
        match (self.section_id, self.course_id) {
            (Some(section), Some(course)) => Ok((section, course)),
            _ => Err(problems::missing_fields()),
        }
    }
}

/// Sub-section fields as submitted by the lesson upload forms.
#[derive(Debug, Clone, Default)]
pub struct SubSectionData {
    pub section_id: Option<String>,
    pub sub_section_id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub video: Option<MediaFile>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_id(field: &str, raw: &str) -> Result<Id, Problem> {
    raw.parse::<Id>().map_err(|e| problem::bad_id(field, e))
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteSubSectionData {
    #[schema(value_type = Option<String>)]
    pub sub_section_id: Option<Id>,
    #[schema(value_type = Option<String>)]
    pub section_id: Option<Id>,
}

impl DeleteSubSectionData {
    pub fn validate(&self) -> Result<(Id, Id), Problem> {
        match (self.sub_section_id, self.section_id) {
            (Some(sub), Some(section)) => Ok((sub, section)),
            _ => Err(problems::missing_fields()),
        }
    }
}

/// Stored form of an uploaded video's length.
fn video_duration(seconds: Option<f64>) -> String {
    match seconds {
        Some(it) => it.to_string(),
        None => "0".to_string(),
    }
}

pub trait SectionDbExt {
    async fn create_section(
        &self,
        instructor: &Id,
        data: CreateSectionData,
    ) -> Result<CourseDetails, Problem>;

    async fn update_section(
        &self,
        instructor: &Id,
        data: UpdateSectionData,
    ) -> Result<CourseDetails, Problem>;

    async fn delete_section(
        &self,
        instructor: &Id,
        data: DeleteSectionData,
    ) -> Result<CourseDetails, Problem>;

    async fn create_sub_section(
        &self,
        instructor: &Id,
        data: SubSectionData,
    ) -> Result<SectionContent, Problem>;

    async fn update_sub_section(
        &self,
        instructor: &Id,
        data: SubSectionData,
    ) -> Result<SectionContent, Problem>;

    async fn delete_sub_section(
        &self,
        instructor: &Id,
        data: DeleteSubSectionData,
    ) -> Result<SectionContent, Problem>;
}

impl Context {
    /// A section of a course owned by the instructor.
    async fn owned_section(&self, instructor: &Id, id: &Id) -> Result<Section, Problem> {
        let store = self.store();
        let section = store
            .find_section(id)
            .await?
            .ok_or_else(|| problem::not_found(id))?;

        let owner = store
            .find_courses(&CourseQuery::owning(id))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| problem::not_found(id))?;
        if owner.instructor != *instructor {
            return Err(course_problem::not_owner(&owner.id));
        }
        Ok(section)
    }

    async fn populated_course(&self, id: &Id) -> Result<CourseDetails, Problem> {
        let store = self.store();
        let course: Course = store
            .find_course(id)
            .await?
            .ok_or_else(|| course_problem::not_found(id))?;
        Ok(views::course_details(store, course).await?)
    }

    async fn populated_section(&self, id: &Id) -> Result<SectionContent, Problem> {
        views::section_content(self.store(), id)
            .await?
            .ok_or_else(|| problem::not_found(id))
    }
}

impl SectionDbExt for Context {
    #[tracing::instrument(skip(self))]
    async fn create_section(
        &self,
        instructor: &Id,
        data: CreateSectionData,
    ) -> Result<CourseDetails, Problem> {
        let course = data.validate()?;
        self.owned_course(instructor, &course).await?;

        let store = self.store();
        let section = Section::new(data.section_name.trim());
        store.insert_section(&section).await?;
        if !store.push_course_section(&course, &section.id).await? {
            return Err(course_problem::not_found(&course));
        }

        tracing::info!("created section {} in course {}", section.id, course);
        self.populated_course(&course).await
    }

    #[tracing::instrument(skip(self))]
    async fn update_section(
        &self,
        instructor: &Id,
        data: UpdateSectionData,
    ) -> Result<CourseDetails, Problem> {
        let (section, course_id) = data.validate()?;
        let course = self.owned_course(instructor, &course_id).await?;
        if !course.course_content.contains(&section) {
            return Err(problem::not_found(&section));
        }

        if !self
            .store()
            .rename_section(&section, data.section_name.trim())
            .await?
        {
            return Err(problem::not_found(&section));
        }
        self.populated_course(&course_id).await
    }

    #[tracing::instrument(skip(self))]
    async fn delete_section(
        &self,
        instructor: &Id,
        data: DeleteSectionData,
    ) -> Result<CourseDetails, Problem> {
        let (id, course_id) = data.validate()?;
        let course = self.owned_course(instructor, &course_id).await?;
        if !course.course_content.contains(&id) {
            return Err(problem::not_found(&id));
        }

        let store = self.store();
        let section = store
            .find_section(&id)
            .await?
            .ok_or_else(|| problem::not_found(&id))?;

        store.pull_course_section(&course_id, &id).await?;
        store.delete_sub_sections(&section.sub_section).await?;
        store.delete_sections(&[id]).await?;

        tracing::info!("deleted section {} from course {}", id, course_id);
        self.populated_course(&course_id).await
    }

    #[tracing::instrument(skip(self))]
    async fn create_sub_section(
        &self,
        instructor: &Id,
        data: SubSectionData,
    ) -> Result<SectionContent, Problem> {
        let (Some(section_id), Some(title), Some(description), Some(video)) = (
            present(&data.section_id),
            present(&data.title),
            present(&data.description),
            data.video.clone(),
        ) else {
            return Err(problem::sub_section_fields());
        };
        let section_id = parse_id("sectionId", section_id)?;
        self.owned_section(instructor, &section_id).await?;

        let uploaded = self.upload(video).await?;
        let sub = SubSection {
            id: Id::new(),
            title: title.to_string(),
            time_duration: video_duration(uploaded.duration),
            description: description.to_string(),
            video_url: uploaded.secure_url,
        };

        let store = self.store();
        store.insert_sub_section(&sub).await?;
        if !store.push_section_sub_section(&section_id, &sub.id).await? {
            return Err(problem::not_found(&section_id));
        }

        tracing::info!("created sub-section {} in section {}", sub.id, section_id);
        self.populated_section(&section_id).await
    }

    #[tracing::instrument(skip(self))]
    async fn update_sub_section(
        &self,
        instructor: &Id,
        data: SubSectionData,
    ) -> Result<SectionContent, Problem> {
        let (Some(section_id), Some(sub_id)) =
            (present(&data.section_id), present(&data.sub_section_id))
        else {
            return Err(problems::missing_fields());
        };
        let section_id = parse_id("sectionId", section_id)?;
        let sub_id = parse_id("subSectionId", sub_id)?;

        let section = self.owned_section(instructor, &section_id).await?;
        if !section.sub_section.contains(&sub_id) {
            return Err(problem::sub_section_not_found(&sub_id));
        }

        let store = self.store();
        let mut sub = store
            .find_sub_section(&sub_id)
            .await?
            .ok_or_else(|| problem::sub_section_not_found(&sub_id))?;

        if let Some(title) = present(&data.title) {
            sub.title = title.to_string();
        }
        if let Some(description) = present(&data.description) {
            sub.description = description.to_string();
        }
        if let Some(video) = data.video {
            let uploaded = self.upload(video).await?;
            sub.video_url = uploaded.secure_url;
            sub.time_duration = video_duration(uploaded.duration);
        }

        store.replace_sub_section(&sub).await?;
        self.populated_section(&section_id).await
    }

    #[tracing::instrument(skip(self))]
    async fn delete_sub_section(
        &self,
        instructor: &Id,
        data: DeleteSubSectionData,
    ) -> Result<SectionContent, Problem> {
        let (sub_id, section_id) = data.validate()?;
        let section = self.owned_section(instructor, &section_id).await?;
        if !section.sub_section.contains(&sub_id) {
            return Err(problem::sub_section_not_found(&sub_id));
        }

        let store = self.store();
        store.pull_section_sub_section(&section_id, &sub_id).await?;
        if store.delete_sub_sections(&[sub_id]).await? == 0 {
            return Err(problem::sub_section_not_found(&sub_id));
        }

        self.populated_section(&section_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::course::CourseStatus;
    use crate::role::AccountType;
    use crate::store::Store;
    use crate::testing::{media_file, Fixture, RecordingMailer, StubMedia};

    #[rocket::async_test]
    async fn sections_are_created_renamed_and_deleted() {
        let fx = Fixture::new();
        let instructor = fx.user(AccountType::Instructor);
        let category = fx.category("Web").await;
        let course = fx.course(&instructor, &category, CourseStatus::Draft).await;

        let details = fx
            .ctx
            .create_section(
                &instructor.id,
                CreateSectionData {
                    section_name: "Basics".to_string(),
                    course_id: Some(course.id),
                },
            )
            .await
            .unwrap();
        assert_eq!(details.course_content.len(), 1);
        let section = details.course_content[0].id;

        let details = fx
            .ctx
            .update_section(
                &instructor.id,
                UpdateSectionData {
                    section_name: "Fundamentals".to_string(),
                    section_id: Some(section),
                    course_id: Some(course.id),
                },
            )
            .await
            .unwrap();
        assert_eq!(details.course_content[0].section_name, "Fundamentals");

        let details = fx
            .ctx
            .delete_section(
                &instructor.id,
                DeleteSectionData {
                    section_id: Some(section),
                    course_id: Some(course.id),
                },
            )
            .await
            .unwrap();
        assert!(details.course_content.is_empty());
        assert!(fx.store.sections().is_empty());
    }

    #[rocket::async_test]
    async fn other_instructors_cannot_add_sections() {
        let fx = Fixture::new();
        let owner = fx.user(AccountType::Instructor);
        let other = fx.user(AccountType::Instructor);
        let category = fx.category("Web").await;
        let course = fx.course(&owner, &category, CourseStatus::Draft).await;

        let problem = fx
            .ctx
            .create_section(
                &other.id,
                CreateSectionData {
                    section_name: "Mine now".to_string(),
                    course_id: Some(course.id),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(problem.status.code, 403);

        let problem = fx
            .ctx
            .create_section(
                &owner.id,
                CreateSectionData {
                    section_name: " ".to_string(),
                    course_id: Some(course.id),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(problem.status.code, 400);
        assert!(fx.store.sections().is_empty());
    }

    #[rocket::async_test]
    async fn sub_sections_store_the_reported_duration() {
        let fx = Fixture::with(
            StubMedia {
                duration: Some(125.5),
                ..Default::default()
            },
            RecordingMailer::default(),
        );
        let instructor = fx.user(AccountType::Instructor);
        let category = fx.category("Web").await;
        let course = fx.course(&instructor, &category, CourseStatus::Draft).await;
        let (section, _) = fx.section(&course.id, &[]).await;

        let content = fx
            .ctx
            .create_sub_section(
                &instructor.id,
                SubSectionData {
                    section_id: Some(section.id.to_string()),
                    title: Some("Intro".to_string()),
                    description: Some("Welcome".to_string()),
                    video: Some(media_file("intro.mp4", "video/mp4")),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let sub = &content.sub_section[0];
        assert_eq!(sub.time_duration, "125.5");
        assert_eq!(sub.duration_secs(), 125);
        assert_eq!(sub.video_url, "https://media.test/intro.mp4");
    }

    #[rocket::async_test]
    async fn missing_sub_section_fields_are_not_found() {
        let fx = Fixture::new();
        let instructor = fx.user(AccountType::Instructor);

        let problem = fx
            .ctx
            .create_sub_section(
                &instructor.id,
                SubSectionData {
                    section_id: Some(Id::new().to_string()),
                    title: Some("Intro".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(problem.status.code, 404);
        assert_eq!(problem.message, "All Fields are Required");
    }

    #[rocket::async_test]
    async fn sub_sections_are_updated_and_deleted() {
        let fx = Fixture::new();
        let instructor = fx.user(AccountType::Instructor);
        let category = fx.category("Web").await;
        let course = fx.course(&instructor, &category, CourseStatus::Draft).await;
        let (section, subs) = fx.section(&course.id, &["30", "45"]).await;

        let content = fx
            .ctx
            .update_sub_section(
                &instructor.id,
                SubSectionData {
                    section_id: Some(section.id.to_string()),
                    sub_section_id: Some(subs[0].id.to_string()),
                    title: Some("Renamed".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(content.sub_section[0].title, "Renamed");
        assert_eq!(content.sub_section[0].time_duration, "30");

        let content = fx
            .ctx
            .delete_sub_section(
                &instructor.id,
                DeleteSubSectionData {
                    sub_section_id: Some(subs[0].id),
                    section_id: Some(section.id),
                },
            )
            .await
            .unwrap();
        let remaining: Vec<Id> = content.sub_section.iter().map(|s| s.id).collect();
        assert_eq!(remaining, vec![subs[1].id]);
        assert_eq!(fx.store.sub_sections().len(), 1);

        let section = fx.store.find_section(&section.id).await.unwrap().unwrap();
        assert_eq!(section.sub_section, vec![subs[1].id]);
    }
}
