use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::category::Category;
use super::rating::RatingAndReview;
use super::section::SectionContent;
use super::user::UserDetails;
use super::Id;

pub mod db;

pub static COURSE_COLLECTION_NAME: &str = "courses";

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize, ToSchema)]
pub enum CourseStatus {
    Draft,
    Published,
}

impl Default for CourseStatus {
    fn default() -> Self {
        CourseStatus::Draft
    }
}

impl CourseStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CourseStatus::Draft => "Draft",
            CourseStatus::Published => "Published",
        }
    }
}

impl std::str::FromStr for CourseStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Draft" => Ok(CourseStatus::Draft),
            "Published" => Ok(CourseStatus::Published),
            other => Err(format!("unknown course status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    #[serde(rename = "_id")]
    pub id: Id,
    pub course_name: String,
    pub course_description: String,
    pub instructor: Id,
    pub what_you_will_learn: String,
    #[serde(default)]
    pub course_content: Vec<Id>,
    #[serde(default)]
    pub rating_and_reviews: Vec<Id>,
    pub price: u64,
    #[serde(default)]
    pub thumbnail: String,
    #[serde(default)]
    pub tag: Vec<String>,
    pub category: Id,
    #[serde(default)]
    pub students_enrolled: Vec<Id>,
    #[serde(default)]
    pub instructions: Vec<String>,
    #[serde(default)]
    pub status: CourseStatus,
    #[serde(default)]
    pub sold: u64,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Course {
    pub fn is_published(&self) -> bool {
        self.status == CourseStatus::Published
    }

    pub fn is_enrolled(&self, user: &Id) -> bool {
        self.students_enrolled.contains(user)
    }
}

/// Filter for course listings. Unset fields don't constrain the result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CourseQuery {
    pub ids: Option<Vec<Id>>,
    pub status: Option<CourseStatus>,
    pub instructor: Option<Id>,
    pub student: Option<Id>,
    pub section: Option<Id>,
}

impl CourseQuery {
    pub fn published() -> CourseQuery {
        CourseQuery {
            status: Some(CourseStatus::Published),
            ..Default::default()
        }
    }

    pub fn ids(ids: &[Id]) -> CourseQuery {
        CourseQuery {
            ids: Some(ids.to_vec()),
            ..Default::default()
        }
    }

    /// The course that lists the given section.
    pub fn owning(section: &Id) -> CourseQuery {
        CourseQuery {
            section: Some(*section),
            ..Default::default()
        }
    }

    pub fn with_status(mut self, status: CourseStatus) -> CourseQuery {
        self.status = Some(status);
        self
    }

    pub fn matches(&self, course: &Course) -> bool {
        self.ids.as_ref().map_or(true, |ids| ids.contains(&course.id))
            && self.status.map_or(true, |s| course.status == s)
            && self.instructor.map_or(true, |i| course.instructor == i)
            && self.student.map_or(true, |s| course.is_enrolled(&s))
            && self
                .section
                .map_or(true, |s| course.course_content.contains(&s))
    }
}

/// Learner-facing listing entry.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseSummary {
    #[serde(rename = "_id")]
    pub id: Id,
    pub course_name: String,
    pub price: u64,
    pub thumbnail: String,
    pub instructor: Option<UserDetails>,
    pub rating_and_reviews: Vec<Id>,
    pub students_enrolled: Vec<Id>,
}

/// A course with its ratings populated, as listed on category pages.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseWithReviews {
    #[serde(flatten)]
    pub course: CourseFields,
    pub instructor: Id,
    pub category: Id,
    pub course_content: Vec<Id>,
    pub rating_and_reviews: Vec<RatingAndReview>,
}

/// A course with instructor, category, ratings and content populated.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseDetails {
    #[serde(flatten)]
    pub course: CourseFields,
    pub instructor: Option<UserDetails>,
    pub category: Option<Category>,
    pub rating_and_reviews: Vec<RatingAndReview>,
    pub course_content: Vec<SectionContent>,
}

impl CourseDetails {
    pub fn without_videos(mut self) -> CourseDetails {
        self.course_content = self
            .course_content
            .into_iter()
            .map(SectionContent::without_videos)
            .collect();
        self
    }
}

/// Scalar fields of a [`Course`], shared by the populated views.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseFields {
    #[serde(rename = "_id")]
    pub id: Id,
    pub course_name: String,
    pub course_description: String,
    pub what_you_will_learn: String,
    pub price: u64,
    pub thumbnail: String,
    pub tag: Vec<String>,
    pub students_enrolled: Vec<Id>,
    pub instructions: Vec<String>,
    pub status: CourseStatus,
    pub sold: u64,
    pub created_at: DateTime<Utc>,
}

impl From<&Course> for CourseFields {
    fn from(c: &Course) -> Self {
        CourseFields {
            id: c.id,
            course_name: c.course_name.clone(),
            course_description: c.course_description.clone(),
            what_you_will_learn: c.what_you_will_learn.clone(),
            price: c.price,
            thumbnail: c.thumbnail.clone(),
            tag: c.tag.clone(),
            students_enrolled: c.students_enrolled.clone(),
            instructions: c.instructions.clone(),
            status: c.status,
            sold: c.sold,
            created_at: c.created_at,
        }
    }
}

/// An enrolled course with its progress figures.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrolledCourse {
    #[serde(flatten)]
    pub course: CourseFields,
    pub instructor: Id,
    pub category: Id,
    pub course_content: Vec<SectionContent>,
    pub total_duration: String,
    pub progress_percentage: f64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseStats {
    #[serde(rename = "_id")]
    pub id: Id,
    pub course_name: String,
    pub course_description: String,
    pub total_students_enrolled: usize,
    pub total_amount_generated: u64,
}

impl From<&Course> for CourseStats {
    fn from(c: &Course) -> Self {
        let students = c.students_enrolled.len();
        CourseStats {
            id: c.id,
            course_name: c.course_name.clone(),
            course_description: c.course_description.clone(),
            total_students_enrolled: students,
            total_amount_generated: (students as u64).saturating_mul(c.price),
        }
    }
}
