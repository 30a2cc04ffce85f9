use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::section::SectionContent;
use super::Id;

pub static PROGRESS_COLLECTION_NAME: &str = "courseprogresses";

/// Completed sub-sections of one user in one course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseProgress {
    #[serde(rename = "_id")]
    pub id: Id,
    pub course_id: Id,
    pub user_id: Id,
    #[serde(default)]
    pub completed_videos: Vec<Id>,
}

impl CourseProgress {
    pub fn new(user_id: Id, course_id: Id) -> CourseProgress {
        CourseProgress {
            id: Id::new(),
            course_id,
            user_id,
            completed_videos: vec![],
        }
    }
}

/// Total seconds and number of sub-sections across all sections.
pub fn content_totals(content: &[SectionContent]) -> (u64, usize) {
    content
        .iter()
        .flat_map(|section| section.sub_section.iter())
        .fold((0, 0), |(secs, count), sub| {
            (secs + sub.duration_secs(), count + 1)
        })
}

/// Share of completed sub-sections as a percentage rounded to two decimals.
/// A course without content counts as complete.
pub fn completion_percentage(completed: usize, total: usize) -> f64 {
    if total == 0 {
        return 100.0;
    }
    let ratio = completed as f64 / total as f64 * 100.0;
    (ratio * 100.0).round() / 100.0
}
