use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::Id;
use crate::duration;

pub mod db;

pub static SECTION_COLLECTION_NAME: &str = "sections";
pub static SUB_SECTION_COLLECTION_NAME: &str = "subsections";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    #[serde(rename = "_id")]
    pub id: Id,
    pub section_name: String,
    #[serde(default)]
    pub sub_section: Vec<Id>,
}

impl Section {
    pub fn new(section_name: impl ToString) -> Section {
        Section {
            id: Id::new(),
            section_name: section_name.to_string(),
            sub_section: vec![],
        }
    }
}

/// Smallest content unit: a single lesson video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubSection {
    #[serde(rename = "_id")]
    pub id: Id,
    pub title: String,
    #[serde(default)]
    pub time_duration: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub video_url: String,
}

impl SubSection {
    pub fn duration_secs(&self) -> u64 {
        duration::parse_duration(&self.time_duration)
    }
}

/// A section with its sub-sections populated, in section order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionContent {
    #[serde(rename = "_id")]
    pub id: Id,
    pub section_name: String,
    pub sub_section: Vec<SubSection>,
}

impl SectionContent {
    pub fn new(section: Section, sub_sections: Vec<SubSection>) -> SectionContent {
        SectionContent {
            id: section.id,
            section_name: section.section_name,
            sub_section: sub_sections,
        }
    }

    pub fn without_videos(mut self) -> SectionContent {
        for sub in self.sub_section.iter_mut() {
            sub.video_url.clear();
        }
        self
    }
}
