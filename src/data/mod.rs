use bson::Bson;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

pub mod category;
pub mod course;
pub mod progress;
pub mod rating;
pub mod section;
pub mod user;

/// Document identifier.
///
/// Always stored as a UUID string, in JSON bodies as well as in BSON
/// documents, so that filters built with [`filter`] match what the serializer
/// wrote.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd, ToSchema)]
pub struct Id(Uuid);

impl Id {
    pub fn new() -> Id {
        Id(Uuid::new_v4())
    }
}

impl Default for Id {
    fn default() -> Self {
        Id::new()
    }
}

impl From<Uuid> for Id {
    fn from(value: Uuid) -> Self {
        Id(value)
    }
}

impl FromStr for Id {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Id)
    }
}

impl Display for Id {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl Serialize for Id {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Id::from_str(&value).map_err(serde::de::Error::custom)
    }
}

impl From<Id> for Bson {
    fn from(id: Id) -> Self {
        Bson::String(id.to_string())
    }
}

pub mod filter {
    use super::Id;
    use bson::{doc, Bson, Document};

    #[inline]
    pub fn by_id(id: &Id) -> Document {
        doc! { "_id": id }
    }

    #[inline]
    pub fn by_ids(ids: &[Id]) -> Document {
        let ids: Vec<Bson> = ids.iter().map(Bson::from).collect();
        doc! { "_id": { "$in": ids } }
    }
}
