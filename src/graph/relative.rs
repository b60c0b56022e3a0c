//! Relative type and related structures.
//!
//! Relatives are the person cards of the family tree. Each relative has:
//! - A stable identifier assigned by the backend
//! - Display name fields
//! - Optional birth/death dates and gender
//! - An optional user-assigned generation row
//! - A story map (`context`) used only to flag "has stories"

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Stable relative identifier.
///
/// Wraps the backend's integer id. Serialized transparently so payloads keep
/// the plain number the API returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelativeId(pub i64);

impl RelativeId {
    /// Create a new RelativeId from a raw i64.
    #[inline]
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the raw i64 value.
    #[inline]
    pub fn raw(self) -> i64 {
        self.0
    }
}

impl fmt::Display for RelativeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Relative({})", self.0)
    }
}

impl From<i64> for RelativeId {
    #[inline]
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<RelativeId> for i64 {
    #[inline]
    fn from(id: RelativeId) -> Self {
        id.0
    }
}

/// Gender as stored by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

/// A person node in the family tree.
///
/// Unknown payload fields (photo URL, Telegram linkage, timestamps) are
/// ignored on deserialization; the canvas never reads them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relative {
    pub id: RelativeId,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub middle_name: Option<String>,
    #[serde(default)]
    pub birth_date: Option<String>,
    #[serde(default)]
    pub death_date: Option<String>,
    #[serde(default)]
    pub gender: Option<Gender>,
    /// User-assigned generation row. Not derived from graph depth.
    #[serde(default)]
    pub generation: Option<i32>,
    /// Story title -> story body (plain text or `{text, media}` object).
    #[serde(default)]
    pub context: Option<Map<String, Value>>,
}

impl Relative {
    /// Create a relative with only identity and name set.
    pub fn new(id: impl Into<RelativeId>, first_name: &str, last_name: &str) -> Self {
        Self {
            id: id.into(),
            first_name: first_name.to_owned(),
            last_name: last_name.to_owned(),
            middle_name: None,
            birth_date: None,
            death_date: None,
            gender: None,
            generation: None,
            context: None,
        }
    }

    pub fn with_generation(mut self, generation: i32) -> Self {
        self.generation = Some(generation);
        self
    }

    pub fn with_gender(mut self, gender: Gender) -> Self {
        self.gender = Some(gender);
        self
    }

    pub fn with_middle_name(mut self, middle_name: &str) -> Self {
        self.middle_name = Some(middle_name.to_owned());
        self
    }

    pub fn with_death_date(mut self, date: &str) -> Self {
        self.death_date = Some(date.to_owned());
        self
    }

    /// Attach a story under `title`.
    pub fn with_story(mut self, title: &str, text: &str) -> Self {
        self.context
            .get_or_insert_with(Map::new)
            .insert(title.to_owned(), Value::String(text.to_owned()));
        self
    }

    /// "first last middle", the string the search box matches against.
    pub fn full_name(&self) -> String {
        format!(
            "{} {} {}",
            self.first_name,
            self.last_name,
            self.middle_name.as_deref().unwrap_or("")
        )
    }

    /// A relative without a death date is considered alive.
    pub fn is_alive(&self) -> bool {
        self.death_date.as_deref().is_none_or(str::is_empty)
    }

    pub fn has_stories(&self) -> bool {
        self.context.as_ref().is_some_and(|c| !c.is_empty())
    }

    /// Generation row used for collision grouping (missing counts as 0).
    #[inline]
    pub fn generation_or_default(&self) -> i32 {
        self.generation.unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_id() {
        let id = RelativeId::new(42);
        assert_eq!(id.raw(), 42);
        assert_eq!(format!("{}", id), "Relative(42)");
        let raw: i64 = RelativeId::from(7).into();
        assert_eq!(raw, 7);
    }

    #[test]
    fn test_deserialize_api_payload() {
        let json = serde_json::json!({
            "id": 5,
            "user_id": 1,
            "first_name": "Анна",
            "last_name": "Петрова",
            "gender": "female",
            "generation": 2,
            "death_date": null,
            "is_active": true,
            "context": {"Война": "История о войне"}
        });
        let relative: Relative = serde_json::from_value(json).unwrap();
        assert_eq!(relative.id, RelativeId(5));
        assert_eq!(relative.gender, Some(Gender::Female));
        assert_eq!(relative.generation, Some(2));
        assert!(relative.is_alive());
        assert!(relative.has_stories());
    }

    #[test]
    fn test_story_and_alive_flags() {
        let plain = Relative::new(1, "Иван", "Иванов");
        assert!(!plain.has_stories());
        assert!(plain.is_alive());

        let empty_context = Relative {
            context: Some(Map::new()),
            ..plain.clone()
        };
        assert!(!empty_context.has_stories());

        let storied = plain.clone().with_story("Детство", "...");
        assert!(storied.has_stories());

        let deceased = plain.with_death_date("1990-01-01");
        assert!(!deceased.is_alive());
    }

    #[test]
    fn test_full_name_includes_middle_name() {
        let r = Relative::new(1, "Иван", "Иванов").with_middle_name("Петрович");
        assert_eq!(r.full_name(), "Иван Иванов Петрович");
    }
}
