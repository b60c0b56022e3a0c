//! Relationship type and related structures.
//!
//! Relationships are directed, typed edges between two relatives. The core
//! never mirrors them: "A father of B" and "B son of A" are separate records.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::relative::RelativeId;

/// Stable relationship identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelationshipId(pub i64);

impl RelationshipId {
    /// Create a new RelationshipId from a raw i64.
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

impl fmt::Display for RelationshipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Relationship({})", self.0)
    }
}

impl From<i64> for RelationshipId {
    #[inline]
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Wire colour used for tags without a dedicated colour.
pub const FALLBACK_COLOR: &str = "#AC6D78";

macro_rules! relationship_types {
    ($($variant:ident => $tag:literal, $label:literal, $color:expr;)*) => {
        /// Closed set of relationship tags understood by the canvas.
        ///
        /// Tags the canvas does not know deserialize to [`RelationshipType::Unknown`].
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum RelationshipType {
            $(
                #[serde(rename = $tag)]
                $variant,
            )*
            #[serde(rename = "unknown")]
            #[serde(other)]
            Unknown,
        }

        impl RelationshipType {
            /// Every known type, `Unknown` last.
            pub const ALL: &'static [RelationshipType] = &[
                $(RelationshipType::$variant,)*
                RelationshipType::Unknown,
            ];

            /// Wire tag, e.g. `"father_in_law"`.
            pub fn as_str(self) -> &'static str {
                match self {
                    $(RelationshipType::$variant => $tag,)*
                    RelationshipType::Unknown => "unknown",
                }
            }

            /// Display label rendered in the edge pill.
            ///
            /// `Unknown` has no label of its own; [`Relationship::label`]
            /// shows the raw tag instead.
            pub fn label(self) -> &'static str {
                match self {
                    $(RelationshipType::$variant => $label,)*
                    RelationshipType::Unknown => "unknown",
                }
            }

            /// Wire and marker colour.
            pub fn color(self) -> &'static str {
                match self {
                    $(RelationshipType::$variant => $color,)*
                    RelationshipType::Unknown => FALLBACK_COLOR,
                }
            }
        }
    };
}

relationship_types! {
    // Parents
    Parent => "parent", "Родитель", "#D9845F";
    Father => "father", "Отец", "#E8956E";
    Mother => "mother", "Мать", "#F0A986";
    Stepfather => "stepfather", "Отчим", "#F0BDA4";
    Stepmother => "stepmother", "Мачеха", "#F5CCBA";
    AdoptiveFather => "adoptive_father", "Приёмный отец", FALLBACK_COLOR;
    AdoptiveMother => "adoptive_mother", "Приёмная мать", FALLBACK_COLOR;
    // Children
    Child => "child", "Ребёнок", "#6BA5CA";
    Son => "son", "Сын", "#7EB5D6";
    Daughter => "daughter", "Дочь", "#96C5E0";
    Stepson => "stepson", "Пасынок", "#AED4EA";
    Stepdaughter => "stepdaughter", "Падчерица", "#C5E0F0";
    AdoptiveSon => "adoptive_son", "Приёмный сын", FALLBACK_COLOR;
    AdoptiveDaughter => "adoptive_daughter", "Приёмная дочь", FALLBACK_COLOR;
    // Grandparents and grandchildren
    Grandfather => "grandfather", "Дед", "#D4A65A";
    Grandmother => "grandmother", "Бабушка", "#E0B96E";
    GreatGrandfather => "great_grandfather", "Прадед", FALLBACK_COLOR;
    GreatGrandmother => "great_grandmother", "Прабабушка", FALLBACK_COLOR;
    Grandson => "grandson", "Внук", "#6EB5B0";
    Granddaughter => "granddaughter", "Внучка", "#88C5C0";
    GreatGrandson => "great_grandson", "Правнук", FALLBACK_COLOR;
    GreatGranddaughter => "great_granddaughter", "Правнучка", FALLBACK_COLOR;
    // Siblings
    Sibling => "sibling", "Сиблинг", FALLBACK_COLOR;
    Brother => "brother", "Брат", "#B88A94";
    Sister => "sister", "Сестра", "#C9A0A8";
    HalfBrother => "half_brother", "Сводный брат", "#D4B5BC";
    HalfSister => "half_sister", "Сводная сестра", "#E0C8CE";
    Stepbrother => "stepbrother", "Сводный брат", FALLBACK_COLOR;
    Stepsister => "stepsister", "Сводная сестра", FALLBACK_COLOR;
    // Spouses
    Spouse => "spouse", "В браке", "#ED7855";
    Husband => "husband", "В браке", "#ED7855";
    Wife => "wife", "В браке", "#ED7855";
    ExSpouse => "ex_spouse", "Был(а) в браке", "#E89580";
    ExHusband => "ex_husband", "Был в браке", FALLBACK_COLOR;
    ExWife => "ex_wife", "Была в браке", FALLBACK_COLOR;
    Partner => "partner", "Партнёр", "#FFA477";
    // Extended family
    Uncle => "uncle", "Дядя", "#8B8ABF";
    Aunt => "aunt", "Тётя", "#A09FC8";
    GreatUncle => "great_uncle", "Двоюродный дед", FALLBACK_COLOR;
    GreatAunt => "great_aunt", "Двоюродная бабушка", FALLBACK_COLOR;
    Nephew => "nephew", "Племянник", "#6EAA9E";
    Niece => "niece", "Племянница", "#88BDB3";
    GrandNephew => "grand_nephew", "Внучатый племянник", FALLBACK_COLOR;
    GrandNiece => "grand_niece", "Внучатая племянница", FALLBACK_COLOR;
    Cousin => "cousin", "Кузен", "#C48BA0";
    SecondCousin => "second_cousin", "Троюродный", FALLBACK_COLOR;
    // In-laws
    FatherInLaw => "father_in_law", "Тесть", "#8A8090";
    MotherInLaw => "mother_in_law", "Тёща", "#A098A6";
    SonInLaw => "son_in_law", "Зять", "#706878";
    DaughterInLaw => "daughter_in_law", "Невестка", "#B8B0BF";
    BrotherInLaw => "brother_in_law", "Деверь", "#605868";
    SisterInLaw => "sister_in_law", "Золовка", "#C8C0CE";
    // Godparents
    Godfather => "godfather", "Крёстный", "#7A70A8";
    Godmother => "godmother", "Крёстная", "#8E85B5";
    Godson => "godson", "Крестник", "#9585B8";
    Goddaughter => "goddaughter", "Крестница", "#A898C5";
    // Other
    Guardian => "guardian", "Опекун", "#B880C0";
    Ward => "ward", "Подопечный", "#C898D0";
}

impl RelationshipType {
    /// Types treated as an ancestor -> descendant edge when building the tree.
    pub fn is_parent_like(self) -> bool {
        matches!(
            self,
            RelationshipType::Father
                | RelationshipType::Mother
                | RelationshipType::Parent
                | RelationshipType::Stepfather
                | RelationshipType::Stepmother
                | RelationshipType::Guardian
        )
    }

    /// Types drawn as a horizontal marriage wire.
    pub fn is_spousal(self) -> bool {
        matches!(
            self,
            RelationshipType::Spouse
                | RelationshipType::Husband
                | RelationshipType::Wife
                | RelationshipType::ExSpouse
                | RelationshipType::Partner
        )
    }

    pub fn is_sibling(self) -> bool {
        matches!(
            self,
            RelationshipType::Brother
                | RelationshipType::Sister
                | RelationshipType::HalfBrother
                | RelationshipType::HalfSister
                | RelationshipType::Sibling
        )
    }

    /// Look up a tag; anything unrecognised maps to `Unknown`.
    pub fn from_tag(tag: &str) -> Self {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == tag)
            .unwrap_or(RelationshipType::Unknown)
    }
}

impl FromStr for RelationshipType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_tag(s))
    }
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A directed, typed edge between two relatives.
///
/// On the wire `relationship_type` is a plain tag string. Tags outside the
/// known set become [`RelationshipType::Unknown`] and the original text is
/// kept in `unrecognized_tag`, so it can still be shown and written back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RelationshipRecord", into = "RelationshipRecord")]
pub struct Relationship {
    pub id: RelationshipId,
    pub from_relative_id: RelativeId,
    pub to_relative_id: RelativeId,
    pub relationship_type: RelationshipType,
    pub unrecognized_tag: Option<String>,
}

/// Wire shape of [`Relationship`].
#[derive(Serialize, Deserialize)]
struct RelationshipRecord {
    id: RelationshipId,
    from_relative_id: RelativeId,
    to_relative_id: RelativeId,
    relationship_type: String,
}

impl From<RelationshipRecord> for Relationship {
    fn from(record: RelationshipRecord) -> Self {
        Relationship::tagged(
            record.id,
            record.from_relative_id,
            record.to_relative_id,
            &record.relationship_type,
        )
    }
}

impl From<Relationship> for RelationshipRecord {
    fn from(rel: Relationship) -> Self {
        let relationship_type = match rel.unrecognized_tag {
            Some(tag) => tag,
            None => rel.relationship_type.as_str().to_owned(),
        };
        RelationshipRecord {
            id: rel.id,
            from_relative_id: rel.from_relative_id,
            to_relative_id: rel.to_relative_id,
            relationship_type,
        }
    }
}

impl Relationship {
    pub fn new(
        id: impl Into<RelationshipId>,
        from: impl Into<RelativeId>,
        to: impl Into<RelativeId>,
        relationship_type: RelationshipType,
    ) -> Self {
        Self {
            id: id.into(),
            from_relative_id: from.into(),
            to_relative_id: to.into(),
            relationship_type,
            unrecognized_tag: None,
        }
    }

    /// Build from a wire tag, keeping tags the canvas does not know.
    pub fn tagged(
        id: impl Into<RelationshipId>,
        from: impl Into<RelativeId>,
        to: impl Into<RelativeId>,
        tag: &str,
    ) -> Self {
        let relationship_type = RelationshipType::from_tag(tag);
        let mut rel = Self::new(id, from, to, relationship_type);
        if relationship_type == RelationshipType::Unknown && tag != relationship_type.as_str() {
            rel.unrecognized_tag = Some(tag.to_owned());
        }
        rel
    }

    /// Edge label: the type's label, or the raw tag for unknown types.
    pub fn label(&self) -> &str {
        match &self.unrecognized_tag {
            Some(tag) => tag,
            None => self.relationship_type.label(),
        }
    }

    /// Unordered endpoint pair, used to fan out parallel edges.
    pub fn pair_key(&self) -> (RelativeId, RelativeId) {
        if self.from_relative_id <= self.to_relative_id {
            (self.from_relative_id, self.to_relative_id)
        } else {
            (self.to_relative_id, self.from_relative_id)
        }
    }

    pub fn is_self_loop(&self) -> bool {
        self.from_relative_id == self.to_relative_id
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_relationship_id() {
        let id = RelationshipId::new(9);
        assert_eq!(id.raw(), 9);
        assert_eq!(format!("{}", id), "Relationship(9)");
    }

    #[test]
    fn test_tags_round_trip_through_lookup() {
        for &ty in RelationshipType::ALL {
            assert_eq!(RelationshipType::from_tag(ty.as_str()), ty, "tag {}", ty);
        }
        assert_eq!(RelationshipType::from_tag("martian"), RelationshipType::Unknown);
    }

    #[test]
    fn test_tags_are_unique() {
        let tags: HashSet<_> = RelationshipType::ALL.iter().map(|t| t.as_str()).collect();
        assert_eq!(tags.len(), RelationshipType::ALL.len());
    }

    #[test]
    fn test_unknown_tag_deserializes_to_unknown() {
        let rel: Relationship = serde_json::from_value(serde_json::json!({
            "id": 1,
            "user_id": 3,
            "from_relative_id": 1,
            "to_relative_id": 2,
            "relationship_type": "best_friend",
            "is_active": true
        }))
        .unwrap();
        assert_eq!(rel.relationship_type, RelationshipType::Unknown);
        assert_eq!(rel.unrecognized_tag.as_deref(), Some("best_friend"));
        assert_eq!(rel.label(), "best_friend");
        assert_eq!(rel.relationship_type.color(), FALLBACK_COLOR);

        let written = serde_json::to_value(&rel).unwrap();
        assert_eq!(written["relationship_type"], "best_friend");

        let known: Relationship = serde_json::from_value(serde_json::json!({
            "id": 2,
            "from_relative_id": 1,
            "to_relative_id": 2,
            "relationship_type": "mother"
        }))
        .unwrap();
        assert_eq!(known, Relationship::new(2, 1, 2, RelationshipType::Mother));
        assert_eq!(known.label(), "Мать");

        let literal = Relationship::tagged(3, 1, 2, "unknown");
        assert_eq!(literal.unrecognized_tag, None);
        assert_eq!(literal.label(), "unknown");

        let father: RelationshipType = serde_json::from_str("\"father_in_law\"").unwrap();
        assert_eq!(father, RelationshipType::FatherInLaw);
    }

    #[test]
    fn test_categories() {
        assert!(RelationshipType::Guardian.is_parent_like());
        assert!(!RelationshipType::Son.is_parent_like());
        assert!(!RelationshipType::AdoptiveFather.is_parent_like());
        assert!(RelationshipType::Partner.is_spousal());
        assert!(!RelationshipType::ExHusband.is_spousal());
        assert!(RelationshipType::HalfSister.is_sibling());
        assert!(!RelationshipType::Cousin.is_sibling());
    }

    #[test]
    fn test_labels_and_colors() {
        assert_eq!(RelationshipType::Father.label(), "Отец");
        assert_eq!(RelationshipType::Father.color(), "#E8956E");
        assert_eq!(RelationshipType::Unknown.color(), FALLBACK_COLOR);
        assert_eq!(RelationshipType::Husband.label(), RelationshipType::Wife.label());
    }

    #[test]
    fn test_pair_key_is_unordered() {
        let a = Relationship::new(1, 4, 2, RelationshipType::Father);
        let b = Relationship::new(2, 2, 4, RelationshipType::Son);
        assert_eq!(a.pair_key(), b.pair_key());
        assert!(!a.is_self_loop());
    }
}
