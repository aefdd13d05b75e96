//! Domain entities: people, relationships and their validated ingestion

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::domain::error::{DomainError, DomainResult};

/// Identity of a person within one family tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonId(String);

impl PersonId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PersonId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    #[default]
    Other,
}

impl std::str::FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "other" | "" => Ok(Gender::Other),
            other => Err(format!("unknown gender: {other}")),
        }
    }
}

/// A family member as seen by the layout core. Read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Person {
    pub id: PersonId,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub gender: Gender,
    pub birth_date: Option<NaiveDate>,
    pub death_date: Option<NaiveDate>,
    /// Portrait reference (URL or storage key)
    pub photo_url: Option<String>,
    pub is_root: bool,
}

impl Person {
    /// Minimal constructor, mostly for tests and fixtures.
    pub fn new(id: impl Into<String>, first_name: &str, last_name: &str) -> Self {
        Self {
            id: PersonId::new(id),
            first_name: first_name.to_string(),
            middle_name: None,
            last_name: last_name.to_string(),
            gender: Gender::Other,
            birth_date: None,
            death_date: None,
            photo_url: None,
            is_root: false,
        }
    }

    pub fn born(mut self, date: NaiveDate) -> Self {
        self.birth_date = Some(date);
        self
    }

    pub fn as_root(mut self) -> Self {
        self.is_root = true;
        self
    }

    pub fn full_name(&self) -> String {
        match &self.middle_name {
            Some(middle) => format!("{} {} {}", self.first_name, middle, self.last_name),
            None => format!("{} {}", self.first_name, self.last_name),
        }
    }

    pub fn birth_year(&self) -> Option<i32> {
        self.birth_date.map(|d| d.year())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipKind {
    /// Symmetric marriage/partnership
    Spouse,
    /// Directed: person1 is the parent of person2
    ParentChild,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Relationship {
    pub id: String,
    pub person1: PersonId,
    pub person2: PersonId,
    pub kind: RelationshipKind,
}

impl Relationship {
    pub fn spouse(id: &str, a: &str, b: &str) -> Self {
        Self {
            id: id.to_string(),
            person1: a.into(),
            person2: b.into(),
            kind: RelationshipKind::Spouse,
        }
    }

    pub fn parent_child(id: &str, parent: &str, child: &str) -> Self {
        Self {
            id: id.to_string(),
            person1: parent.into(),
            person2: child.into(),
            kind: RelationshipKind::ParentChild,
        }
    }
}

/// Member record as delivered by the backend, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MemberRecord {
    #[serde(alias = "_id")]
    pub id: String,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub gender: Option<String>,
    pub birth_date: Option<String>,
    pub death_date: Option<String>,
    #[serde(alias = "profile_image")]
    pub photo_url: Option<String>,
    pub is_root: Option<bool>,
}

/// Relationship record as delivered by the backend, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RelationshipRecord {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(alias = "person1_id")]
    pub person1: String,
    #[serde(alias = "person2_id")]
    pub person2: String,
    #[serde(alias = "relationship_type")]
    pub kind: String,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Calendar date of a plain ISO date or a full ISO 8601 date-time.
///
/// Date-times keep the date as written, in their own offset.
fn parse_date(id: &str, field: &str, value: Option<String>) -> DomainResult<Option<NaiveDate>> {
    let Some(raw) = non_blank(value) else {
        return Ok(None);
    };
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .or_else(|e| {
            DateTime::parse_from_rfc3339(&raw)
                .map(|dt| dt.date_naive())
                .or_else(|_| {
                    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
                        .map(|dt| dt.date())
                })
                .map_err(|_| e)
        })
        .map(Some)
        .map_err(|e| DomainError::InvalidRecord {
            id: id.to_string(),
            message: format!("{field} '{raw}' is not an ISO date: {e}"),
        })
}

impl TryFrom<MemberRecord> for Person {
    type Error = DomainError;

    fn try_from(record: MemberRecord) -> Result<Self, Self::Error> {
        let id = record.id.trim().to_string();
        if id.is_empty() {
            return Err(DomainError::InvalidRecord {
                id: "<member>".to_string(),
                message: "member id is empty".to_string(),
            });
        }
        let first_name = record.first_name.trim().to_string();
        if first_name.is_empty() {
            return Err(DomainError::InvalidRecord {
                id,
                message: "first name is empty".to_string(),
            });
        }
        let gender = match record.gender {
            Some(g) => g.parse().map_err(|message| DomainError::InvalidRecord {
                id: id.clone(),
                message,
            })?,
            None => Gender::Other,
        };
        let birth_date = parse_date(&id, "birth_date", record.birth_date)?;
        let death_date = parse_date(&id, "death_date", record.death_date)?;

        Ok(Self {
            first_name,
            middle_name: non_blank(record.middle_name),
            last_name: record.last_name.trim().to_string(),
            gender,
            birth_date,
            death_date,
            photo_url: non_blank(record.photo_url),
            is_root: record.is_root.unwrap_or(false),
            id: PersonId(id),
        })
    }
}

impl TryFrom<RelationshipRecord> for Relationship {
    type Error = DomainError;

    fn try_from(record: RelationshipRecord) -> Result<Self, Self::Error> {
        let id = record.id.trim().to_string();
        let invalid = |message: String| DomainError::InvalidRecord {
            id: if id.is_empty() { "<relationship>".to_string() } else { id.clone() },
            message,
        };
        if id.is_empty() {
            return Err(invalid("relationship id is empty".to_string()));
        }
        let person1 = record.person1.trim();
        let person2 = record.person2.trim();
        if person1.is_empty() || person2.is_empty() {
            return Err(invalid("relationship is missing a person id".to_string()));
        }
        if person1 == person2 {
            return Err(invalid(format!("{person1} cannot be related to themselves")));
        }
        let kind = match record.kind.trim() {
            "spouse" => RelationshipKind::Spouse,
            "parent_child" => RelationshipKind::ParentChild,
            other => return Err(invalid(format!("unknown relationship type: '{other}'"))),
        };

        Ok(Self {
            person1: PersonId::new(person1),
            person2: PersonId::new(person2),
            kind,
            id,
        })
    }
}

/// Validate raw backend records into typed people and relationships.
///
/// Record order is preserved. Relationships may still reference ids that are not
/// in the member list; the builder drops those edges.
pub fn ingest(
    members: Vec<MemberRecord>,
    relationships: Vec<RelationshipRecord>,
) -> DomainResult<(Vec<Person>, Vec<Relationship>)> {
    let mut seen = HashSet::new();
    let mut persons = Vec::with_capacity(members.len());
    for record in members {
        let person = Person::try_from(record)?;
        if !seen.insert(person.id.clone()) {
            return Err(DomainError::InvalidRecord {
                id: person.id.to_string(),
                message: "duplicate member id".to_string(),
            });
        }
        persons.push(person);
    }

    let relationships = relationships
        .into_iter()
        .map(Relationship::try_from)
        .collect::<DomainResult<Vec<_>>>()?;

    Ok((persons, relationships))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn member(id: &str, first: &str) -> MemberRecord {
        MemberRecord {
            id: id.to_string(),
            first_name: first.to_string(),
            last_name: "Smith".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn given_valid_member_record_when_converting_then_parses_dates_and_gender() {
        let record = MemberRecord {
            gender: Some("Female".to_string()),
            birth_date: Some("1952-07-25".to_string()),
            death_date: Some("".to_string()),
            middle_name: Some("  ".to_string()),
            ..member("e", "Elizabeth")
        };

        let person = Person::try_from(record).unwrap();

        assert_eq!(person.gender, Gender::Female);
        assert_eq!(person.birth_date, NaiveDate::from_ymd_opt(1952, 7, 25));
        assert_eq!(person.death_date, None);
        assert_eq!(person.middle_name, None);
        assert!(!person.is_root);
    }

    #[test]
    fn given_malformed_birth_date_when_converting_then_rejects_record() {
        let record = MemberRecord {
            birth_date: Some("25/07/1952".to_string()),
            ..member("e", "Elizabeth")
        };

        let err = Person::try_from(record).unwrap_err();

        assert!(err.to_string().contains("birth_date"), "{err}");
    }

    #[rstest]
    #[case::utc_millis("1950-03-01T00:00:00.000Z")]
    #[case::offset("1950-03-01T23:30:00+02:00")]
    #[case::no_zone("1950-03-01T12:00:00")]
    fn given_iso_date_time_when_converting_then_keeps_calendar_date(#[case] raw: &str) {
        let record = MemberRecord {
            birth_date: Some(raw.to_string()),
            ..member("a", "Arthur")
        };

        let person = Person::try_from(record).unwrap();

        assert_eq!(person.birth_date, NaiveDate::from_ymd_opt(1950, 3, 1));
    }

    #[rstest]
    #[case::garbage_time("1950-03-01Tnoon")]
    #[case::bad_month("1950-13-01T00:00:00Z")]
    fn given_broken_date_time_when_converting_then_rejects_record(#[case] raw: &str) {
        let record = MemberRecord {
            birth_date: Some(raw.to_string()),
            ..member("a", "Arthur")
        };

        assert!(Person::try_from(record).is_err());
    }

    #[test]
    fn given_duplicate_member_ids_when_ingesting_then_errors() {
        let result = ingest(vec![member("a", "Ann"), member("a", "Anna")], vec![]);

        assert!(matches!(result, Err(DomainError::InvalidRecord { .. })));
    }

    #[test]
    fn given_unknown_relationship_type_when_ingesting_then_errors() {
        let rel = RelationshipRecord {
            id: "r1".to_string(),
            person1: "a".to_string(),
            person2: "b".to_string(),
            kind: "sibling".to_string(),
        };

        let result = ingest(vec![member("a", "Ann"), member("b", "Bob")], vec![rel]);

        assert!(result.unwrap_err().to_string().contains("sibling"));
    }

    #[test]
    fn given_self_relationship_when_ingesting_then_errors() {
        let rel = RelationshipRecord {
            id: "r1".to_string(),
            person1: "a".to_string(),
            person2: "a".to_string(),
            kind: "spouse".to_string(),
        };

        assert!(ingest(vec![member("a", "Ann")], vec![rel]).is_err());
    }

    #[test]
    fn given_relationship_to_unknown_member_when_ingesting_then_keeps_it() {
        let rel = RelationshipRecord {
            id: "r1".to_string(),
            person1: "a".to_string(),
            person2: "ghost".to_string(),
            kind: "parent_child".to_string(),
        };

        let (_, relationships) = ingest(vec![member("a", "Ann")], vec![rel]).unwrap();

        assert_eq!(relationships.len(), 1);
        assert_eq!(relationships[0].kind, RelationshipKind::ParentChild);
    }

    #[test]
    fn test_full_name_with_middle_name() {
        let mut person = Person::new("j", "John", "Smith");
        assert_eq!(person.full_name(), "John Smith");
        person.middle_name = Some("Q".to_string());
        assert_eq!(person.full_name(), "John Q Smith");
    }
}
