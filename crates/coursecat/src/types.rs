use std::borrow::Cow;
use std::fmt::Display;

use schemars::{JsonSchema, Schema, SchemaGenerator, json_schema};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

/// Placeholder written out for any field that could not be parsed.
pub const SENTINEL: &str = "N/A";

/// A parsed value, or the explicit "unknown" sentinel.
///
/// Serializes as the bare value when known and as [`SENTINEL`] otherwise, so a
/// record always carries every key.
#[derive(Debug, Clone, PartialEq)]
pub enum Field<T> {
    Known(T),
    Unknown,
}

impl<T> Field<T> {
    pub fn is_known(&self) -> bool {
        matches!(self, Field::Known(_))
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Field::Unknown)
    }

    pub fn as_option(&self) -> Option<&T> {
        match self {
            Field::Known(value) => Some(value),
            Field::Unknown => None,
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Field::Known(value) => Some(value),
            Field::Unknown => None,
        }
    }
}

impl<T> Default for Field<T> {
    fn default() -> Self {
        Field::Unknown
    }
}

impl<T> From<Option<T>> for Field<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Field::Unknown, Field::Known)
    }
}

impl<T: Display> Display for Field<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Field::Known(value) => write!(f, "{}", value),
            Field::Unknown => f.write_str(SENTINEL),
        }
    }
}

impl<T: Serialize> Serialize for Field<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Field::Known(value) => value.serialize(serializer),
            Field::Unknown => serializer.serialize_str(SENTINEL),
        }
    }
}

struct Sentinel;

impl<'de> Deserialize<'de> for Sentinel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        if s == SENTINEL {
            Ok(Sentinel)
        } else {
            Err(de::Error::custom(format!("expected {SENTINEL:?}, got {s:?}")))
        }
    }
}

// A stored string equal to the sentinel reads back as `Unknown`.
impl<'de, T: Deserialize<'de>> Deserialize<'de> for Field<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr<U> {
            Sentinel(Sentinel),
            Known(U),
        }

        Ok(match Repr::<T>::deserialize(deserializer)? {
            Repr::Sentinel(_) => Field::Unknown,
            Repr::Known(value) => Field::Known(value),
        })
    }
}

impl<T: JsonSchema> JsonSchema for Field<T> {
    fn schema_name() -> Cow<'static, str> {
        format!("Field_{}", T::schema_name()).into()
    }

    fn json_schema(generator: &mut SchemaGenerator) -> Schema {
        json_schema!({
            "anyOf": [
                generator.subschema_for::<T>(),
                { "const": SENTINEL }
            ]
        })
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct Units {
    pub credits: Field<f64>,
    pub fee_index: Field<u32>,
    pub term: Field<String>,
}

impl Units {
    pub fn unknown() -> Self {
        Self::default()
    }

    pub fn is_unknown(&self) -> bool {
        self.credits.is_unknown() && self.fee_index.is_unknown() && self.term.is_unknown()
    }
}

impl Display for Units {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_unknown() {
            return f.write_str(SENTINEL);
        }
        write!(
            f,
            "{} unit(s), fi {}, {}",
            self.credits, self.fee_index, self.term
        )
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct CourseRecord {
    pub department: Field<String>,
    #[serde(rename = "courseCode")]
    pub course_code: Field<String>,
    pub title: Field<String>,
    pub description: Field<String>,
    pub units: Units,
    pub url: Field<String>,
}

impl CourseRecord {
    /// True when nothing at all could be extracted from the block.
    pub fn is_empty(&self) -> bool {
        self.department.is_unknown()
            && self.course_code.is_unknown()
            && self.title.is_unknown()
            && self.description.is_unknown()
            && self.units.is_unknown()
            && self.url.is_unknown()
    }

    /// The course URL made absolute against `host` when it is relative.
    pub fn absolute_url(&self, host: &str) -> Option<String> {
        let url = self.url.as_option()?;
        if url.starts_with("http") {
            Some(url.clone())
        } else {
            Some(format!(
                "{}/{}",
                host.trim_end_matches('/'),
                url.trim_start_matches('/')
            ))
        }
    }
}

impl Display for CourseRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "┌─ {} ─ {}", self.course_code, self.title)?;
        writeln!(f, "│  Department: {}", self.department)?;
        writeln!(f, "│  Units: {}", self.units)?;
        writeln!(f, "│  URL: {}", self.url)?;
        match &self.description {
            Field::Known(description) => {
                let preview: String = description.chars().take(120).collect();
                if preview.len() < description.len() {
                    writeln!(f, "└─ {}…", preview)
                } else {
                    writeln!(f, "└─ {}", preview)
                }
            }
            Field::Unknown => writeln!(f, "└─ {}", SENTINEL),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> CourseRecord {
        CourseRecord {
            department: Field::Known("cmput".to_string()),
            course_code: Field::Known("CMPUT 174".to_string()),
            title: Field::Unknown,
            description: Field::Known("Intro course.".to_string()),
            units: Units {
                credits: Field::Known(3.0),
                fee_index: Field::Known(6),
                term: Field::Known("either term".to_string()),
            },
            url: Field::Unknown,
        }
    }

    #[test]
    fn test_serialize_uses_sentinel_and_original_keys() {
        let value = serde_json::to_value(sample()).expect("Failed to serialize");

        assert_eq!(value["department"], json!("cmput"));
        assert_eq!(value["courseCode"], json!("CMPUT 174"));
        assert_eq!(value["title"], json!("N/A"));
        assert_eq!(value["url"], json!("N/A"));
        assert_eq!(value["units"]["credits"], json!(3.0));
        assert_eq!(value["units"]["fee_index"], json!(6));
        assert_eq!(value["units"]["term"], json!("either term"));
    }

    #[test]
    fn test_unknown_units_serialize_every_key() {
        let value = serde_json::to_value(CourseRecord::default()).expect("Failed to serialize");

        for key in ["department", "courseCode", "title", "description", "url"] {
            assert_eq!(value[key], json!("N/A"), "key {key}");
        }
        for key in ["credits", "fee_index", "term"] {
            assert_eq!(value["units"][key], json!("N/A"), "units key {key}");
        }
    }

    #[test]
    fn test_deserialize_stored_record() {
        let stored = json!({
            "department": "int d",
            "courseCode": "INT D 410",
            "title": "Interdisciplinary Topic",
            "description": "N/A",
            "units": { "credits": "N/A", "fee_index": "N/A", "term": "N/A" },
            "url": "/catalogue/course/int_d/410"
        });

        let record: CourseRecord = serde_json::from_value(stored).expect("Failed to deserialize");

        assert_eq!(record.department, Field::Known("int d".to_string()));
        assert!(record.description.is_unknown());
        assert!(record.units.is_unknown());
    }

    #[test]
    fn test_deserialize_rejects_wrong_type() {
        let result = serde_json::from_value::<Field<u32>>(json!("six"));
        assert!(result.is_err());
    }

    #[test]
    fn test_absolute_url() {
        let mut record = sample();
        assert_eq!(record.absolute_url("https://apps.ualberta.ca"), None);

        record.url = Field::Known("/catalogue/course/cmput/174".to_string());
        assert_eq!(
            record.absolute_url("https://apps.ualberta.ca/").as_deref(),
            Some("https://apps.ualberta.ca/catalogue/course/cmput/174")
        );

        record.url = Field::Known("https://example.org/c/1".to_string());
        assert_eq!(
            record.absolute_url("https://apps.ualberta.ca").as_deref(),
            Some("https://example.org/c/1")
        );
    }

    #[test]
    fn test_display_units() {
        assert_eq!(sample().units.to_string(), "3 unit(s), fi 6, either term");
        assert_eq!(Units::unknown().to_string(), "N/A");
    }
}
