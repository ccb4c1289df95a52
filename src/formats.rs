use serde::{Deserialize, Serialize};

/// A JSON value that may be written either as a string or as a number.
///
/// Record ids and seminar numbers appear in both forms in the data files and
/// are compared by their textual form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "RawScalar")]
pub struct Scalar(String);

pub type ItemId = Scalar;

#[derive(Deserialize)]
#[serde(untagged)]
enum RawScalar {
    Text(String),
    Number(serde_json::Number),
}

impl From<RawScalar> for Scalar {
    fn from(raw: RawScalar) -> Self {
        match raw {
            RawScalar::Text(text) => Self(text),
            RawScalar::Number(number) => Self(number.to_string()),
        }
    }
}

impl Scalar {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Scalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Person {
    pub id: ItemId,
    pub full_name: Option<String>,
    pub img: Option<String>,
    pub birth: Option<LifeEvent>,
    pub death: Option<LifeEvent>,
    /// Inline text, or a path to a `.md` file.
    pub biography_text: Option<String>,
    pub description: Option<String>,
    pub bio: Option<ShortBio>,
    pub occupations: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LifeEvent {
    pub date: Option<String>,
    pub place_id: Option<ItemId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ShortBio {
    pub short: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Place {
    pub id: ItemId,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Plain text that may contain `[text](url)` links.
    pub description: Option<String>,
    pub coordinates: Option<Coordinates>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Meeting {
    pub id: ItemId,
    pub title: Option<String>,
    pub date: Option<String>,
    pub image: Option<String>,
    pub audio: Option<String>,
    /// Path to a `.md` file with the meeting notes.
    pub notes: Option<String>,
    pub description: Option<String>,
}

/// Any record shown through the generic detail layout (books and the like).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GenericItem {
    pub id: ItemId,
    pub title: Option<String>,
    pub full_name: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub biography_text: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Seminar {
    pub number: Option<Scalar>,
    pub date: Option<String>,
    pub topic: Option<String>,
    pub materials: Option<String>,
    pub literature: Vec<LinkItem>,
    #[serde(rename = "additionalMaterials")]
    pub additional_materials: Vec<LinkItem>,
    pub plan: Option<Plan>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Plan {
    Steps(Vec<String>),
    Text(String),
}

impl Plan {
    /// Non-empty plan steps; a text plan is split on newlines.
    pub fn steps(&self) -> Vec<String> {
        match self {
            Self::Steps(steps) => steps
                .iter()
                .map(|step| step.trim().to_owned())
                .filter(|step| !step.is_empty())
                .collect(),
            Self::Text(text) => text
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_owned)
                .collect(),
        }
    }

    pub fn as_text(&self) -> String {
        match self {
            Self::Steps(steps) => steps.join("\n"),
            Self::Text(text) => text.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkItem {
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialGroup {
    pub title: String,
    pub sections: Vec<MaterialSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialSection {
    pub title: String,
    /// Trusted HTML snippets.
    pub content: Vec<String>,
}

/// `biography.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BiographyData {
    pub people: Vec<Person>,
    pub places: Vec<Place>,
}

/// `meetings.json`: meeting records plus the seminar table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MeetingsData {
    pub materials: Vec<Meeting>,
    pub meetings: Vec<Seminar>,
}

/// `books.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BooksData {
    pub books: Vec<GenericItem>,
}

/// `places.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacesData {
    pub places: Vec<Place>,
}

/// `index.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexData {
    pub meetings: Vec<Seminar>,
}

/// `materials.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialsData {
    pub materials: Vec<MaterialGroup>,
}

/// Returns `value` when it names a Markdown file.
pub fn markdown_path(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| v.contains(".md"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_accept_strings_and_numbers() -> anyhow::Result<()> {
        let data: BiographyData = serde_json::from_str(
            r#"{"people":[{"id":7,"full_name":"A"},{"id":"p2","full_name":"B"}]}"#,
        )?;
        assert_eq!(data.people[0].id.as_str(), "7");
        assert_eq!(data.people[1].id, Scalar::new("p2"));
        assert!(data.places.is_empty());
        Ok(())
    }

    #[test]
    fn plan_accepts_text_or_list() -> anyhow::Result<()> {
        let seminars: IndexData = serde_json::from_str(
            r#"{"meetings":[{"plan":"one\n\n two "},{"plan":["a"," ","b"]}]}"#,
        )?;
        let steps: Vec<Vec<String>> = seminars
            .meetings
            .iter()
            .map(|s| s.plan.as_ref().map(Plan::steps).unwrap_or_default())
            .collect();
        assert_eq!(steps, vec![vec!["one", "two"], vec!["a", "b"]]);
        Ok(())
    }

    #[test]
    fn seminar_reads_camel_case_materials() -> anyhow::Result<()> {
        let seminar: Seminar = serde_json::from_str(
            r#"{"number":3,"additionalMaterials":[{"title":"T","url":"https://e.x"}]}"#,
        )?;
        assert_eq!(seminar.number.map(|n| n.to_string()), Some("3".to_owned()));
        assert_eq!(seminar.additional_materials[0].title, "T");
        Ok(())
    }

    #[test]
    fn place_reads_type_field() -> anyhow::Result<()> {
        let place: Place = serde_json::from_str(
            r#"{"id":"klushino","name":"Клушино","type":"village","coordinates":{"lat":55.5,"lon":34.9}}"#,
        )?;
        assert_eq!(place.kind.as_deref(), Some("village"));
        assert_eq!(place.coordinates.map(|c| c.lat), Some(55.5));
        Ok(())
    }

    #[test]
    fn markdown_path_requires_md_extension() {
        assert_eq!(markdown_path(Some(" data/a.md ")), Some("data/a.md"));
        assert_eq!(markdown_path(Some("Inline biography")), None);
        assert_eq!(markdown_path(None), None);
    }
}
