//! Mission templates.
//!
//! A template is the `{title, description, challenge}` triple a mission is
//! created from. The catalog is plain data: the built-in table can be
//! replaced at startup by a TOML file of the form
//!
//! ```toml
//! [templates.market-entry]
//! title = "..."
//! description = "..."
//! challenge = "..."
//! ```

use crate::model::NewMission;
use crate::{LucidraError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionTemplate {
    pub title: String,
    pub description: String,
    pub challenge: String,
}

impl MissionTemplate {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        challenge: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            challenge: challenge.into(),
        }
    }

    /// Creation parameters; the category stays at the default
    pub fn to_new_mission(&self) -> NewMission {
        NewMission::new(&self.title, &self.description, &self.challenge)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateCatalog {
    templates: BTreeMap<String, MissionTemplate>,
}

#[derive(Debug, Deserialize)]
struct TemplateFile {
    #[serde(default)]
    templates: BTreeMap<String, MissionTemplate>,
}

impl TemplateCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// The four stock strategy templates
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        catalog.insert(
            "market-entry",
            MissionTemplate::new(
                "Market Entry Strategy",
                "Plan the launch of an existing product into a new geographic or customer market.",
                "How can we enter a new market with limited resources while minimizing risk?",
            ),
        );
        catalog.insert(
            "competitive-analysis",
            MissionTemplate::new(
                "Competitive Analysis",
                "Map the competitive landscape and identify where rivals are strong and exposed.",
                "What are our main competitors doing better than us, and where can we differentiate?",
            ),
        );
        catalog.insert(
            "blue-ocean",
            MissionTemplate::new(
                "Blue Ocean Strategy",
                "Use the eliminate-reduce-raise-create grid to look for uncontested market space.",
                "Which factors can we eliminate, reduce, raise or create to make the competition irrelevant?",
            ),
        );
        catalog.insert(
            "digital-transformation",
            MissionTemplate::new(
                "Digital Transformation",
                "Assess current processes and design a roadmap for adopting digital tools.",
                "Which processes should we digitize first to deliver the most value to customers?",
            ),
        );
        catalog
    }

    /// Parse a catalog from TOML text
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let file: TemplateFile = toml::from_str(s)
            .map_err(|e| LucidraError::ConfigError(format!("Invalid template file: {e}")))?;
        Ok(Self {
            templates: file.templates,
        })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let catalog = Self::from_toml_str(&text)?;
        tracing::info!(
            target: "templates",
            path = %path.as_ref().display(),
            count = catalog.len(),
            "Loaded mission templates"
        );
        Ok(catalog)
    }

    pub fn insert(&mut self, id: impl Into<String>, template: MissionTemplate) {
        self.templates.insert(id.into(), template);
    }

    pub fn get(&self, id: &str) -> Option<&MissionTemplate> {
        self.templates.get(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MissionTemplate)> {
        self.templates.iter().map(|(id, t)| (id.as_str(), t))
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
