//! Template registry — in-memory cache of template definitions.
//!
//! Loaded once per page activation with full-replace semantics: there is no
//! pagination, incremental sync or conflict resolution.

use serde::Serialize;

use crate::api::{ApiClient, ApiError, Transport};
use crate::model::Template;

/// One entry of a template select control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    /// Empty for the placeholder entry.
    pub value: String,
    pub label: String,
}

#[derive(Debug, Default, Clone)]
pub struct TemplateRegistry {
    templates: Vec<Template>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch all templates and replace the cache. On failure the previous
    /// contents are kept.
    pub fn load<T: Transport>(&mut self, client: &ApiClient<T>) -> Result<(), ApiError> {
        let templates = client.list_templates()?;
        tracing::debug!(count = templates.len(), "template registry loaded");
        self.replace(templates);
        Ok(())
    }

    pub fn replace(&mut self, templates: Vec<Template>) {
        self.templates = templates;
    }

    /// Linear lookup by id.
    pub fn find(&self, id: &str) -> Option<&Template> {
        self.templates.iter().find(|t| t.id == id)
    }

    pub fn all(&self) -> &[Template] {
        &self.templates
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Select-control entries: the placeholder, then one per template.
    pub fn options(&self, placeholder: &str) -> Vec<SelectOption> {
        std::iter::once(SelectOption {
            value: String::new(),
            label: placeholder.to_string(),
        })
        .chain(self.templates.iter().map(|t| SelectOption {
            value: t.id.clone(),
            label: t.name.clone(),
        }))
        .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn template(id: &str, name: &str) -> Template {
        Template {
            id: id.to_string(),
            name: name.to_string(),
            description: None,
            value_definitions: Vec::new(),
            created_at: Utc::now(),
            updated_at: None,
            is_active: true,
            owner_id: None,
        }
    }

    #[test]
    fn find_by_id() {
        let mut registry = TemplateRegistry::new();
        registry.replace(vec![template("a", "Weight"), template("b", "Pulse")]);
        assert_eq!(registry.find("b").map(|t| t.name.as_str()), Some("Pulse"));
        assert!(registry.find("c").is_none());
    }

    #[test]
    fn replace_discards_previous_contents() {
        let mut registry = TemplateRegistry::new();
        registry.replace(vec![template("a", "Weight")]);
        registry.replace(vec![template("b", "Pulse")]);
        assert!(registry.find("a").is_none());
        assert_eq!(registry.all().len(), 1);
    }

    #[test]
    fn options_start_with_placeholder() {
        let mut registry = TemplateRegistry::new();
        registry.replace(vec![template("a", "Weight")]);
        let options = registry.options("All Templates");
        assert_eq!(options.len(), 2);
        assert_eq!(options[0].value, "");
        assert_eq!(options[0].label, "All Templates");
        assert_eq!(options[1].value, "a");
    }
}
