//! Template editor — add-only form state for composing a template.
//!
//! The value-definition list starts with exactly one empty row. Rows can be
//! appended and removed, but the last remaining row can never be removed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::forms::{self, FormError};
use crate::model::{Template, Unit, ValueDefinition};

/// Raw text of one value-definition row, exactly as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValueDefinitionRow {
    pub name: String,
    pub display_name: String,
    pub unit_name: String,
    pub unit_display_name: String,
    pub unit_description: String,
    pub min_value: String,
    pub max_value: String,
}

impl ValueDefinitionRow {
    fn to_definition(&self, index: usize) -> Result<ValueDefinition, FormError> {
        let field = |label: &str| format!("value {} {label}", index + 1);

        Ok(ValueDefinition {
            name: forms::required(&field("name"), &self.name)?,
            display_name: forms::required(&field("display name"), &self.display_name)?,
            description: None,
            unit: Unit {
                name: forms::required(&field("unit"), &self.unit_name)?,
                display_name: forms::required(&field("unit display name"), &self.unit_display_name)?,
                description: forms::optional_text(&self.unit_description),
            },
            min_value: forms::optional_number(&field("minimum"), &self.min_value)?,
            max_value: forms::optional_number(&field("maximum"), &self.max_value)?,
        })
    }
}

/// Editable state of the "new template" form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateDraft {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "one_empty_row")]
    rows: Vec<ValueDefinitionRow>,
}

fn one_empty_row() -> Vec<ValueDefinitionRow> {
    vec![ValueDefinitionRow::default()]
}

impl Default for TemplateDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            rows: one_empty_row(),
        }
    }
}

impl TemplateDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Back to a blank form with a single empty row.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn rows(&self) -> &[ValueDefinitionRow] {
        &self.rows
    }

    pub fn row_mut(&mut self, index: usize) -> Option<&mut ValueDefinitionRow> {
        self.rows.get_mut(index)
    }

    /// Append an empty row and return its index.
    pub fn add_row(&mut self) -> usize {
        self.rows.push(ValueDefinitionRow::default());
        self.rows.len() - 1
    }

    /// Append a pre-filled row.
    pub fn push_row(&mut self, row: ValueDefinitionRow) {
        // A draft that still holds only its initial blank row gets it replaced.
        if self.rows.len() == 1 && self.rows[0] == ValueDefinitionRow::default() {
            self.rows[0] = row;
        } else {
            self.rows.push(row);
        }
    }

    /// Remove row `index`. Removing the last remaining row, or an index out
    /// of range, is a no-op that returns `false`.
    pub fn remove_row(&mut self, index: usize) -> bool {
        if self.rows.len() <= 1 || index >= self.rows.len() {
            return false;
        }
        self.rows.remove(index);
        true
    }

    /// Check every required field and numeric input.
    pub fn validate(&self) -> Result<(), FormError> {
        self.definitions().map(|_| ())
    }

    fn definitions(&self) -> Result<Vec<ValueDefinition>, FormError> {
        forms::required("template name", &self.name)?;
        // Deserialized drafts may arrive without rows.
        if self.rows.is_empty() {
            return Err(FormError::Required {
                field: "value definition".to_string(),
            });
        }
        self.rows
            .iter()
            .enumerate()
            .map(|(i, row)| row.to_definition(i))
            .collect()
    }

    /// Assemble the template payload with a fresh id and the current time.
    pub fn build(&self) -> Result<Template, FormError> {
        self.build_with(Uuid::new_v4(), Utc::now())
    }

    /// Assemble the template payload with an explicit id and timestamp.
    pub fn build_with(&self, id: Uuid, now: DateTime<Utc>) -> Result<Template, FormError> {
        let value_definitions = self.definitions()?;
        Ok(Template {
            id: id.to_string(),
            name: forms::required("template name", &self.name)?,
            description: forms::optional_text(&self.description),
            value_definitions,
            created_at: now,
            updated_at: None,
            is_active: true,
            owner_id: None,
        })
    }
}

/// Parse a `name:display:unit:unit_display[:min[:max[:unit_description]]]`
/// spec into a row. Used by `lifetrack templates create --value`.
pub fn parse_row_spec(spec: &str) -> Result<ValueDefinitionRow, FormError> {
    let parts: Vec<&str> = spec.split(':').collect();
    if parts.len() < 4 || parts.len() > 7 {
        return Err(FormError::Required {
            field: format!("value spec '{spec}' (name:display:unit:unit_display[:min[:max[:description]]])"),
        });
    }
    let part = |i: usize| parts.get(i).map(|s| s.to_string()).unwrap_or_default();

    Ok(ValueDefinitionRow {
        name: part(0),
        display_name: part(1),
        unit_name: part(2),
        unit_display_name: part(3),
        min_value: part(4),
        max_value: part(5),
        unit_description: part(6),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn filled_row(name: &str) -> ValueDefinitionRow {
        ValueDefinitionRow {
            name: name.to_string(),
            display_name: name.to_uppercase(),
            unit_name: "mmHg".to_string(),
            unit_display_name: "mmHg".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn starts_with_exactly_one_row() {
        assert_eq!(TemplateDraft::new().rows().len(), 1);
    }

    #[test]
    fn removing_last_row_is_a_no_op() {
        let mut draft = TemplateDraft::new();
        assert!(!draft.remove_row(0));
        assert_eq!(draft.rows().len(), 1);

        draft.add_row();
        assert!(draft.remove_row(0));
        assert!(!draft.remove_row(0));
        assert_eq!(draft.rows().len(), 1);
    }

    #[test]
    fn out_of_range_removal_is_a_no_op() {
        let mut draft = TemplateDraft::new();
        draft.add_row();
        assert!(!draft.remove_row(5));
        assert_eq!(draft.rows().len(), 2);
    }

    #[test]
    fn removal_drops_the_chosen_row() {
        let mut draft = TemplateDraft::new();
        draft.push_row(filled_row("a"));
        draft.push_row(filled_row("b"));
        draft.push_row(filled_row("c"));
        assert!(draft.remove_row(1));
        let names: Vec<&str> = draft.rows().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["a", "c"]);
    }

    #[test]
    fn payload_has_one_definition_per_row() {
        let mut draft = TemplateDraft::new();
        draft.name = "Blood Pressure".to_string();
        *draft.row_mut(0).unwrap() = filled_row("systolic");
        let second = draft.add_row();
        *draft.row_mut(second).unwrap() = filled_row("diastolic");
        let third = draft.add_row();
        *draft.row_mut(third).unwrap() = filled_row("pulse");
        draft.remove_row(third);

        let now = Utc::now();
        let id = Uuid::new_v4();
        let template = draft.build_with(id, now).unwrap();
        assert_eq!(template.value_definitions.len(), draft.rows().len());
        assert_eq!(template.value_definitions.len(), 2);
        assert_eq!(template.id, id.to_string());
        assert_eq!(template.created_at, now);
        assert!(template.is_active);
        assert!(template.description.is_none());
    }

    #[test]
    fn blank_min_max_are_unset() {
        let mut draft = TemplateDraft::new();
        draft.name = "Weight".to_string();
        let row = draft.row_mut(0).unwrap();
        *row = filled_row("weight");
        row.min_value = "0".to_string();

        let template = draft.build().unwrap();
        let vd = &template.value_definitions[0];
        assert_eq!(vd.min_value, Some(0.0));
        assert_eq!(vd.max_value, None);
        assert!(vd.unit.description.is_none());
    }

    #[test]
    fn missing_required_fields_fail_validation() {
        let mut draft = TemplateDraft::new();
        assert!(matches!(draft.validate(), Err(FormError::Required { .. })));

        draft.name = "Weight".to_string();
        let err = draft.validate().unwrap_err();
        assert_eq!(err.to_string(), "value 1 name is required");

        *draft.row_mut(0).unwrap() = filled_row("weight");
        assert!(draft.validate().is_ok());

        draft.row_mut(0).unwrap().max_value = "heavy".to_string();
        assert!(matches!(draft.validate(), Err(FormError::NotANumber { .. })));
    }

    #[test]
    fn reset_restores_single_blank_row() {
        let mut draft = TemplateDraft::new();
        draft.name = "x".to_string();
        draft.add_row();
        draft.reset();
        assert_eq!(draft, TemplateDraft::new());
    }

    #[test]
    fn draft_deserializes_from_frontend_json() {
        let json = r#"{
            "name": "Blood Pressure",
            "rows": [
                {"name": "systolic", "display_name": "Systolic", "unit_name": "mmHg",
                 "unit_display_name": "mmHg", "min_value": "50", "max_value": ""}
            ]
        }"#;
        let draft: TemplateDraft = serde_json::from_str(json).unwrap();
        let template = draft.build().unwrap();
        assert_eq!(template.value_definitions[0].min_value, Some(50.0));
        assert_eq!(template.value_definitions[0].max_value, None);
    }

    #[test]
    fn row_spec_parsing() {
        let row = parse_row_spec("systolic:Systolic:mmHg:mmHg::250").unwrap();
        assert_eq!(row.name, "systolic");
        assert_eq!(row.min_value, "");
        assert_eq!(row.max_value, "250");

        let row = parse_row_spec("weight:Weight:kg:Kilograms").unwrap();
        assert_eq!(row.unit_display_name, "Kilograms");
        assert!(parse_row_spec("weight:Weight").is_err());
    }
}
