//! Blank record forms rendered from embedded Tera templates

use chrono::{DateTime, Utc};
use rust_embed::Embed;
use tera::Tera;
use thiserror::Error;

use crate::reference::{Category, MeasurementApplication};

#[derive(Embed)]
#[folder = "templates/"]
struct EmbeddedTemplates;

const ANALYSIS_TEMPLATE: &str = "analysis.yaml.tera";

/// Values pre-filled into a blank analysis form
#[derive(Debug, Clone)]
pub struct TemplateContext {
    pub author: String,
    pub created: DateTime<Utc>,
    pub title: Option<String>,
    pub laboratory: Option<String>,
    pub tag: Option<String>,
    pub instrument_type: Option<String>,
    pub category: Option<Category>,
    pub application: Option<MeasurementApplication>,
    pub unit: Option<String>,
}

impl TemplateContext {
    pub fn new(author: String) -> Self {
        Self {
            author,
            created: Utc::now(),
            title: None,
            laboratory: None,
            tag: None,
            instrument_type: None,
            category: None,
            application: None,
            unit: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_laboratory(mut self, laboratory: Option<String>) -> Self {
        self.laboratory = laboratory;
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_instrument_type(mut self, instrument_type: impl Into<String>) -> Self {
        self.instrument_type = Some(instrument_type.into());
        self
    }

    pub fn with_category(mut self, category: Option<Category>) -> Self {
        self.category = category;
        self
    }

    pub fn with_application(mut self, application: Option<MeasurementApplication>) -> Self {
        self.application = application;
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }
}

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template not found: {0}")]
    NotFound(String),

    #[error("template rendering error: {0}")]
    RenderError(String),
}

/// Renders the embedded templates
pub struct TemplateGenerator {
    tera: Tera,
}

impl TemplateGenerator {
    pub fn new() -> Result<Self, TemplateError> {
        let mut tera = Tera::default();
        for file in EmbeddedTemplates::iter() {
            let Some(content) = EmbeddedTemplates::get(&file) else {
                continue;
            };
            let text = std::str::from_utf8(&content.data)
                .map_err(|e| TemplateError::RenderError(format!("{}: {}", file, e)))?;
            tera.add_raw_template(&file, text)
                .map_err(|e| TemplateError::RenderError(e.to_string()))?;
        }
        Ok(Self { tera })
    }

    /// Blank analysis record form
    pub fn generate_analysis(&self, ctx: &TemplateContext) -> Result<String, TemplateError> {
        if !self.tera.get_template_names().any(|n| n == ANALYSIS_TEMPLATE) {
            return Err(TemplateError::NotFound(ANALYSIS_TEMPLATE.to_string()));
        }

        let text = |value: &Option<String>| escape(value.as_deref().unwrap_or_default());

        let mut context = tera::Context::new();
        context.insert("author", &escape(&ctx.author));
        context.insert("today", &ctx.created.format("%Y-%m-%d").to_string());
        context.insert("title", &text(&ctx.title));
        context.insert("laboratory", &text(&ctx.laboratory));
        context.insert("tag", &text(&ctx.tag));
        context.insert("instrument_type", &text(&ctx.instrument_type));
        context.insert("unit", &text(&ctx.unit));
        context.insert("category", &ctx.category.map(|c| c.to_string()));
        context.insert("application", &ctx.application.map(|a| a.to_string()));

        self.tera
            .render(ANALYSIS_TEMPLATE, &context)
            .map_err(|e| TemplateError::RenderError(e.to_string()))
    }
}

/// Escape text for a double-quoted YAML scalar
fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::validator::{yaml_to_json, Validator};

    #[test]
    fn test_blank_form_parses() {
        let generator = TemplateGenerator::new().unwrap();
        let ctx = TemplateContext::new("Ana".to_string()).with_title("FT-101");
        let yaml = generator.generate_analysis(&ctx).unwrap();

        let parsed: serde_yml::Value = serde_yml::from_str(&yaml).unwrap();
        assert_eq!(parsed.get("title").unwrap().as_str(), Some("FT-101"));
        assert_eq!(parsed.get("status").unwrap().as_str(), Some("draft"));
        assert!(parsed.get("id").is_none());
    }

    #[test]
    fn test_form_carries_category() {
        let generator = TemplateGenerator::new().unwrap();
        let ctx = TemplateContext::new("Ana".to_string())
            .with_category(Some(Category::NaturalGas))
            .with_application(Some(MeasurementApplication::Fiscal))
            .with_unit("kPa");
        let yaml = generator.generate_analysis(&ctx).unwrap();
        assert!(yaml.contains("  category: natural_gas\n"));
        assert!(yaml.contains("  application: fiscal\n"));
        assert!(yaml.contains("unit: \"kPa\""));
    }

    #[test]
    fn test_form_passes_schema_once_stamped() {
        let generator = TemplateGenerator::new().unwrap();
        let ctx = TemplateContext::new("Ana \"QA\"".to_string()).with_title("Título");
        let yaml = generator.generate_analysis(&ctx).unwrap();

        let mut value = yaml_to_json(&yaml, "form.yaml").unwrap();
        value["id"] = serde_json::json!(1);
        value["created"] = serde_json::json!("2024-01-01T00:00:00Z");
        value["updated"] = serde_json::json!("2024-01-01T00:00:00Z");
        assert_eq!(value["author"], "Ana \"QA\"");

        let validator = Validator::default();
        let result = validator.validate_value(&value, &yaml, "form.yaml", "analysis");
        assert!(result.is_ok(), "{:?}", result);
    }
}
