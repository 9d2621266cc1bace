//! Input dataset items for hazmat classification (X only)

use serde::{Deserialize, Serialize};
use url::Url;

/// Simplified product attribute from the marketplace catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemAttribute {
    pub id: String,
    pub name: String,
    pub value_name: String,
}

impl ItemAttribute {
    pub fn to_text(&self) -> String {
        format!("{}: {}", self.name, self.value_name)
    }
}

/// Highlighted product feature from the marketplace catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemMainFeature {
    pub text: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl ItemMainFeature {
    pub fn to_text(&self) -> String {
        self.text.clone()
    }
}

/// Options controlling how items are rendered into prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptOptions {
    pub include_item_id: bool,
    pub include_attributes: bool,
}

impl Default for PromptOptions {
    fn default() -> Self {
        Self {
            include_item_id: true,
            include_attributes: true,
        }
    }
}

/// A product listing with the fields relevant for hazmat detection.
///
/// Produced by the dataset collector and read-only for the pipeline; the
/// `item_id` is the stable identifier that ties predictions back to inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HazmatInputItem {
    pub item_id: String,
    pub name: String,
    pub domain_id: String,
    pub family_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permalink: Option<Url>,

    // Textual content (most important for hazmat detection)
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub short_description: Option<String>,
    #[serde(default)]
    pub keywords: Option<String>,

    // Structured data
    #[serde(default)]
    pub attributes: Vec<ItemAttribute>,
    #[serde(default)]
    pub main_features: Vec<ItemMainFeature>,
}

impl HazmatInputItem {
    /// Render all textual content as an `<item>` block for prompt building.
    pub fn to_prompt_xml(&self, options: PromptOptions) -> String {
        let mut parts = vec!["<item>".to_string()];

        if options.include_item_id {
            parts.push(format!("<item_id>{}</item_id>", self.item_id));
        }

        if !self.name.is_empty() {
            parts.push(format!("<name>{}</name>", self.name));
        }

        if !self.family_name.is_empty() {
            parts.push(format!("<family_name>{}</family_name>", self.family_name));
        }

        if let Some(description) = self.description.as_deref().map(str::trim) {
            if !description.is_empty() {
                parts.push(format!("<description>{description}</description>"));
            }
        }

        if let Some(short_description) = self.short_description.as_deref().map(str::trim) {
            if !short_description.is_empty() {
                parts.push(format!(
                    "<short_description>{short_description}</short_description>"
                ));
            }
        }

        if let Some(keywords) = self.keywords.as_deref() {
            if !keywords.is_empty() {
                parts.push(format!("<keywords>{keywords}</keywords>"));
            }
        }

        if options.include_attributes {
            for attribute in &self.attributes {
                let text = attribute.to_text();
                let text = text.trim();
                if !text.is_empty() {
                    parts.push(format!("<attribute>{text}</attribute>"));
                }
            }

            for feature in &self.main_features {
                let text = feature.to_text();
                let text = text.trim();
                if !text.is_empty() {
                    parts.push(format!("<feature>{text}</feature>"));
                }
            }
        }

        parts.push("</item>".to_string());
        parts.join("\n")
    }
}
