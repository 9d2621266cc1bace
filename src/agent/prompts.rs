//! Prompts for hazmat classification

use crate::model::{HazmatInputItem, HazmatLabeledItem, PromptOptions};

/// System prompt for hazmat classification
pub const CLASSIFICATION_SYSTEM_PROMPT: &str = r#"You are a hazardous materials (Hazmat) classification expert. Your job is to analyze product information and determine if items contain hazardous materials that require special handling during shipping.

Hazardous materials include but are not limited to:

- Flammable liquids, solids, and gases
- Explosive materials and fireworks
- Corrosive substances (acids, bases)
- Toxic or poisonous materials
- Radioactive materials
- Compressed gases
- Oxidizing agents
- Infectious substances
- Materials harmful to aquatic life

Consider the following factors:

1. Product name and description
2. Chemical composition or ingredients
3. Physical properties mentioned
4. Intended use or application
5. Safety warnings or precautions
6. Regulatory classifications mentioned

Be conservative in your classification - when in doubt about potential hazards, classify as hazmat for safety.

Example hazard traits to identify: "flammable", "explosive", "corrosive", "toxic", "compressed_gas", "oxidizing", "radioactive", "infectious", "irritant", "carcinogenic", "environmental_hazard"

Always provide a clear, comprehensive justification for your decision.
IMPORTANT: Always include the item_id of each input item in your response to maintain traceability."#;

/// Extra instructions appended to the system prompt when similar labeled
/// examples are injected into the user prompt.
pub const EXAMPLES_SYSTEM_SECTION: &str = r#"ENHANCED CLASSIFICATION WITH EXAMPLES:
The user prompt may include previously classified products similar to the items under analysis.

CLASSIFICATION PROCESS:
1. Analyze the product information considering the factors above
2. Compare with the similar examples provided
3. Make your classification decision based on both the product analysis and similar examples
4. Provide a clear justification that references the similar examples when relevant"#;

/// Build the system prompt, optionally with the examples section.
pub fn system_prompt(with_examples: bool) -> String {
    if with_examples {
        format!("{CLASSIFICATION_SYSTEM_PROMPT}\n\n{EXAMPLES_SYSTEM_SECTION}")
    } else {
        CLASSIFICATION_SYSTEM_PROMPT.to_string()
    }
}

/// Build the user prompt for a single item.
pub fn build_item_prompt(item: &HazmatInputItem, options: PromptOptions) -> String {
    format!(
        "Analyze the following product information and classify whether it contains hazardous materials:\n\n{}",
        item.to_prompt_xml(options)
    )
}

/// Build the user prompt for a batch of items.
pub fn build_batch_prompt(items: &[HazmatInputItem], options: PromptOptions) -> String {
    let item_data = items
        .iter()
        .map(|item| item.to_prompt_xml(options))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Analyze the following product information and classify each item as containing hazardous materials or not.\n\n{item_data}\n\nFor each input item above, you must provide a classification result with the corresponding item_id."
    )
}

/// Format retrieved examples for injection into a user prompt.
pub fn format_examples(examples: &[HazmatLabeledItem]) -> String {
    let mut formatted = Vec::with_capacity(examples.len());

    for (i, example) in examples.iter().enumerate() {
        let mut lines = vec![
            format!("Example {}:", i + 1),
            format!("- Product: {}", example.name),
            format!(
                "- Classification: {}",
                if example.is_hazmat {
                    "HAZMAT"
                } else {
                    "NOT HAZMAT"
                }
            ),
            format!("- Reason: {}", example.reason),
        ];
        if !example.traits.is_empty() {
            lines.push(format!(
                "- Hazmat Traits: {}",
                example
                    .traits
                    .iter()
                    .map(|t| t.as_str().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
        }
        formatted.push(lines.join("\n"));
    }

    formatted.join("\n\n")
}
