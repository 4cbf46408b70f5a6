use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A recipe eligible for selection in the current call. The pool is produced
/// upstream by the ingredient-sufficiency filter and is already deduplicated
/// by recipe id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub recipe_id: i64,
    /// Recipe name and description folded into one searchable string.
    #[serde(default)]
    pub descriptive_text: String,
    /// Nutrient name -> amount supplied by one serving of the recipe.
    #[serde(default)]
    pub nutrient_profile: HashMap<String, f32>,
    #[serde(default)]
    pub missing_ingredients: Vec<String>,
    #[serde(default)]
    pub missing_count: u32,
}

/// One nutrient record as delivered by the nutrition-lookup collaborator.
/// Fields are optional because upstream records can be sparse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NutritionEntry {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub value: Option<f32>,
    #[serde(default)]
    pub unit: Option<String>,
}

/// Map a nutrition record list to name -> value. Entries without a name or
/// value are skipped rather than treated as an error.
pub fn to_nutrition_map(entries: &[NutritionEntry]) -> HashMap<String, f32> {
    let mut result = HashMap::new();
    for entry in entries {
        if let (Some(name), Some(value)) = (&entry.name, entry.value) {
            result.insert(name.clone(), value);
        }
    }
    result
}
