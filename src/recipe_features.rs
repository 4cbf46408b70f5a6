use serde::{Deserialize, Serialize};

use crate::candidate::Candidate;

// Keyword tables for categorizing recipes from their free text. First match
// wins, so more common keywords go first in each table.

const PROTEIN_KEYWORDS: &[(&str, ProteinSource)] = &[
    ("chicken", ProteinSource::Chicken),
    ("beef", ProteinSource::Beef),
    ("pork", ProteinSource::Pork),
    ("fish", ProteinSource::Fish),
    ("tofu", ProteinSource::Tofu),
    ("beans", ProteinSource::Beans),
    ("eggs", ProteinSource::Eggs),
];

const CUISINE_KEYWORDS: &[(&str, CuisineType)] = &[
    ("asian", CuisineType::Asian),
    ("western", CuisineType::Western),
    ("mediterranean", CuisineType::Mediterranean),
    ("indian", CuisineType::Indian),
    ("mexican", CuisineType::Mexican),
    ("italian", CuisineType::Italian),
];

const METHOD_KEYWORDS: &[(&str, CookingMethod)] = &[
    ("grilled", CookingMethod::Grilled),
    ("fried", CookingMethod::Fried),
    ("steamed", CookingMethod::Steamed),
    ("baked", CookingMethod::Baked),
    ("stir-fry", CookingMethod::StirFry),
    ("soup", CookingMethod::Soup),
    ("salad", CookingMethod::Salad),
];

// Portion class cutoffs in kcal.
const LIGHT_MEAL_MAX_CALORIES: f32 = 200.0;
const HEAVY_MEAL_MIN_CALORIES: f32 = 500.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProteinSource {
    Chicken,
    Beef,
    Pork,
    Fish,
    Tofu,
    Beans,
    Eggs,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CuisineType {
    Asian,
    Western,
    Mediterranean,
    Indian,
    Mexican,
    Italian,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CookingMethod {
    Grilled,
    Fried,
    Steamed,
    Baked,
    StirFry,
    Soup,
    Salad,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MealType {
    Light,
    Medium,
    Heavy,
    Unknown,
}

impl ProteinSource {
    fn from_text(text: &str) -> Self {
        for (keyword, source) in PROTEIN_KEYWORDS {
            if text.contains(keyword) {
                return *source;
            }
        }
        ProteinSource::Unknown
    }
}

impl CuisineType {
    fn from_text(text: &str) -> Self {
        for (keyword, cuisine) in CUISINE_KEYWORDS {
            if text.contains(keyword) {
                return *cuisine;
            }
        }
        CuisineType::Unknown
    }
}

impl CookingMethod {
    fn from_text(text: &str) -> Self {
        for (keyword, method) in METHOD_KEYWORDS {
            if text.contains(keyword) {
                return *method;
            }
        }
        CookingMethod::Unknown
    }
}

impl MealType {
    fn from_calories(calories: f32) -> Self {
        if calories < LIGHT_MEAL_MAX_CALORIES {
            MealType::Light
        } else if calories > HEAVY_MEAL_MIN_CALORIES {
            MealType::Heavy
        } else {
            MealType::Medium
        }
    }
}

/// Coarse categorical tags for one recipe, derived once per candidate per
/// call and reused across all selection rounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeFeatures {
    pub protein_source: ProteinSource,
    pub cuisine_type: CuisineType,
    pub cooking_method: CookingMethod,
    pub meal_type: MealType,
}

impl RecipeFeatures {
    pub fn extract(candidate: &Candidate) -> Self {
        let text = candidate.descriptive_text.to_lowercase();
        // A recipe without calorie data classifies as light, same as one
        // reporting zero.
        let calories = candidate
            .nutrient_profile
            .get("Calories")
            .copied()
            .unwrap_or(0.0);

        RecipeFeatures {
            protein_source: ProteinSource::from_text(&text),
            cuisine_type: CuisineType::from_text(&text),
            cooking_method: CookingMethod::from_text(&text),
            meal_type: MealType::from_calories(calories),
        }
    }

    /// Fraction of the four tag dimensions matching exactly, unknown tags
    /// excluded from matching.
    pub fn overlap_ratio(&self, other: &RecipeFeatures) -> f32 {
        let mut matching = 0.0;
        if self.protein_source != ProteinSource::Unknown && self.protein_source == other.protein_source
        {
            matching += 1.0;
        }
        if self.cuisine_type != CuisineType::Unknown && self.cuisine_type == other.cuisine_type {
            matching += 1.0;
        }
        if self.cooking_method != CookingMethod::Unknown && self.cooking_method == other.cooking_method
        {
            matching += 1.0;
        }
        if self.meal_type != MealType::Unknown && self.meal_type == other.meal_type {
            matching += 1.0;
        }
        matching / 4.0
    }
}
