use rand::Rng;
use std::collections::{BTreeMap, HashMap};

use crate::candidate::Candidate;
use crate::gap_tracker::{GapSet, MIN_GAP_THRESHOLD};
use crate::recipe_features::RecipeFeatures;
use crate::suggest::selector::SelectionRecord;

// Trade-off constants carried over from the tuned values in production use.
// TODO: calibrate against logged meal plans before changing any of these.

/// Fill ratio beyond which a recipe starts wasting a gap.
pub const OVERFILL_THRESHOLD: f32 = 1.5;
pub const OVERFILL_PENALTY_FACTOR: f32 = 0.3;
/// Maximum penalty share per already-selected recipe, by criterion.
pub const FEATURE_OVERLAP_PENALTY: f32 = 0.4;
pub const PROFILE_SIMILARITY_PENALTY: f32 = 0.3;
pub const ID_PROXIMITY_PENALTY: f32 = 0.25;
/// Recipes whose ids are this close count as near-neighbors in the catalog.
pub const ID_PROXIMITY_WINDOW: i64 = 20;
/// Diversity never drops below this, so no candidate starves in a tie-heavy
/// pool. Exact duplicates are the one exception and score 0.
pub const MIN_DIVERSITY_SCORE: f32 = 0.05;

// Nutrients compared when judging how alike two recipe profiles are.
const KEY_NUTRIENTS: &[&str] = &[
    "Protein",
    "Carbs",
    "Fat",
    "Fiber",
    "Iron",
    "Calcium",
    "Vitamin C",
];

/// How well a recipe's nutrients satisfy the current deficits.
///
/// Each active nutrient the recipe actually supplies contributes
/// `min(1, supplied/remaining) * criticality * jitter`. Supplying more than
/// `OVERFILL_THRESHOLD` times the remaining gap costs a penalty proportional
/// to the excess. The total is floored at zero.
///
/// Returns the total and the per-nutrient contribution breakdown.
pub fn gap_filling_score(
    nutrient_profile: &HashMap<String, f32>,
    remaining_gaps: &GapSet,
    gap_criticality: &BTreeMap<String, f32>,
    rng: &mut impl Rng,
) -> (f32, BTreeMap<String, f32>) {
    let mut total_score = 0.0;
    let mut nutrient_contributions = BTreeMap::new();

    for (name, remaining) in remaining_gaps.iter() {
        if remaining <= MIN_GAP_THRESHOLD {
            continue;
        }
        let recipe_value = nutrient_profile.get(name).copied().unwrap_or(0.0);
        if recipe_value <= 0.0 {
            continue;
        }

        let gap_fill_ratio = recipe_value / remaining;
        let effective_fill = gap_fill_ratio.min(1.0);
        let criticality = gap_criticality.get(name).copied().unwrap_or(1.0);

        let contribution = effective_fill * criticality * rng.gen_range(0.9..1.1);
        nutrient_contributions.insert(name.to_string(), contribution);
        total_score += contribution;

        if gap_fill_ratio > OVERFILL_THRESHOLD {
            let overfill_penalty =
                (gap_fill_ratio - OVERFILL_THRESHOLD) * criticality * OVERFILL_PENALTY_FACTOR;
            total_score -= overfill_penalty;
        }
    }

    (total_score.max(0.0), nutrient_contributions)
}

/// How dissimilar a candidate is from everything already selected this call.
///
/// Starts at 1.0 and is multiplied down per selected recipe by three capped
/// penalties (feature overlap, nutrition-profile similarity, catalog-id
/// proximity), then jittered. An already-selected id returns 0 immediately;
/// every other candidate keeps at least `MIN_DIVERSITY_SCORE`.
pub fn diversity_score(
    candidate: &Candidate,
    selected: &[SelectionRecord],
    candidate_features: &RecipeFeatures,
    selected_features: &[RecipeFeatures],
    rng: &mut impl Rng,
) -> f32 {
    if selected.is_empty() {
        return 1.0;
    }

    let mut score = 1.0;
    for (index, record) in selected.iter().enumerate() {
        if candidate.recipe_id == record.candidate.recipe_id {
            return 0.0;
        }

        if let Some(features) = selected_features.get(index) {
            score *= 1.0 - candidate_features.overlap_ratio(features) * FEATURE_OVERLAP_PENALTY;
        }

        let similarity = nutrition_profile_similarity(
            &candidate.nutrient_profile,
            &record.candidate.nutrient_profile,
        );
        score *= 1.0 - similarity * PROFILE_SIMILARITY_PENALTY;

        let id_distance = (candidate.recipe_id - record.candidate.recipe_id).abs();
        if id_distance < ID_PROXIMITY_WINDOW {
            let proximity_penalty = (ID_PROXIMITY_WINDOW - id_distance) as f32
                / ID_PROXIMITY_WINDOW as f32
                * ID_PROXIMITY_PENALTY;
            score *= 1.0 - proximity_penalty;
        }
    }

    score *= rng.gen_range(0.85..1.15);
    score.max(MIN_DIVERSITY_SCORE)
}

/// Ratio similarity over the key nutrients: 0.0 = entirely different,
/// 1.0 = identical. Both-zero values are neutral (0.5), one-sided zeros count
/// as fully different.
pub fn nutrition_profile_similarity(
    profile1: &HashMap<String, f32>,
    profile2: &HashMap<String, f32>,
) -> f32 {
    if profile1.is_empty() || profile2.is_empty() {
        return 0.0;
    }

    let mut similarity_sum = 0.0;
    for nutrient in KEY_NUTRIENTS {
        let value1 = profile1.get(*nutrient).copied().unwrap_or(0.0);
        let value2 = profile2.get(*nutrient).copied().unwrap_or(0.0);

        similarity_sum += if value1 == 0.0 && value2 == 0.0 {
            0.5
        } else if value1 == 0.0 || value2 == 0.0 {
            0.0
        } else {
            value1.min(value2) / value1.max(value2)
        };
    }
    similarity_sum / KEY_NUTRIENTS.len() as f32
}
