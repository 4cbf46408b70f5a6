use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::candidate::Candidate;
use crate::gap_tracker::GapSet;
use crate::recipe_features::RecipeFeatures;
use crate::suggest::scorer::{diversity_score, gap_filling_score};

/// Size of the head of the ranking eligible for the weighted random draw.
pub const TOP_CANDIDATE_POOL: usize = 3;

/// One selected recipe with its score breakdown, in selection order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionRecord {
    pub candidate: Candidate,
    pub gap_contribution: f32,
    pub diversity_contribution: f32,
    pub combined_score: f32,
    pub nutrient_contributions: BTreeMap<String, f32>,
}

struct ScoredCandidate<'a> {
    candidate: &'a Candidate,
    features: RecipeFeatures,
    combined_score: f32,
    gap_score: f32,
    diversity: f32,
    contributions: BTreeMap<String, f32>,
}

/// Greedy, randomized multi-round selection.
///
/// Each round scores every unused candidate against the current gap snapshot,
/// blends gap filling with diversity under a round-ramped weight, perturbs
/// the result, and picks one recipe (usually the best, sometimes a weighted
/// draw from the top few). The chosen recipe deflates the gaps before the
/// next round. Stops at `num_recipes`, when the gaps are exhausted, or when
/// no candidate scores above zero.
///
/// Returns the selection records and the gap snapshot left after them.
#[allow(clippy::too_many_arguments)]
pub fn select_diverse_recipes(
    candidates: &[Candidate],
    remaining_gaps: &GapSet,
    gap_criticality: &BTreeMap<String, f32>,
    num_recipes: usize,
    diversity_factor: f32,
    randomization_strength: f32,
    rng: &mut impl Rng,
    progress: &impl Fn(String),
) -> (Vec<SelectionRecord>, GapSet) {
    let mut current_gaps = remaining_gaps.clone();
    if candidates.is_empty() || num_recipes == 0 {
        return (Vec::new(), current_gaps);
    }

    // Feature tags are derived once per candidate and reused every round.
    let candidate_features: HashMap<i64, RecipeFeatures> = candidates
        .iter()
        .map(|candidate| (candidate.recipe_id, RecipeFeatures::extract(candidate)))
        .collect();

    // Shuffle up front so score ties resolve differently between calls.
    let mut shuffled: Vec<&Candidate> = candidates.iter().collect();
    shuffled.shuffle(rng);

    let mut selected: Vec<SelectionRecord> = Vec::new();
    let mut selected_features: Vec<RecipeFeatures> = Vec::new();
    let mut used_recipe_ids: HashSet<i64> = HashSet::new();
    let mut current_criticality = gap_criticality.clone();

    for selection_round in 0..num_recipes {
        if current_gaps.is_empty() {
            break;
        }

        let mut candidate_scores: Vec<ScoredCandidate> = Vec::new();
        for &candidate in &shuffled {
            if used_recipe_ids.contains(&candidate.recipe_id) {
                continue;
            }
            let features = candidate_features[&candidate.recipe_id];

            let (gap_score, contributions) = gap_filling_score(
                &candidate.nutrient_profile,
                &current_gaps,
                &current_criticality,
                rng,
            );
            let diversity =
                diversity_score(candidate, &selected, &features, &selected_features, rng);

            // Diversity influence ramps up as slots fill; early rounds chase
            // the largest gaps.
            let phase_diversity_weight =
                diversity_factor * (((selection_round + 1) as f32 / num_recipes as f32).min(1.0));
            let gap_weight = 1.0 - phase_diversity_weight;

            let base_combined = gap_weight * gap_score + phase_diversity_weight * diversity;
            let combined_score =
                base_combined * (1.0 + (rng.gen::<f32>() - 0.5) * 2.0 * randomization_strength);

            if combined_score > 0.0 {
                candidate_scores.push(ScoredCandidate {
                    candidate,
                    features,
                    combined_score,
                    gap_score,
                    diversity,
                    contributions,
                });
            }
        }

        if candidate_scores.is_empty() {
            progress(format!(
                "Round {}: no candidate scored above zero, stopping early.",
                selection_round + 1
            ));
            break;
        }

        candidate_scores.sort_by(|a, b| {
            b.combined_score
                .partial_cmp(&a.combined_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        // Usually take the best; with probability = randomization_strength,
        // draw from the top few weighted by score.
        let top_count = candidate_scores.len().min(TOP_CANDIDATE_POOL);
        let chosen_index = if top_count > 1 && rng.gen::<f32>() < randomization_strength {
            weighted_draw(&candidate_scores[..top_count], rng)
        } else {
            0
        };
        let chosen = candidate_scores.swap_remove(chosen_index);

        progress(format!(
            "Round {}/{}: picked recipe {} (combined {:.4}, gap {:.4}, diversity {:.4})",
            selection_round + 1,
            num_recipes,
            chosen.candidate.recipe_id,
            chosen.combined_score,
            chosen.gap_score,
            chosen.diversity
        ));

        used_recipe_ids.insert(chosen.candidate.recipe_id);
        selected_features.push(chosen.features);
        current_gaps = current_gaps.deflate(&chosen.candidate.nutrient_profile);
        current_criticality.retain(|name, _| current_gaps.contains(name));

        selected.push(SelectionRecord {
            candidate: chosen.candidate.clone(),
            gap_contribution: chosen.gap_score,
            diversity_contribution: chosen.diversity,
            combined_score: chosen.combined_score,
            nutrient_contributions: chosen.contributions,
        });
    }

    (selected, current_gaps)
}

fn weighted_draw(top_candidates: &[ScoredCandidate<'_>], rng: &mut impl Rng) -> usize {
    let total_weight: f32 = top_candidates
        .iter()
        .map(|scored| scored.combined_score)
        .sum();
    if total_weight <= 0.0 {
        return 0;
    }

    let rand_val = rng.gen::<f32>() * total_weight;
    let mut cumulative = 0.0;
    for (index, scored) in top_candidates.iter().enumerate() {
        cumulative += scored.combined_score;
        if rand_val <= cumulative {
            return index;
        }
    }
    0
}
