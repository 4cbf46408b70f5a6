use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::candidate::Candidate;
use crate::gap_tracker::{round4, GapSet, NutrientGap, NutrientGoal};
use crate::history::{collect_recent_recipe_ids, MealHistory};
use crate::suggest::selector::{select_diverse_recipes, SelectionRecord};
use crate::suggest::session_seed::generate_session_seed;
use crate::suggest::slots::{distribute_into_slots, SlotAssignment};

pub const DEFAULT_MEAL_SLOTS: &[&str] = &["breakfast", "lunch", "dinner"];
pub const MAX_RANDOMIZATION_STRENGTH: f32 = 0.5;

fn default_dishes_per_slot() -> u32 {
    1
}

fn default_diversity_factor() -> f32 {
    0.3
}

fn default_randomization_strength() -> f32 {
    0.15
}

/// Caller-tunable knobs for one suggestion call. Out-of-range trade-off
/// values are clamped; a negative lookback window is rejected up front.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionParams {
    pub day: NaiveDate,
    pub user_id: i64,
    #[serde(default = "default_dishes_per_slot")]
    pub dishes_per_slot: u32,
    /// Empty means the default breakfast/lunch/dinner slots.
    #[serde(default)]
    pub slot_names: Vec<String>,
    #[serde(default = "default_diversity_factor")]
    pub diversity_factor: f32,
    #[serde(default = "default_randomization_strength")]
    pub randomization_strength: f32,
    #[serde(default)]
    pub avoid_recent: bool,
    #[serde(default)]
    pub lookback_days: i64,
    /// Extra entropy mixed into the session seed.
    #[serde(default)]
    pub entropy: Option<String>,
}

/// Everything the engine consumes, already resolved by upstream services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionRequest {
    pub goals: Vec<NutrientGoal>,
    #[serde(default)]
    pub consumed: HashMap<String, f32>,
    pub candidates: Vec<Candidate>,
    pub params: SuggestionParams,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionStatus {
    Suggested,
    GoalsAlreadyMet,
    NoCandidates,
}

impl SuggestionStatus {
    pub fn note(&self) -> &'static str {
        match self {
            SuggestionStatus::Suggested => "Recipes selected to fill the remaining nutrition gaps.",
            SuggestionStatus::GoalsAlreadyMet => {
                "All nutrition goals are already met for this day."
            }
            SuggestionStatus::NoCandidates => {
                "No suitable recipes found with current ingredient availability."
            }
        }
    }
}

/// Telemetry for reproducible debugging of an intentionally non-deterministic
/// call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionDiagnostics {
    pub candidate_pool_size: usize,
    pub recipes_selected: usize,
    pub gaps_closed: usize,
    pub gap_reduction_percentage: f32,
    pub diversity_factor_applied: f32,
    pub randomization_strength_applied: f32,
    pub session_seed: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealPlan {
    pub date: NaiveDate,
    pub status: SuggestionStatus,
    pub note: String,
    pub meal_slots: Vec<String>,
    pub slot_assignments: Vec<SlotAssignment>,
    pub residual_gaps: Vec<NutrientGap>,
    pub diagnostics: SuggestionDiagnostics,
}

/// Suggest recipes for the day, seeding the randomness from the session seed
/// generator (varies between calls even with identical inputs).
pub fn suggest_meals(
    request: &SuggestionRequest,
    history: &dyn MealHistory,
    progress: &impl Fn(String),
) -> Result<MealPlan> {
    let seed = generate_session_seed(
        request.params.day,
        request.params.user_id,
        request.params.entropy.as_deref(),
    );
    suggest_meals_seeded(request, history, seed, progress)
}

/// Same as `suggest_meals` with the seed injected directly. Identical inputs
/// and seed produce an identical plan.
pub fn suggest_meals_seeded(
    request: &SuggestionRequest,
    history: &dyn MealHistory,
    seed: u64,
    progress: &impl Fn(String),
) -> Result<MealPlan> {
    let params = &request.params;
    if params.lookback_days < 0 {
        return Err(anyhow!(
            "lookback_days must be non-negative, got {}",
            params.lookback_days
        ));
    }

    let dishes_per_slot = params.dishes_per_slot.max(1) as usize;
    let diversity_factor = params.diversity_factor.clamp(0.0, 1.0);
    let randomization_strength = params
        .randomization_strength
        .clamp(0.0, MAX_RANDOMIZATION_STRENGTH);
    let meal_slots: Vec<String> = if params.slot_names.is_empty() {
        DEFAULT_MEAL_SLOTS.iter().map(|s| s.to_string()).collect()
    } else {
        params.slot_names.clone()
    };

    let mut rng = StdRng::seed_from_u64(seed);

    // Drop anything eaten inside the lookback window.
    let pool: Vec<Candidate> = if params.avoid_recent && params.lookback_days > 0 {
        let eaten = collect_recent_recipe_ids(history, params.day, params.lookback_days);
        request
            .candidates
            .iter()
            .filter(|candidate| !eaten.contains(&candidate.recipe_id))
            .cloned()
            .collect()
    } else {
        request.candidates.clone()
    };

    let initial_gaps = GapSet::from_goals(&request.goals, &request.consumed);

    if initial_gaps.is_empty() {
        return Ok(empty_plan(
            SuggestionStatus::GoalsAlreadyMet,
            params.day,
            meal_slots,
            Vec::new(),
            pool.len(),
            seed,
            diversity_factor,
            randomization_strength,
        ));
    }
    if pool.is_empty() {
        return Ok(empty_plan(
            SuggestionStatus::NoCandidates,
            params.day,
            meal_slots,
            initial_gaps.to_residual_gaps(),
            0,
            seed,
            diversity_factor,
            randomization_strength,
        ));
    }

    let gap_criticality = initial_gaps.criticality(&request.goals, &mut rng);
    let total_recipes_needed = meal_slots.len() * dishes_per_slot;
    progress(format!(
        "Selecting up to {} recipes from a pool of {} (seed {}).",
        total_recipes_needed,
        pool.len(),
        seed
    ));

    let (mut records, final_gaps) = select_diverse_recipes(
        &pool,
        &initial_gaps,
        &gap_criticality,
        total_recipes_needed,
        diversity_factor,
        randomization_strength,
        &mut rng,
        progress,
    );

    for record in &mut records {
        round_record_scores(record);
    }

    let gaps_closed = initial_gaps.len() - final_gaps.len();
    let initial_total = initial_gaps.total_remaining().max(1.0);
    let gap_reduction_percentage =
        round2((1.0 - final_gaps.total_remaining() / initial_total) * 100.0);

    let recipes_selected = records.len();
    let slot_assignments = distribute_into_slots(records, &meal_slots, dishes_per_slot);

    Ok(MealPlan {
        date: params.day,
        status: SuggestionStatus::Suggested,
        note: SuggestionStatus::Suggested.note().to_string(),
        meal_slots,
        slot_assignments,
        residual_gaps: final_gaps.to_residual_gaps(),
        diagnostics: SuggestionDiagnostics {
            candidate_pool_size: pool.len(),
            recipes_selected,
            gaps_closed,
            gap_reduction_percentage,
            diversity_factor_applied: diversity_factor,
            randomization_strength_applied: randomization_strength,
            session_seed: seed,
        },
    })
}

#[allow(clippy::too_many_arguments)]
fn empty_plan(
    status: SuggestionStatus,
    date: NaiveDate,
    meal_slots: Vec<String>,
    residual_gaps: Vec<NutrientGap>,
    candidate_pool_size: usize,
    seed: u64,
    diversity_factor: f32,
    randomization_strength: f32,
) -> MealPlan {
    MealPlan {
        date,
        status,
        note: status.note().to_string(),
        meal_slots,
        slot_assignments: Vec::new(),
        residual_gaps,
        diagnostics: SuggestionDiagnostics {
            candidate_pool_size,
            recipes_selected: 0,
            gaps_closed: 0,
            gap_reduction_percentage: 0.0,
            diversity_factor_applied: diversity_factor,
            randomization_strength_applied: randomization_strength,
            session_seed: seed,
        },
    }
}

fn round_record_scores(record: &mut SelectionRecord) {
    record.gap_contribution = round4(record.gap_contribution);
    record.diversity_contribution = round4(record.diversity_contribution);
    record.combined_score = round4(record.combined_score);
    for value in record.nutrient_contributions.values_mut() {
        *value = round4(*value);
    }
}

fn round2(value: f32) -> f32 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::NoHistory;
    use anyhow::anyhow;
    use chrono::Duration;
    use std::collections::HashSet;

    fn goal(name: &str, value: f32) -> NutrientGoal {
        NutrientGoal {
            name: name.to_string(),
            value,
            unit: "g".to_string(),
        }
    }

    fn candidate(recipe_id: i64, text: &str, pairs: &[(&str, f32)]) -> Candidate {
        Candidate {
            recipe_id,
            descriptive_text: text.to_string(),
            nutrient_profile: pairs
                .iter()
                .map(|(name, value)| (name.to_string(), *value))
                .collect(),
            missing_ingredients: Vec::new(),
            missing_count: 0,
        }
    }

    fn params(day: &str) -> SuggestionParams {
        SuggestionParams {
            day: day.parse().unwrap(),
            user_id: 42,
            dishes_per_slot: 1,
            slot_names: Vec::new(),
            diversity_factor: 0.3,
            randomization_strength: 0.15,
            avoid_recent: false,
            lookback_days: 0,
            entropy: None,
        }
    }

    #[test]
    fn test_goals_already_met_returns_empty_plan() {
        let request = SuggestionRequest {
            goals: vec![goal("Protein", 50.0)],
            consumed: HashMap::from([("Protein".to_string(), 60.0)]),
            candidates: vec![candidate(1, "steak", &[("Protein", 40.0)])],
            params: params("2025-06-01"),
        };

        let plan = suggest_meals_seeded(&request, &NoHistory, 1234, &|_| {}).unwrap();
        assert_eq!(plan.status, SuggestionStatus::GoalsAlreadyMet);
        assert!(plan.slot_assignments.is_empty());
        assert!(plan.residual_gaps.is_empty());
        assert_eq!(plan.diagnostics.session_seed, 1234);
    }

    #[test]
    fn test_no_candidates_keeps_residual_gaps() {
        let request = SuggestionRequest {
            goals: vec![goal("Protein", 50.0)],
            consumed: HashMap::new(),
            candidates: Vec::new(),
            params: params("2025-06-01"),
        };

        let plan = suggest_meals_seeded(&request, &NoHistory, 1, &|_| {}).unwrap();
        assert_eq!(plan.status, SuggestionStatus::NoCandidates);
        assert!(plan.slot_assignments.is_empty());
        assert_eq!(plan.residual_gaps.len(), 1);
        assert_eq!(plan.residual_gaps[0].remaining, 50.0);
    }

    #[test]
    fn test_single_gap_single_candidate_fills_lunch() {
        let mut request_params = params("2025-06-01");
        request_params.slot_names = vec!["lunch".to_string()];
        let request = SuggestionRequest {
            goals: vec![goal("Protein", 50.0)],
            consumed: HashMap::new(),
            candidates: vec![candidate(1, "grilled chicken", &[("Protein", 60.0)])],
            params: request_params,
        };

        let plan = suggest_meals_seeded(&request, &NoHistory, 9, &|_| {}).unwrap();
        assert_eq!(plan.status, SuggestionStatus::Suggested);
        assert_eq!(plan.slot_assignments.len(), 1);
        assert_eq!(plan.slot_assignments[0].slot, "lunch");
        assert_eq!(plan.slot_assignments[0].record.candidate.recipe_id, 1);
        // 60g against a 50g gap closes it entirely.
        assert!(plan.residual_gaps.is_empty());
        assert_eq!(plan.diagnostics.gaps_closed, 1);
        assert_eq!(plan.diagnostics.gap_reduction_percentage, 100.0);
    }

    #[test]
    fn test_negative_lookback_is_rejected() {
        let mut request_params = params("2025-06-01");
        request_params.lookback_days = -3;
        let request = SuggestionRequest {
            goals: vec![goal("Protein", 50.0)],
            consumed: HashMap::new(),
            candidates: vec![candidate(1, "steak", &[("Protein", 40.0)])],
            params: request_params,
        };

        let result = suggest_meals_seeded(&request, &NoHistory, 1, &|_| {});
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("lookback_days"));
    }

    #[test]
    fn test_default_slots_applied_when_empty() {
        let request = SuggestionRequest {
            goals: vec![goal("Protein", 200.0)],
            consumed: HashMap::new(),
            candidates: (0..12)
                .map(|i| candidate(i * 40, "chicken bowl", &[("Protein", 30.0)]))
                .collect(),
            params: params("2025-06-01"),
        };

        let plan = suggest_meals_seeded(&request, &NoHistory, 21, &|_| {}).unwrap();
        assert_eq!(plan.meal_slots, vec!["breakfast", "lunch", "dinner"]);
        assert!(plan.slot_assignments.len() <= 3);
    }

    #[test]
    fn test_trade_off_parameters_are_clamped() {
        let mut request_params = params("2025-06-01");
        request_params.diversity_factor = 4.0;
        request_params.randomization_strength = 0.9;
        request_params.dishes_per_slot = 0;
        let request = SuggestionRequest {
            goals: vec![goal("Protein", 50.0)],
            consumed: HashMap::new(),
            candidates: vec![candidate(1, "steak", &[("Protein", 40.0)])],
            params: request_params,
        };

        let plan = suggest_meals_seeded(&request, &NoHistory, 3, &|_| {}).unwrap();
        assert_eq!(plan.diagnostics.diversity_factor_applied, 1.0);
        assert_eq!(
            plan.diagnostics.randomization_strength_applied,
            MAX_RANDOMIZATION_STRENGTH
        );
        // dishes_per_slot 0 clamps to 1, one dish per default slot at most.
        assert!(plan.slot_assignments.len() <= 3);
    }

    struct RecordedHistory {
        eaten: Vec<(NaiveDate, Vec<i64>)>,
        failing_day: Option<NaiveDate>,
    }

    impl MealHistory for RecordedHistory {
        fn recipes_eaten_on(&self, day: NaiveDate) -> Result<Vec<i64>> {
            if self.failing_day == Some(day) {
                return Err(anyhow!("no records for {}", day));
            }
            Ok(self
                .eaten
                .iter()
                .filter(|(d, _)| *d == day)
                .flat_map(|(_, ids)| ids.clone())
                .collect())
        }
    }

    #[test]
    fn test_avoid_recent_filters_eaten_recipes() {
        let day: NaiveDate = "2025-06-05".parse().unwrap();
        let history = RecordedHistory {
            eaten: vec![
                (day - Duration::days(1), vec![100]),
                (day - Duration::days(2), vec![200]),
            ],
            failing_day: Some(day - Duration::days(3)),
        };

        let mut request_params = params("2025-06-05");
        request_params.avoid_recent = true;
        request_params.lookback_days = 3;
        let request = SuggestionRequest {
            goals: vec![goal("Protein", 500.0)],
            consumed: HashMap::new(),
            candidates: vec![
                candidate(100, "eaten yesterday", &[("Protein", 30.0)]),
                candidate(200, "eaten before", &[("Protein", 30.0)]),
                candidate(300, "fresh option", &[("Protein", 30.0)]),
            ],
            params: request_params,
        };

        let plan = suggest_meals_seeded(&request, &history, 5, &|_| {}).unwrap();
        assert_eq!(plan.diagnostics.candidate_pool_size, 1);
        let selected_ids: HashSet<i64> = plan
            .slot_assignments
            .iter()
            .map(|a| a.record.candidate.recipe_id)
            .collect();
        assert_eq!(selected_ids, HashSet::from([300]));
    }
}
