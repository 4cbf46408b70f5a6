use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Remaining amounts at or below this are treated as closed.
pub const MIN_GAP_THRESHOLD: f32 = 0.05;

// Fixed importance table; nutrients not listed weigh 1.0.
const NUTRIENT_WEIGHTS: &[(&str, f32)] = &[
    ("Protein", 3.0),
    ("Fiber", 2.5),
    ("Iron", 2.5),
    ("Vitamin C", 2.0),
    ("Vitamin A", 2.0),
    ("Calcium", 2.0),
    ("Potassium", 1.8),
    ("Carbs", 1.0),
    ("Fat", 0.8),
    ("Calories", 0.4),
];

pub fn nutrient_weight(name: &str) -> f32 {
    NUTRIENT_WEIGHTS
        .iter()
        .find(|(weighted_name, _)| *weighted_name == name)
        .map(|(_, weight)| *weight)
        .unwrap_or(1.0)
}

/// A daily nutrient target, set once per day per user by the upstream
/// goal-calculation service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NutrientGoal {
    pub name: String,
    pub value: f32,
    #[serde(default)]
    pub unit: String,
}

/// The unmet portion of one goal, as reported back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutrientGap {
    pub name: String,
    pub remaining: f32,
    pub unit: String,
}

/// The active nutrient deficits for one suggestion call. Deflation produces a
/// new snapshot instead of mutating, so each selection round can be inspected
/// in isolation.
#[derive(Debug, Clone, Default)]
pub struct GapSet {
    gaps: BTreeMap<String, (f32, String)>,
}

impl GapSet {
    /// Build the initial gap set from (goal - consumed). Nutrients already
    /// within the threshold of their goal are left out. Nutrients absent from
    /// `consumed` count as not eaten at all.
    pub fn from_goals(goals: &[NutrientGoal], consumed: &HashMap<String, f32>) -> Self {
        let mut gaps = BTreeMap::new();
        for goal in goals {
            let consumed_value = consumed.get(&goal.name).copied().unwrap_or(0.0);
            let remaining = goal.value - consumed_value;
            if remaining > MIN_GAP_THRESHOLD {
                gaps.insert(goal.name.clone(), (remaining, goal.unit.clone()));
            }
        }
        GapSet { gaps }
    }

    pub fn is_empty(&self) -> bool {
        self.gaps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.gaps.len()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.gaps.contains_key(name)
    }

    pub fn remaining(&self, name: &str) -> Option<f32> {
        self.gaps.get(name).map(|(remaining, _)| *remaining)
    }

    /// Iterate (nutrient, remaining) in stable name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f32)> {
        self.gaps
            .iter()
            .map(|(name, (remaining, _unit))| (name.as_str(), *remaining))
    }

    pub fn total_remaining(&self) -> f32 {
        self.gaps.values().map(|(remaining, _)| *remaining).sum()
    }

    /// New snapshot with the recipe's nutrient amounts subtracted. Remaining
    /// values clamp at zero and nutrients falling within the threshold are
    /// dropped from the active set. Negative profile values count as zero.
    pub fn deflate(&self, nutrient_profile: &HashMap<String, f32>) -> GapSet {
        let mut updated = BTreeMap::new();
        for (name, (remaining, unit)) in &self.gaps {
            let value = nutrient_profile.get(name).copied().unwrap_or(0.0);
            let new_remaining = (remaining - value.max(0.0)).max(0.0);
            if new_remaining > MIN_GAP_THRESHOLD {
                updated.insert(name.clone(), (new_remaining, unit.clone()));
            }
        }
        GapSet { gaps: updated }
    }

    /// Per-nutrient urgency: (remaining fraction of the goal) ^ 1.5 times the
    /// fixed importance weight, times a bounded random factor that breaks
    /// ties between sessions. Computed once per call, then pruned as
    /// nutrients leave the active set.
    pub fn criticality(&self, goals: &[NutrientGoal], rng: &mut impl Rng) -> BTreeMap<String, f32> {
        let goal_values: HashMap<&str, f32> =
            goals.iter().map(|goal| (goal.name.as_str(), goal.value)).collect();

        let mut criticality = BTreeMap::new();
        for (name, (remaining, _unit)) in &self.gaps {
            let goal_value = match goal_values.get(name.as_str()) {
                Some(value) if *value > 0.0 => *value,
                _ => continue,
            };
            let percentage_remaining = (remaining / goal_value).min(1.0);
            let base_criticality = percentage_remaining.powf(1.5) * nutrient_weight(name);
            let randomization_factor = rng.gen_range(0.8..1.2);
            criticality.insert(name.clone(), base_criticality * randomization_factor);
        }
        criticality
    }

    /// Residual gaps for the response, rounded for display.
    pub fn to_residual_gaps(&self) -> Vec<NutrientGap> {
        self.gaps
            .iter()
            .map(|(name, (remaining, unit))| NutrientGap {
                name: name.clone(),
                remaining: round4(*remaining),
                unit: unit.clone(),
            })
            .collect()
    }
}

pub fn round4(value: f32) -> f32 {
    (value * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn goal(name: &str, value: f32, unit: &str) -> NutrientGoal {
        NutrientGoal {
            name: name.to_string(),
            value,
            unit: unit.to_string(),
        }
    }

    #[test]
    fn test_from_goals_excludes_met_goals() {
        let goals = vec![
            goal("Protein", 50.0, "g"),
            goal("Fiber", 25.0, "g"),
            goal("Iron", 8.0, "mg"),
        ];
        let mut consumed = HashMap::new();
        consumed.insert("Protein".to_string(), 60.0); // over goal
        consumed.insert("Fiber".to_string(), 24.99); // within threshold of goal

        let gaps = GapSet::from_goals(&goals, &consumed);
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps.remaining("Iron"), Some(8.0));
        assert!(!gaps.contains("Protein"));
        assert!(!gaps.contains("Fiber"));
    }

    #[test]
    fn test_deflate_clamps_and_drops() {
        let goals = vec![goal("Protein", 50.0, "g"), goal("Fiber", 10.0, "g")];
        let gaps = GapSet::from_goals(&goals, &HashMap::new());

        let mut profile = HashMap::new();
        profile.insert("Protein".to_string(), 80.0); // overshoots the gap
        profile.insert("Fiber".to_string(), 4.0);
        profile.insert("Iron".to_string(), 2.0); // not an active gap, ignored

        let updated = gaps.deflate(&profile);
        assert!(!updated.contains("Protein")); // clamped to 0, dropped
        assert_eq!(updated.remaining("Fiber"), Some(6.0));

        // Original snapshot is untouched.
        assert_eq!(gaps.remaining("Protein"), Some(50.0));
    }

    #[test]
    fn test_deflate_ignores_negative_profile_values() {
        let goals = vec![goal("Fiber", 10.0, "g")];
        let gaps = GapSet::from_goals(&goals, &HashMap::new());

        let mut profile = HashMap::new();
        profile.insert("Fiber".to_string(), -5.0);

        let updated = gaps.deflate(&profile);
        assert_eq!(updated.remaining("Fiber"), Some(10.0));
    }

    #[test]
    fn test_criticality_within_randomization_bounds() {
        let goals = vec![goal("Protein", 50.0, "g")];
        let mut consumed = HashMap::new();
        consumed.insert("Protein".to_string(), 25.0);
        let gaps = GapSet::from_goals(&goals, &consumed);

        let mut rng = StdRng::seed_from_u64(7);
        let criticality = gaps.criticality(&goals, &mut rng);

        // base = (25/50)^1.5 * 3.0, random factor in [0.8, 1.2)
        let base = 0.5_f32.powf(1.5) * 3.0;
        let score = criticality["Protein"];
        assert!(score >= base * 0.8 && score <= base * 1.2, "score {}", score);
    }

    #[test]
    fn test_criticality_skips_nutrients_without_goal() {
        let goals = vec![goal("Protein", 50.0, "g")];
        let gaps = GapSet::from_goals(&goals, &HashMap::new());

        // Criticality is asked with a goal list missing the gap's nutrient.
        let other_goals = vec![goal("Fiber", 25.0, "g")];
        let mut rng = StdRng::seed_from_u64(7);
        let criticality = gaps.criticality(&other_goals, &mut rng);
        assert!(criticality.is_empty());
    }

    #[test]
    fn test_nutrient_weight_defaults_to_one() {
        assert_eq!(nutrient_weight("Protein"), 3.0);
        assert_eq!(nutrient_weight("Zinc"), 1.0);
    }

    #[test]
    fn test_residual_gaps_rounded() {
        let goals = vec![goal("Iron", 8.0, "mg")];
        let mut consumed = HashMap::new();
        consumed.insert("Iron".to_string(), 0.333_333);
        let gaps = GapSet::from_goals(&goals, &consumed);

        let residual = gaps.to_residual_gaps();
        assert_eq!(residual.len(), 1);
        assert_eq!(residual[0].remaining, 7.6667);
        assert_eq!(residual[0].unit, "mg");
    }
}
