use serde::{Deserialize, Serialize};

use crate::suggest::selector::SelectionRecord;

/// One selected recipe placed into a named meal slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotAssignment {
    pub slot: String,
    pub dish_index: usize,
    pub record: SelectionRecord,
}

impl SlotAssignment {
    /// Display label: the first dish carries the bare slot name, extra
    /// dishes are suffixed.
    pub fn meal_label(&self) -> String {
        if self.dish_index == 0 {
            self.slot.clone()
        } else {
            format!("{}_dish_{}", self.slot, self.dish_index + 1)
        }
    }
}

/// Walk the records in selection order, slot-major and dish-minor: every
/// dish of a slot is placed before moving to the next slot. A short record
/// list leaves later slots underfilled, which is not an error.
pub fn distribute_into_slots(
    records: Vec<SelectionRecord>,
    slot_names: &[String],
    dishes_per_slot: usize,
) -> Vec<SlotAssignment> {
    let mut assignments = Vec::with_capacity(records.len());
    let mut records_iter = records.into_iter();

    'slots: for slot in slot_names {
        for dish_index in 0..dishes_per_slot {
            match records_iter.next() {
                Some(record) => assignments.push(SlotAssignment {
                    slot: slot.clone(),
                    dish_index,
                    record,
                }),
                None => break 'slots,
            }
        }
    }
    assignments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::Candidate;
    use std::collections::BTreeMap;

    fn record(recipe_id: i64) -> SelectionRecord {
        SelectionRecord {
            candidate: Candidate {
                recipe_id,
                descriptive_text: String::new(),
                nutrient_profile: Default::default(),
                missing_ingredients: Vec::new(),
                missing_count: 0,
            },
            gap_contribution: 0.0,
            diversity_contribution: 0.0,
            combined_score: 0.0,
            nutrient_contributions: BTreeMap::new(),
        }
    }

    fn slots(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_slot_major_dish_minor_order() {
        let records = (1..=4).map(record).collect();
        let assignments = distribute_into_slots(records, &slots(&["lunch", "dinner"]), 2);

        let layout: Vec<(String, usize, i64)> = assignments
            .iter()
            .map(|a| (a.slot.clone(), a.dish_index, a.record.candidate.recipe_id))
            .collect();
        assert_eq!(
            layout,
            vec![
                ("lunch".to_string(), 0, 1),
                ("lunch".to_string(), 1, 2),
                ("dinner".to_string(), 0, 3),
                ("dinner".to_string(), 1, 4),
            ]
        );
    }

    #[test]
    fn test_short_record_list_underfills_later_slots() {
        let records = (1..=3).map(record).collect();
        let assignments =
            distribute_into_slots(records, &slots(&["breakfast", "lunch", "dinner"]), 2);

        assert_eq!(assignments.len(), 3);
        assert_eq!(assignments[2].slot, "lunch");
        assert_eq!(assignments[2].dish_index, 0);
        assert!(!assignments.iter().any(|a| a.slot == "dinner"));
    }

    #[test]
    fn test_meal_labels() {
        let records = (1..=2).map(record).collect();
        let assignments = distribute_into_slots(records, &slots(&["lunch"]), 2);
        assert_eq!(assignments[0].meal_label(), "lunch");
        assert_eq!(assignments[1].meal_label(), "lunch_dish_2");
    }
}
