pub mod engine;
pub mod scorer;
pub mod selector;
pub mod session_seed;
pub mod slots;

// Re-export the surface collaborators actually call.
pub use engine::{
    suggest_meals, suggest_meals_seeded, MealPlan, SuggestionDiagnostics, SuggestionParams,
    SuggestionRequest, SuggestionStatus, DEFAULT_MEAL_SLOTS,
};
pub use selector::{select_diverse_recipes, SelectionRecord};
pub use session_seed::generate_session_seed;
pub use slots::{distribute_into_slots, SlotAssignment};
