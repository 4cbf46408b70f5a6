use anyhow::{Context, Result};
use meal_suggest::cli::parse_args;
use meal_suggest::history::NoHistory;
use meal_suggest::suggest::{suggest_meals, suggest_meals_seeded, SuggestionRequest};
use tokio::fs;

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = parse_args();
    println!("Reading suggestion request: {}", cli_args.request_file);

    let request_content = fs::read_to_string(&cli_args.request_file)
        .await
        .with_context(|| format!("Failed to read request file '{}'", cli_args.request_file))?;
    let request: SuggestionRequest = serde_json::from_str(&request_content)
        .with_context(|| format!("Failed to parse request file '{}'", cli_args.request_file))?;

    println!(
        "Loaded {} goals and {} candidate recipes for user {} on {}.",
        request.goals.len(),
        request.candidates.len(),
        request.params.user_id,
        request.params.day
    );

    let progress_callback = |message: String| {
        println!("{}", message);
    };

    // The CLI has no meal records to consult, so recently-eaten filtering is
    // a no-op here.
    let plan = match cli_args.seed {
        Some(seed) => suggest_meals_seeded(&request, &NoHistory, seed, &progress_callback)?,
        None => suggest_meals(&request, &NoHistory, &progress_callback)?,
    };

    println!("\n{}", serde_json::to_string_pretty(&plan)?);
    Ok(())
}
