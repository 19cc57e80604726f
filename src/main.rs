use anyhow::{Context, Result};
use recipe_finder::cli::{parse_args, Command, PantryAction};
use recipe_finder::config::AppConfig;
use recipe_finder::models::SearchRequest;
use recipe_finder::pantry::PantryStore;
use recipe_finder::quantity::{measure_to_grams, scale_measure};
use recipe_finder::recipe_detail::DetailError;
use recipe_finder::sources::backend::IngredientValidation;
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).context("Failed to serialize output")?);
    Ok(())
}

async fn run_pantry(config: &AppConfig, action: PantryAction) -> Result<()> {
    let mut pantry = PantryStore::open(config.pantry_file())
        .await
        .with_context(|| format!("Failed to open pantry at {:?}", config.pantry_file()))?;

    match action {
        PantryAction::List => {
            if pantry.is_first_time_user() {
                eprintln!("Your pantry is saved between runs. Add items with `pantry add <ingredient>`.");
                pantry.mark_onboarded().await?;
            }
            print_json(&pantry.ingredients())?;
        }
        PantryAction::Add { ingredients } => {
            for ingredient in ingredients {
                if !pantry.add(&ingredient).await? {
                    eprintln!("'{}' is already in the pantry", ingredient.trim());
                }
            }
            print_json(&pantry.ingredients())?;
        }
        PantryAction::Remove { ingredients } => {
            for ingredient in ingredients {
                if !pantry.remove(&ingredient).await? {
                    eprintln!("'{}' is not in the pantry", ingredient.trim());
                }
            }
            print_json(&pantry.ingredients())?;
        }
        PantryAction::Clear => {
            pantry.clear().await?;
            eprintln!("Pantry cleared.");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli_args = parse_args();
    let config = AppConfig::from_env().context("Failed to read configuration")?;
    debug!(?config, "configuration loaded");

    match cli_args.command {
        Command::Search {
            ingredients,
            diet,
            focus,
            exact,
        } => {
            let request = if ingredients.is_empty() {
                PantryStore::open(config.pantry_file()).await?.search_request()?
            } else {
                SearchRequest::new(&ingredients)?
            }
            .with_diet(diet.as_deref())
            .with_focus(focus.as_deref())
            .with_exact_match(exact);

            let aggregator = config.build_aggregator()?;
            let outcome = aggregator.search(&request).await;
            if let Some(message) = outcome.message() {
                eprintln!("{message}");
            }
            print_json(&*outcome)?;
        }
        Command::Meal { id, servings } => {
            let service = config.build_detail_service()?;
            match service.meal(&id, servings).await {
                Ok(detail) => print_json(&detail)?,
                Err(e) => {
                    eprintln!("{}", e.user_message());
                    return Err(e).with_context(|| format!("Failed to load meal {id}"));
                }
            }
        }
        Command::Cocktail { id, servings } => {
            let service = config.build_detail_service()?;
            match service.cocktail(&id, servings).await {
                Ok(detail) => print_json(&detail)?,
                Err(e @ DetailError::NotFound { .. }) => {
                    // The public catalog has drinks the backend may not.
                    match config.cocktail_catalog()?.lookup(&id).await {
                        Ok(Some(recipe)) => print_json(&recipe)?,
                        _ => {
                            eprintln!("{}", e.user_message());
                            return Err(e).with_context(|| format!("Failed to load cocktail {id}"));
                        }
                    }
                }
                Err(e) => {
                    eprintln!("{}", e.user_message());
                    return Err(e).with_context(|| format!("Failed to load cocktail {id}"));
                }
            }
        }
        Command::Latest { count } => {
            let recipes = config.backend_client()?.latest_recipes(count).await?;
            print_json(&recipes)?;
        }
        Command::Category { category, count } => {
            let recipes = config
                .backend_client()?
                .category_recipes(&category, count)
                .await
                .with_context(|| format!("Failed to load category '{category}'"))?;
            print_json(&recipes)?;
        }
        Command::Scale { measure, ratio } => {
            println!("{}", scale_measure(&measure, ratio));
        }
        Command::Grams { measure, ingredient } => match measure_to_grams(&measure, &ingredient) {
            Some(grams) => println!("{grams:.1} g"),
            None => println!("'{measure}' has no measurable quantity"),
        },
        Command::Nutrition { ingredient, measure } => {
            let resolver = config.build_resolver()?;
            let profile = resolver.resolve_ingredient_nutrition(&ingredient, &measure).await;
            print_json(&profile)?;
        }
        Command::Validate { ingredient } => {
            match config.backend_client()?.validate_ingredient(&ingredient).await? {
                IngredientValidation::Valid(name) => println!("{name}"),
                IngredientValidation::Rejected(reason) => eprintln!("Not an ingredient: {reason}"),
            }
        }
        Command::Identify { image } => {
            let bytes = tokio::fs::read(&image)
                .await
                .with_context(|| format!("Failed to read image '{}'", image.display()))?;
            let file_name = image
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "upload.jpg".to_string());
            let response = config.backend_client()?.identify_ingredient(bytes, &file_name).await?;
            print_json(&response)?;
        }
        Command::Pantry { action } => run_pantry(&config, action).await?,
    }

    Ok(())
}
