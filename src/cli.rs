use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Find recipes for what is in your pantry", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Search every source for recipes using the given ingredients
    Search {
        /// Ingredients to search with; defaults to the saved pantry
        ingredients: Vec<String>,
        /// Diet filter passed to the recipe backend (e.g. vegetarian)
        #[arg(short, long)]
        diet: Option<String>,
        /// Only keep recipes featuring this ingredient and rank it first
        #[arg(short, long)]
        focus: Option<String>,
        /// Drop recipes that need anything not in the ingredient list
        #[arg(short, long)]
        exact: bool,
    },
    /// Show a meal with scaled measures and nutrition
    Meal {
        id: String,
        #[arg(short, long)]
        servings: Option<u32>,
    },
    /// Show a cocktail with scaled measures and nutrition
    Cocktail {
        id: String,
        #[arg(short, long)]
        servings: Option<u32>,
    },
    /// Most recently added recipes
    Latest {
        #[arg(short, long, default_value_t = 10)]
        count: u32,
    },
    /// Recipes in a category
    Category {
        category: String,
        #[arg(short, long, default_value_t = 10)]
        count: u32,
    },
    /// Scale a measure such as "1 1/2 cups" by a serving ratio
    Scale {
        measure: String,
        ratio: f64,
    },
    /// Convert a measure of an ingredient to grams
    Grams {
        measure: String,
        ingredient: String,
    },
    /// Resolve nutrition for one ingredient
    Nutrition {
        ingredient: String,
        #[arg(short, long, default_value = "")]
        measure: String,
    },
    /// Ask the backend whether a name is a real ingredient
    Validate { ingredient: String },
    /// Identify an ingredient from a photo
    Identify { image: PathBuf },
    /// Manage the saved pantry
    Pantry {
        #[command(subcommand)]
        action: PantryAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum PantryAction {
    List,
    Add { ingredients: Vec<String> },
    Remove { ingredients: Vec<String> },
    Clear,
}

pub fn parse_args() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_search_flags() {
        let cli = Cli::try_parse_from(["recipe_finder", "search", "chicken", "rice", "--focus", "rice", "--exact"])
            .unwrap();
        match cli.command {
            Command::Search { ingredients, focus, exact, diet } => {
                assert_eq!(ingredients, vec!["chicken", "rice"]);
                assert_eq!(focus.as_deref(), Some("rice"));
                assert!(exact);
                assert!(diet.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn parses_pantry_actions() {
        let cli = Cli::try_parse_from(["recipe_finder", "pantry", "add", "eggs", "milk"]).unwrap();
        assert!(matches!(cli.command, Command::Pantry { action: PantryAction::Add { .. } }));
        assert!(Cli::try_parse_from(["recipe_finder", "scale", "2 cups"]).is_err());
    }
}
