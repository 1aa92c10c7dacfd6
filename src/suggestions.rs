//! Canned prompts behind the "Suggest Fun Activities" and "Brainstorm Names"
//! buttons.

use rand::seq::IndexedRandom;
use rand::Rng;

pub const ACTIVITY_SUGGESTIONS: [&str; 10] = [
    "How to play soccer?",
    "What to play in a park?",
    "Give me a new recipe",
    "Recommend a book",
    "Recommend a movie",
    "How to do gardening?",
    "Recommend some music",
    "How to paint or draw?",
    "Recommend a board game",
    "Recommend a new hobby",
];

pub const NAME_BRAINSTORMS: [&str; 10] = [
    "Brainstorm Names for a Bakery",
    "Brainstorm Names for a Travel Agency",
    "Brainstorm Names for a Fashion Brand",
    "Brainstorm Names for a pet grooming service",
    "Brainstorm Names for a podcast network dedicated to exploring conspiracy theories.",
    "Brainstorm Names for a restaurant chain featuring fusion cuisine",
    "Brainstorm Names for a Tech Company",
    "Brainstorm Names for a tutoring service offering virtual reality-enhanced",
    "Brainstorm Names for a gardening center specializing in sustainable urban gardening",
    "Brainstorm Names for a nonprofit organization promoting STEM education",
];

/// Uniform draw from the activity list. Draws are independent.
pub fn pick_activity<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    pick(&ACTIVITY_SUGGESTIONS, rng)
}

/// Uniform draw from the brainstorm list.
pub fn pick_brainstorm<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    pick(&NAME_BRAINSTORMS, rng)
}

fn pick<R: Rng + ?Sized>(table: &'static [&'static str], rng: &mut R) -> &'static str {
    // Both tables are non-empty constants.
    table.choose(rng).copied().unwrap_or_default()
}
