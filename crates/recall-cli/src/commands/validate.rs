//! The `recall validate` command.

use std::path::PathBuf;

use anyhow::Result;

use recall_core::parser::{load_decks, validate_deck};

pub fn execute(deck_path: PathBuf) -> Result<()> {
    let decks = load_decks(&deck_path)?;

    let mut total_warnings = 0;

    for deck in &decks {
        println!(
            "Deck: {} ({} folders, {} cards, {} answered)",
            deck.name,
            deck.folders.len(),
            deck.card_count(),
            deck.answered_count()
        );

        let warnings = validate_deck(deck);
        for w in &warnings {
            let prefix = w
                .folder
                .as_ref()
                .map(|name| format!("  [{name}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All decks valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
