//! TOML deck parser.
//!
//! Loads decks from TOML files and directories, and validates them.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{Flashcard, Folder, Project};

/// Intermediate TOML structure for parsing deck files.
#[derive(Debug, Deserialize)]
struct TomlDeckFile {
    project: TomlProjectHeader,
    #[serde(default)]
    folders: Vec<TomlFolder>,
}

#[derive(Debug, Deserialize)]
struct TomlProjectHeader {
    name: String,
}

#[derive(Debug, Deserialize)]
struct TomlFolder {
    name: String,
    #[serde(default)]
    cards: Vec<TomlCard>,
}

#[derive(Debug, Deserialize)]
struct TomlCard {
    question: String,
    answer: String,
    #[serde(default)]
    response: Option<String>,
}

/// Parse a single TOML file into a `Project`.
pub fn parse_deck(path: &Path) -> Result<Project> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read deck file: {}", path.display()))?;

    parse_deck_str(&content, path)
}

/// Parse a TOML string into a `Project` (useful for testing).
pub fn parse_deck_str(content: &str, source_path: &Path) -> Result<Project> {
    let parsed: TomlDeckFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let folders = parsed
        .folders
        .into_iter()
        .map(|f| {
            let cards = f
                .cards
                .into_iter()
                .map(|c| {
                    let card = Flashcard::new(c.question, c.answer);
                    match c.response {
                        Some(response) => card.with_response(response),
                        None => card,
                    }
                })
                .collect();
            Folder::new(f.name, cards)
        })
        .collect();

    Ok(Project::new(parsed.project.name, folders))
}

/// Recursively load all `.toml` deck files from a directory.
pub fn load_deck_directory(dir: &Path) -> Result<Vec<Project>> {
    let mut decks = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();

        if path.is_dir() {
            decks.extend(load_deck_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_deck(&path) {
                Ok(deck) => decks.push(deck),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(decks)
}

/// Load a single deck file, or every deck under a directory.
pub fn load_decks(path: &Path) -> Result<Vec<Project>> {
    if path.is_dir() {
        load_deck_directory(path)
    } else {
        Ok(vec![parse_deck(path)?])
    }
}

/// A warning from deck validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The folder name (if applicable).
    pub folder: Option<String>,
    /// Warning message.
    pub message: String,
}

/// Validate a deck for common issues.
pub fn validate_deck(project: &Project) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if project.folders.is_empty() {
        warnings.push(ValidationWarning {
            folder: None,
            message: "deck has no folders".into(),
        });
    }

    let mut seen_folders = HashSet::new();
    for folder in &project.folders {
        let warn = |message: String| ValidationWarning {
            folder: Some(folder.name.clone()),
            message,
        };

        if !seen_folders.insert(folder.name.as_str()) {
            warnings.push(warn(format!("duplicate folder name: {}", folder.name)));
        }

        if folder.flashcards.is_empty() {
            warnings.push(warn("folder has no cards".into()));
        }

        let mut seen_questions = HashSet::new();
        for (idx, card) in folder.flashcards.iter().enumerate() {
            let n = idx + 1;
            if card.question.trim().is_empty() {
                warnings.push(warn(format!("card {n}: question is empty")));
            } else if !seen_questions.insert(card.question.trim()) {
                warnings.push(warn(format!(
                    "card {n}: duplicate question: {}",
                    card.question.trim()
                )));
            }
            if card.answer.trim().is_empty() {
                warnings.push(warn(format!(
                    "card {n}: answer is empty, every response will score 0"
                )));
            }
            if card.response.is_none() {
                warnings.push(warn(format!(
                    "card {n}: no response, card will be skipped when grading"
                )));
            }
        }
    }

    warnings
}
