//! Flashcard data model.
//!
//! A [`Project`] holds [`Folder`]s which hold [`Flashcard`]s. A card may carry
//! the learner's `response`, which is what gets graded against its `answer`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single question/answer card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub question: String,
    /// The reference answer.
    pub answer: String,
    /// The learner's submitted answer, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
}

impl Flashcard {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            question: question.into(),
            answer: answer.into(),
            response: None,
        }
    }

    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.response = Some(response.into());
        self
    }
}

/// A named group of cards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub flashcards: Vec<Flashcard>,
}

impl Folder {
    pub fn new(name: impl Into<String>, flashcards: Vec<Flashcard>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            flashcards,
        }
    }
}

/// Top-level container of folders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub folders: Vec<Folder>,
}

impl Project {
    pub fn new(name: impl Into<String>, folders: Vec<Folder>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            folders,
        }
    }

    /// Every card paired with the folder that holds it, in file order.
    pub fn cards(&self) -> impl Iterator<Item = (&Folder, &Flashcard)> {
        self.folders
            .iter()
            .flat_map(|folder| folder.flashcards.iter().map(move |card| (folder, card)))
    }

    pub fn card_count(&self) -> usize {
        self.folders.iter().map(|f| f.flashcards.len()).sum()
    }

    /// Cards that carry a learner response.
    pub fn answered_count(&self) -> usize {
        self.cards().filter(|(_, c)| c.response.is_some()).count()
    }
}
