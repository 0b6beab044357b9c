//! The `recall score` command.

use anyhow::Result;
use serde::Serialize;

use recall_core::scorer::{assess, Assessment, Rule};

#[derive(Serialize)]
struct ScoreOutput<'a> {
    reference: &'a str,
    candidate: &'a str,
    percent: u8,
    #[serde(flatten)]
    assessment: Assessment,
}

pub fn execute(reference: &str, candidate: &str, explain: bool, json: bool) -> Result<()> {
    let assessment = assess(reference, candidate);

    if json {
        let output = ScoreOutput {
            reference,
            candidate,
            percent: assessment.grade.percent(),
            assessment,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("Grade: {}", assessment.grade);
    println!("Percent: {}%", assessment.grade.percent());
    if explain {
        println!("Rule: {}", describe(&assessment.rule));
    }

    Ok(())
}

fn describe(rule: &Rule) -> String {
    match rule {
        Rule::EmptyInput => "empty input".to_string(),
        Rule::ExactMatch => "exact match".to_string(),
        Rule::Containment => "short answer containment".to_string(),
        Rule::SingleWordTypo {
            distance,
            threshold,
        } => format!("single-word typo (distance {distance}, threshold {threshold})"),
        Rule::Overlap {
            word_score,
            char_score,
            combined,
        } => format!(
            "overlap (word {word_score:.3}, char {char_score:.3}, combined {combined:.3})"
        ),
    }
}
