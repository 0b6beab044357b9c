//! The `recall init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("recall.toml").exists() {
        println!("recall.toml already exists, skipping.");
    } else {
        std::fs::write("recall.toml", SAMPLE_CONFIG)?;
        println!("Created recall.toml");
    }

    std::fs::create_dir_all("decks")?;
    let example_path = std::path::Path::new("decks/example.toml");
    if example_path.exists() {
        println!("decks/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_DECK)?;
        println!("Created decks/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Fill in the response fields in decks/example.toml");
    println!("  2. Run: recall validate --deck decks/example.toml");
    println!("  3. Run: recall grade --deck decks/example.toml");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# recall configuration

# "local" grades offline; "remote" asks a remote grader first and falls back to local
mode = "local"
remote_timeout_ms = 3000
parallelism = 4
pass_threshold = 80
output_dir = "./recall-results"
"#;

const EXAMPLE_DECK: &str = r#"[project]
name = "Example Deck"

[[folders]]
name = "Biology"

[[folders.cards]]
question = "What is the powerhouse of the cell?"
answer = "mitochondria"
response = "mitocondria"

[[folders.cards]]
question = "What pigment makes plants green?"
answer = "chlorophyll"

[[folders]]
name = "Geography"

[[folders.cards]]
question = "What is the capital of France?"
answer = "Paris, France"
response = "Paris"

[[folders.cards]]
question = "Which river flows through Cairo?"
answer = "the Nile river"
"#;
