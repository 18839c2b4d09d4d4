//! The `mathdrill init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("mathdrill.toml").exists() {
        println!("mathdrill.toml already exists, skipping.");
    } else {
        std::fs::write("mathdrill.toml", SAMPLE_CONFIG)?;
        println!("Created mathdrill.toml");
    }

    println!("\nNext steps:");
    println!("  1. Export GEMINI_API_KEY (or edit mathdrill.toml)");
    println!("  2. Run: mathdrill practice --difficulty medium");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# mathdrill configuration

default_provider = "gemini"
default_model = "gemini-2.0-flash"
default_difficulty = "medium"
request_timeout_secs = 120

[providers.gemini]
type = "gemini"
api_key = "${GEMINI_API_KEY}"

# Offline provider that replays canned replies, handy for demos.
[providers.offline]
type = "mock"
responses = [
    "A baker makes 48 muffins and packs them into boxes of 6. How many boxes does she fill?",
    '{"isCorrect": true, "explanation": "48 / 6 = 8 boxes."}',
]
"#;
