//! The `quizline init` command.

use anyhow::Result;

use quizline_core::bank::BUILTIN_BANK;

pub fn execute() -> Result<()> {
    // Create quizline.toml
    if std::path::Path::new("quizline.toml").exists() {
        println!("quizline.toml already exists, skipping.");
    } else {
        std::fs::write("quizline.toml", SAMPLE_CONFIG)?;
        println!("Created quizline.toml");
    }

    // Create example bank
    std::fs::create_dir_all("banks")?;
    let example_path = std::path::Path::new("banks/general.toml");
    if example_path.exists() {
        println!("banks/general.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, BUILTIN_BANK)?;
        println!("Created banks/general.toml");
    }

    println!("\nNext steps:");
    println!("  1. Edit banks/general.toml or add your own banks");
    println!("  2. Run: quizline validate --bank banks");
    println!("  3. Run: quizline play --name <you> --character wizard --bank banks/general.toml");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# quizline configuration

seconds_per_question = 30
time_boost_secs = 15
reveal_delay_ms = 1500
timeout_grace_ms = 1000
retention_days = 30
# bank = "banks/general.toml"
# seed = 42

[store]
type = "file"
path = "./quizline-data/attempts.json"
"#;
