//! The `examprep init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("examprep.toml").exists() {
        println!("examprep.toml already exists, skipping.");
    } else {
        std::fs::write("examprep.toml", SAMPLE_CONFIG)?;
        println!("Created examprep.toml");
    }

    println!("\nNext steps:");
    println!("  1. Set SUPABASE_ANON_KEY and DEEPSEEK_API_KEY, and the [store] url");
    println!("  2. Run: examprep levels");
    println!("  3. Run: examprep questions --topic <id> --type Structural");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# examprep configuration

# Question-type id used when no row is named "structural".
structural_type_id = 1

[store]
url = "https://your-project.supabase.co"
api_key = "${SUPABASE_ANON_KEY}"
bucket = "question-images"
blob_urls = "signed"
signed_url_ttl_secs = 3600

[grader]
api_key = "${DEEPSEEK_API_KEY}"
base_url = "https://api.deepseek.com"
model = "deepseek-chat"
temperature = 0.5
max_tokens = 800
timeout_secs = 120

[retry]
max_attempts = 3
base_delay_secs = 1
"#;
