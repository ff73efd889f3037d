//! `stepline tools` — list the registered tools.

use std::path::PathBuf;

pub fn run(config_path: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let registry = super::build_registry(&config)?;

    for summary in registry.summaries() {
        let params = if summary.params.is_empty() {
            String::new()
        } else {
            summary.params.join("|")
        };
        println!("{}({})\n    {}", summary.name, params, summary.description);
    }

    Ok(())
}
