use codeflow::{config::DEFAULT_CONFIG_FILE, Config};
use std::path::Path;

fn main() -> anyhow::Result<()> {
    println!("codeflow configuration check");
    println!("============================");

    let path = Path::new(DEFAULT_CONFIG_FILE);
    let config = match Config::load(path) {
        Ok(config) => config,
        Err(e) => {
            println!("{}", e);
            println!("Using built-in defaults for display.");
            Config::default()
        }
    };
    config.validate()?;

    println!("Target files: *.{}", config.language.extension);
    println!("Entry point marker: {}", config.language.entry_point_marker);
    println!("Import prefixes: {:?}", config.language.import_prefixes);
    println!("Chunk size: {} characters", config.chunk_size);
    println!("Report: {}", config.output_path.display());
    println!("Provider: {} ({})", config.llm.provider, config.llm.model);

    match config.credential() {
        Ok(_) => println!("API key: [CONFIGURED]"),
        Err(e) => println!("API key: {}", e),
    }

    Ok(())
}
