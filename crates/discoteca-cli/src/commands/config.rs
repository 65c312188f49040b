use anyhow::{Context, Result};
use discoteca_etl::{config, Config};

/// Keys accepted by `config get` and `config set`.
const KEYS: &[&str] = &[
    "music_folder",
    "database_path",
    "scratch_dir",
    "lastfm_api_key",
    "ytdlp_path",
    "cookies_file",
    "musicbrainz_lookup",
    "web_search",
    "embed_cover",
];

const BOOL_KEYS: &[&str] = &["musicbrainz_lookup", "web_search", "embed_cover"];

/// Show the current effective configuration.
pub fn show_config() -> Result<()> {
    let config = Config::load()?;

    println!("Current Configuration");
    println!("=====================\n");

    println!("Config file: {}", config::config_file_path().display());

    let exists = config::config_file_path().exists();
    println!("File exists: {}\n", if exists { "yes" } else { "no (using defaults)" });

    println!("Settings:");
    for key in KEYS {
        println!("  {key}: {}", value_of(&config, key)?);
    }

    println!("\nPriority: CLI args > MUSIC_FOLDER/DB_PATH/LASTFM_API_KEY > ENV vars (DISCOTECA_*) > Config file > Defaults");

    Ok(())
}

/// Get a specific config value, or print the config file.
pub fn get_config(key: Option<String>) -> Result<()> {
    if let Some(key) = key {
        check_key(&key)?;
        let config = Config::load()?;
        println!("{}", value_of(&config, &key)?);
    } else {
        let config_path = config::config_file_path();

        if config_path.exists() {
            let contents =
                std::fs::read_to_string(&config_path).context("Failed to read config file")?;
            print!("{contents}");
        } else {
            println!("Config file does not exist: {}", config_path.display());
            println!("\nRun 'discoteca config init' to create it.");
        }
    }

    Ok(())
}

/// Set a config value in the config file.
pub fn set_config(key: &str, value: &str) -> Result<()> {
    check_key(key)?;
    let rendered = if BOOL_KEYS.contains(&key) {
        let flag: bool = value
            .parse()
            .with_context(|| format!("{key} must be true or false"))?;
        flag.to_string()
    } else {
        format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
    };

    let config_path = config::config_file_path();
    config::ensure_config_file()?;

    let contents = std::fs::read_to_string(&config_path).context("Failed to read config file")?;
    let contents = set_line(&contents, key, &rendered);
    std::fs::write(&config_path, contents).context("Failed to write config file")?;

    println!("✓ Updated {key} = {rendered}");
    println!("  in {}", config_path.display());

    Ok(())
}

/// Show the config file path.
pub fn show_path() -> Result<()> {
    println!("{}", config::config_file_path().display());
    Ok(())
}

/// Show example configuration.
pub fn show_example() -> Result<()> {
    print!("{}", config::example_config());
    Ok(())
}

/// Initialize config file with defaults.
pub fn init_config() -> Result<()> {
    let created = config::ensure_config_file()?;
    let config_path = config::config_file_path();

    if created {
        println!("✓ Created config file: {}", config_path.display());
        println!("\nEdit this file to configure discoteca.");
    } else {
        println!("Config file already exists: {}", config_path.display());
    }

    Ok(())
}

fn check_key(key: &str) -> Result<()> {
    if KEYS.contains(&key) {
        Ok(())
    } else {
        anyhow::bail!("Unknown config key: {key}\n\nValid keys: {}", KEYS.join(", "))
    }
}

fn value_of(config: &Config, key: &str) -> Result<String> {
    let value = serde_json::to_value(config)?;
    Ok(match value.get(key) {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Null) | None => "<not set>".to_string(),
        Some(other) => other.to_string(),
    })
}

/// Replace the active `key = ...` line, or append one.
fn set_line(contents: &str, key: &str, rendered: &str) -> String {
    let mut found = false;
    let mut lines: Vec<String> = contents
        .lines()
        .map(|line| {
            let trimmed = line.trim_start();
            let is_key = trimmed
                .strip_prefix(key)
                .is_some_and(|rest| rest.trim_start().starts_with('='));
            if is_key && !found {
                found = true;
                format!("{key} = {rendered}")
            } else {
                line.to_string()
            }
        })
        .collect();

    if !found {
        lines.push(format!("{key} = {rendered}"));
    }
    let mut out = lines.join("\n");
    out.push('\n');
    out
}
