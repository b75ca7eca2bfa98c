use std::path::Path;

use crate::cli::ConfigCmd;
use anyhow::Result;
use colored::Colorize;
use spotter::types::{ALLOWED_CONFIG_KEYS, Config, best_key_suggestion};

pub async fn handle(cmd: ConfigCmd, config_path: &Path) -> Result<()> {
    let mut cfg = Config::load(config_path)?;

    match cmd {
        ConfigCmd::List => {
            if cfg.map.is_empty() {
                println!(
                    "{} using defaults ({})",
                    "note:".dimmed(),
                    config_path.display()
                );
            } else {
                println!("{}", config_path.display().to_string().dimmed());
                let width = cfg.map.keys().map(String::len).max().unwrap_or(0);
                for (k, v) in &cfg.map {
                    println!("  {}  {}", format!("{k:<width$}").green(), v);
                }
            }
        }

        ConfigCmd::Get { key } => match cfg.map.get(&key) {
            Some(val) => println!("{}", val),
            None => println!("{} `{}` is not set", "warning:".yellow().bold(), key),
        },

        ConfigCmd::Set { key, val } => {
            if !ALLOWED_CONFIG_KEYS.contains(key.as_str()) {
                print!("{} `{}` is not a spotter setting", "error:".red().bold(), key);
                match best_key_suggestion(&key) {
                    Some(s) => println!("; closest is `{}`", s.green()),
                    None => println!(" (see `spotter config list`)"),
                }
                return Ok(());
            }

            cfg.map.insert(key.clone(), val.clone());
            cfg.save(config_path)?;
            println!("{} {} → {}", "ok:".green().bold(), key, val.bold());
        }

        ConfigCmd::Unset { key } => {
            if cfg.map.remove(&key).is_some() {
                cfg.save(config_path)?;
                println!("{} {} reset to default", "ok:".green().bold(), key);
            } else {
                println!("{} `{}` is not set", "warning:".yellow().bold(), key);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_keys_are_not_saved() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.toml");

        let set = |key: &str| ConfigCmd::Set {
            key: key.into(),
            val: "10".into(),
        };
        handle(set("dispatch.timeout"), &path).await?;
        assert!(Config::load(&path)?.map.is_empty());

        handle(set("dispatch.timeout_secs"), &path).await?;
        handle(ConfigCmd::Unset { key: "trainer.id".into() }, &path).await?;
        let cfg = Config::load(&path)?;
        assert_eq!(cfg.dispatch_timeout_secs()?, 10);
        assert_eq!(cfg.map.len(), 1);

        Ok(())
    }
}
