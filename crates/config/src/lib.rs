#![forbid(unsafe_code)]

mod cache;
mod error;
mod prediction;
mod scheduler;

pub use cache::Cache;
pub use error::Error;
pub use prediction::Prediction;
pub use scheduler::Scheduler;

use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub cache: Cache,
    pub prediction: Prediction,
    pub scheduler: Scheduler,
}

impl Config {
    /// Load configuration from a TOML file. Missing fields are filled with defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path)?;
        let mut config: Config = toml_edit::de::from_str(&text)?;
        config.apply_defaults();
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        let toml = toml_edit::ser::to_string_pretty(self)?;
        std::fs::write(path, toml)?;
        Ok(())
    }

    /// Load configuration from multiple TOML files. Later files override earlier ones.
    pub fn load_multiple<T, U>(paths: U) -> Result<Self, Error>
    where
        T: AsRef<Path>,
        U: IntoIterator<Item = T>,
    {
        let mut merged = toml_edit::DocumentMut::new();
        for path in paths {
            let path = path.as_ref();
            if !path.exists() {
                continue;
            }
            let text = std::fs::read_to_string(path)?;
            let doc: toml_edit::DocumentMut = text.parse()?;
            merge_document(&mut merged, doc);
        }
        let mut config: Config = toml_edit::de::from_str(&merged.to_string())?;
        config.apply_defaults();
        Ok(config)
    }

    fn apply_defaults(&mut self) {
        // Duplicate route entries make the warm-up phases re-issue preloads;
        // cheap to normalize once at load time.
        self.scheduler.critical.dedup();
        self.scheduler.high_priority.dedup();
        self.prediction.probability_ceiling = self.prediction.probability_ceiling.clamp(0.0, 1.0);
        self.prediction.min_probability = self.prediction.min_probability.clamp(0.0, 1.0);
        if self.prediction.saturation_count == 0 {
            self.prediction.saturation_count = 1;
        }
    }
}

fn merge_document(target: &mut toml_edit::DocumentMut, source: toml_edit::DocumentMut) {
    for (key, item) in source.iter() {
        merge_item(
            target.entry(key).or_insert(toml_edit::Item::None),
            item.clone(),
        );
    }
}

fn merge_item(target: &mut toml_edit::Item, source: toml_edit::Item) {
    use toml_edit::Item;
    match (target, source) {
        (Item::Table(target_table), Item::Table(source_table)) => {
            for (key, item) in source_table.iter() {
                merge_item(target_table.entry(key).or_insert(Item::None), item.clone());
            }
        }
        (Item::ArrayOfTables(target_array), Item::ArrayOfTables(source_array)) => {
            for table in source_array.iter() {
                target_array.push(table.clone());
            }
        }
        (target_item, source_item) => {
            *target_item = source_item;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::tempdir;

    #[test]
    fn roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.apply_defaults();
        config.save(&path).unwrap();
        let loaded = Config::load(&path).unwrap();

        assert_eq!(config, loaded);
    }

    #[test]
    fn load_multiple_merges() {
        let dir = tempdir().unwrap();
        let path1 = dir.path().join("a.toml");
        let path2 = dir.path().join("b.toml");

        std::fs::write(&path1, "[cache]\ncapacity = 4\nttl = 60\n").unwrap();
        std::fs::write(&path2, "[scheduler]\nbatch_size = 5\n[cache]\nttl = 120\n").unwrap();

        let cfg = Config::load_multiple([path1, path2]).unwrap();
        assert_eq!(cfg.cache.capacity, 4);
        assert_eq!(cfg.cache.ttl, Duration::from_secs(120));
        assert_eq!(cfg.scheduler.batch_size, 5);
    }

    #[test]
    fn defaults_carry_documented_tuning() {
        let config = Config::default();
        assert_eq!(config.prediction.saturation_count, 10);
        assert_eq!(config.prediction.probability_ceiling, 0.95);
        assert_eq!(config.prediction.top_n, 3);
        assert_eq!(config.prediction.min_probability, 0.3);
        assert_eq!(config.scheduler.batch_size, 3);
        assert_eq!(config.cache.decay_reference, Duration::from_secs(3600));
    }

    #[test]
    fn degenerate_values_are_clamped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[prediction]\nsaturation_count = 0\nprobability_ceiling = 1.5\n",
        )
        .unwrap();

        let cfg = Config::load(&path).unwrap();
        assert_eq!(cfg.prediction.saturation_count, 1);
        assert_eq!(cfg.prediction.probability_ceiling, 1.0);
    }
}
