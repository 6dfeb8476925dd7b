use std::path::Path;

use anyhow::Context;
use itemflow::NewItem;
use serde::Deserialize;

/// Items loaded into the store at startup.
#[derive(Debug, Default, Deserialize)]
pub struct SeedConfig {
	#[serde(default)]
	pub items: Vec<NewItem>,
}

impl SeedConfig {
	pub fn from_path(path: &Path) -> anyhow::Result<Self> {
		let raw = std::fs::read_to_string(path)
			.with_context(|| format!("Failed to read seed file {}", path.display()))?;
		Self::from_json(&raw).with_context(|| format!("Invalid seed file {}", path.display()))
	}

	/// Parse and validate every seeded item.
	pub fn from_json(raw: &str) -> anyhow::Result<Self> {
		let config: SeedConfig = serde_json::from_str(raw)?;

		for (index, item) in config.items.iter().enumerate() {
			if let Err(errors) = item.validate() {
				let errors = errors.iter().map(ToString::to_string).collect::<Vec<_>>();
				anyhow::bail!("Seed item {index} is invalid: {}", errors.join(", "));
			}
		}

		Ok(config)
	}
}
