use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value as JsonValue;
use serde_yaml::Value as YamlValue;

#[derive(Debug, Clone, Deserialize)]
pub struct InstrumentEntry {
	pub code: String,
	pub exchange: String,
	#[serde(default)]
	pub name: Option<String>,
	#[serde(default)]
	pub subscribe: Option<bool>,
}

pub fn load_instrument_codes(
	path: impl AsRef<Path>,
) -> Result<Vec<String>, Box<dyn std::error::Error>> {
	let path = path.as_ref();
	let text = fs::read_to_string(path)?;

	let items: HashMap<String, InstrumentEntry> = match path.extension().and_then(|x| x.to_str()) {
		Some("json") => {
			let value: JsonValue = serde_json::from_str(&text)?;
			serde_json::from_value(value)?
		}
		Some("yaml") | Some("yml") => {
			let value: YamlValue = serde_yaml::from_str(&text)?;
			serde_yaml::from_value(value)?
		}
		_ => return Err("unsupported instrument file format".into()),
	};

	let mut codes = items
		.into_values()
		.filter(|entry| entry.subscribe.unwrap_or(true))
		.map(|entry| entry.code)
		.collect::<Vec<_>>();
	codes.sort();
	codes.dedup();
	Ok(codes)
}
