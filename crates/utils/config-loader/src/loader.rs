use config::{
    Config, ConfigError, File, FileFormat, FileStoredFormat, Format, Map, Value, ValueKind,
};
use serde::de::DeserializeOwned;
use std::{
    io::{Error, ErrorKind},
    path::PathBuf,
};

/// Load configuration from a file on disk.
pub fn load_config<T>(path: &str) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    let mut config_path = PathBuf::from(path);

    config_path =
        std::fs::canonicalize(&config_path).map_err(|e| ConfigError::Foreign(Box::new(e)))?;

    let settings = Config::builder()
        .add_source(File::from(config_path))
        .build()?;

    settings
        .try_deserialize::<T>()
        .map_err(|e| ConfigError::Foreign(Box::new(e)))
}

/// Load configuration from an in-memory string, so scenario tables can live
/// next to the code that consumes them.
pub fn load_config_from_str<T>(content: &str, format: FileFormat) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    let settings = Config::builder()
        .add_source(File::from_str(content, format))
        .build()?;

    settings.try_deserialize::<T>()
}

#[derive(Debug, Clone)]
pub struct PropertiesFile;

impl Format for PropertiesFile {
    fn parse(
        &self,
        uri: Option<&String>,
        text: &str,
    ) -> Result<Map<String, Value>, Box<dyn std::error::Error + Send + Sync>> {
        let mut result = Map::new();

        for (lineno, line) in text.lines().enumerate() {
            let line = line.trim();

            // Skip empty lines and comments (# or !)
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }

            // Split key=value
            let (key, value) = match line.split_once('=') {
                Some((k, v)) => (k.trim(), v.trim()),
                None => {
                    return Err(Box::new(Error::new(
                        ErrorKind::InvalidData,
                        format!("Invalid line {}: '{}'", lineno + 1, line),
                    )));
                }
            };

            result.insert(
                key.to_string(),
                Value::new(uri, ValueKind::String(value.to_string())),
            );
        }

        Ok(result)
    }
}

impl FileStoredFormat for PropertiesFile {
    fn file_extensions(&self) -> &'static [&'static str] {
        &["properties"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_properties_format_parses_pairs() {
        let text = "# comment\nname = stress\nscopes=100\n";
        let parsed = PropertiesFile.parse(None, text).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed["name"].clone().into_string().unwrap(), "stress");
    }

    #[test]
    fn test_properties_format_rejects_bare_lines() {
        let err = PropertiesFile.parse(None, "not-a-pair").unwrap_err();
        assert!(err.to_string().contains("Invalid line 1"));
    }

    #[test]
    fn test_load_config_from_str_json() {
        #[derive(serde::Deserialize)]
        struct Probe {
            name: String,
        }

        let probe: Probe =
            load_config_from_str(r#"{ "name": "scenario" }"#, FileFormat::Json).unwrap();
        assert_eq!(probe.name, "scenario");
    }
}
