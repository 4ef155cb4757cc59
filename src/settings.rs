use anyhow::Result;
use config::{Config, Environment};
use serde::Deserialize;

/// Runtime settings. Every field can be overridden with a `CASENOTES_*` variable,
/// e.g. `CASENOTES_CHUNK_SIZE=50` or `CASENOTES_CASE_FILE_MARKERS="Entry Date,Intake Date"`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Settings {
    /// Appended to the document stem to name its csv report.
    pub extracted_suffix: String,
    /// Text that marks a document as a client case file when filtering archives.
    pub case_file_markers: Vec<String>,
    /// Documents handled per parallel batch.
    pub chunk_size: usize,
    /// Worker threads; rayon's default when unset.
    pub threads: Option<usize>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            extracted_suffix: "_CASENOTES_extracted".to_string(),
            case_file_markers: vec!["Entry Date".to_string(), "Exit Date".to_string()],
            chunk_size: 200,
            threads: None,
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        let defaults = Settings::default();
        let settings = Config::builder()
            .set_default("extracted_suffix", defaults.extracted_suffix)?
            .set_default("case_file_markers", defaults.case_file_markers)?
            .set_default("chunk_size", defaults.chunk_size as i64)?
            .add_source(
                Environment::with_prefix("CASENOTES")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("case_file_markers"),
            )
            .build()?;
        let mut settings: Settings = settings.try_deserialize()?;
        settings.chunk_size = settings.chunk_size.max(1);
        Ok(settings)
    }
}
