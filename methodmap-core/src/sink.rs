// Result sinks: where a finished result log goes

use methodmap_scanner::{RequestOutcome, Result, ScanError};
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Csv,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "csv" => Some(OutputFormat::Csv),
            _ => None,
        }
    }

    pub fn sink(self, path: impl Into<PathBuf>) -> Box<dyn ResultSink> {
        match self {
            OutputFormat::Json => Box::new(JsonFileSink::new(path)),
            OutputFormat::Csv => Box::new(CsvFileSink::new(path)),
        }
    }
}

pub trait ResultSink {
    fn write(&self, outcomes: &[RequestOutcome]) -> Result<()>;
}

/// Writes the result log as a JSON array indented by four spaces.
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_json(&self, outcomes: &[RequestOutcome]) -> Result<()> {
        let mut writer = BufWriter::new(File::create(&self.path)?);
        let mut serializer =
            Serializer::with_formatter(&mut writer, PrettyFormatter::with_indent(b"    "));
        outcomes.serialize(&mut serializer)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}

impl ResultSink for JsonFileSink {
    fn write(&self, outcomes: &[RequestOutcome]) -> Result<()> {
        match self.write_json(outcomes) {
            Ok(()) => {
                info!("Results saved to {}", self.path.display());
                Ok(())
            }
            Err(e) => {
                error!("Error saving results: {}", e);
                Err(e)
            }
        }
    }
}

/// One row per outcome: `url,method,status,depth,headers,error`.
///
/// Headers are flattened to `name: value; name: value`.
pub struct CsvFileSink {
    path: PathBuf,
}

impl CsvFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ResultSink for CsvFileSink {
    fn write(&self, outcomes: &[RequestOutcome]) -> Result<()> {
        let written = File::create(&self.path)
            .map_err(ScanError::from)
            .and_then(|file| write_csv(BufWriter::new(file), outcomes));

        match written {
            Ok(()) => {
                info!("Results saved to {}", self.path.display());
                Ok(())
            }
            Err(e) => {
                error!("Error saving results: {}", e);
                Err(e)
            }
        }
    }
}

/// Render the CSV result log in memory.
pub fn render_csv(outcomes: &[RequestOutcome]) -> Result<String> {
    let mut buffer = Vec::new();
    write_csv(&mut buffer, outcomes)?;
    String::from_utf8(buffer).map_err(|e| ScanError::Other(e.to_string()))
}

fn write_csv<W: Write>(output: W, outcomes: &[RequestOutcome]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(output);
    writer
        .write_record(["url", "method", "status", "depth", "headers", "error"])
        .map_err(csv_error)?;

    for outcome in outcomes {
        let status = outcome.status.map(|s| s.to_string()).unwrap_or_default();
        let depth = outcome.depth.to_string();
        let headers = outcome
            .headers
            .as_ref()
            .map(flatten_headers)
            .unwrap_or_default();
        writer
            .write_record([
                outcome.url.as_str(),
                outcome.method.as_str(),
                status.as_str(),
                depth.as_str(),
                headers.as_str(),
                outcome.error.as_deref().unwrap_or(""),
            ])
            .map_err(csv_error)?;
    }

    writer.flush()?;
    Ok(())
}

fn flatten_headers(headers: &BTreeMap<String, String>) -> String {
    headers
        .iter()
        .map(|(name, value)| format!("{}: {}", name, value))
        .collect::<Vec<_>>()
        .join("; ")
}

fn csv_error(e: csv::Error) -> ScanError {
    ScanError::Other(format!("CSV error: {}", e))
}
