use crate::error::{Error, Result};
use crate::results::ProjectStats;
use csv::WriterBuilder;
use serde_json::json;

pub struct StatsExporter;

impl StatsExporter {
    /// One row per project; the files cell holds one display path per line.
    pub fn to_csv(stats: &[ProjectStats]) -> Result<String> {
        let mut writer = WriterBuilder::new().has_headers(true).from_writer(Vec::new());
        writer
            .write_record(["index", "project_name", "project_link", "files"])
            .map_err(|e| Error::Other(e.into()))?;

        for row in stats {
            writer
                .write_record([
                    row.index.to_string(),
                    row.project_name.clone(),
                    row.project_link.clone(),
                    row.files.join("\n"),
                ])
                .map_err(|e| Error::Other(e.into()))?;
        }

        let bytes = writer.into_inner().map_err(|e| Error::Io(e.into_error()))?;
        String::from_utf8(bytes).map_err(|e| Error::Other(e.into()))
    }

    /// `{"projects": [...]}` with the same fields as the CSV columns.
    pub fn to_json(stats: &[ProjectStats]) -> Result<String> {
        Ok(serde_json::to_string_pretty(&json!({ "projects": stats }))?)
    }
}
