//! CSV export of batch results.
//!
//! One row per analysed position:
//! session_id,index,position,best_move,quality_tier,quality_score,risk_level,
//! confidence,primary_reason,legal_moves_analyzed,analysis_time_ms,error,finished_at

use crate::services::batch::PositionResult;
use crate::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResultRow {
    pub session_id: String,
    pub index: usize,
    pub position: String,
    pub best_move: Option<String>,
    pub quality_tier: Option<String>,
    pub quality_score: Option<f64>,
    pub risk_level: Option<String>,
    pub confidence: Option<f64>,
    pub primary_reason: Option<String>,
    pub legal_moves_analyzed: Option<usize>,
    pub analysis_time_ms: Option<u64>,
    pub error: Option<String>,
    pub finished_at: String,
}

impl ResultRow {
    pub fn from_result(session_id: Uuid, result: &PositionResult) -> Self {
        let best = result.response.as_ref().map(|r| &r.best);
        Self {
            session_id: session_id.to_string(),
            index: result.index,
            position: result.position_key.clone(),
            best_move: best.map(|b| b.mv.to_string()),
            quality_tier: best.map(|b| b.quality_tier.to_string()),
            quality_score: best.map(|b| (b.quality_score * 100.0).round() / 100.0),
            risk_level: best.map(|b| format!("{:?}", b.risk_level)),
            confidence: best.map(|b| (b.confidence * 1000.0).round() / 1000.0),
            primary_reason: best.map(|b| b.primary_reason.clone()),
            legal_moves_analyzed: result.response.as_ref().map(|r| r.legal_moves_analyzed),
            analysis_time_ms: result.response.as_ref().map(|r| r.analysis_time_ms),
            error: result.error.clone(),
            finished_at: result.finished_at.to_rfc3339(),
        }
    }
}

/// Writes batch results under a base directory, one file per session.
pub struct CsvWriter {
    base_dir: PathBuf,
}

impl CsvWriter {
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    /// `batch_<date>_<session>.csv`
    pub fn file_path(&self, session_id: Uuid) -> PathBuf {
        let date = Utc::now().format("%Y%m%d");
        self.base_dir.join(format!("batch_{}_{}.csv", date, session_id.simple()))
    }

    /// Exports `results` sorted by position index and returns the file path.
    pub fn write_session(&self, session_id: Uuid, results: &[PositionResult]) -> Result<PathBuf> {
        let path = self.file_path(session_id);
        let mut rows: Vec<ResultRow> = results
            .iter()
            .map(|r| ResultRow::from_result(session_id, r))
            .collect();
        rows.sort_by_key(|r| r.index);
        write_rows(&path, &rows)?;
        log::info!("💾 Exported {} results to {}", rows.len(), path.display());
        Ok(path)
    }
}

pub fn write_rows<P: AsRef<Path>>(path: P, rows: &[ResultRow]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn read_rows<P: AsRef<Path>>(path: P) -> Result<Vec<ResultRow>> {
    let mut rdr = csv::Reader::from_path(path)?;
    let mut rows = Vec::new();
    for row in rdr.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn failed_result(index: usize) -> PositionResult {
        PositionResult {
            index,
            position_key: format!("key-{}", index),
            response: None,
            error: Some("worker failed".to_string()),
            finished_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_export_sorts_by_index() {
        let dir = TempDir::new().unwrap();
        let writer = CsvWriter::new(dir.path()).unwrap();
        let session = Uuid::new_v4();
        let results = vec![failed_result(2), failed_result(0), failed_result(1)];

        let path = writer.write_session(session, &results).unwrap();
        let rows = read_rows(&path).unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows.iter().map(|r| r.index).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(rows[0].session_id, session.to_string());
        assert_eq!(rows[0].best_move, None);
        assert_eq!(rows[0].error.as_deref(), Some("worker failed"));
    }
}
