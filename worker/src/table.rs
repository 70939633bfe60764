use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use log::debug;
use machine_learning::{metrics::Score, readout::TaskRow};

use crate::{Result, WorkerErr};

/// A row of the result table: one sweep value, optionally one module.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub alpha: f64,
    pub module: Option<String>,
    pub n_nodes: usize,
    /// One score per metric column, in column order.
    pub scores: Vec<Score>,
}

/// The scores of a whole sweep, in sweep order.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultTable {
    metrics: Vec<String>,
    rows: Vec<TableRow>,
}

impl ResultTable {
    /// Creates an empty table with a column per metric.
    pub fn new(metrics: Vec<String>) -> Self {
        Self {
            metrics,
            rows: Vec::new(),
        }
    }

    pub fn metrics(&self) -> &[String] {
        &self.metrics
    }

    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The sweep value of every row, in row order.
    pub fn alphas(&self) -> impl Iterator<Item = f64> + '_ {
        self.rows.iter().map(|row| row.alpha)
    }

    /// Appends the readout rows of a sweep value, projecting their scores onto the metric columns.
    ///
    /// # Arguments
    /// * `alpha` - The sweep value the rows were produced with.
    /// * `rows` - The readout rows.
    ///
    /// # Returns
    /// An error if a row lacks a metric column.
    pub fn extend(&mut self, alpha: f64, rows: Vec<TaskRow>) -> Result<()> {
        for row in rows {
            let scores = self
                .metrics
                .iter()
                .map(|metric| {
                    row.scores.get(metric).cloned().ok_or_else(|| {
                        WorkerErr::InvalidJob(format!("the readout produced no '{metric}' score"))
                    })
                })
                .collect::<Result<_>>()?;

            self.rows.push(TableRow {
                alpha,
                module: row.module,
                n_nodes: row.n_nodes,
                scores,
            });
        }

        Ok(())
    }

    /// Writes the table as csv, with the columns `alpha,module,n_nodes,<metrics...>`.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut w = csv::Writer::from_writer(writer);

        let header = ["alpha", "module", "n_nodes"]
            .into_iter()
            .chain(self.metrics.iter().map(String::as_str));
        w.write_record(header)?;

        for row in &self.rows {
            let mut record = vec![
                row.alpha.to_string(),
                row.module.clone().unwrap_or_default(),
                row.n_nodes.to_string(),
            ];
            record.extend(row.scores.iter().map(Score::to_string));
            w.write_record(&record)?;
        }

        w.flush()?;
        Ok(())
    }

    /// Writes the table to `{dir}/{output_id}_scores.csv`.
    ///
    /// The table is written to a hidden temporary file first and then renamed, so the final path
    /// either holds a whole table or doesn't exist.
    ///
    /// # Arguments
    /// * `dir` - The output directory, created if missing.
    /// * `output_id` - The job's output identifier.
    ///
    /// # Returns
    /// The path of the persisted table.
    pub fn persist(&self, dir: &Path, output_id: &str) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;

        let path = scores_path(dir, output_id);
        let tmp = dir.join(format!(".{output_id}_scores.csv.tmp"));

        let write = || -> Result<()> {
            let file = fs::File::create(&tmp)?;
            self.write_csv(&file)?;
            file.sync_all()?;
            fs::rename(&tmp, &path)?;
            Ok(())
        };

        if let Err(e) = write() {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }

        debug!(rows = self.len(); "persisted result table to {}", path.display());
        Ok(path)
    }
}

/// Where the table of `output_id` is persisted inside `dir`.
pub fn scores_path(dir: &Path, output_id: &str) -> PathBuf {
    dir.join(format!("{output_id}_scores.csv"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> ResultTable {
        let mut table = ResultTable::new(vec!["score".into(), "corrcoef".into()]);
        table.rows = vec![
            TableRow {
                alpha: 0.5,
                module: None,
                n_nodes: 3,
                scores: vec![Score::Scalar(0.25), Score::Vector(vec![1.0, 2.0])],
            },
            TableRow {
                alpha: 1.0,
                module: Some("vis".into()),
                n_nodes: 2,
                scores: vec![Score::Scalar(0.75), Score::Scalar(3.0)],
            },
        ];
        table
    }

    #[test]
    fn csv_columns_follow_the_schema() {
        let mut buf = Vec::new();
        table().write_csv(&mut buf).unwrap();

        let csv = String::from_utf8(buf).unwrap();
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(
            lines,
            [
                "alpha,module,n_nodes,score,corrcoef",
                "0.5,,3,0.25,[1 2]",
                "1,vis,2,0.75,3",
            ]
        );
    }

    #[test]
    fn persisting_leaves_no_temporary_file() {
        let dir = std::env::temp_dir().join(format!("table-persist-{}", std::process::id()));
        let path = table().persist(&dir, "net_null_3").unwrap();

        assert_eq!(path, dir.join("net_null_3_scores.csv"));
        assert!(path.exists());
        assert!(!dir.join(".net_null_3_scores.csv.tmp").exists());

        fs::remove_dir_all(&dir).unwrap();
    }
}
