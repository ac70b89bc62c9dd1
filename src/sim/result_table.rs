use super::VariableNames;
use crate::StrError;
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::fmt::Write as FmtWrite;
use std::fs::{self, File};
use std::io::{BufReader, Write};
use std::path::Path;

/// Receives the committed states of a run
pub trait ResultSink {
    /// Receives the names of the columns before the first record
    fn initialize(&mut self, _names: &VariableNames) -> Result<(), StrError> {
        Ok(())
    }

    /// Records the driving variables, thermodynamic forces and internal variables at time t
    ///
    /// The Lagrange multipliers are not included in `u`.
    fn record(&mut self, t: f64, u: &[f64], s: &[f64], iv: &[f64]) -> Result<(), StrError>;
}

/// Holds the results in memory
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ResultTable {
    /// Names of the columns: t, driving variables, thermodynamic forces, internal variables
    pub header: Vec<String>,

    /// One row per recorded time
    pub rows: Vec<Vec<f64>>,
}

impl ResultTable {
    /// Allocates a new (empty) instance
    pub fn new() -> Self {
        ResultTable {
            header: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Returns the values of a column (None if the column does not exist)
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let index = self.header.iter().position(|h| h == name)?;
        Some(self.rows.iter().map(|row| row[index]).collect())
    }

    /// Returns the last row
    pub fn last(&self) -> Option<&Vec<f64>> {
        self.rows.last()
    }

    /// Reads a JSON file containing the results
    pub fn read_json<P>(full_path: &P) -> Result<Self, StrError>
    where
        P: AsRef<OsStr> + ?Sized,
    {
        let path = Path::new(full_path).to_path_buf();
        let input = File::open(path).map_err(|_| "cannot open file")?;
        let buffered = BufReader::new(input);
        let table = serde_json::from_reader(buffered).map_err(|_| "cannot parse JSON file")?;
        Ok(table)
    }

    /// Writes a JSON file with the results
    pub fn write_json<P>(&self, full_path: &P) -> Result<(), StrError>
    where
        P: AsRef<OsStr> + ?Sized,
    {
        let path = create_parent_dir(full_path)?;
        let mut file = File::create(&path).map_err(|_| "cannot create file")?;
        serde_json::to_writer(&mut file, &self).map_err(|_| "cannot write file")?;
        Ok(())
    }

    /// Writes a whitespace-separated text file with the results
    ///
    /// The first line holds the column names, prefixed by `#`.
    pub fn write_text<P>(&self, full_path: &P) -> Result<(), StrError>
    where
        P: AsRef<OsStr> + ?Sized,
    {
        let mut buffer = String::new();
        write!(&mut buffer, "#").map_err(|_| "cannot format results")?;
        for name in &self.header {
            write!(&mut buffer, " {:>23}", name).map_err(|_| "cannot format results")?;
        }
        writeln!(&mut buffer).map_err(|_| "cannot format results")?;
        for row in &self.rows {
            write!(&mut buffer, " ").map_err(|_| "cannot format results")?;
            for value in row {
                write!(&mut buffer, " {:>23.15e}", value).map_err(|_| "cannot format results")?;
            }
            writeln!(&mut buffer).map_err(|_| "cannot format results")?;
        }
        let path = create_parent_dir(full_path)?;
        let mut file = File::create(&path).map_err(|_| "cannot create file")?;
        file.write_all(buffer.as_bytes()).map_err(|_| "cannot write file")?;
        Ok(())
    }
}

impl ResultSink for ResultTable {
    fn initialize(&mut self, names: &VariableNames) -> Result<(), StrError> {
        self.header = names.header();
        self.rows.clear();
        Ok(())
    }

    fn record(&mut self, t: f64, u: &[f64], s: &[f64], iv: &[f64]) -> Result<(), StrError> {
        let mut row = Vec::with_capacity(1 + u.len() + s.len() + iv.len());
        row.push(t);
        row.extend_from_slice(u);
        row.extend_from_slice(s);
        row.extend_from_slice(iv);
        if !self.header.is_empty() && row.len() != self.header.len() {
            return Err("the number of values does not match the header");
        }
        self.rows.push(row);
        Ok(())
    }
}

/// Creates the parent directory of a file (if needed) and returns the path of the file
fn create_parent_dir<P>(full_path: &P) -> Result<std::path::PathBuf, StrError>
where
    P: AsRef<OsStr> + ?Sized,
{
    let path = Path::new(full_path).to_path_buf();
    if let Some(p) = path.parent() {
        fs::create_dir_all(p).map_err(|_| "cannot create directory")?;
    }
    Ok(path)
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{ResultSink, ResultTable};
    use crate::base::DEFAULT_TEST_DIR;
    use crate::sim::VariableNames;
    use std::fs;

    fn names() -> VariableNames {
        VariableNames {
            driving: vec!["EXX".to_string(), "EYY".to_string()],
            forces: vec!["SXX".to_string(), "SYY".to_string()],
            internal: vec!["p".to_string()],
        }
    }

    #[test]
    fn record_captures_errors() {
        let mut table = ResultTable::new();
        table.initialize(&names()).unwrap();
        assert_eq!(
            table.record(0.0, &[0.0], &[0.0, 0.0], &[0.0]).err(),
            Some("the number of values does not match the header")
        );
    }

    #[test]
    fn record_and_column_work() {
        let mut table = ResultTable::new();
        table.initialize(&names()).unwrap();
        assert_eq!(table.header, &["t", "EXX", "EYY", "SXX", "SYY", "p"]);
        table.record(0.0, &[0.0, 0.0], &[0.0, 0.0], &[0.0]).unwrap();
        table.record(1.0, &[0.1, 0.2], &[10.0, 20.0], &[0.5]).unwrap();
        assert_eq!(table.column("SXX"), Some(vec![0.0, 10.0]));
        assert_eq!(table.column("SZZ"), None);
        assert_eq!(table.last(), Some(&vec![1.0, 0.1, 0.2, 10.0, 20.0, 0.5]));
    }

    #[test]
    fn write_files_work() {
        let mut table = ResultTable::new();
        table.initialize(&names()).unwrap();
        table.record(1.0, &[0.1, 0.2], &[10.0, 20.0], &[0.5]).unwrap();

        let path = format!("{}/result_table.json", DEFAULT_TEST_DIR);
        table.write_json(&path).unwrap();
        let read = ResultTable::read_json(&path).unwrap();
        assert_eq!(read.header, table.header);
        assert_eq!(read.rows, table.rows);

        let path = format!("{}/result_table.txt", DEFAULT_TEST_DIR);
        table.write_text(&path).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("#"));
        assert!(lines[0].contains("SYY"));
        let values: Vec<f64> = lines[1].split_whitespace().map(|v| v.parse().unwrap()).collect();
        assert_eq!(values, &[1.0, 0.1, 0.2, 10.0, 20.0, 0.5]);
    }
}
