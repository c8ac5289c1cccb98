//! CSV Data Loader Module
//! Handles loading and cleaning of policy-level insurance data using Polars.

use polars::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::is_numeric_dtype;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("No data loaded")]
    NoData,
}

/// Handles CSV file loading and preprocessing with Polars.
pub struct DataLoader {
    df: Option<DataFrame>,
    file_path: PathBuf,
}

impl DataLoader {
    pub fn new(file_path: impl AsRef<Path>) -> Self {
        Self {
            df: None,
            file_path: file_path.as_ref().to_path_buf(),
        }
    }

    /// Load the CSV file using Polars.
    pub fn load(&mut self) -> Result<&DataFrame, LoaderError> {
        // Use lazy evaluation for memory efficiency, then collect
        let df = LazyCsvReader::new(&self.file_path)
            .with_infer_schema_length(Some(10000))
            .with_ignore_errors(true)
            .with_try_parse_dates(true)
            .finish()?
            .collect()?;

        if df.height() == 0 {
            return Err(LoaderError::NoData);
        }

        self.df = Some(df);
        self.df.as_ref().ok_or(LoaderError::NoData)
    }

    /// Clean the loaded data: coerce the date column and fill missing
    /// numeric values with the column mean.
    ///
    /// A string-typed date column is parsed leniently (cells that do not
    /// parse become null). Running this twice is a no-op.
    pub fn preprocess(&mut self, date_col: &str) -> Result<&DataFrame, LoaderError> {
        let df = self.df.take().ok_or(LoaderError::NoData)?;

        let date_is_string = df
            .column(date_col)
            .map(|c| matches!(c.dtype(), DataType::String))
            .unwrap_or(false);

        let numeric_cols: Vec<String> = df
            .get_columns()
            .iter()
            .filter(|c| is_numeric_dtype(c.dtype()))
            .map(|c| c.name().to_string())
            .collect();

        let mut lf = df.lazy();

        if date_is_string {
            let options = StrptimeOptions {
                strict: false,
                ..Default::default()
            };
            lf = lf.with_column(col(date_col).str().to_date(options));
        }

        let fill_exprs: Vec<Expr> = numeric_cols
            .iter()
            .map(|name| col(name.as_str()).fill_null(col(name.as_str()).mean()))
            .collect();
        if !fill_exprs.is_empty() {
            lf = lf.with_columns(fill_exprs);
        }

        self.df = Some(lf.collect()?);
        self.df.as_ref().ok_or(LoaderError::NoData)
    }

    /// Get a reference to the loaded DataFrame.
    pub fn dataframe(&self) -> Result<&DataFrame, LoaderError> {
        self.df.as_ref().ok_or(LoaderError::NoData)
    }

    /// Get list of column names from the loaded DataFrame.
    pub fn columns(&self) -> Vec<String> {
        self.df
            .as_ref()
            .map(|df| {
                df.get_column_names()
                    .iter()
                    .map(|s| s.to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Get list of numeric column names.
    pub fn numeric_columns(&self) -> Vec<String> {
        let Some(df) = &self.df else {
            return Vec::new();
        };

        df.get_columns()
            .iter()
            .filter(|c| is_numeric_dtype(c.dtype()))
            .map(|c| c.name().to_string())
            .collect()
    }

    /// Get the number of rows in the DataFrame.
    pub fn row_count(&self) -> usize {
        self.df.as_ref().map(|df| df.height()).unwrap_or(0)
    }

    /// Get the source file path.
    pub fn file_path(&self) -> &PathBuf {
        &self.file_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::io::Write;

    fn write_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".csv")
            .tempfile()
            .expect("temp file");
        file.write_all(contents.as_bytes()).expect("write csv");
        file
    }

    #[test]
    fn load_reads_rows_and_columns() {
        let file = write_csv(
            "Province,TotalPremium,TotalClaims\n\
             Gauteng,100.0,20.0\n\
             Limpopo,50.0,0.0\n",
        );

        let mut loader = DataLoader::new(file.path());
        loader.load().expect("load");

        assert_eq!(loader.row_count(), 2);
        assert_eq!(
            loader.columns(),
            vec!["Province", "TotalPremium", "TotalClaims"]
        );
        assert_eq!(
            loader.numeric_columns(),
            vec!["TotalPremium", "TotalClaims"]
        );
    }

    #[test]
    fn load_empty_file_is_an_error() {
        let file = write_csv("Province,TotalPremium\n");
        let mut loader = DataLoader::new(file.path());
        assert!(matches!(loader.load(), Err(LoaderError::NoData)));
    }

    #[test]
    fn preprocess_fills_missing_numerics_with_mean() {
        let file = write_csv(
            "Province,TotalPremium\n\
             A,10.0\n\
             B,\n\
             C,30.0\n",
        );

        let mut loader = DataLoader::new(file.path());
        loader.load().expect("load");
        let df = loader.preprocess("Date").expect("preprocess");

        let premiums: Vec<f64> = df
            .column("TotalPremium")
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .flatten()
            .collect();
        assert_eq!(premiums.len(), 3);
        assert_relative_eq!(premiums[1], 20.0);
    }

    #[test]
    fn preprocess_parses_string_dates() {
        let file = write_csv(
            "Date,TotalClaims\n\
             \"2015-01-14\",5.0\n\
             \"not a date\",6.0\n",
        );

        let mut loader = DataLoader::new(file.path());
        loader.load().expect("load");

        // The unparseable cell defeats the CSV reader's own date inference,
        // so the column arrives as strings and preprocess has to coerce it.
        let df = loader.preprocess("Date").expect("preprocess");
        let date = df.column("Date").unwrap();
        assert_eq!(date.dtype(), &DataType::Date);
        assert_eq!(date.null_count(), 1);
    }
}
