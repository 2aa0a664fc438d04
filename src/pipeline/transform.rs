use crate::error::{EtlError, Result};
use csv::{ReaderBuilder, WriterBuilder};
use std::path::Path;
use tracing::{info, instrument};

/// Rewrite the combined file with the value of `column` upper-cased on every
/// data row. The header row and all other columns pass through untouched.
/// A data row without the designated column index fails the whole run; there
/// is no partial output.
///
/// Returns the number of data rows written (header excluded).
#[instrument(fields(input = %input.display()))]
pub fn uppercase_column(input: &Path, output: &Path, column: usize) -> Result<usize> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(input)?;
    let mut writer = WriterBuilder::new().from_path(output)?;

    let mut rows: usize = 0;
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        if row == 0 {
            writer.write_record(&record)?;
            continue;
        }
        if column >= record.len() {
            return Err(EtlError::MissingColumn {
                file: input.display().to_string(),
                row,
                column,
                found: record.len(),
            });
        }
        let rewritten: Vec<String> = record
            .iter()
            .enumerate()
            .map(|(i, field)| {
                if i == column {
                    field.to_uppercase()
                } else {
                    field.to_string()
                }
            })
            .collect();
        writer.write_record(&rewritten)?;
        rows += 1;
    }
    writer.flush()?;

    info!(rows, column, "transformed combined file");
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn uppercases_only_the_designated_column() {
        let temp = tempdir().unwrap();
        let input = temp.path().join("combined.csv");
        let output = temp.path().join("transformed.csv");
        std::fs::write(
            &input,
            "id,name,kind,note\n1,car,small sedan,keep-me\n2,truck,6-axle rig,as is\n",
        )
        .unwrap();

        let rows = uppercase_column(&input, &output, 2).unwrap();
        assert_eq!(rows, 2);
        assert_eq!(
            std::fs::read_to_string(&output).unwrap(),
            "id,name,kind,note\n1,car,SMALL SEDAN,keep-me\n2,truck,6-AXLE RIG,as is\n"
        );
    }

    #[test]
    fn header_row_is_never_touched() {
        let temp = tempdir().unwrap();
        let input = temp.path().join("combined.csv");
        let output = temp.path().join("transformed.csv");
        std::fs::write(&input, "alpha,beta\nx,y\n").unwrap();

        uppercase_column(&input, &output, 0).unwrap();
        assert_eq!(
            std::fs::read_to_string(&output).unwrap(),
            "alpha,beta\nX,y\n"
        );
    }

    #[test]
    fn short_data_row_is_fatal() {
        let temp = tempdir().unwrap();
        let input = temp.path().join("combined.csv");
        let output = temp.path().join("transformed.csv");
        std::fs::write(&input, "a,b,c,d\n1,2,3,4\n5,6\n").unwrap();

        let err = uppercase_column(&input, &output, 3).unwrap_err();
        match err {
            EtlError::MissingColumn { row, column, found, .. } => {
                assert_eq!(row, 2);
                assert_eq!(column, 3);
                assert_eq!(found, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
