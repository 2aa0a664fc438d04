use crate::error::{EtlError, Result};
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use std::path::Path;
use tracing::{info, instrument};

/// Concatenate the rows of the given inputs side by side: output row `i` is
/// the fields of row `i` of every input, in input order. This is a positional
/// merge, not a keyed join; the inputs must describe the same logical rows in
/// the same order. Row counts must be equal across all inputs, and a mismatch
/// is a hard error listing every input's count. Nothing is ever silently
/// truncated.
///
/// Returns the number of data rows written (header excluded).
#[instrument(skip(inputs), fields(output = %output.display()))]
pub fn combine_columns<P: AsRef<Path>>(inputs: &[P], output: &Path) -> Result<usize> {
    let mut tables: Vec<(String, Vec<StringRecord>)> = Vec::with_capacity(inputs.len());
    for input in inputs {
        let input = input.as_ref();
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(input)?;
        let mut rows = Vec::new();
        for record in reader.records() {
            rows.push(record?);
        }
        tables.push((input.display().to_string(), rows));
    }

    let counts: Vec<(String, usize)> = tables
        .iter()
        .map(|(file, rows)| (file.clone(), rows.len()))
        .collect();
    if counts.windows(2).any(|pair| pair[0].1 != pair[1].1) {
        return Err(EtlError::RowCountMismatch { counts });
    }

    let mut writer = WriterBuilder::new().from_path(output)?;
    let records = tables.first().map(|(_, rows)| rows.len()).unwrap_or(0);
    for i in 0..records {
        let mut combined: Vec<&str> = Vec::new();
        for (_, rows) in &tables {
            combined.extend(rows[i].iter());
        }
        writer.write_record(&combined)?;
    }
    writer.flush()?;

    let rows = records.saturating_sub(1);
    info!(rows, inputs = tables.len(), "combined projected files");
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn zips_rows_across_inputs_in_order() {
        let temp = tempdir().unwrap();
        let a = temp.path().join("a.csv");
        let b = temp.path().join("b.csv");
        let c = temp.path().join("c.csv");
        let out = temp.path().join("combined.csv");
        std::fs::write(&a, "h1,h2\n1,2\n3,4\n").unwrap();
        std::fs::write(&b, "h3\nx\ny\n").unwrap();
        std::fs::write(&c, "h4,h5\na,b\nc,d\n").unwrap();

        let rows = combine_columns(&[&a, &b, &c], &out).unwrap();
        assert_eq!(rows, 2);
        assert_eq!(
            std::fs::read_to_string(&out).unwrap(),
            "h1,h2,h3,h4,h5\n1,2,x,a,b\n3,4,y,c,d\n"
        );
    }

    #[test]
    fn row_count_mismatch_is_fatal_and_lists_counts() {
        let temp = tempdir().unwrap();
        let a = temp.path().join("a.csv");
        let b = temp.path().join("b.csv");
        let out = temp.path().join("combined.csv");
        std::fs::write(&a, "h1\n1\n2\n").unwrap();
        std::fs::write(&b, "h2\nx\n").unwrap();

        let err = combine_columns(&[&a, &b], &out).unwrap_err();
        match err {
            EtlError::RowCountMismatch { counts } => {
                assert_eq!(counts.len(), 2);
                assert_eq!(counts[0].1, 3);
                assert_eq!(counts[1].1, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!out.exists());
    }
}
