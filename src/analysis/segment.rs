use crate::analysis::table::MeasurementTable;
use std::ops::Range;

/// Splits a table into runs.
///
/// A run starts at every row whose position is exactly zero and extends up
/// to the next such row or the end of the table. Rows before the first zero
/// position belong to no run; a table without any zero position has no runs.
pub fn segment_runs(table: &MeasurementTable) -> Vec<Range<usize>> {
    let mut boundaries: Vec<usize> = table
        .records
        .iter()
        .enumerate()
        .filter(|(_, record)| record.position_mm == 0.0)
        .map(|(index, _)| index)
        .collect();
    if boundaries.is_empty() {
        return Vec::new();
    }
    boundaries.push(table.len());
    boundaries.windows(2).map(|pair| pair[0]..pair[1]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::table::Record;

    fn table(positions: &[f64]) -> MeasurementTable {
        MeasurementTable {
            file_name: "pad.xlsx".to_owned(),
            sheet_name: "Raw Data".to_owned(),
            header_row: 0,
            labels: vec!["Position mm".to_owned(), "Pull Force g".to_owned()],
            records: positions
                .iter()
                .map(|position| Record { position_mm: *position, pull_force_g: Some(1.0), clamp_force_g: None })
                .collect(),
        }
    }

    #[test]
    fn runs_start_at_zero_positions() {
        let runs = segment_runs(&table(&[0.0, 5.0, 10.0, 0.0, 3.0, 8.0]));
        assert_eq!(runs, vec![0..3, 3..6]);
    }

    #[test]
    fn leading_rows_belong_to_no_run() {
        let runs = segment_runs(&table(&[4.0, 2.0, 0.0, 1.0]));
        assert_eq!(runs, vec![2..4]);
    }

    #[test]
    fn single_zero_runs_to_the_end() {
        assert_eq!(segment_runs(&table(&[0.0, 1.0, 2.0, 3.0])), vec![0..4]);
        assert_eq!(segment_runs(&table(&[1.0, 2.0, 0.0])), vec![2..3]);
    }

    #[test]
    fn no_zero_means_no_runs() {
        assert!(segment_runs(&table(&[0.5, 1.0, 2.0])).is_empty());
        assert!(segment_runs(&table(&[])).is_empty());
    }

    #[test]
    fn only_exact_zero_is_a_boundary() {
        let runs = segment_runs(&table(&[0.0, 1e-9, -0.0, 0.1]));
        // -0.0 compares equal to 0.0
        assert_eq!(runs, vec![0..2, 2..4]);
    }

    #[test]
    fn runs_are_contiguous_and_cover_the_tail() {
        let positions = [3.0, 0.0, 0.0, 2.0, 0.0, 9.0, 9.0, 0.0];
        let runs = segment_runs(&table(&positions));

        assert_eq!(runs.first().map(|run| run.start), Some(1));
        assert_eq!(runs.last().map(|run| run.end), Some(positions.len()));
        for pair in runs.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
        assert!(runs.iter().all(|run| !run.is_empty()));
        assert_eq!(runs, vec![1..2, 2..4, 4..7, 7..8]);
    }
}
