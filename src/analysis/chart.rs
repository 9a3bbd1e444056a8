use crate::analysis::window::RunResult;

/// Head room added above the highest force on a chart, in grams
pub const DEFAULT_BUFFER_G: f64 = 5.0;

/// Upper y-axis limit for a force chart: the highest available average or
/// peak plus `buffer_g`. `None` when no result is available.
pub fn y_axis_ceiling<'a>(results: impl IntoIterator<Item = &'a RunResult>, buffer_g: f64) -> Option<f64> {
    results
        .into_iter()
        .filter_map(|result| match result {
            RunResult::Measured { average, peak } => Some(average.max(*peak)),
            RunResult::NotAvailable => None,
        })
        .reduce(f64::max)
        .map(|max| max + buffer_g)
}

/// Combines the results of several files run by run.
///
/// Entry `i` averages the available averages and the available peaks of run
/// `i + 1` over all files; it is not available when no file has a measured
/// run at that index.
pub fn combine_runs(per_file: &[Vec<RunResult>]) -> Vec<RunResult> {
    let runs = per_file.iter().map(Vec::len).max().unwrap_or(0);
    (0..runs)
        .map(|run| {
            let measured: Vec<(f64, f64)> = per_file
                .iter()
                .filter_map(|results| match results.get(run) {
                    Some(RunResult::Measured { average, peak }) => Some((*average, *peak)),
                    _ => None,
                })
                .collect();
            if measured.is_empty() {
                return RunResult::NotAvailable;
            }
            let count = measured.len() as f64;
            RunResult::Measured {
                average: measured.iter().map(|(average, _)| average).sum::<f64>() / count,
                peak: measured.iter().map(|(_, peak)| peak).sum::<f64>() / count,
            }
        })
        .collect()
}

/// Number of files with a measured result for each run index.
pub fn run_coverage(per_file: &[Vec<RunResult>]) -> Vec<usize> {
    let runs = per_file.iter().map(Vec::len).max().unwrap_or(0);
    (0..runs)
        .map(|run| {
            per_file
                .iter()
                .filter(|results| results.get(run).map(RunResult::is_available).unwrap_or(false))
                .count()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const NA: RunResult = RunResult::NotAvailable;

    fn measured(average: f64, peak: f64) -> RunResult {
        RunResult::Measured { average, peak }
    }

    #[test]
    fn ceiling_skips_unavailable_runs() {
        let results = [measured(2.0, 3.0), NA, measured(5.0, 6.0)];
        assert_eq!(y_axis_ceiling(&results, DEFAULT_BUFFER_G), Some(11.0));
        assert_eq!(y_axis_ceiling(&[NA, NA], DEFAULT_BUFFER_G), None);
        assert_eq!(y_axis_ceiling(&Vec::<RunResult>::new(), 1.0), None);
    }

    #[test]
    fn ceiling_spans_several_files() {
        let first = vec![measured(-4.0, -1.0)];
        let second = vec![NA, measured(-2.0, -0.5)];
        assert_eq!(y_axis_ceiling(first.iter().chain(second.iter()), 0.0), Some(-0.5));
    }

    #[test]
    fn runs_combine_by_index() {
        let per_file = vec![
            vec![measured(2.0, 3.0), measured(5.0, 6.0)],
            vec![measured(4.0, 5.0), NA, measured(1.0, 1.0)],
            vec![],
        ];
        assert_eq!(combine_runs(&per_file), vec![measured(3.0, 4.0), measured(5.0, 6.0), measured(1.0, 1.0)]);
        assert_eq!(run_coverage(&per_file), vec![2, 1, 1]);
    }

    #[test]
    fn run_without_any_measurement_is_not_available() {
        let per_file = vec![vec![NA, measured(1.0, 2.0)], vec![NA]];
        assert_eq!(combine_runs(&per_file), vec![NA, measured(1.0, 2.0)]);
        assert_eq!(run_coverage(&per_file), vec![0, 1]);
        assert!(combine_runs(&[]).is_empty());
    }
}
