//! Seeded train/test partitioning.
//!
//! Splitting happens before any transform is fitted, so held-out rows can
//! never leak into fitted parameters.

use crate::data::Dataset;
use crate::error::PipelineError;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Split a dataset into train and held-out partitions.
///
/// Rows are shuffled with a seeded RNG so the same (dataset, fraction, seed)
/// always produces the same partitions. Fails if either partition would be
/// empty.
pub fn split_dataset(
    dataset: &Dataset,
    train_fraction: f64,
    seed: u64,
) -> Result<(Dataset, Dataset), PipelineError> {
    if !(0.0..1.0).contains(&train_fraction) || train_fraction == 0.0 {
        return Err(PipelineError::transformation(format!(
            "train fraction {train_fraction} must be in (0, 1)"
        )));
    }

    let mut indices: Vec<usize> = (0..dataset.row_count()).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let n_train = (dataset.row_count() as f64 * train_fraction).round() as usize;
    if n_train == 0 || n_train == dataset.row_count() {
        return Err(PipelineError::transformation(format!(
            "split of {} rows at fraction {train_fraction} leaves an empty partition",
            dataset.row_count()
        )));
    }

    let collect = |idx: &[usize]| {
        Dataset::new(
            dataset.columns.clone(),
            idx.iter().map(|&i| dataset.rows[i].clone()).collect(),
        )
    };

    Ok((collect(&indices[..n_train]), collect(&indices[n_train..])))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset(rows: usize) -> Dataset {
        Dataset::new(
            vec!["x".into()],
            (0..rows).map(|i| vec![serde_json::json!(i)]).collect(),
        )
    }

    #[test]
    fn test_split_sizes() {
        let (train, test) = split_dataset(&dataset(10), 0.8, 42).unwrap();
        assert_eq!(train.row_count(), 8);
        assert_eq!(test.row_count(), 2);
    }

    #[test]
    fn test_split_deterministic() {
        let ds = dataset(20);
        let (a_train, _) = split_dataset(&ds, 0.7, 7).unwrap();
        let (b_train, _) = split_dataset(&ds, 0.7, 7).unwrap();
        assert_eq!(a_train.rows, b_train.rows);

        let (c_train, _) = split_dataset(&ds, 0.7, 8).unwrap();
        assert_ne!(a_train.rows, c_train.rows);
    }

    #[test]
    fn test_split_partitions_disjoint_and_complete() {
        let ds = dataset(10);
        let (train, test) = split_dataset(&ds, 0.6, 1).unwrap();
        let mut all: Vec<i64> = train
            .rows
            .iter()
            .chain(test.rows.iter())
            .map(|r| r[0].as_i64().unwrap())
            .collect();
        all.sort_unstable();
        assert_eq!(all, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_split_rejects_empty_partition() {
        assert!(split_dataset(&dataset(1), 0.8, 0).is_err());
        assert!(split_dataset(&dataset(10), 0.0, 0).is_err());
    }
}
