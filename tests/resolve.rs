use assert_matches::assert_matches;

use sadd_disagg::error::SaddError;
use sadd_disagg::resolve::{
    Resolution, Strategy, aggregation_run, apply_resolution, resolve_label,
};
use sadd_disagg::table::{BucketColumn, PopulationRow, PopulationTable, RatioRow, RatioTable, Sex};

fn population() -> PopulationTable {
    let labels = vec!["0-4".to_string(), "5-9".to_string(), "10+".to_string()];
    let rows = vec![
        PopulationRow {
            location: "Testland".to_string(),
            sex: Sex::Female,
            counts: vec![10.0, 20.0, 30.0],
        },
        PopulationRow {
            location: "Testland".to_string(),
            sex: Sex::Male,
            counts: vec![5.0, 15.0, 40.0],
        },
    ];
    PopulationTable::new(&labels, rows).unwrap()
}

fn ratios(labels: &[&str], female: &[f64], male: &[f64]) -> (RatioTable, RatioTable) {
    let labels: Vec<String> = labels.iter().map(|s| s.to_string()).collect();
    let female = RatioTable::new(
        &labels,
        vec![RatioRow {
            location: "Testland".to_string(),
            shares: female.to_vec(),
        }],
    )
    .unwrap();
    let male = RatioTable::new(
        &labels,
        vec![RatioRow {
            location: "Testland".to_string(),
            shares: male.to_vec(),
        }],
    )
    .unwrap();
    (female, male)
}

fn empty_ratios() -> (RatioTable, RatioTable) {
    (
        RatioTable::new(&[], Vec::new()).unwrap(),
        RatioTable::new(&[], Vec::new()).unwrap(),
    )
}

#[test]
fn direct_match_returns_column_unchanged() {
    let pop = population();
    let (female, male) = empty_ratios();
    let resolution = resolve_label("5-9", &pop, &female, &male).unwrap();
    assert_matches!(resolution, Resolution::Direct { bucket: 1 });
    let column = apply_resolution(&resolution, &pop, &female, &male).unwrap();
    assert_eq!(column, vec![20.0, 15.0]);
}

#[test]
fn direct_match_wins_over_ratio_bucket() {
    // "0-4" is both a canonical bucket and a broad ratio bucket; the chain
    // must pick the direct source.
    let pop = population();
    let (female, male) = ratios(&["0-4"], &[99.0], &[99.0]);
    let resolution = resolve_label("0-4", &pop, &female, &male).unwrap();
    assert_eq!(resolution.strategy(), Strategy::Direct);
}

#[test]
fn ratio_bucket_wins_over_aggregation() {
    // "0-9" aligns with canonical boundaries, but it is also a broad ratio
    // bucket, and the ratio strategy sits earlier in the chain.
    let pop = population();
    let (female, male) = ratios(&["0-9"], &[50.0], &[100.0 / 3.0]);
    let resolution = resolve_label("0-9", &pop, &female, &male).unwrap();
    assert_eq!(resolution.strategy(), Strategy::RatioDerived);
}

#[test]
fn ratio_derivation_scales_sex_totals() {
    let pop = population();
    let (female, male) = ratios(&["0-14"], &[50.0], &[25.0]);
    let resolution = resolve_label("0-14", &pop, &female, &male).unwrap();
    let column = apply_resolution(&resolution, &pop, &female, &male).unwrap();
    // Female total 60 * 50% = 30; male total 60 * 25% = 15, in row order.
    assert_eq!(column, vec![30.0, 15.0]);
}

#[test]
fn ratio_derivation_requires_a_row_per_location() {
    let pop = population();
    let labels = vec!["0-14".to_string()];
    let female = RatioTable::new(
        &labels,
        vec![RatioRow {
            location: "Elsewhere".to_string(),
            shares: vec![50.0],
        }],
    )
    .unwrap();
    let male = female.clone();
    let resolution = resolve_label("0-14", &pop, &female, &male).unwrap();
    let err = apply_resolution(&resolution, &pop, &female, &male).unwrap_err();
    assert_matches!(err, SaddError::MissingRatioRow { .. });
}

#[test]
fn aggregation_sums_contiguous_buckets() {
    let pop = population();
    let (female, male) = empty_ratios();
    let resolution = resolve_label("0-9", &pop, &female, &male).unwrap();
    assert_matches!(resolution, Resolution::Aggregated { .. });
    let column = apply_resolution(&resolution, &pop, &female, &male).unwrap();
    assert_eq!(column, vec![30.0, 20.0]);
}

#[test]
fn aggregation_and_ratio_paths_agree() {
    // Sanity cross-check from the two derivations of the same semantic
    // interval: summing canonical buckets for 0-9 must match scaling the sex
    // total by an exact 0-9 share.
    let pop = population();
    let (female, male) = ratios(&["0-9"], &[100.0 * 30.0 / 60.0], &[100.0 * 20.0 / 60.0]);
    let ratio = resolve_label("0-9", &pop, &female, &male).unwrap();
    assert_eq!(ratio.strategy(), Strategy::RatioDerived);
    let via_ratio = apply_resolution(&ratio, &pop, &female, &male).unwrap();

    let run = aggregation_run("0-9".parse().unwrap(), pop.buckets()).unwrap();
    let via_sum = apply_resolution(
        &Resolution::Aggregated { run },
        &pop,
        &female,
        &male,
    )
    .unwrap();

    for (a, b) in via_ratio.iter().zip(&via_sum) {
        assert!((a - b).abs() < 1e-9);
    }
}

#[test]
fn open_ended_label_aggregates_to_the_tail() {
    let pop = population();
    let (female, male) = empty_ratios();
    let resolution = resolve_label("5+", &pop, &female, &male).unwrap();
    let column = apply_resolution(&resolution, &pop, &female, &male).unwrap();
    assert_eq!(column, vec![50.0, 55.0]);
}

#[test]
fn off_grid_label_is_unresolvable() {
    let pop = population();
    let (female, male) = empty_ratios();
    let err = resolve_label("0-17", &pop, &female, &male).unwrap_err();
    assert_matches!(err, SaddError::UnresolvableLabel { ref label } if label == "0-17");
}

#[test]
fn label_inside_one_bucket_is_unresolvable() {
    let pop = population();
    let (female, male) = empty_ratios();
    let err = resolve_label("1-3", &pop, &female, &male).unwrap_err();
    assert_matches!(err, SaddError::UnresolvableLabel { .. });
}

#[test]
fn boundary_exactness_is_required() {
    let buckets: Vec<BucketColumn> = ["0-4", "5-9", "10-14", "15-19", "20+"]
        .iter()
        .map(|label| BucketColumn::parse(label).unwrap())
        .collect();
    assert_eq!(
        aggregation_run("0-19".parse().unwrap(), &buckets),
        Some(0..=3)
    );
    // 17 is not a canonical upper bound anywhere, so 0-17 has no run.
    assert_eq!(aggregation_run("0-17".parse().unwrap(), &buckets), None);
}
