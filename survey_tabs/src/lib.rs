mod config;
mod labels;
use log::{debug, info};

use std::collections::{BTreeMap, HashMap};

pub use crate::classify::*;
pub use crate::config::*;
pub use crate::labels::*;

pub mod builder;
pub mod classify;
pub mod manual;
pub mod render;

/// Percentage of `n` over `base`, rounded to one decimal. A zero base gives 0.
pub fn percentage(n: u64, base: u64) -> f64 {
    if base == 0 {
        0.0
    } else {
        round1(100.0 * (n as f64) / (base as f64))
    }
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

/// The percentage shown in every cell of the Total row.
const TOTAL_PCT: f64 = 100.0;

fn group_positions(groups: &[CategoryKey]) -> HashMap<CategoryKey, usize> {
    groups
        .iter()
        .enumerate()
        .map(|(idx, g)| (g.clone(), idx))
        .collect()
}

/// Cross-tabulates one categorical variable against the grouping values.
///
/// Arguments:
/// * `data` the records, already filtered
/// * `code` the variable to tabulate
/// * `groups` the grouping values in display order, usually `data.groups()`
/// * `labels` to resolve the title
///
/// Each category observed among the grouped records is one row. The percentages use the
/// column totals as base. The Total row holds the column totals, at 100% by definition.
pub fn tabulate_single(
    data: &Dataset,
    code: &str,
    groups: &[CategoryKey],
    labels: &LabelBook,
) -> TabulationOutcome {
    let title = labels.resolve(code).to_string();
    let col = match data.column_index(code) {
        Some(col) => col,
        None => {
            debug!("tabulate_single: {:?} is not in the dataset", code);
            return TabulationOutcome::NoData {
                code: code.to_string(),
                title,
                reason: NoDataReason::MissingVariable,
            };
        }
    };
    info!(
        "Tabulating {:?} over {} records and {} groups",
        code,
        data.len(),
        groups.len()
    );

    let positions = group_positions(groups);
    let num_groups = groups.len();

    // N[v][g]
    let mut counts: BTreeMap<CategoryKey, Vec<u64>> = BTreeMap::new();
    for row in data.rows() {
        let pos = match data.group_of(row).and_then(|g| positions.get(&g)) {
            Some(pos) => *pos,
            None => continue,
        };
        if let Some(cat) = row[col].category() {
            counts.entry(cat).or_insert_with(|| vec![0; num_groups])[pos] += 1;
        }
    }
    debug!("tabulate_single: {:?} counts: {:?}", code, counts);

    if counts.is_empty() {
        return TabulationOutcome::NoData {
            code: code.to_string(),
            title,
            reason: NoDataReason::NoRecords,
        };
    }

    // N['Total'][g], the Total column included.
    let mut col_totals: Vec<u64> = vec![0; num_groups + 1];
    for ns in counts.values() {
        for (idx, n) in ns.iter().enumerate() {
            col_totals[idx] += n;
            col_totals[num_groups] += n;
        }
    }

    let mut rows: Vec<TabRow> = Vec::new();
    let mut series: Vec<ChartPoint> = Vec::new();
    for (cat, ns) in counts.iter() {
        let label = cat.to_string();
        let row_total: u64 = ns.iter().sum();
        let cells: Vec<TabCell> = ns
            .iter()
            .chain([row_total].iter())
            .enumerate()
            .map(|(idx, n)| TabCell {
                n: *n,
                pct: percentage(*n, col_totals[idx]),
            })
            .collect();
        for (g, n) in groups.iter().zip(ns.iter()) {
            if *n > 0 {
                series.push(ChartPoint {
                    category: label.clone(),
                    group: g.to_string(),
                    count: *n,
                });
            }
        }
        rows.push(TabRow { label, cells });
    }

    let total = TabRow {
        label: TOTAL.to_string(),
        cells: col_totals
            .iter()
            .map(|n| TabCell {
                n: *n,
                pct: TOTAL_PCT,
            })
            .collect(),
    };

    TabulationOutcome::Table(Tabulation {
        code: code.to_string(),
        title,
        kind: TabulationKind::SingleResponse,
        groups: groups.iter().map(|g| g.to_string()).collect(),
        rows,
        total,
        series,
    })
}

/// Tabulates a multi-response question (an option set) against the grouping values.
///
/// The count of an option is the number of respondents who selected it (see `is_selected`).
/// The base of a group is the number of its respondents who selected at least one option of
/// the set, so that a respondent with several selections counts once in the base.
/// The Total column uses the base over all the grouped respondents.
///
/// The Total row holds the bases, at 100% by definition: it is not the sum of the rows.
pub fn tabulate_multi(
    data: &Dataset,
    set: &OptionSet,
    groups: &[CategoryKey],
    labels: &LabelBook,
) -> TabulationOutcome {
    let title = labels.resolve(&set.prefix).to_string();
    let present: Vec<(&String, usize)> = set
        .options
        .iter()
        .filter_map(|o| data.column_index(o).map(|idx| (o, idx)))
        .collect();
    if present.is_empty() {
        debug!(
            "tabulate_multi: no option of {:?} is in the dataset",
            set.prefix
        );
        return TabulationOutcome::NoData {
            code: set.prefix.clone(),
            title,
            reason: NoDataReason::EmptyOptionSet,
        };
    }
    info!(
        "Tabulating option set {:?} ({} options) over {} records and {} groups",
        set.prefix,
        present.len(),
        data.len(),
        groups.len()
    );

    let positions = group_positions(groups);
    let num_groups = groups.len();

    let mut counts: Vec<Vec<u64>> = vec![vec![0; num_groups]; present.len()];
    let mut bases: Vec<u64> = vec![0; num_groups];
    let mut num_grouped: u64 = 0;
    for row in data.rows() {
        let pos = match data.group_of(row).and_then(|g| positions.get(&g)) {
            Some(pos) => *pos,
            None => continue,
        };
        num_grouped += 1;
        let mut any_selected = false;
        for (opt_idx, (_, col)) in present.iter().enumerate() {
            if is_selected(&row[*col]) {
                counts[opt_idx][pos] += 1;
                any_selected = true;
            }
        }
        if any_selected {
            bases[pos] += 1;
        }
    }
    let overall_base: u64 = bases.iter().sum();
    debug!(
        "tabulate_multi: {:?} counts: {:?} bases: {:?} overall base: {}",
        set.prefix, counts, bases, overall_base
    );

    if num_grouped == 0 {
        return TabulationOutcome::NoData {
            code: set.prefix.clone(),
            title,
            reason: NoDataReason::NoRecords,
        };
    }

    let mut rows: Vec<TabRow> = Vec::new();
    let mut series: Vec<ChartPoint> = Vec::new();
    for ((code, _), ns) in present.iter().zip(counts.iter()) {
        let label = labels.resolve(code).to_string();
        let mut cells: Vec<TabCell> = ns
            .iter()
            .zip(bases.iter())
            .map(|(n, base)| TabCell {
                n: *n,
                pct: percentage(*n, *base),
            })
            .collect();
        let n_total: u64 = ns.iter().sum();
        cells.push(TabCell {
            n: n_total,
            pct: percentage(n_total, overall_base),
        });
        for (g, n) in groups.iter().zip(ns.iter()) {
            series.push(ChartPoint {
                category: label.clone(),
                group: g.to_string(),
                count: *n,
            });
        }
        rows.push(TabRow { label, cells });
    }

    let total = TabRow {
        label: TOTAL.to_string(),
        cells: bases
            .iter()
            .chain([overall_base].iter())
            .map(|n| TabCell {
                n: *n,
                pct: TOTAL_PCT,
            })
            .collect(),
    };

    TabulationOutcome::Table(Tabulation {
        code: set.prefix.clone(),
        title,
        kind: TabulationKind::MultiResponse,
        groups: groups.iter().map(|g| g.to_string()).collect(),
        rows,
        total,
        series,
    })
}

#[cfg(test)]
mod tests {
    use super::builder::Builder;
    use super::*;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn dataset(columns: &[&str], records: &[&[&str]]) -> Dataset {
        let mut b = Builder::new(columns, "District").unwrap();
        for r in records {
            b.add_record_simple(r).unwrap();
        }
        b.build()
    }

    fn single(data: &Dataset, code: &str) -> Tabulation {
        let out = tabulate_single(data, code, &data.groups(), &LabelBook::default());
        out.table().cloned().unwrap()
    }

    fn option_set(prefix: &str, n: usize) -> OptionSet {
        OptionSet {
            prefix: prefix.to_string(),
            options: (1..=n).map(|i| format!("{}_{}", prefix, i)).collect(),
        }
    }

    fn multi(data: &Dataset, set: &OptionSet) -> TabulationOutcome {
        tabulate_multi(data, set, &data.groups(), &LabelBook::default())
    }

    fn anc() -> Dataset {
        dataset(
            &["District", "AC1"],
            &[
                &["Lodhran", "Yes"],
                &["Lodhran", "Yes"],
                &["Lodhran", "No"],
                &["Jamshoro", "Yes"],
                &["Jamshoro", ""],
                &["", "No"],
                &["Khairpur", "No"],
                &["Khairpur", "No"],
                &["Khairpur", "Yes"],
            ],
        )
    }

    #[test]
    fn percentage_rounding() {
        assert_eq!(percentage(1, 3), 33.3);
        assert_eq!(percentage(2, 3), 66.7);
        assert_eq!(percentage(0, 5), 0.0);
        assert_eq!(percentage(3, 0), 0.0);
        assert_eq!(percentage(7, 7), 100.0);
    }

    #[test]
    fn single_grid() {
        init();
        let t = single(&anc(), "AC1");
        assert_eq!(t.kind, TabulationKind::SingleResponse);
        assert_eq!(t.groups, vec!["Jamshoro", "Khairpur", "Lodhran"]);
        let labels: Vec<&str> = t.rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["No", "Yes"]);

        let no = &t.rows[0];
        let ns: Vec<u64> = no.cells.iter().map(|c| c.n).collect();
        assert_eq!(ns, vec![0, 2, 1, 3]);
        let pcts: Vec<f64> = no.cells.iter().map(|c| c.pct).collect();
        assert_eq!(pcts, vec![0.0, 66.7, 33.3, 42.9]);

        let totals: Vec<u64> = t.total.cells.iter().map(|c| c.n).collect();
        assert_eq!(totals, vec![1, 3, 3, 7]);
        assert!(t.total.cells.iter().all(|c| c.pct == 100.0));
        assert_eq!(t.total.label, "Total");
    }

    #[test]
    fn single_totals_are_consistent() {
        let t = single(&anc(), "AC1");
        let ng = t.groups.len();
        for g in 0..=ng {
            let col_sum: u64 = t.rows.iter().map(|r| r.cells[g].n).sum();
            assert_eq!(col_sum, t.total.cells[g].n);
        }
        for r in t.rows.iter() {
            let row_sum: u64 = r.cells[..ng].iter().map(|c| c.n).sum();
            assert_eq!(row_sum, r.cells[ng].n);
            for (idx, c) in r.cells.iter().enumerate() {
                let base = t.total.cells[idx].n;
                let expected = if base > 0 {
                    ((100.0 * c.n as f64 / base as f64) * 10.0).round() / 10.0
                } else {
                    0.0
                };
                assert_eq!(c.pct, expected);
            }
        }
    }

    #[test]
    fn single_chart_series_skips_empty_bars() {
        let t = single(&anc(), "AC1");
        assert_eq!(
            t.series[0],
            ChartPoint {
                category: "No".to_string(),
                group: "Khairpur".to_string(),
                count: 2
            }
        );
        assert!(t.series.iter().all(|p| p.count > 0));
        assert_eq!(t.series.iter().map(|p| p.count).sum::<u64>(), 7);
    }

    #[test]
    fn single_numeric_categories_in_numeric_order() {
        let data = dataset(
            &["District", "MB3"],
            &[&["A", "10"], &["A", "2"], &["B", "1"], &["B", "2"]],
        );
        let t = single(&data, "MB3");
        let labels: Vec<&str> = t.rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["1", "2", "10"]);
    }

    #[test]
    fn single_missing_variable() {
        let data = anc();
        let out = tabulate_single(&data, "ZZ9", &data.groups(), &LabelBook::default());
        assert_eq!(
            out,
            TabulationOutcome::NoData {
                code: "ZZ9".to_string(),
                title: "ZZ9".to_string(),
                reason: NoDataReason::MissingVariable
            }
        );
    }

    #[test]
    fn single_empty_dataset() {
        let data = dataset(&["District", "AC1"], &[]);
        let out = tabulate_single(&data, "AC1", &data.groups(), &LabelBook::default());
        assert!(out.table().is_none());
    }

    #[test]
    fn single_title_is_resolved() {
        let data = anc();
        let labels = LabelBook::from_pairs(
            &[("AC1".to_string(), "Received ANC".to_string())],
            &[],
        );
        let out = tabulate_single(&data, "AC1", &data.groups(), &labels);
        assert_eq!(out.title(), "Received ANC");
    }

    #[test]
    fn numbers_and_numeric_text_share_a_row() {
        let mut b = Builder::new(&["District", "MB3"], "District").unwrap();
        let district = || Value::Text("Lodhran".to_string());
        b.add_record(vec![district(), Value::Number(1.0)]).unwrap();
        b.add_record(vec![district(), Value::Text("1".to_string())]).unwrap();
        b.add_record(vec![district(), Value::Text("01".to_string())]).unwrap();
        b.add_record(vec![district(), Value::Number(2.0)]).unwrap();
        let t = single(&b.build(), "MB3");
        let labels: Vec<&str> = t.rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["1", "2", "01"]);
        assert_eq!(t.rows[0].cells[0].n, 2);
        assert_eq!(t.rows[2].cells[0].n, 1);
    }

    #[test]
    fn empty_filter_is_all_groups() {
        let data = anc();
        let all: Vec<String> = data.groups().iter().map(|g| g.to_string()).collect();
        let none = data.filter_groups(&[]);
        let every = data.filter_groups(&all);
        assert_eq!(none.len(), 9);
        assert_eq!(every.len(), 8);
        assert_eq!(single(&none, "AC1"), single(&every, "AC1"));
    }

    #[test]
    fn empty_filter_is_all_groups_multi() {
        let data = dataset(
            &["District", "BF4_1", "BF4_2"],
            &[&["A", "1", ""], &["", "1", "1"], &["B", "0", "yes"]],
        );
        let all: Vec<String> = data.groups().iter().map(|g| g.to_string()).collect();
        let set = option_set("BF4", 2);
        let none = multi(&data.filter_groups(&[]), &set);
        let every = multi(&data.filter_groups(&all), &set);
        assert_eq!(none, every);
        assert_eq!(none.table().unwrap().total.cells[2].n, 2);
    }

    #[test]
    fn filter_subset() {
        let data = anc().filter_groups(&["Lodhran".to_string()]);
        let t = single(&data, "AC1");
        assert_eq!(t.groups, vec!["Lodhran"]);
        assert_eq!(t.total.cells[1].n, 3);
    }

    fn bf() -> Dataset {
        dataset(
            &["District", "BF4_1", "BF4_2", "BF4_3"],
            &[
                // Selects options 1 and 3.
                &["A", "1", "0", "yes"],
                &["A", "", "1", ""],
                &["A", "0", "0", "0"],
                &["B", "0", "no", ""],
                &["B", "TRUE", "", ""],
            ],
        )
    }

    #[test]
    fn multi_base_counts_respondents_once() {
        init();
        let set = option_set("BF4", 3);
        let out = multi(&bf(), &set);
        let t = out.table().unwrap();
        assert_eq!(t.kind, TabulationKind::MultiResponse);
        assert_eq!(t.groups, vec!["A", "B"]);

        let ns: Vec<Vec<u64>> = t
            .rows
            .iter()
            .map(|r| r.cells.iter().map(|c| c.n).collect())
            .collect();
        assert_eq!(ns, vec![vec![1, 1, 2], vec![1, 0, 1], vec![1, 0, 1]]);

        // base(A) = 2 respondents, base(B) = 1, overall = 3
        let bases: Vec<u64> = t.total.cells.iter().map(|c| c.n).collect();
        assert_eq!(bases, vec![2, 1, 3]);
        assert!(t.total.cells.iter().all(|c| c.pct == 100.0));

        let pcts: Vec<f64> = t.rows[0].cells.iter().map(|c| c.pct).collect();
        assert_eq!(pcts, vec![50.0, 100.0, 66.7]);
        let pcts: Vec<f64> = t.rows[2].cells.iter().map(|c| c.pct).collect();
        assert_eq!(pcts, vec![50.0, 0.0, 33.3]);
    }

    #[test]
    fn multi_single_respondent_contribution() {
        let data = dataset(
            &["District", "Q_1", "Q_2", "Q_3"],
            &[&["A", "1", "0", "1"]],
        );
        let t = multi(&data, &option_set("Q", 3)).table().cloned().unwrap();
        assert_eq!(t.total.cells[0].n, 1);
        assert_eq!(t.rows[0].cells[0].n, 1);
        assert_eq!(t.rows[1].cells[0].n, 0);
        assert_eq!(t.rows[2].cells[0].n, 1);
    }

    #[test]
    fn multi_group_without_selection() {
        let set = option_set("BF4", 3);
        let data = dataset(
            &["District", "BF4_1", "BF4_2", "BF4_3"],
            &[&["C", "0", "", "no"], &["C", "", "", ""]],
        );
        let t = multi(&data, &set).table().cloned().unwrap();
        assert_eq!(t.total.cells[0].n, 0);
        assert!(t.rows.iter().all(|r| r.cells.iter().all(|c| c.pct == 0.0)));
        assert!(t.rows.iter().all(|r| r.cells.iter().all(|c| c.n == 0)));
        // All-zero table, still a table.
        assert_eq!(t.rows.len(), 3);
        assert_eq!(t.series.len(), 3);
    }

    #[test]
    fn multi_no_data() {
        let data = bf();
        let out = multi(&data, &option_set("KC1", 2));
        assert!(matches!(
            out,
            TabulationOutcome::NoData {
                reason: NoDataReason::EmptyOptionSet,
                ..
            }
        ));

        let empty = data.filter_groups(&["Nowhere".to_string()]);
        let out = multi(&empty, &option_set("BF4", 3));
        assert!(matches!(
            out,
            TabulationOutcome::NoData {
                reason: NoDataReason::NoRecords,
                ..
            }
        ));
    }

    #[test]
    fn multi_labels() {
        let labels = LabelBook::from_pairs(
            &[("BF4_2".to_string(), "Formula".to_string())],
            &[
                ("BF4".to_string(), "What was given?".to_string()),
                ("BF4_1".to_string(), "Water".to_string()),
            ],
        );
        let data = bf();
        let out = tabulate_multi(&data, &option_set("BF4", 3), &data.groups(), &labels);
        let t = out.table().unwrap();
        assert_eq!(t.title, "What was given?");
        let labels: Vec<&str> = t.rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["Water", "Formula", "BF4_3"]);
        assert_eq!(t.series.len(), 6);
    }

    #[test]
    fn multi_skips_absent_options() {
        let data = bf();
        let mut set = option_set("BF4", 3);
        set.options.push("BF4_9".to_string());
        let t = multi(&data, &set).table().cloned().unwrap();
        assert_eq!(t.rows.len(), 3);
    }
}
