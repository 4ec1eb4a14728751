use crate::report::*;

fn cell_json(c: &TabCell) -> JSValue {
    json!({"n": c.n, "pct": c.pct})
}

fn row_json(r: &TabRow) -> JSValue {
    let cells: Vec<JSValue> = r.cells.iter().map(cell_json).collect();
    json!({"label": r.label, "cells": cells})
}

fn reason_json(reason: &NoDataReason) -> JSValue {
    let s = match reason {
        NoDataReason::MissingVariable => "missingVariable",
        NoDataReason::EmptyOptionSet => "emptyOptionSet",
        NoDataReason::NoRecords => "noRecords",
    };
    json!(s)
}

pub fn outcome_json(outcome: &TabulationOutcome) -> JSValue {
    match outcome {
        TabulationOutcome::Table(t) => {
            let kind = match t.kind {
                TabulationKind::SingleResponse => "single",
                TabulationKind::MultiResponse => "multi",
            };
            let rows: Vec<JSValue> = t.rows.iter().map(row_json).collect();
            let series: Vec<JSValue> = t
                .series
                .iter()
                .map(|p| json!({"category": p.category, "group": p.group, "count": p.count}))
                .collect();
            json!({
                "code": t.code,
                "title": t.title,
                "kind": kind,
                "columns": t.groups.iter().cloned().chain([TOTAL.to_string()]).collect::<Vec<String>>(),
                "rows": rows,
                "total": row_json(&t.total),
                "chart": series,
            })
        }
        TabulationOutcome::NoData {
            code,
            title,
            reason,
        } => json!({
            "code": code,
            "title": title,
            "noData": reason_json(reason),
            "message": no_data_message(outcome),
        }),
    }
}

pub fn report_json(header: &ReportHeader, reports: &[ModuleReport]) -> JSValue {
    let modules: Vec<JSValue> = reports
        .iter()
        .map(|r| {
            let tables: Vec<JSValue> = r.outcomes.iter().map(outcome_json).collect();
            json!({"name": r.name, "tables": tables})
        })
        .collect();
    json!({
        "header": {
            "title": header.title,
            "districts": header.districts,
            "interviews": header.interviews,
        },
        "modules": modules,
    })
}
