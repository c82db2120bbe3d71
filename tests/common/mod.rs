//! Shared helpers for the pipeline tests.

use std::collections::BTreeSet;
use std::io::Write;

use polytile::Schedule;
use tempfile::NamedTempFile;

/// `B[i][j] = A[i][j]` over an `ni x nj` box, in JSON form.
#[allow(dead_code)]
pub fn copy_scop(ni: i64, nj: i64) -> String {
    format!(
        r#"{{
            "statements": [{{
                "name": "copy",
                "iterators": ["i", "j"],
                "bounds": [[0, {}], [0, {}]],
                "accesses": [
                    {{ "kind": "read", "array": "A", "subscripts": [[1, 0, 0], [0, 1, 0]] }},
                    {{ "kind": "write", "array": "B", "subscripts": [[1, 0, 0], [0, 1, 0]] }}
                ]
            }}],
            "schedule": {{ "band": {{ "members": [
                {{ "schedule": {{ "copy": [1, 0, 0] }}, "permutable": true, "coincident": true }},
                {{ "schedule": {{ "copy": [0, 1, 0] }}, "permutable": true, "coincident": true }}
            ] }} }}
        }}"#,
        ni - 1,
        nj - 1
    )
}

/// `C[i][j] += A[i][k] * B[k][j]` over an `n x n x n` box.
#[allow(dead_code)]
pub fn gemm_scop(n: i64) -> String {
    let hi = n - 1;
    format!(
        r#"{{
            "statements": [{{
                "name": "gemm",
                "iterators": ["i", "j", "k"],
                "bounds": [[0, {hi}], [0, {hi}], [0, {hi}]],
                "accesses": [
                    {{ "kind": "read", "array": "C", "subscripts": [[1, 0, 0, 0], [0, 1, 0, 0]] }},
                    {{ "kind": "read", "array": "A", "subscripts": [[1, 0, 0, 0], [0, 0, 1, 0]] }},
                    {{ "kind": "read", "array": "B", "subscripts": [[0, 0, 1, 0], [0, 1, 0, 0]] }},
                    {{ "kind": "write", "array": "C", "subscripts": [[1, 0, 0, 0], [0, 1, 0, 0]] }}
                ]
            }}],
            "schedule": {{ "band": {{ "members": [
                {{ "schedule": {{ "gemm": [1, 0, 0, 0] }}, "permutable": true, "coincident": true }},
                {{ "schedule": {{ "gemm": [0, 1, 0, 0] }}, "permutable": true, "coincident": true }},
                {{ "schedule": {{ "gemm": [0, 0, 1, 0] }}, "permutable": true }}
            ] }} }}
        }}"#
    )
}

/// Write `contents` to a temporary `.json` file.
#[allow(dead_code)]
pub fn scop_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::with_suffix(".json").expect("Failed to create temp file");
    file.write_all(contents.as_bytes())
        .expect("Failed to write SCoP");
    file
}

/// Every instance of `original` executes exactly once under `optimized`.
#[allow(dead_code)]
pub fn assert_same_instances(original: &Schedule, optimized: &Schedule) {
    let order = optimized.execution_order();
    let executed: BTreeSet<_> = order
        .iter()
        .map(|inst| (inst.stmt, inst.point.clone()))
        .collect();
    assert_eq!(executed.len(), order.len(), "instance executed twice");
    assert_eq!(order.len() as u128, original.domain().card());
}

/// Tags of every mark, in pre-order.
#[allow(dead_code)]
pub fn marks(schedule: &Schedule) -> Vec<String> {
    schedule
        .to_string()
        .lines()
        .filter_map(|line| line.trim_start().strip_prefix("mark: "))
        .map(|tag| tag.trim_matches('"').to_owned())
        .collect()
}
