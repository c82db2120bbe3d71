mod common;

use std::path::Path;

use common::{copy_scop, gemm_scop, marks, scop_file};
use polytile::pipeline::compare_files;
use polytile::{
    OptimizerConfig, PipelineErrorKind, PipelineOptions, TargetCostModel, load_scop, optimize,
    optimize_file, parse_scop,
};

#[test]
fn test_optimize_copy_file() {
    let file = scop_file(&copy_scop(128, 128));
    let result = optimize_file(file.path(), &PipelineOptions::default()).unwrap();

    assert!(result.accepted);
    assert_eq!(result.stats.bands_tiled, 1);
    assert_eq!(result.stats.bands_prevectorized, 1);
    assert_eq!(
        marks(&result.schedule),
        vec!["Tiling - Tiles", "Tiling - Points", "SIMD"]
    );
    common::assert_same_instances(&load_scop(file.path()).unwrap(), &result.schedule);
}

#[test]
fn test_disabled_tiling_only_prevectorizes() {
    let schedule = parse_scop(&copy_scop(128, 128)).unwrap();
    let options = PipelineOptions {
        config: OptimizerConfig::default().with_tiling(false),
        target: None,
    };
    let result = optimize(schedule.clone(), &options).unwrap();

    assert_eq!(result.stats.bands_tiled, 0);
    assert_eq!(result.stats.bands_prevectorized, 1);
    assert_eq!(marks(&result.schedule), vec!["SIMD"]);
    common::assert_same_instances(&schedule, &result.schedule);
}

#[test]
fn test_everything_disabled_is_identity() {
    let schedule = parse_scop(&gemm_scop(16)).unwrap();
    let options = PipelineOptions {
        config: OptimizerConfig::default()
            .with_tiling(false)
            .with_vectorization(false)
            .with_pattern_matching(false),
        target: None,
    };
    let result = optimize(schedule.clone(), &options).unwrap();

    assert!(result.stats.is_empty());
    assert!(result.accepted);
    assert_eq!(result.schedule, schedule);
}

#[test]
fn test_gemm_uses_target_register_width() {
    let schedule = parse_scop(&gemm_scop(32)).unwrap();
    let options = PipelineOptions {
        config: OptimizerConfig::default(),
        target: Some(TargetCostModel {
            vector_register_bits: 256,
            ..TargetCostModel::default()
        }),
    };
    let result = optimize(schedule.clone(), &options).unwrap();

    assert_eq!(result.stats.matmul_kernels, 1);
    assert_eq!(
        marks(&result.schedule),
        vec!["Register tiling - Tiles", "Register tiling - Points"]
    );
    common::assert_same_instances(&schedule, &result.schedule);
}

#[test]
fn test_ragged_extent_is_isolated() {
    let schedule = parse_scop(&copy_scop(6, 10)).unwrap();
    let options = PipelineOptions {
        config: OptimizerConfig::default().with_tiling(false),
        target: None,
    };
    let result = optimize(schedule.clone(), &options).unwrap();
    let text = result.schedule.to_string();

    assert!(text.contains("options: isolated"), "{text}");
    assert!(text.contains("options: atomic"), "{text}");
    assert_eq!(marks(&result.schedule), vec!["SIMD", "SIMD"]);
    common::assert_same_instances(&schedule, &result.schedule);
}

#[test]
fn test_compare_files() {
    let original = scop_file(&copy_scop(8, 8));
    // j outermost: every access walks a leading dimension in the inner loop.
    let interchanged = scop_file(
        &copy_scop(8, 8)
            .replace(r#""copy": [1, 0, 0] }"#, r#""copy": [0, 2, 0] }"#)
            .replace(r#""copy": [0, 1, 0] }"#, r#""copy": [1, 0, 0] }"#)
            .replace(r#""copy": [0, 2, 0] }"#, r#""copy": [0, 1, 0] }"#),
    );

    assert!(compare_files(original.path(), original.path()).unwrap());
    assert!(!compare_files(original.path(), interchanged.path()).unwrap());
    assert!(compare_files(interchanged.path(), original.path()).unwrap());
}

#[test]
fn test_missing_file() {
    let err = load_scop(Path::new("/nonexistent/scop.json")).unwrap_err();
    assert!(matches!(err.kind(), PipelineErrorKind::Io { .. }));
    assert!(err.to_string().starts_with("Cannot read /nonexistent/scop.json"));
}

#[test]
fn test_malformed_json() {
    let err = parse_scop(r#"{ "statements": [] "#).unwrap_err();
    assert!(matches!(err.kind(), PipelineErrorKind::Json(_)));
}

#[test]
fn test_unknown_statement_in_filter() {
    let source = r#"{
        "statements": [{ "name": "S", "iterators": ["i"], "bounds": [[0, 3]] }],
        "schedule": { "sequence": [{ "statements": ["T"] }] }
    }"#;
    let err = parse_scop(source).unwrap_err();
    assert!(matches!(err.kind(), PipelineErrorKind::Scop(_)));
}

#[test]
fn test_invalid_configuration() {
    let schedule = parse_scop(&copy_scop(8, 8)).unwrap();
    let options = PipelineOptions {
        config: OptimizerConfig::default().with_first_level_tile_sizes(vec![0], 32),
        target: None,
    };
    let err = optimize(schedule, &options).unwrap_err();
    assert!(matches!(err.kind(), PipelineErrorKind::Config(_)));
}

#[test]
fn test_invalid_tile_size_hint() {
    let schedule = parse_scop(&copy_scop(8, 8)).unwrap();
    let options = PipelineOptions {
        config: OptimizerConfig::default(),
        target: Some(TargetCostModel {
            tile_size_hints: vec![0, 8],
            ..TargetCostModel::default()
        }),
    };
    let err = optimize(schedule, &options).unwrap_err();
    assert!(matches!(err.kind(), PipelineErrorKind::Config(_)));
    assert_eq!(
        err.to_string(),
        "Invalid configuration: target tile size hints must be positive, got 0"
    );
}

#[test]
fn test_huge_domain_keeps_original_schedule() {
    let hi = 1_i64 << 40;
    let source = format!(
        r#"{{
            "statements": [{{
                "name": "S",
                "iterators": ["a", "b", "c", "d"],
                "bounds": [[0, {hi}], [0, {hi}], [0, {hi}], [0, {hi}]]
            }}],
            "schedule": {{ "band": {{ "members": [
                {{ "schedule": {{ "S": [1, 0, 0, 0, 0] }}, "permutable": true, "coincident": true }},
                {{ "schedule": {{ "S": [0, 1, 0, 0, 0] }}, "permutable": true, "coincident": true }},
                {{ "schedule": {{ "S": [0, 0, 1, 0, 0] }}, "permutable": true, "coincident": true }},
                {{ "schedule": {{ "S": [0, 0, 0, 1, 0] }}, "permutable": true, "coincident": true }}
            ] }} }}
        }}"#
    );
    let schedule = parse_scop(&source).unwrap();
    let result = optimize(schedule.clone(), &PipelineOptions::default()).unwrap();

    assert_eq!(result.stats.bands_tiled, 1);
    assert!(!result.accepted);
    assert_eq!(result.schedule, schedule);
}

#[test]
fn test_printed_schedules() {
    let schedule = parse_scop(&copy_scop(8, 8)).unwrap();
    insta::assert_snapshot!(schedule.to_string(), @r"
    domain: { copy[i, j] : 0 <= i <= 7 and 0 <= j <= 7 }
    band: { copy[i, j] -> [(i), (j)] } permutable: [1, 1] coincident: [1, 1]
      leaf
    ");

    let options = PipelineOptions {
        config: OptimizerConfig::default().with_tiling(false),
        target: None,
    };
    let result = optimize(schedule, &options).unwrap();
    insta::assert_snapshot!(result.schedule.to_string(), @r#"
    domain: { copy[i, j] : 0 <= i <= 7 and 0 <= j <= 7 }
    band: { copy[i, j] -> [(i)] } permutable: [1] coincident: [1]
      band: { copy[i, j] -> [(floor((j)/4))] } permutable: [1] coincident: [1] options: isolated
        mark: "SIMD"
          band: { copy[i, j] -> [((j) mod 4)] } permutable: [1] coincident: [1] options: no-unroll
            leaf
    "#);
}
