//! API 入口测试：编译、加载、错误报告、日志

mod common;
use common::run_code;

use gscript_api::{
    compile_file, compile_file_strict, compile_str, default_commands, default_functions, execute, load,
    GscriptError, RunConfig,
};
use gscript_log::{Level, LogConfig};

fn temp_script(name: &str, text: &str) -> std::path::PathBuf {
    let path = std::env::temp_dir().join(format!("gscript-api-{}-{}.gs", std::process::id(), name));
    std::fs::write(&path, text).unwrap();
    path
}

#[test]
fn test_compile_file_and_run_loaded_bytes() {
    let path = temp_script("ok", "total = 0; for (i = 1; i <= 4; i++) total += i;");
    let config = RunConfig::default();

    let compiled = compile_file(&path, &default_commands(), &default_functions(), &config).unwrap();
    assert!(compiled.diagnostics.is_empty());

    // 写盘后的字节可以重新加载
    let program = load(&compiled.bytes).unwrap();
    assert_eq!(program, compiled.program);

    let output = execute(program, &config).unwrap();
    assert_eq!(output.context.primary_store().number("total"), Some(10.0));

    let _ = std::fs::remove_file(path);
}

#[test]
fn test_missing_file() {
    let err = compile_file(
        "/definitely/not/here.gs",
        &default_commands(),
        &default_functions(),
        &RunConfig::default(),
    )
    .unwrap_err();
    assert_eq!(err.phase(), "source");
    assert!(err.to_string().starts_with("couldn't open file:"), "{}", err);
}

#[test]
fn test_strict_file_reports_position() {
    let path = temp_script("bad", "a = 1;\nb = (2;\n");
    let err = compile_file_strict(&path, &default_commands(), &default_functions(), &RunConfig::default())
        .unwrap_err();

    assert!(matches!(err, GscriptError::Diagnostics(_)));
    assert_eq!(err.line(), Some(2));
    let report = err.to_report();
    assert!(report.to_string().starts_with("[2:"), "{}", report);

    let _ = std::fs::remove_file(path);
}

#[test]
fn test_runtime_error_report() {
    let err = run_code("x = nosuch();").unwrap_err();
    assert_eq!(err.phase(), "runtime");
    assert_eq!(err.to_report().to_string(), "runtime error: unknown function 'nosuch'");
}

#[test]
fn test_compile_error_report() {
    let err = run_code("\n  5 = 1;").unwrap_err();
    assert_eq!(err.phase(), "compiler");
    assert_eq!(err.line(), Some(2));
}

#[test]
fn test_limits_applied() {
    let config = RunConfig {
        limits: gscript_api::LimitConfig {
            max_array_len: 8,
            ..Default::default()
        },
        ..RunConfig::default()
    };
    let err = gscript_api::run("a[8] = 1;", &config).unwrap_err();
    assert!(matches!(err, GscriptError::Runtime(_)));
}

#[test]
fn test_output_is_logged() {
    let (logger, ring) = LogConfig::new(Level::Info).with_ring_buffer(32).init();
    let ring = ring.unwrap();
    let config = RunConfig::default().with_logger(logger);

    gscript_api::run("message hi there;", &config).unwrap();
    assert_eq!(ring.messages("gscript::output"), vec!["hi there".to_string()]);
}

#[test]
fn test_dump_bytecode_logs_listing() {
    let (logger, ring) = LogConfig::test().init();
    let ring = ring.unwrap();
    let config = RunConfig {
        dump_bytecode: true,
        ..RunConfig::default().with_logger(logger)
    };

    let compiled = compile_str("a = 1;", &default_commands(), &default_functions(), &config).unwrap();
    assert_eq!(compiled.program.strings(), &["a".to_string()]);

    let messages = ring.messages("gscript::compiler");
    assert!(messages.iter().any(|m| m.contains("ASSIGN")), "{:?}", messages);
}
