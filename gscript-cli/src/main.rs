//! GScript CLI - Command line interface
//!
//! 接受项目文件（`*.json`）、源码脚本或编译好的字节码容器（`*.gsc`）。

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, ValueEnum};
use gscript_api::{
    compile_str, default_commands, default_functions, execute, init_config, load, GscriptError,
    PrototypeMap, RunConfig,
};
use gscript_core::{Program, SourceError};

mod config;
mod dump;
mod logging;
mod platform;

use crate::config::{LogConfig, ProjectFile, ProjectOptions};
use crate::logging::LogFormat;
use crate::platform::{print_diagnostics, print_error_with_source};

/// 字节码输出格式
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum DumpFormat {
    /// 反汇编文本
    Listing,
    /// JSON（工具集成）
    Json,
}

#[derive(Parser)]
#[command(name = "gscript", about = "GScript - compile and run scripts", version = "0.1.0")]
struct Cli {
    /// Project file, script or compiled bytecode (default: ./gscript.json)
    #[arg(value_name = "PATH", default_value = "gscript.json")]
    path: PathBuf,

    /// Compile without executing
    #[arg(long)]
    compile_only: bool,

    /// Write the compiled container to this file
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Print the bytecode to stdout
    #[arg(long, value_enum, value_name = "FORMAT")]
    dump: Option<DumpFormat>,

    /// Trace every executed instruction
    #[arg(long)]
    show_steps: bool,

    /// Print the source before running
    #[arg(long)]
    show_source: bool,

    /// Global log level (error, warn, info, debug, trace)
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<tracing::Level>,

    #[arg(long, value_enum, default_value = "compact")]
    log_format: LogFormat,

    /// Append logs to this file instead of stderr
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,
}

/// 待处理的输入
enum Input {
    Script {
        path: PathBuf,
        project: Option<ProjectFile>,
    },
    Bytecode(PathBuf),
}

fn main() {
    let cli = Cli::parse();

    let input = match resolve_input(&cli.path) {
        Ok(input) => input,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let project = match &input {
        Input::Script { project, .. } => project.as_ref(),
        Input::Bytecode(_) => None,
    };

    let options = merge_options(&cli, project.map(|p| &p.options));
    let mut log_config = project.map(|p| LogConfig::from_section(&p.log)).unwrap_or_default();
    if let Some(level) = cli.log_level {
        log_config.global = level;
    }
    // 单步输出走 vm 的 trace 日志
    if options.show_steps && log_config.vm.is_none() {
        log_config.vm = Some(tracing::Level::TRACE);
    }
    let logger = match logging::init(&log_config, cli.log_format, cli.log_file.as_deref()) {
        Ok(logger) => logger,
        Err(e) => {
            eprintln!("Error: cannot open log file: {}", e);
            process::exit(1);
        }
    };

    let run_config = RunConfig {
        show_steps: options.show_steps,
        // 文本形式的字节码由 CLI 自己打印
        dump_bytecode: false,
        compiler: project.map(|p| p.compiler.clone()).unwrap_or_default(),
        limits: project.map(|p| p.limits.clone()).unwrap_or_default(),
        logger,
    };
    tracing::debug!(target: "gscript::cli", config = ?run_config, "configuration loaded");

    // 全局单例仅供便捷入口使用，这里只会初始化一次
    init_config(run_config.clone());

    let code = match input {
        Input::Script { path, project } => {
            handle_script(&cli, &path, project.as_ref(), &options, &run_config)
        }
        Input::Bytecode(path) => handle_bytecode(&cli, &path, &options, &run_config),
    };
    process::exit(code);
}

/// `.json` 为项目文件，`.gsc` 为字节码，其余按脚本处理
fn resolve_input(path: &Path) -> Result<Input, String> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => {
            let project = ProjectFile::read(path)?;
            Ok(Input::Script {
                path: project.entry_path(path),
                project: Some(project),
            })
        }
        Some("gsc") => Ok(Input::Bytecode(path.to_path_buf())),
        _ => Ok(Input::Script {
            path: path.to_path_buf(),
            project: None,
        }),
    }
}

/// 命令行开关与项目文件选项取或
fn merge_options(cli: &Cli, project: Option<&ProjectOptions>) -> ProjectOptions {
    let project_flag = |f: fn(&ProjectOptions) -> bool| project.map(f).unwrap_or(false);
    ProjectOptions {
        compile_only: cli.compile_only || project_flag(|o| o.compile_only),
        dump_bytecode: cli.dump.is_some() || project_flag(|o| o.dump_bytecode),
        show_steps: cli.show_steps || project_flag(|o| o.show_steps),
        show_source: cli.show_source || project_flag(|o| o.show_source),
    }
}

fn prototypes(project: Option<&ProjectFile>) -> (PrototypeMap, PrototypeMap) {
    match project.and_then(|p| p.prototypes.as_ref()) {
        Some(prototypes) => (prototypes.commands.clone(), prototypes.functions.clone()),
        None => (default_commands(), default_functions()),
    }
}

fn handle_script(
    cli: &Cli,
    path: &Path,
    project: Option<&ProjectFile>,
    options: &ProjectOptions,
    config: &RunConfig,
) -> i32 {
    let source = match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            let error = GscriptError::Source(SourceError::Open {
                path: path.display().to_string(),
                source: e,
            });
            print_error_with_source(&error, None);
            return 1;
        }
    };

    if options.show_source {
        println!("[Source]");
        for (i, line) in source.lines().enumerate() {
            println!("{:3} | {}", i + 1, line);
        }
    }

    let (commands, functions) = prototypes(project);
    let output = match compile_str(&source, &commands, &functions, config) {
        Ok(output) => output,
        Err(e) => {
            print_error_with_source(&e, Some(&source));
            return 1;
        }
    };

    print_diagnostics(&output.diagnostics, &source);
    if output.has_errors() {
        return 1;
    }
    tracing::info!(
        target: "gscript::cli",
        file = %path.display(),
        bytes = output.bytes.len(),
        "compilation successful"
    );

    if let Some(out_path) = &cli.output {
        if let Err(e) = std::fs::write(out_path, &output.bytes) {
            eprintln!("Error: cannot write '{}': {}", out_path.display(), e);
            return 1;
        }
    }
    if options.dump_bytecode {
        dump_program(&output.program, cli.dump.unwrap_or(DumpFormat::Listing), path);
    }
    if options.compile_only {
        return 0;
    }

    run_program(output.program, config, Some(&source))
}

fn handle_bytecode(cli: &Cli, path: &Path, options: &ProjectOptions, config: &RunConfig) -> i32 {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Error: cannot read '{}': {}", path.display(), e);
            return 1;
        }
    };

    let program = match load(&bytes) {
        Ok(program) => program,
        Err(e) => {
            print_error_with_source(&e, None);
            return 1;
        }
    };

    if options.dump_bytecode {
        dump_program(&program, cli.dump.unwrap_or(DumpFormat::Listing), path);
    }
    if options.compile_only {
        return 0;
    }

    run_program(program, config, None)
}

fn dump_program(program: &Program, format: DumpFormat, path: &Path) {
    match format {
        DumpFormat::Listing => print!("{}", program.disassemble()),
        DumpFormat::Json => {
            let name = path.file_stem().and_then(|s| s.to_str()).unwrap_or("main");
            let value = dump::program_json(program, name);
            match serde_json::to_string_pretty(&value) {
                Ok(text) => println!("{}", text),
                Err(e) => eprintln!("Error: cannot serialize bytecode: {}", e),
            }
        }
    }
}

fn run_program(program: Program, config: &RunConfig, source: Option<&str>) -> i32 {
    match execute(program, config) {
        Ok(result) => {
            for line in &result.output {
                println!("{}", line);
            }
            0
        }
        Err(e) => {
            print_error_with_source(&e, source);
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_flags() {
        let cli = Cli::try_parse_from([
            "gscript",
            "demo.gs",
            "--compile-only",
            "-o",
            "demo.gsc",
            "--dump",
            "json",
            "--log-level",
            "debug",
        ])
        .unwrap();

        assert_eq!(cli.path, PathBuf::from("demo.gs"));
        assert!(cli.compile_only);
        assert_eq!(cli.output, Some(PathBuf::from("demo.gsc")));
        assert_eq!(cli.dump, Some(DumpFormat::Json));
        assert_eq!(cli.log_level, Some(tracing::Level::DEBUG));
        assert_eq!(cli.log_format, LogFormat::Compact);
    }

    #[test]
    fn test_default_path_is_project_file() {
        let cli = Cli::try_parse_from(["gscript"]).unwrap();
        assert_eq!(cli.path, PathBuf::from("gscript.json"));
    }

    #[test]
    fn test_resolve_input_by_extension() {
        assert!(matches!(resolve_input(Path::new("a.gsc")), Ok(Input::Bytecode(_))));
        assert!(matches!(
            resolve_input(Path::new("a.gs")),
            Ok(Input::Script { project: None, .. })
        ));
        assert!(resolve_input(Path::new("/definitely/missing/gscript.json")).is_err());
    }

    #[test]
    fn test_merge_options() {
        let cli = Cli::try_parse_from(["gscript", "a.gs", "--show-steps"]).unwrap();
        let project = ProjectOptions {
            compile_only: true,
            ..ProjectOptions::default()
        };
        let options = merge_options(&cli, Some(&project));
        assert!(options.compile_only);
        assert!(options.show_steps);
        assert!(!options.dump_bytecode);
    }
}
