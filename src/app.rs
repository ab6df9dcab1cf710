use clap::{error::ErrorKind, CommandFactory, Parser};
use colored::Colorize;
use indexmap::IndexMap;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use crate::cli::args::CliArgs;
use crate::cli::validation;
use crate::config::{self, ConfigFile};
use crate::output::{self, OutputFormat};
use crate::render::RenderOptions;
use crate::runner::{Options, RecordSource, RunResult, Runner};
use crate::source::{FetchRequest, HttpSettings};
use crate::transform::{Grouper, Normalizer};

#[derive(Clone, Debug)]
struct RunConfig {
    verbose: u8,
    no_color: bool,
    workers: usize,
    output: Option<String>,
    output_format: OutputFormat,
    options: Options,
}

fn format_kv_line(label: &str, value: &str, no_color: bool) {
    if no_color {
        eprintln!(":: {:<10}: {}", label, value);
    } else {
        eprintln!(":: {:<10}: {}", label.bold(), value.cyan());
    }
}

fn build_fetch_request(
    args: &CliArgs,
    cfg: &ConfigFile,
) -> Result<Option<FetchRequest>, String> {
    let url = match args.url.clone().or_else(|| cfg.url.clone()) {
        Some(url) if !url.trim().is_empty() => url.trim().to_string(),
        _ => return Ok(None),
    };

    let fields = if args.field.is_empty() {
        cfg.fields.clone().unwrap_or_default()
    } else {
        crate::utils::split_csv_values(&args.field)
    };
    let sort = if args.sort.is_empty() {
        cfg.sort.clone().unwrap_or_default()
    } else {
        crate::utils::split_csv_values(&args.sort)
    };
    let filters = if args.filter.is_empty() {
        cfg.filters.clone().unwrap_or_default()
    } else {
        let mut filters = IndexMap::new();
        for raw in args.filter.iter() {
            let (key, value) = crate::utils::parse_filter_pair(raw)
                .map_err(|e| format!("invalid --filter '{raw}': {e}"))?;
            filters.insert(key, value);
        }
        filters
    };

    let request = FetchRequest {
        url,
        base_url: args.base_url.clone().or_else(|| cfg.base_url.clone()),
        fields,
        sort,
        filters,
    };
    request
        .validate()
        .map_err(|e| format!("invalid fetch request: {e}"))?;
    Ok(Some(request))
}

fn build_run_config(args: CliArgs, cfg: ConfigFile) -> Result<RunConfig, String> {
    validation::validate(&args)?;

    let no_color = args.no_color || cfg.no_color.unwrap_or(false);
    let escape = args.escape || cfg.escape.unwrap_or(false);
    let timeout = args.timeout.or(cfg.timeout).unwrap_or(10);
    if timeout == 0 {
        return Err("invalid timeout, expected positive integer".to_string());
    }
    let workers = args.workers.or(cfg.workers).unwrap_or(2);
    if workers == 0 {
        return Err("invalid workers, expected positive integer".to_string());
    }
    let proxy = args.proxy.clone().or_else(|| cfg.proxy.clone());

    let raw_headers = if args.header.is_empty() {
        cfg.headers.clone().unwrap_or_default()
    } else {
        args.header.clone()
    };
    let mut headers = Vec::with_capacity(raw_headers.len());
    for raw in raw_headers.iter() {
        headers.push(
            crate::utils::parse_header(raw).map_err(|e| format!("invalid header '{raw}': {e}"))?,
        );
    }

    let fetch = build_fetch_request(&args, &cfg)?;

    let initial = match args.input_file.clone().or_else(|| cfg.input_file.clone()) {
        Some(path) if !path.trim().is_empty() => RecordSource::FilePath(path),
        _ => RecordSource::default(),
    };
    if fetch.is_none() && matches!(initial, RecordSource::Inline(_)) {
        return Err("no records source: provide --url and/or --input-file".to_string());
    }

    let normalize_raw = args
        .normalize
        .clone()
        .or_else(|| cfg.normalize.clone())
        .unwrap_or_else(|| "none".to_string());
    let normalizer = Normalizer::parse(&normalize_raw)
        .map_err(|e| format!("invalid normalize '{normalize_raw}': {e}"))?;

    let group_raw = args
        .group_by
        .clone()
        .or_else(|| cfg.group_by.clone())
        .unwrap_or_else(|| "initial:last".to_string());
    let grouper =
        Grouper::parse(&group_raw).map_err(|e| format!("invalid group-by '{group_raw}': {e}"))?;

    let container_id = args
        .container
        .clone()
        .or_else(|| cfg.container.clone())
        .unwrap_or_else(|| "list".to_string());

    let output = args
        .output
        .clone()
        .or_else(|| cfg.output.clone())
        .filter(|p| !p.trim().is_empty())
        .map(|p| config::expand_tilde_string(&p));
    let output_format = match args.output_format.clone().or_else(|| cfg.output_format.clone()) {
        Some(raw) => OutputFormat::parse(&raw).ok_or_else(|| {
            format!("invalid output format '{raw}', expected fragment, page or json")
        })?,
        None => output
            .as_deref()
            .and_then(output::infer_format_from_path)
            .unwrap_or_default(),
    };

    Ok(RunConfig {
        verbose: args.verbose,
        no_color,
        workers,
        output,
        output_format,
        options: Options {
            initial,
            fetch,
            http: HttpSettings {
                timeout_seconds: timeout,
                proxy,
                headers,
                ..HttpSettings::default()
            },
            normalizer,
            grouper,
            container_id,
            render: RenderOptions { escape },
        },
    })
}

fn print_summary(run: &RunConfig, result: &RunResult) {
    if let Some(request) = run.options.fetch.as_ref() {
        format_kv_line("Source", &request.url, run.no_color);
    }
    format_kv_line("Records", &result.records.len().to_string(), run.no_color);
    format_kv_line("Groups", &result.groups.len().to_string(), run.no_color);
    if let Some(path) = run.output.as_deref() {
        format_kv_line("Output", path, run.no_color);
    }
    format_kv_line(
        "Elapsed",
        &format!("{}ms", result.elapsed.as_millis()),
        run.no_color,
    );
}

async fn run_async(run: RunConfig) -> Result<(), String> {
    let runner = Runner::new(run.options.clone()).map_err(|e| e.to_string())?;
    let result = runner.run().await.map_err(|e| e.to_string())?;

    let rendered = output::render(
        run.output_format,
        &result.container,
        &result.records,
        &result.groups,
    )
    .map_err(|e| format!("failed to render output: {e}"))?;

    match run.output.as_deref() {
        Some(path) => {
            let mut outfile = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(path)
                .await
                .map_err(|e| format!("failed to open output file: {e}"))?;
            outfile
                .write_all(&rendered)
                .await
                .map_err(|e| format!("failed to write output file: {e}"))?;
        }
        None => {
            let mut stdout = tokio::io::stdout();
            stdout
                .write_all(&rendered)
                .await
                .map_err(|e| format!("failed to write output: {e}"))?;
            stdout
                .flush()
                .await
                .map_err(|e| format!("failed to write output: {e}"))?;
        }
    }

    print_summary(&run, &result);
    Ok(())
}

pub fn run_cli() -> Result<(), String> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp => {
                print!("{e}");
                return Ok(());
            }
            ErrorKind::DisplayVersion => {
                let cmd = CliArgs::command();
                print!("{}", cmd.render_version());
                return Ok(());
            }
            _ => return Err(e.to_string()),
        },
    };

    if args.init_config {
        let path = config::default_config_path()
            .ok_or_else(|| "cannot determine home directory".to_string())?;
        config::ensure_default_config_file(&path)?;
        println!("{}", path.display());
        return Ok(());
    }

    let cfg = match args.config.as_deref() {
        Some(path) => config::load_config(&config::expand_tilde(path), false)?,
        None => match config::default_config_path() {
            Some(path) => config::load_config(&path, true)?,
            None => ConfigFile::default(),
        },
    };

    let run = build_run_config(args, cfg)?;
    crate::logging::init(run.verbose);

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(run.workers)
        .build()
        .map_err(|e| format!("failed to build runtime: {e}"))?;

    rt.block_on(run_async(run))
}
