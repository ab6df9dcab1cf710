use crate::cli::args::CliArgs;
use crate::output::OutputFormat;
use crate::transform::{Grouper, Normalizer};

pub fn validate(args: &CliArgs) -> Result<(), String> {
    for raw in args.filter.iter() {
        crate::utils::parse_filter_pair(raw).map_err(|e| format!("invalid --filter '{raw}': {e}"))?;
    }
    for raw in args.header.iter() {
        crate::utils::parse_header(raw).map_err(|e| format!("invalid --header '{raw}': {e}"))?;
    }
    if let Some(raw) = args.normalize.as_deref() {
        Normalizer::parse(raw).map_err(|e| format!("invalid --normalize '{raw}': {e}"))?;
    }
    if let Some(raw) = args.group_by.as_deref() {
        Grouper::parse(raw).map_err(|e| format!("invalid --group-by '{raw}': {e}"))?;
    }
    if let Some(raw) = args.output_format.as_deref() {
        if OutputFormat::parse(raw).is_none() {
            return Err(format!(
                "invalid --output-format '{raw}', expected fragment, page or json"
            ));
        }
    }
    if let Some(id) = args.container.as_deref() {
        if !crate::utils::is_valid_container_id(id) {
            return Err(format!("invalid --container '{id}'"));
        }
    }
    if args.timeout == Some(0) {
        return Err("invalid timeout, expected positive integer".to_string());
    }
    if args.workers == Some(0) {
        return Err("invalid workers, expected positive integer".to_string());
    }
    Ok(())
}
