/// Split repeated CLI values, each of which may be a comma-separated list.
/// Entries are trimmed; empty ones are kept so the request can reject them.
pub fn split_csv_values(values: &[String]) -> Vec<String> {
    values
        .iter()
        .flat_map(|value| value.split(','))
        .map(|item| item.trim().to_string())
        .collect()
}

pub fn parse_filter_pair(value: &str) -> Result<(String, String), String> {
    let (key, val) = value
        .split_once('=')
        .ok_or_else(|| "expected format KEY=VALUE".to_string())?;
    let key = key.trim();
    if key.is_empty() {
        return Err("filter key is empty".to_string());
    }
    Ok((key.to_string(), val.trim().to_string()))
}

pub fn parse_header(value: &str) -> Result<(String, String), String> {
    let (name, val) = value
        .split_once(':')
        .ok_or_else(|| "expected format 'Key: Value'".to_string())?;
    let name = name.trim();
    if name.is_empty() {
        return Err("header name is empty".to_string());
    }
    if name.contains(char::is_whitespace) {
        return Err(format!("header name '{name}' contains whitespace"));
    }
    Ok((name.to_string(), val.trim().to_string()))
}

pub fn is_valid_container_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == ':' || c == '.')
}
