use std::path::{Path, PathBuf};
use std::{env, fs, io};

use indexmap::IndexMap;
use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct ConfigFile {
    pub url: Option<String>,
    #[serde(alias = "origin")]
    pub base_url: Option<String>,
    pub fields: Option<Vec<String>>,
    pub sort: Option<Vec<String>>,
    pub filters: Option<IndexMap<String, String>>,
    pub input_file: Option<String>,
    pub normalize: Option<String>,
    pub group_by: Option<String>,
    pub container: Option<String>,
    pub output: Option<String>,
    pub output_format: Option<String>,
    pub timeout: Option<usize>,
    pub workers: Option<usize>,
    pub proxy: Option<String>,
    pub headers: Option<Vec<String>>,
    pub escape: Option<bool>,
    pub no_color: Option<bool>,
}

fn home_dir() -> Option<PathBuf> {
    ["HOME", "USERPROFILE"]
        .into_iter()
        .find_map(env::var_os)
        .map(PathBuf::from)
        .or_else(|| {
            let mut home = PathBuf::from(env::var_os("HOMEDRIVE")?);
            home.push(env::var_os("HOMEPATH")?);
            Some(home)
        })
}

pub fn default_config_path() -> Option<PathBuf> {
    home_dir().map(|home| home.join(".grouplist/config.yml"))
}

/// Resolve a leading `~/` against the home directory. Paths without it, or
/// with no known home, come back unchanged.
pub fn expand_tilde(path: &str) -> PathBuf {
    let rest = match path.strip_prefix('~') {
        Some(rest) if rest.starts_with(['/', '\\']) => &rest[1..],
        _ => return PathBuf::from(path),
    };
    match home_dir() {
        Some(home) => home.join(rest),
        None => PathBuf::from(path),
    }
}

pub fn expand_tilde_string(path: &str) -> String {
    expand_tilde(path).display().to_string()
}

pub fn parse_config(contents: &str) -> Result<ConfigFile, String> {
    serde_yaml::from_str::<ConfigFile>(contents).map_err(|e| e.to_string())
}

/// Read the YAML config at `path`. With `allow_missing`, an absent file
/// yields the empty config.
pub fn load_config(path: &Path, allow_missing: bool) -> Result<ConfigFile, String> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return if allow_missing {
                Ok(ConfigFile::default())
            } else {
                Err(format!("config file not found '{}'", path.display()))
            };
        }
        Err(e) => return Err(format!("failed to read config '{}': {e}", path.display())),
    };
    parse_config(&contents).map_err(|e| format!("failed to parse config '{}': {e}", path.display()))
}

fn default_config_yaml() -> String {
    r#"# grouplist config
#
# Location (default):
#   ~/.grouplist/config.yml

# Data source (optional; without url the input_file records are rendered)
# url: https://api.example.com/people
# base_url: https://api.example.com
# input_file: ./people.json
# fields: [first, last]
# sort: [last]
# filters:
#   department: sales

# Pipeline
normalize: none
group_by: "initial:last"

# Output
container: list
# output: ./people.html
# output_format: page
escape: false
no_color: false

# HTTP
timeout: 10
workers: 2
# proxy: http://127.0.0.1:8080
# headers:
#   - "Authorization: Bearer <token>"
"#
    .to_string()
}

/// Write the commented default config unless a file is already there.
pub fn ensure_default_config_file(path: &Path) -> Result<(), String> {
    if path.is_file() {
        return Ok(());
    }
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .map_err(|e| format!("failed to create config directory '{}': {e}", dir.display()))?;
    }
    fs::write(path, default_config_yaml())
        .map_err(|e| format!("failed to write config file '{}': {e}", path.display()))
}
