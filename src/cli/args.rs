use clap::{ArgAction, Parser};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "grouplist",
    version,
    about = "render grouped record lists as nested HTML lists",
    long_about = "grouplist fetches (or loads) a list of records, normalizes and groups them, and renders the groups as nested HTML lists inside a container element.\n\nExamples:\n  grouplist -i people.json -N split-name -G initial:last\n  grouplist -u https://api.example.com/people -f first,last -s last -F team=core\n  grouplist -i debts.json -N split-name -G field:debt -A page -o debts.html\n\nTip: Use --config to persist settings and keep CLI invocations short."
)]
pub struct CliArgs {
    #[arg(
        short = 'v',
        long = "vb",
        visible_alias = "verbose",
        action = ArgAction::Count,
        help_heading = "Output",
        help = "Increase log verbosity (-v, -vv, -vvv). RUST_LOG takes precedence."
    )]
    pub verbose: u8,

    #[arg(
        short = 'n',
        long = "nc",
        visible_alias = "no-color",
        help_heading = "Output",
        help = "Disable colored summary output."
    )]
    pub no_color: bool,

    #[arg(
        short = 'u',
        long = "u",
        visible_alias = "url",
        value_name = "URL",
        help_heading = "Source",
        help = "Endpoint returning a JSON envelope {\"results\": [...]}."
    )]
    pub url: Option<String>,

    #[arg(
        short = 'b',
        long = "bu",
        visible_aliases = ["base-url", "origin"],
        value_name = "URL",
        help_heading = "Source",
        help = "Origin used to resolve a relative --url."
    )]
    pub base_url: Option<String>,

    #[arg(
        short = 'f',
        long = "fld",
        visible_alias = "field",
        value_name = "FIELDS",
        action = ArgAction::Append,
        help_heading = "Source",
        help = "Fields to request (repeatable or comma-separated)."
    )]
    pub field: Vec<String>,

    #[arg(
        short = 's',
        long = "srt",
        visible_alias = "sort",
        value_name = "KEYS",
        action = ArgAction::Append,
        help_heading = "Source",
        help = "Sort keys to request (repeatable or comma-separated)."
    )]
    pub sort: Vec<String>,

    #[arg(
        short = 'F',
        long = "flt",
        visible_alias = "filter",
        value_name = "KEY=VALUE",
        action = ArgAction::Append,
        help_heading = "Source",
        help = "Filter query parameter (repeatable)."
    )]
    pub filter: Vec<String>,

    #[arg(
        short = 'i',
        long = "if",
        visible_alias = "input-file",
        value_name = "FILE",
        help_heading = "Source",
        help = "JSON array of initial records (kept when the fetch fails)."
    )]
    pub input_file: Option<String>,

    #[arg(
        short = 'C',
        long = "cfg",
        visible_alias = "config",
        value_name = "FILE",
        help_heading = "Source",
        help = "Path to config file (defaults to ~/.grouplist/config.yml)."
    )]
    pub config: Option<String>,

    #[arg(
        long = "init-config",
        help_heading = "Source",
        help = "Write a default config file to ~/.grouplist/config.yml if missing, then exit."
    )]
    pub init_config: bool,

    #[arg(
        short = 'N',
        long = "nm",
        visible_alias = "normalize",
        value_name = "STRATEGY",
        help_heading = "Pipeline",
        help = "Normalize strategy: none, split-name[:FIELD]."
    )]
    pub normalize: Option<String>,

    #[arg(
        short = 'G',
        long = "gb",
        visible_alias = "group-by",
        value_name = "STRATEGY",
        help_heading = "Pipeline",
        help = "Group strategy: initial:FIELD or field:FIELD."
    )]
    pub group_by: Option<String>,

    #[arg(
        short = 'k',
        long = "ct",
        visible_alias = "container",
        value_name = "ID",
        help_heading = "Output",
        help = "Id of the container element that receives the list."
    )]
    pub container: Option<String>,

    #[arg(
        short = 'o',
        long = "out",
        visible_alias = "output",
        value_name = "FILE",
        help_heading = "Output",
        help = "Write the result to a file instead of stdout."
    )]
    pub output: Option<String>,

    #[arg(
        short = 'A',
        long = "of",
        visible_alias = "output-format",
        value_name = "FORMAT",
        help_heading = "Output",
        help = "Output format (fragment, page, json)."
    )]
    pub output_format: Option<String>,

    #[arg(
        short = 'e',
        long = "esc",
        visible_alias = "escape",
        help_heading = "Output",
        help = "HTML-escape record content (inserted verbatim by default)."
    )]
    pub escape: bool,

    #[arg(
        short = 'T',
        long = "to",
        visible_alias = "timeout",
        value_name = "SECONDS",
        help_heading = "HTTP",
        help = "Request timeout in seconds."
    )]
    pub timeout: Option<usize>,

    #[arg(
        short = 'p',
        long = "px",
        visible_alias = "proxy",
        value_name = "URL",
        help_heading = "HTTP",
        help = "HTTP proxy URL (e.g. http://127.0.0.1:8080)."
    )]
    pub proxy: Option<String>,

    #[arg(
        short = 'H',
        long = "hdr",
        visible_alias = "header",
        value_name = "HEADER",
        action = ArgAction::Append,
        help_heading = "HTTP",
        help = "Add a request header (format: 'Key: Value', repeatable)."
    )]
    pub header: Vec<String>,

    #[arg(
        short = 'w',
        long = "wrk",
        visible_alias = "workers",
        value_name = "N",
        help_heading = "Performance",
        help = "Number of runtime worker threads."
    )]
    pub workers: Option<usize>,
}
