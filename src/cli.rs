use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "flatsql")]
#[command(author, version, about = "A small SQL engine over tables stored as flat delimited files")]
pub struct Cli {
    /// Directory holding one folder per database
    #[arg(env = "FLATSQL_ROOT", default_value = ".")]
    pub root: PathBuf,

    /// Database to select on start-up
    #[arg(short, long, env = "FLATSQL_DATABASE")]
    pub database: Option<String>,

    /// Execute `;`-terminated statements directly (non-interactive mode)
    #[arg(short, long, conflicts_with = "script")]
    pub query: Option<String>,

    /// Execute statements from a file (non-interactive mode)
    #[arg(short, long)]
    pub script: Option<PathBuf>,

    /// Output format for non-interactive mode
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,

    /// Cell delimiter of table files
    #[arg(long, default_value = ",")]
    pub delimiter: char,

    /// Log statements and storage operations to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Csv,
    Json,
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["flatsql", "/tmp/data"]).unwrap();
        assert_eq!(cli.root, PathBuf::from("/tmp/data"));
        assert_eq!(cli.format, OutputFormat::Table);
        assert_eq!(cli.delimiter, ',');
        assert!(cli.query.is_none() && cli.script.is_none());
    }

    #[test]
    fn test_batch_flags() {
        let cli = Cli::try_parse_from([
            "flatsql", "data", "-d", "shop", "-q", "SHOW TABLES;", "-f", "json", "--delimiter", ";",
        ])
        .unwrap();
        assert_eq!(cli.database.as_deref(), Some("shop"));
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.delimiter, ';');
        assert_eq!(cli.query.as_deref(), Some("SHOW TABLES;"));
    }

    #[test]
    fn test_query_and_script_conflict() {
        assert!(Cli::try_parse_from(["flatsql", "data", "-q", "SHOW TABLES;", "-s", "x.sql"]).is_err());
    }
}
