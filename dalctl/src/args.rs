use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sql_dataaccess::DataAccessError;
use sql_dataaccess::config::{ConnectionDescriptor, DataSources};
use sql_dataaccess::translation::ParameterToken;

#[derive(Parser, Debug)]
#[command(author, version, about = "Run SQL scripts and queries through sql-dataaccess")]
pub(crate) struct Args {
    /// JSON file mapping data-source roles to connection descriptors.
    #[arg(long, requires = "role")]
    pub(crate) config: Option<PathBuf>,
    /// Role to use from `--config`.
    #[arg(long)]
    pub(crate) role: Option<String>,
    #[arg(long, default_value = "sqlite")]
    pub(crate) provider: String,
    /// Connection string, used when no `--config` is given.
    #[arg(long, conflicts_with = "config")]
    pub(crate) connection: Option<String>,
    /// Override the descriptor's parameter token.
    #[arg(long, value_enum)]
    pub(crate) token: Option<ParameterToken>,
    /// Also write logs to this file.
    #[arg(long)]
    pub(crate) log: Option<PathBuf>,
    #[arg(long, short)]
    pub(crate) verbose: bool,
    #[command(subcommand)]
    pub(crate) command: Cmd,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Cmd {
    /// Execute a SQL script file in one transaction.
    Script {
        file: PathBuf,
        #[arg(long)]
        keep_comments: bool,
        /// Send the file as one statement instead of splitting on `;`.
        #[arg(long)]
        single: bool,
    },
    /// Print the first column of the first row.
    Scalar { sql: String },
    /// Print the number of rows a query returns.
    Count { sql: String },
    /// Print one page of a query as JSON.
    Page {
        sql: String,
        #[arg(long)]
        order_by: String,
        #[arg(long, default_value_t = 1)]
        page: i64,
        #[arg(long, default_value_t = 10)]
        size: i64,
    },
    /// Print provider metadata (`Tables`, `Columns`) as JSON.
    Schema {
        collection: String,
        #[arg(long)]
        table: Option<String>,
    },
}

impl Args {
    pub(crate) fn descriptor(&self) -> Result<ConnectionDescriptor, DataAccessError> {
        let descriptor = match (&self.config, &self.connection) {
            (Some(path), _) => {
                let role = self.role.as_deref().unwrap_or_default();
                DataSources::from_path(path)?.get(role)?.clone()
            }
            (None, Some(connection)) => {
                ConnectionDescriptor::new(self.provider.clone(), connection.clone())
            }
            (None, None) => {
                return Err(DataAccessError::ConfigError(
                    "either --config/--role or --connection is required".into(),
                ));
            }
        };
        Ok(match self.token {
            Some(token) => descriptor.with_token(token),
            None => descriptor,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_connection_with_token() {
        let args = Args::try_parse_from([
            "dalctl",
            "--connection",
            "books.db",
            "--token",
            "colon",
            "scalar",
            "SELECT 1",
        ])
        .unwrap();
        let descriptor = args.descriptor().unwrap();
        assert_eq!(descriptor.provider, "sqlite");
        assert_eq!(descriptor.connection_string, "books.db");
        assert_eq!(descriptor.parameter_token, ParameterToken::Colon);
    }

    #[test]
    fn role_from_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sources.json");
        std::fs::write(
            &path,
            r#"{ "books": { "provider": "sqlite", "connection_string": "b.db", "parameter_token": "@" } }"#,
        )
        .unwrap();
        let args = Args::try_parse_from([
            "dalctl",
            "--config",
            path.to_str().unwrap(),
            "--role",
            "books",
            "count",
            "SELECT * FROM Books",
        ])
        .unwrap();
        let descriptor = args.descriptor().unwrap();
        assert_eq!(descriptor.connection_string, "b.db");
        assert_eq!(descriptor.parameter_token, ParameterToken::At);
    }

    #[test]
    fn missing_source_is_config_error() {
        let args = Args::try_parse_from(["dalctl", "scalar", "SELECT 1"]).unwrap();
        assert!(matches!(
            args.descriptor(),
            Err(DataAccessError::ConfigError(_))
        ));
        assert!(Args::try_parse_from(["dalctl", "--config", "x.json", "scalar", "SELECT 1"]).is_err());
    }
}
