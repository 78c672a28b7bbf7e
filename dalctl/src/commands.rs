use serde_json::{Value, json};
use sql_dataaccess::DataAccessError;
use sql_dataaccess::driver::DriverRegistry;
use sql_dataaccess::engine::DataAccess;
use sql_dataaccess::paging::Pager;
use sql_dataaccess::parameters::ParameterCollection;
use tracing::info;

use crate::args::{Args, Cmd};

/// Run one subcommand and return what should be printed to stdout.
pub(crate) fn run(args: &Args) -> Result<Value, DataAccessError> {
    let descriptor = args.descriptor()?;
    info!(provider = %descriptor.provider, token = ?descriptor.parameter_token, "connecting");
    let access = DataAccess::from_registry(descriptor, &DriverRegistry::with_defaults())?;

    match &args.command {
        Cmd::Script {
            file,
            keep_comments,
            single,
        } => {
            let script = std::fs::read_to_string(file).map_err(|err| {
                DataAccessError::ConfigError(format!("cannot read {}: {err}", file.display()))
            })?;
            access.execute_script(&script, !keep_comments, !single)?;
            info!(file = %file.display(), "script committed");
            Ok(json!({ "ok": true }))
        }
        Cmd::Scalar { sql } => {
            let value = access.execute_scalar(&access.create_command_with(sql.as_str()))?;
            Ok(serde_json::to_value(value).unwrap_or(Value::Null))
        }
        Cmd::Count { sql } => {
            let value = access.execute_count(&access.create_command_with(sql.as_str()))?;
            Ok(serde_json::to_value(value).unwrap_or(Value::Null))
        }
        Cmd::Page {
            sql,
            order_by,
            page,
            size,
        } => page_json(&access, sql, order_by, *page, *size),
        Cmd::Schema { collection, table } => {
            let table = access.execute_schema(collection, &[table.clone()])?;
            Ok(table.to_json())
        }
    }
}

/// Pages an ad-hoc query; rows have no static type here, so they are emitted as JSON objects.
fn page_json(
    access: &DataAccess,
    sql: &str,
    order_by: &str,
    page_index: i64,
    page_size: i64,
) -> Result<Value, DataAccessError> {
    let result = Pager::new(sql, order_by)
        .with_page_size(page_size)
        .with_current_page(page_index)
        .fetch_rows(access, &ParameterCollection::new())?
        .map(|row| row.to_json());
    Ok(serde_json::to_value(result).unwrap_or(Value::Null))
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use clap::Parser;

    use super::*;

    fn args(db: &std::path::Path, rest: &[&str]) -> Args {
        let mut argv = vec!["dalctl", "--connection", db.to_str().unwrap()];
        argv.extend_from_slice(rest);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn script_then_page_and_count() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("books.db");
        let script = dir.path().join("seed.sql");
        std::fs::write(
            &script,
            "-- seed data\n\
             CREATE TABLE Books (BookId INTEGER, Title TEXT);\n\
             INSERT INTO Books VALUES (1, 'a'); INSERT INTO Books VALUES (2, 'b');\n\
             INSERT INTO Books VALUES (3, 'c; d');",
        )
        .unwrap();

        run(&args(&db, &["script", script.to_str().unwrap()])).unwrap();

        let count = run(&args(&db, &["count", "SELECT * FROM Books"])).unwrap();
        assert_eq!(count, json!(3));

        let paged = run(&args(
            &db,
            &["page", "select BookId, Title from Books", "--order-by", "BookId", "--page", "2", "--size", "2"],
        ))
        .unwrap();
        assert_eq!(paged["total_item_count"], json!(3));
        assert_eq!(paged["total_page_count"], json!(2));
        assert_eq!(paged["current_page_index"], json!(2));
        let rows = paged["rows"].as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["Title"], json!("c; d"));

        let unpaged = run(&args(
            &db,
            &["page", "SELECT BookId FROM Books", "--order-by", "BookId", "--size", "0"],
        ))
        .unwrap();
        assert_eq!(unpaged["total_page_count"], json!(1));
        assert_eq!(unpaged["rows"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn empty_script_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("books.db");
        let script = dir.path().join("empty.sql");
        std::fs::write(&script, "-- nothing here\n").unwrap();
        let err = run(&args(&db, &["script", script.to_str().unwrap()])).unwrap_err();
        assert!(matches!(err, DataAccessError::InvalidCommand(_)));
    }
}
