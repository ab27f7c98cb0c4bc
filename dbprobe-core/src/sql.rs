//! SQL text helpers.
//!
//! Only identifiers ever reach SQL text, and always bracket-quoted.
//! Values go through [`crate::executor::QueryParam`].

/// System catalogs skipped unless explicitly requested.
pub const SYSTEM_CATALOGS: [&str; 4] = ["master", "tempdb", "model", "msdb"];

/// Lists every catalog on the server.
pub const LIST_CATALOGS: &str = "SELECT name FROM master.dbo.sysdatabases ORDER BY 1";

/// Lists the `(schema, table, column)` triples of `catalog`.
///
/// The view is catalog-qualified so the result never depends on the
/// session's current database. Image columns cannot be cast to character
/// types and are left out.
///
/// ```rust
/// use dbprobe_core::sql::list_columns;
///
/// assert!(list_columns("Sales").contains("FROM [Sales].INFORMATION_SCHEMA.COLUMNS"));
/// ```
pub fn list_columns(catalog: &str) -> String {
    format!(
        "SELECT TABLE_SCHEMA, TABLE_NAME, COLUMN_NAME \
         FROM {}.INFORMATION_SCHEMA.COLUMNS \
         WHERE DATA_TYPE <> 'image' \
         ORDER BY 1, 2, 3",
        quote_identifier(catalog)
    )
}

/// `EXEC [catalog].sys.sp_help @P1`
///
/// A catalog-qualified system procedure runs in that catalog, so the
/// two-part object name bound to `@P1` resolves there.
pub fn describe_object(catalog: &str) -> String {
    format!("EXEC {}.sys.sp_help @P1", quote_identifier(catalog))
}

/// Quotes an identifier with brackets, doubling any `]`.
///
/// ```rust
/// use dbprobe_core::sql::quote_identifier;
///
/// assert_eq!(quote_identifier("Orders"), "[Orders]");
/// assert_eq!(quote_identifier("odd]name"), "[odd]]name]");
/// ```
pub fn quote_identifier(identifier: &str) -> String {
    format!("[{}]", identifier.replace(']', "]]"))
}

/// Quotes each part and joins them with dots.
pub fn quote_multipart(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|part| quote_identifier(part))
        .collect::<Vec<_>>()
        .join(".")
}

/// `USE [catalog]`
pub fn use_catalog(catalog: &str) -> String {
    format!("USE {}", quote_identifier(catalog))
}

/// `CAST([column] AS VARCHAR(width))`
pub fn cast_to_varchar(column: &str, width: u32) -> String {
    format!("CAST({} AS VARCHAR({}))", quote_identifier(column), width)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_identifier_plain() {
        assert_eq!(quote_identifier("dbo"), "[dbo]");
        assert_eq!(quote_identifier("Order Details"), "[Order Details]");
    }

    #[test]
    fn test_quote_identifier_escapes_closing_bracket() {
        assert_eq!(quote_identifier("a]b"), "[a]]b]");
        assert_eq!(quote_identifier("x]; DROP TABLE t; --"), "[x]]; DROP TABLE t; --]");
        // An opening bracket needs no escaping
        assert_eq!(quote_identifier("[x"), "[[x]");
    }

    #[test]
    fn test_quote_multipart() {
        assert_eq!(
            quote_multipart(&["Sales", "dbo", "Orders"]),
            "[Sales].[dbo].[Orders]"
        );
    }

    #[test]
    fn test_use_and_cast() {
        assert_eq!(use_catalog("Sales"), "USE [Sales]");
        assert_eq!(cast_to_varchar("Status", 80), "CAST([Status] AS VARCHAR(80))");
    }

    #[test]
    fn test_discovery_queries() {
        let columns = list_columns("Sales");
        assert!(columns.contains("FROM [Sales].INFORMATION_SCHEMA.COLUMNS"));
        assert!(columns.contains("DATA_TYPE <> 'image'"));
        assert!(columns.ends_with("ORDER BY 1, 2, 3"));
        assert!(LIST_CATALOGS.contains("sysdatabases"));
    }

    #[test]
    fn test_discovery_quotes_catalog() {
        assert!(list_columns("odd]cat").contains("FROM [odd]]cat].INFORMATION_SCHEMA"));
        assert_eq!(describe_object("HR"), "EXEC [HR].sys.sp_help @P1");
        assert_eq!(describe_object("a]b"), "EXEC [a]]b].sys.sp_help @P1");
    }
}
