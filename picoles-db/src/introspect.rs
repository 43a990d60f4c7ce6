//! Schema introspection: which tables hold foreign keys to a given table

use picoles_core::Backend;
use sqlx::AnyConnection;

use crate::error::DbResult;

const EMBEDDED_REFERENCING: &str = r#"
SELECT DISTINCT m.name
FROM sqlite_master AS m, pragma_foreign_key_list(m.name) AS p
WHERE m.type = 'table' AND p."table" = $1 AND m.name <> $1
ORDER BY m.name
"#;

const NETWORKED_REFERENCING: &str = r#"
SELECT DISTINCT tc.table_name::text
FROM information_schema.table_constraints AS tc
JOIN information_schema.constraint_column_usage AS ccu
  ON tc.constraint_name = ccu.constraint_name
 AND tc.table_schema = ccu.table_schema
WHERE tc.constraint_type = 'FOREIGN KEY'
  AND ccu.table_name::text = $1
  AND tc.table_name::text <> $1
ORDER BY 1
"#;

/// Names of the tables declaring a foreign key to `table`, sorted.
pub async fn tables_referencing(
    conn: &mut AnyConnection,
    backend: Backend,
    table: &str,
) -> DbResult<Vec<String>> {
    let sql = match backend {
        Backend::Embedded => EMBEDDED_REFERENCING,
        Backend::Networked => NETWORKED_REFERENCING,
    };

    let rows: Vec<(String,)> = sqlx::query_as(sql).bind(table).fetch_all(conn).await?;
    Ok(rows.into_iter().map(|(name,)| name).collect())
}
