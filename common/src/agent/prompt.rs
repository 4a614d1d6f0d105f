use crate::table::Table;

pub const QUERY_PREFIX: &str = "SELECT";

pub const DIALECT_HEADER: &str = "### SQLite tables, with their properties:";

/// rendered prompt plus the fragment the model's continuation is appended to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub text: String,
    pub query_prefix: String,
}

/// render one `# name(col1, col2)` line; single columns render as `(col)`
fn schema_line<S: AsRef<str>>(name: &str, columns: &[S]) -> String {
    let columns: Vec<&str> = columns.iter().map(|c| c.as_ref()).collect();
    format!("# {}({})", name, columns.join(", "))
}

pub fn build_prompt<'a, I, S>(request: &str, tables: I) -> Prompt
where
    I: IntoIterator<Item = (&'a str, &'a [S])>,
    S: AsRef<str> + 'a,
{
    let mut lines = vec![DIALECT_HEADER.to_string(), "#".to_string()];

    for (name, columns) in tables {
        lines.push(schema_line(name, columns));
    }

    lines.push("#".to_string());
    lines.push(format!("### A query to {}", request));
    lines.push(QUERY_PREFIX.to_string());

    Prompt {
        text: lines.join("\n"),
        query_prefix: QUERY_PREFIX.to_string(),
    }
}

/// build a prompt straight from loaded tables
pub fn build_table_prompt(request: &str, tables: &[Table]) -> Prompt {
    build_prompt(
        request,
        tables.iter().map(|t| (t.name.as_str(), t.columns.as_slice())),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_prompt() {
        let columns = vec!["id".to_string(), "amount".to_string()];
        let prompt = build_prompt("total amount by id", [("orders", columns.as_slice())]);

        assert_eq!(
            prompt.text,
            "### SQLite tables, with their properties:\n\
             #\n\
             # orders(id, amount)\n\
             #\n\
             ### A query to total amount by id\n\
             SELECT"
        );
        assert_eq!(prompt.query_prefix, "SELECT");
        assert!(prompt.text.ends_with(&prompt.query_prefix));
    }

    #[test]
    fn test_single_column_has_no_trailing_comma() {
        let prompt = build_prompt("list ids", [("ids", &["id"][..])]);
        assert!(prompt.text.contains("\n# ids(id)\n"));
        assert!(!prompt.text.contains("(id,)"));
    }

    #[test]
    fn test_tables_keep_order() {
        let a = ["x"];
        let b = ["y", "z"];
        let prompt = build_prompt("q", [("b", &b[..]), ("a", &a[..])]);

        let b_at = prompt.text.find("# b(y, z)").unwrap();
        let a_at = prompt.text.find("# a(x)").unwrap();
        assert!(b_at < a_at);
    }

    #[test]
    fn test_no_tables() {
        let none: [(&str, &[&str]); 0] = [];
        let prompt = build_prompt("anything", none);
        assert_eq!(prompt.text.lines().count(), 5);
    }
}
