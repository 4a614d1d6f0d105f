use crate::error::{QueryMeError, Result};
use once_cell::sync::Lazy;
use regex::Regex;

/// models sometimes keep generating after closing a code block
pub const CLOSING_MARKER: &str = "</code>";

static STATEMENT_SHAPE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)^\s*select\s+\S").unwrap()
});

/// keep the text before the closing marker, flatten it to one line
pub fn clean_fragment(generated: &str) -> String {
    let fragment = generated.split(CLOSING_MARKER).next().unwrap_or_default();

    fragment
        .replace(['\r', '\n'], " ")
        .trim_end()
        .to_string()
}

/// column names of a generated select list, with any `table.` qualifier stripped
pub fn derive_columns(fragment: &str) -> Vec<String> {
    let select_list = fragment.split("FROM").next().unwrap_or_default().trim();

    select_list
        .split(", ")
        .map(|column| column.rsplit('.').next().unwrap_or(column).to_string())
        .collect()
}

pub fn assemble_statement(query_prefix: &str, fragment: &str) -> String {
    format!("{}{}", query_prefix, fragment)
}

/// only single select statements are handed to the store
pub fn validate_statement(statement: &str) -> Result<()> {
    if !STATEMENT_SHAPE_REGEX.is_match(statement) {
        return Err(QueryMeError::QueryFailure(format!(
            "statement is not a select: '{}'",
            statement
        )));
    }

    if statement.contains(';') {
        return Err(QueryMeError::QueryFailure(format!(
            "statement contains a separator: '{}'",
            statement
        )));
    }

    Ok(())
}
