pub mod executor;
pub mod parser;
pub mod prompt;

pub use executor::execute;
pub use parser::{assemble_statement, clean_fragment, derive_columns, validate_statement};
pub use prompt::{build_prompt, Prompt, QUERY_PREFIX};
