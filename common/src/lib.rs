pub mod agent;
pub mod error;
pub mod export;
pub mod llm;
pub mod schema;
pub mod session;
pub mod store;
pub mod table;
pub mod telemetry;
pub mod upload;

pub use error::{ErrorKind, QueryMeError, Result};
pub use session::Session;
pub use table::{ColumnSpec, ResultSet, Table};
pub use upload::Upload;
