use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use common::export::{write_csv, DEFAULT_EXPORT_FILENAME};
use common::llm::{ClientConfig, Completion, FixedCompletion, OpenAiClient};
use common::session::PAGE_SIZE;
use common::{ResultSet, Session, Table, Upload};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "queryme")]
#[command(about = "query csv files with natural language", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the prompt that would be sent for a request
    Prompt {
        #[command(flatten)]
        tables: TableArgs,

        /// Natural language request
        #[arg(short, long)]
        request: String,
    },
    /// Show the columns and a page of rows of an uploaded table
    View {
        #[command(flatten)]
        tables: TableArgs,

        /// Which table of the batch to show
        #[arg(long, default_value = "0")]
        index: usize,

        /// Zero-based page of rows
        #[arg(long, default_value = "0")]
        page: usize,
    },
    /// Answer a natural language request against the uploaded tables
    Query {
        #[command(flatten)]
        tables: TableArgs,

        /// Natural language request
        #[arg(short, long)]
        request: String,

        /// Also write the result as csv to this path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Format printed to stdout
        #[arg(long, value_enum, default_value = "csv")]
        format: OutputFormat,

        #[command(flatten)]
        completion: CompletionArgs,
    },
    /// Interactive session over the uploaded tables
    Shell {
        #[command(flatten)]
        tables: TableArgs,

        #[command(flatten)]
        completion: CompletionArgs,
    },
}

#[derive(Args)]
struct TableArgs {
    /// CSV files to upload, one table per file
    #[arg(short = 't', long = "table")]
    files: Vec<PathBuf>,
}

#[derive(Args, Clone)]
struct CompletionArgs {
    /// API key for the completion service
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Completion model name
    #[arg(long, env = "QUERYME_MODEL")]
    model: Option<String>,

    /// Base url of an openai compatible api
    #[arg(long, env = "QUERYME_API_BASE")]
    api_base: Option<String>,

    /// Timeout for the completion call in seconds
    #[arg(long, env = "QUERYME_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    /// Use this text as the model continuation instead of calling the service
    #[arg(long)]
    completion: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
}

impl CompletionArgs {
    fn build(&self) -> Result<Box<dyn Completion>> {
        if let Some(text) = &self.completion {
            return Ok(Box::new(FixedCompletion::new(text.clone())));
        }

        let config = ClientConfig::resolve(
            self.api_key.clone(),
            self.model.clone(),
            self.api_base.clone(),
            self.timeout_secs,
        )?;
        Ok(Box::new(OpenAiClient::new(config)?))
    }
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        // sqlite and the completion client block, so sessions run off the async workers
        tokio::task::spawn_blocking(move || self.run())
            .await
            .context("session task failed")?
    }

    fn run(self) -> Result<()> {
        match self.command {
            Commands::Prompt { tables, request } => {
                let session = load_session(&tables.files)?;
                println!("{}", session.prompt(&request).text);
                Ok(())
            }
            Commands::View {
                tables,
                index,
                page,
            } => {
                let mut session = load_session(&tables.files)?;
                for _ in 0..index {
                    session.next();
                }
                let table = session.current().context("no tables uploaded")?;
                print_table_page(table, page)
            }
            Commands::Query {
                tables,
                request,
                output,
                format,
                completion,
            } => {
                let mut session = load_session(&tables.files)?;
                let completion = completion.build()?;

                let result = session.run_query(&request, completion.as_ref())?;
                print_result(result, format)?;

                if let Some(path) = output {
                    export_to(&session, &path)?;
                }
                Ok(())
            }
            Commands::Shell { tables, completion } => {
                let session = load_session(&tables.files)?;
                let completion = completion.build()?;
                run_shell(session, completion.as_ref())
            }
        }
    }
}

fn load_session(files: &[PathBuf]) -> Result<Session> {
    let mut session = Session::new();
    load_files(&mut session, files)?;
    Ok(session)
}

/// replace the session tables with a new batch; any failure leaves the session empty
fn load_files(session: &mut Session, files: &[PathBuf]) -> Result<usize> {
    let uploads = match read_uploads(files) {
        Ok(uploads) => uploads,
        Err(e) => {
            session.clear();
            return Err(e);
        }
    };

    let tables = session.load_batch(&uploads)?;
    tracing::info!("loaded {} tables", tables.len());
    Ok(tables.len())
}

fn read_uploads(files: &[PathBuf]) -> Result<Vec<Upload>> {
    files
        .iter()
        .map(|path| {
            Upload::from_path(path).with_context(|| format!("failed to read {}", path.display()))
        })
        .collect()
}

fn print_table_page(table: &Table, page: usize) -> Result<()> {
    let specs = table
        .column_specs()
        .into_iter()
        .map(|spec| format!("{} ({})", spec.name, spec.column_type))
        .collect::<Vec<_>>();

    eprintln!("Table Name: {} ({})", table.name, table.source);
    eprintln!("columns: {}", specs.join(", "));
    eprintln!(
        "page {}/{}",
        page + 1,
        table.page_count(PAGE_SIZE).max(1)
    );

    let rows = ResultSet {
        columns: table.columns.clone(),
        rows: table.page(page, PAGE_SIZE).to_vec(),
    };
    write_csv(&rows, std::io::stdout().lock())?;
    Ok(())
}

fn print_result(result: &ResultSet, format: OutputFormat) -> Result<()> {
    let stdout = std::io::stdout().lock();

    match format {
        OutputFormat::Csv => write_csv(result, stdout)?,
        OutputFormat::Json => {
            let body = serde_json::json!({
                "columns": result.column_specs(),
                "records": result.records(),
            });
            let mut stdout = stdout;
            serde_json::to_writer_pretty(&mut stdout, &body)?;
            writeln!(stdout)?;
        }
    }

    Ok(())
}

fn export_to(session: &Session, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    session.export_csv(file)?;

    tracing::info!(output = %path.display(), "wrote results");
    Ok(())
}

fn run_shell(mut session: Session, completion: &dyn Completion) -> Result<()> {
    eprintln!(":load <files..>, :next, :prev, :show, :export [path], :quit; anything else is a query");

    if let Some(table) = session.current() {
        eprintln!("Table Name: {}", table.name);
    }

    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let line = line.trim();

        match line.split_once(' ').map_or((line, ""), |(cmd, rest)| (cmd, rest.trim())) {
            ("", _) => continue,
            (":quit", _) | (":q", _) => break,
            (":load", "") => eprintln!("usage: :load <file.csv> [more.csv ..]"),
            (":load", files) => {
                let files: Vec<PathBuf> = files.split_whitespace().map(PathBuf::from).collect();
                match load_files(&mut session, &files) {
                    Ok(count) => {
                        eprintln!("loaded {} tables", count);
                        report_table(session.current());
                    }
                    Err(e) => eprintln!("{:#}", e),
                }
            }
            (":next", _) => report_table(session.next()),
            (":prev", _) => report_table(session.previous()),
            (":show", _) => match session.current() {
                Some(table) => print_table_page(table, 0)?,
                None => eprintln!("no tables uploaded"),
            },
            (":export", path) => {
                let path = if path.is_empty() { DEFAULT_EXPORT_FILENAME } else { path };
                if let Err(e) = export_to(&session, Path::new(path)) {
                    eprintln!("{:#}", e);
                }
            }
            _ => match session.run_query(line, completion) {
                Ok(result) => print_result(result, OutputFormat::Csv)?,
                Err(e) => eprintln!("{}", e),
            },
        }
    }

    Ok(())
}

fn report_table(table: Option<&Table>) {
    match table {
        Some(table) => eprintln!("Table Name: {}", table.name),
        None => eprintln!("no tables uploaded"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_csv_file(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_load_files_replaces_batch() {
        let dir = tempfile::tempdir().unwrap();
        let orders = write_csv_file(dir.path(), "orders.csv", "id,amount\n1,9.5\n");
        let customers = write_csv_file(dir.path(), "customers.csv", "id,name\n1,ada\n");
        let products = write_csv_file(dir.path(), "products.csv", "sku\nx1\n");

        let mut session = load_session(&[orders, customers]).unwrap();
        session.next();
        session
            .run_query("ids", &FixedCompletion::new(" id FROM orders"))
            .unwrap();

        assert_eq!(load_files(&mut session, &[products]).unwrap(), 1);
        assert_eq!(session.cursor(), 0);
        assert_eq!(session.current().unwrap().name, "products");
        assert!(session.last_result().is_none());
    }

    #[test]
    fn test_load_files_failure_resets_session() {
        let dir = tempfile::tempdir().unwrap();
        let orders = write_csv_file(dir.path(), "orders.csv", "id\n1\n");
        let notes = write_csv_file(dir.path(), "notes.txt", "hello");

        let mut session = load_session(&[orders.clone()]).unwrap();
        assert!(load_files(&mut session, &[orders.clone(), notes]).is_err());
        assert!(session.tables().is_empty());

        let mut session = load_session(&[orders.clone()]).unwrap();
        let missing = dir.path().join("missing.csv");
        let err = load_files(&mut session, &[orders, missing]).unwrap_err();
        assert!(format!("{:#}", err).contains("missing.csv"));
        assert!(session.tables().is_empty());
        assert!(session.current().is_none());
    }
}
