pub mod loggers;

use crate::loggers::init_logger;
use clap::{Parser, Subcommand};
use pdfcodes::config::{
    parse_option, IndexRequest, MergeByBaseRequest, MergeByCodeRequest, DEFAULT_MAX_PAGES,
};
use pdfcodes::error::Error;
use pdfcodes::extracter::DEFAULT_CODE_PATTERN;
use pdfcodes::pipeline::{index_workspace, merge_by_bases, merge_by_code};
use pdfcodes::workspace::Workspace;
use serde_json::{json, Value};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(version, about, long_about=None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a new workspace under STORAGE.
    Init {
        #[arg(long)]
        storage: PathBuf,
    },
    /// List the workspaces under STORAGE.
    List {
        #[arg(long)]
        storage: PathBuf,
    },
    /// Copy PDF files into a workspace.
    Upload {
        #[arg(short, long)]
        workspace: PathBuf,

        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// List the PDF files of a workspace.
    Files {
        #[arg(short, long)]
        workspace: PathBuf,
    },
    /// Build the code index of a workspace.
    Index {
        #[arg(short, long)]
        workspace: PathBuf,

        #[arg(short, long)]
        pattern: Option<String>,

        #[arg(long, default_value = "both")]
        scan_mode: String,

        #[arg(long, default_value_t = DEFAULT_MAX_PAGES)]
        max_pages: usize,
    },
    /// Print the last index built for a workspace.
    ShowIndex {
        #[arg(short, long)]
        workspace: PathBuf,
    },
    /// Merge the pages of an ordered list of codes.
    MergeByCode {
        #[arg(short, long)]
        workspace: PathBuf,

        #[arg(long, value_delimiter = ',', required = true)]
        order: Vec<String>,

        #[arg(short, long, default_value = "merged_by_code.pdf")]
        output_name: String,

        #[arg(long, default_value = "first")]
        pages_per_code: String,

        #[arg(long, default_value = "skip")]
        on_missing: String,

        #[arg(long, default_value = "any")]
        source_filter: String,

        #[arg(long, default_value = "first_page")]
        filename_behavior: String,
    },
    /// Merge every numbered part of each base, in order.
    MergeByBases {
        #[arg(short, long)]
        workspace: PathBuf,

        #[arg(long, value_delimiter = ',', required = true)]
        bases: Vec<String>,

        #[arg(short, long, default_value = "merged_by_bases.pdf")]
        output_name: String,
    },
}

async fn run(command: Command, verbose: bool) -> anyhow::Result<Value> {
    let value = match command {
        Command::Init { storage } => {
            let workspace = Workspace::create(&storage)?;
            json!({ "workspace_id": workspace.id(), "path": workspace.root() })
        }
        Command::List { storage } => {
            json!({ "workspaces": Workspace::list(&storage)? })
        }
        Command::Upload { workspace, files } => {
            let workspace = Workspace::open(&workspace)?;
            let mut uploaded = Vec::new();
            for file in files.iter() {
                uploaded.push(workspace.add_file(file)?);
            }
            json!({ "workspace_id": workspace.id(), "uploaded": uploaded })
        }
        Command::Files { workspace } => {
            let workspace = Workspace::open(&workspace)?;
            json!({ "workspace_id": workspace.id(), "files": workspace.pdf_files()? })
        }
        Command::Index {
            workspace,
            pattern,
            scan_mode,
            max_pages,
        } => {
            let workspace = Workspace::open(&workspace)?;
            let request = IndexRequest {
                pattern: pattern.unwrap_or_else(|| DEFAULT_CODE_PATTERN.to_string()),
                scan_mode: parse_option("scan_mode", &scan_mode)?,
                max_pages,
            };
            serde_json::to_value(index_workspace(&workspace, &request, verbose).await?)?
        }
        Command::ShowIndex { workspace } => {
            let workspace = Workspace::open(&workspace)?;
            serde_json::to_value(workspace.load_index()?)?
        }
        Command::MergeByCode {
            workspace,
            order,
            output_name,
            pages_per_code,
            on_missing,
            source_filter,
            filename_behavior,
        } => {
            let workspace = Workspace::open(&workspace)?;
            let request = MergeByCodeRequest {
                order,
                output_name,
                pages_per_code: parse_option("pages_per_code", &pages_per_code)?,
                on_missing: parse_option("on_missing", &on_missing)?,
                source_filter: parse_option("source_filter", &source_filter)?,
                filename_behavior: parse_option("filename_behavior", &filename_behavior)?,
            };
            serde_json::to_value(merge_by_code(&workspace, &request)?)?
        }
        Command::MergeByBases {
            workspace,
            bases,
            output_name,
        } => {
            let workspace = Workspace::open(&workspace)?;
            let request = MergeByBaseRequest { bases, output_name };
            serde_json::to_value(merge_by_bases(&workspace, &request)?)?
        }
    };
    return Ok(value);
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logger(args.verbose).expect("Failed to initialize logger");

    match run(args.command, args.verbose).await {
        Ok(value) => match serde_json::to_string_pretty(&value) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        },
        Err(e) => {
            eprintln!("Error: {}", e);
            let user_error = e.downcast_ref::<Error>().is_some_and(Error::is_user_error);
            std::process::exit(if user_error { 2 } else { 1 });
        }
    }
}
