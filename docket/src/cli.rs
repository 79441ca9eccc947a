use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;

/// Docket: File project documents and the costs attached to them.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Directory holding the managed `projects/` tree. Defaults to the current directory.
    #[arg(long, global = true, env = "DOCKET_STORAGE_ROOT")]
    pub storage_root: Option<PathBuf>,

    /// Increase verbosity (use multiple times for more).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a document record without a file.
    Create(CreateArgs),
    /// Copy files into managed storage, creating one document per file.
    Import(ImportArgs),
    /// Print a serialized document in readable form.
    Show(ShowArgs),
    /// Open a document's stored file using the system's default application.
    Open(OpenArgs),
}

// --- Argument Structs for each Subcommand ---

/// Fields shared by every new document.
#[derive(Args, Debug)]
pub struct RecordArgs {
    /// Id of the project the document belongs to.
    #[arg(long, short, env = "DOCKET_PROJECT")]
    pub project: String,

    /// Id of the user who owns the document.
    #[arg(long, short, env = "DOCKET_USER")]
    pub user: String,

    /// Cost attached to the document, as an exact decimal (e.g. 1234.50).
    #[arg(long, short)]
    pub cost: Decimal,

    /// Free-text description.
    #[arg(long, short, default_value = "")]
    pub description: String,
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Display name of the document.
    #[arg(long, short)]
    pub name: String,

    #[command(flatten)]
    pub record: RecordArgs,
}

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Path(s) to the file(s) to import.
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Display name for the imported document(s). Defaults to each file's stem.
    #[arg(long, short)]
    pub name: Option<String>,

    #[command(flatten)]
    pub record: RecordArgs,
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// JSON file containing a serialized document.
    pub record: PathBuf,

    /// Print indented JSON instead of the one-line summary.
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct OpenArgs {
    /// JSON file containing a serialized document.
    pub record: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn parse_import() {
        let cli = Cli::try_parse_from([
            "docket", "--storage-root", "/srv/docket", "-vv", "import", "a.pdf", "b.pdf",
            "--project", "proj-42", "--user", "user-7", "--cost", "1234.50",
        ])
        .unwrap();

        assert_eq!(cli.storage_root, Some(PathBuf::from("/srv/docket")));
        assert_eq!(cli.verbose, 2);
        let Commands::Import(args) = cli.command else { panic!("expected import") };
        assert_eq!(args.paths, vec![PathBuf::from("a.pdf"), PathBuf::from("b.pdf")]);
        assert_eq!(args.name, None);
        assert_eq!(args.record.project, "proj-42");
        assert_eq!(args.record.user, "user-7");
        assert_eq!(args.record.cost, Decimal::from_str("1234.50").unwrap());
        assert_eq!(args.record.cost.to_string(), "1234.50");
        assert_eq!(args.record.description, "");
    }

    #[test]
    fn parse_create() {
        let cli = Cli::try_parse_from([
            "docket", "create", "--name", "Memo", "-p", "P1", "-u", "U1", "-c", "0", "-d", "kickoff",
        ])
        .unwrap();

        let Commands::Create(args) = cli.command else { panic!("expected create") };
        assert_eq!(args.name, "Memo");
        assert_eq!(args.record.description, "kickoff");
    }

    #[test]
    fn reject_float_garbage_cost() {
        let result = Cli::try_parse_from([
            "docket", "create", "--name", "Memo", "-p", "P1", "-u", "U1", "-c", "12,5",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["docket", "open", "doc.json", "-q"]).unwrap();
        assert!(cli.quiet);
        let Commands::Open(args) = cli.command else { panic!("expected open") };
        assert_eq!(args.record, PathBuf::from("doc.json"));
    }
}
