#[cfg(feature = "cli")]
fn main() {
    if let Err(err) = cli::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("snapfs was built without the \"cli\" feature");
    std::process::exit(1);
}

#[cfg(feature = "cli")]
mod cli {
    use std::path::PathBuf;

    use clap::{Parser, Subcommand};

    use snapfs::{Author, DifferenceKind, Repository};

    #[derive(Parser)]
    #[command(name = "snapfs", about = "content-addressed snapshot store for directory trees")]
    struct Cli {
        #[command(subcommand)]
        command: Command,
    }

    #[derive(Subcommand)]
    enum Command {
        /// Initialize a repository at PATH (defaults to the current directory).
        Init {
            path: Option<PathBuf>,
        },
        /// Show differences between the working tree and the latest commit.
        Status {
            #[arg(long, default_value = ".")]
            repo: PathBuf,
        },
        /// Stage differences matching a glob pattern.
        Stage {
            #[arg(long, default_value = ".")]
            repo: PathBuf,
            #[arg(long, default_value = "*")]
            pattern: String,
        },
        /// Commit the current working tree.
        Commit {
            #[arg(long, default_value = ".")]
            repo: PathBuf,
            #[arg(long, env = "SNAPFS_AUTHOR", default_value = "unknown")]
            author: String,
            #[arg(long, default_value = "")]
            message: String,
        },
        /// Move HEAD to a branch or tag, creating a branch if neither exists.
        Checkout {
            #[arg(long, default_value = ".")]
            repo: PathBuf,
            name: String,
        },
    }

    pub fn run() -> snapfs::Result<()> {
        let cli = Cli::parse();

        match cli.command {
            Command::Init { path } => {
                let root = path.unwrap_or_else(|| PathBuf::from("."));
                Repository::init(&root)?;
                println!("initialized snapfs repository at {}", root.display());
            }
            Command::Status { repo } => {
                let repo = Repository::open(repo)?;
                for difference in repo.status()? {
                    print_difference(&difference);
                }
            }
            Command::Stage { repo, pattern } => {
                let repo = Repository::open(repo)?;
                let staged = repo.stage(&pattern)?;
                println!(
                    "staged {} added, {} updated, {} removed",
                    staged.added.len(),
                    staged.updated.len(),
                    staged.removed.len()
                );
            }
            Command::Commit { repo, author, message } => {
                let repo = Repository::open(repo)?;
                let hashid = repo.commit(Author::new(author), message)?;
                println!("committed {hashid}");
            }
            Command::Checkout { repo, name } => {
                let repo = Repository::open(repo)?;
                repo.checkout(&name)?;
                println!("switched to {name}");
            }
        }

        Ok(())
    }

    fn print_difference(difference: &snapfs::Difference) {
        let marker = match difference.kind {
            DifferenceKind::Added => "A",
            DifferenceKind::Updated => "U",
            DifferenceKind::Removed => "R",
        };
        println!("{marker} {}", difference.file.path);
    }
}
