use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use colored::Colorize;
use daygraph::config::Config;
use daygraph::consolidate::ConsolidationMode;
use daygraph::pipeline::{self, PipelineError};
use daygraph::serve;
use daygraph::share::LocalShare;
use std::io;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "daygraph")]
#[command(author, version, about = "Consolidate dated CSV logs into one interactive chart")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Discover dated files, consolidate them, and render the chart
    Build {
        /// Consolidation mode
        #[arg(short, long, value_enum, default_value_t = ConsolidationMode::PerDate)]
        mode: ConsolidationMode,

        /// Share root (overrides config and DAYGRAPH_SHARE_ROOT)
        #[arg(long)]
        share_root: Option<PathBuf>,

        /// Folder under the share root holding the dated files
        #[arg(long)]
        folder: Option<String>,

        /// Output artifact path
        #[arg(short, long, default_value = "daygraph.html")]
        output: PathBuf,

        /// Maximum rows loaded per file
        #[arg(long)]
        row_cap: Option<usize>,

        /// Number of parallel loads (default: number of CPUs)
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Open the artifact in the default browser after writing
        #[arg(long)]
        open: bool,

        /// Only report errors
        #[arg(short, long)]
        quiet: bool,
    },

    /// Serve the generated artifact over local HTTP
    Serve {
        /// Artifact to serve
        #[arg(short, long, default_value = "daygraph.html")]
        file: PathBuf,

        /// Port to listen on (default: from config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Generate shell completions
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    let args = Args::parse();

    match args.command {
        Command::Build {
            mode,
            share_root,
            folder,
            output,
            row_cap,
            jobs,
            open,
            quiet,
        } => cmd_build(mode, share_root, folder, output, row_cap, jobs, open, quiet),
        Command::Serve { file, port } => cmd_serve(file, port),
        Command::Completion { shell } => {
            generate(shell, &mut Args::command(), "daygraph", &mut io::stdout());
        }
    }
}

fn cmd_build(
    mode: ConsolidationMode,
    share_root: Option<PathBuf>,
    folder: Option<String>,
    output: PathBuf,
    row_cap: Option<usize>,
    jobs: Option<usize>,
    open: bool,
    quiet: bool,
) {
    let mut config = match Config::load() {
        Ok(config) => config,
        Err(msg) => fatal(&PipelineError::Config(msg)),
    };
    if let Some(folder) = folder {
        config.share.folder = folder;
    }
    if let Some(row_cap) = row_cap {
        config.pipeline.row_cap = row_cap;
    }

    // Bound the loader's worker pool
    if let Some(jobs) = jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()
            .ok();
    }

    let root = match share_root {
        Some(root) => root.to_string_lossy().into_owned(),
        None => config.share_root(),
    };
    let share = LocalShare::new(root);

    match pipeline::run(&share, &config, mode, &output, quiet) {
        Ok(_) => {
            if open {
                open_in_browser(&output);
            }
        }
        Err(e) => fatal(&e),
    }
}

fn cmd_serve(file: PathBuf, port: Option<u16>) {
    let config = match Config::load() {
        Ok(config) => config,
        Err(msg) => fatal(&PipelineError::Config(msg)),
    };
    let port = port.unwrap_or(config.preview.port);

    if let Err(e) = serve::start(port, file) {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn fatal(error: &PipelineError) -> ! {
    eprintln!("{} {}", "error:".red().bold(), error);
    std::process::exit(1);
}

fn open_in_browser(path: &std::path::Path) {
    #[cfg(target_os = "macos")]
    let opener = "open";
    #[cfg(target_os = "windows")]
    let opener = "explorer";
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    let opener = "xdg-open";

    if std::process::Command::new(opener).arg(path).spawn().is_err() {
        eprintln!(
            "{} could not open {} in a browser",
            "warning:".yellow().bold(),
            path.display()
        );
    }
}
