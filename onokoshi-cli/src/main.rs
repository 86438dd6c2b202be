mod reports;
mod util;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;

use onokoshi_core::constants::{DEFAULT_EXPECTED_ELITE_COUNT, DEFAULT_STORE_FILE};
use onokoshi_core::{JsonFileStore, RouteSetDraft, Tracker, TrackerConfig};
use reports::{
    generate_console_report, generate_json_report, generate_markdown_report, write_route_preview,
    write_route_sets, write_run_detail, write_run_summaries,
};
use util::{non_blank, read_route_text};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Colored terminal summary
    Console,
    /// Machine-readable statistics
    Json,
    /// Markdown document
    Markdown,
}

#[derive(Debug, Parser)]
#[command(name = "onokoshi", version)]
#[command(about = "Track leftover elites per route across farming runs")]
struct Args {
    /// JSON file holding route sets and runs
    #[arg(long, global = true, default_value = DEFAULT_STORE_FILE)]
    store: PathBuf,

    /// Optional JSON configuration (markers, top-k, tag vocabulary)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Optional path to write output instead of stdout
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Preview how route text is parsed without saving it
    Parse {
        /// Read route text from this file instead of stdin
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Manage registered route sets
    #[command(subcommand)]
    RouteSet(RouteSetCommand),
    /// Record and inspect runs
    #[command(subcommand)]
    Run(RunCommand),
    /// Aggregate statistics over every recorded run
    Stats {
        #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
        report: ReportFormat,
    },
    /// List the quick-tag vocabulary
    Tags,
}

#[derive(Debug, Subcommand)]
enum RouteSetCommand {
    /// Register a route set from text
    Add {
        #[arg(long)]
        name: String,
        #[arg(long, default_value_t = DEFAULT_EXPECTED_ELITE_COUNT)]
        expected: i32,
        #[arg(long)]
        file: Option<PathBuf>,
    },
    List,
    /// Replace a route set's name, expected count or routes
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        expected: Option<i32>,
        /// New route text; routes are re-parsed with fresh ids
        #[arg(long)]
        file: Option<PathBuf>,
    },
    Remove {
        id: String,
    },
}

#[derive(Debug, Subcommand)]
enum RunCommand {
    /// Start a run from a route set
    Start {
        route_set_id: String,
    },
    List,
    Show {
        id: String,
    },
    /// Flag a remnant on a route (by id or name)
    Mark {
        run_id: String,
        route: String,
        #[arg(long)]
        count: Option<u32>,
        /// Replace the free-text comment
        #[arg(long)]
        comment: Option<String>,
        /// Append a quick tag; repeatable
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Clear the remnant instead
        #[arg(long)]
        clear: bool,
    },
    /// Adjust run-level fields
    Adjust {
        run_id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        expected: Option<i32>,
        #[arg(long, allow_negative_numbers = true)]
        shortage: Option<i32>,
        #[arg(long, allow_negative_numbers = true)]
        addition: Option<i32>,
    },
    Remove {
        id: String,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = load_config(&args)?;
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.command {
        Command::Parse { ref file } => {
            let text = read_route_text(file.as_deref())?;
            let tracker = open_tracker(&args.store, config)?;
            write_route_preview(output_target.writer(), &tracker.preview_routes(&text))?;
        }
        Command::RouteSet(ref command) => {
            let mut tracker = open_tracker(&args.store, config)?;
            route_set_command(&mut tracker, command, output_target.writer())?;
        }
        Command::Run(ref command) => {
            let mut tracker = open_tracker(&args.store, config)?;
            run_command(&mut tracker, command, output_target.writer())?;
        }
        Command::Stats { report } => {
            let tracker = open_tracker(&args.store, config)?;
            let stats = tracker.statistics()?;
            let writer = output_target.writer();
            match report {
                ReportFormat::Console => generate_console_report(writer, &stats)?,
                ReportFormat::Json => generate_json_report(writer, &stats)?,
                ReportFormat::Markdown => generate_markdown_report(writer, &stats)?,
            }
        }
        Command::Tags => {
            for tag in config.stats.vocabulary().tags() {
                writeln!(output_target.writer(), "{tag}")?;
            }
        }
    }

    output_target.flush_inner()?;
    Ok(())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

fn load_config(args: &Args) -> Result<TrackerConfig> {
    let Some(path) = args.config.as_deref() else {
        return Ok(TrackerConfig::default());
    };
    let config = TrackerConfig::load(path)
        .with_context(|| format!("failed to load config {}", path.display()))?;
    log::debug!("loaded config from {}", path.display());
    Ok(config)
}

fn open_tracker(store: &std::path::Path, config: TrackerConfig) -> Result<Tracker<JsonFileStore>> {
    let store = JsonFileStore::open(store)
        .with_context(|| format!("failed to open store {}", store.display()))?;
    Ok(Tracker::new(store, config))
}

fn route_set_command(
    tracker: &mut Tracker<JsonFileStore>,
    command: &RouteSetCommand,
    out: &mut dyn Write,
) -> Result<()> {
    match command {
        RouteSetCommand::Add {
            name,
            expected,
            file,
        } => {
            let draft = RouteSetDraft {
                name: name.clone(),
                text: read_route_text(file.as_deref())?,
                expected_elite_count: *expected,
            };
            let set = tracker.register_route_set(&draft)?;
            writeln!(
                out,
                "{} {} ({} routes)",
                "registered".green().bold(),
                set.id,
                set.routes.len()
            )?;
        }
        RouteSetCommand::List => write_route_sets(out, &tracker.route_sets()?)?,
        RouteSetCommand::Edit {
            id,
            name,
            expected,
            file,
        } => {
            let existing = tracker.route_set(id)?;
            let text = match file {
                Some(path) => read_route_text(Some(path))?,
                None => existing.original_text.clone(),
            };
            let draft = RouteSetDraft {
                name: name.clone().unwrap_or(existing.name),
                text,
                expected_elite_count: expected.unwrap_or(existing.expected_elite_count),
            };
            let set = tracker.edit_route_set(id, &draft)?;
            writeln!(
                out,
                "{} {} ({} routes)",
                "updated".green().bold(),
                set.id,
                set.routes.len()
            )?;
        }
        RouteSetCommand::Remove { id } => {
            tracker.delete_route_set(id)?;
            writeln!(out, "removed route set {id}")?;
        }
    }
    Ok(())
}

fn run_command(
    tracker: &mut Tracker<JsonFileStore>,
    command: &RunCommand,
    out: &mut dyn Write,
) -> Result<()> {
    match command {
        RunCommand::Start { route_set_id } => {
            let run = tracker.start_run(route_set_id)?;
            writeln!(out, "{} {} \"{}\"", "started".green().bold(), run.id, run.name)?;
        }
        RunCommand::List => write_run_summaries(out, &tracker.run_summaries()?)?,
        RunCommand::Show { id } => write_run_detail(out, &tracker.run(id)?)?,
        RunCommand::Mark {
            run_id,
            route,
            count,
            comment,
            tags,
            clear,
        } => {
            let vocabulary = tracker.config().stats.vocabulary();
            if let Some(unknown) = tags.iter().find(|tag| !vocabulary.contains(tag)) {
                bail!("unknown tag {unknown}; run `onokoshi tags` to list the vocabulary");
            }
            let saved = tracker.update_run(run_id, |run| {
                let Some(rr) = run.find_route_run_mut(route) else {
                    bail!("run {run_id} has no route {route}");
                };
                if *clear {
                    rr.set_remaining(false);
                    return Ok(());
                }
                if !rr.has_remaining {
                    rr.set_remaining(true);
                }
                if let Some(count) = count {
                    rr.set_remaining_count(*count);
                }
                if let Some(comment) = comment {
                    rr.comment = comment.trim().to_string();
                }
                for tag in tags {
                    rr.append_tag(tag);
                }
                Ok(())
            })?;
            write_run_detail(out, &saved.run)?;
            if saved.completed {
                writeln!(out, "{}", "🎉 No remnants. Run cleared!".bright_green().bold())?;
            }
        }
        RunCommand::Adjust {
            run_id,
            name,
            expected,
            shortage,
            addition,
        } => {
            let saved = tracker.update_run(run_id, |run| {
                if let Some(name) = name {
                    let Some(name) = non_blank(name) else {
                        bail!("run name is empty");
                    };
                    run.name = name;
                }
                if let Some(expected) = expected {
                    run.expected_elite_count = *expected;
                }
                if let Some(shortage) = shortage {
                    run.tsurumi_shortage = *shortage;
                }
                if let Some(addition) = addition {
                    run.adlib_addition = *addition;
                }
                Ok(())
            })?;
            write_run_detail(out, &saved.run)?;
        }
        RunCommand::Remove { id } => {
            tracker.delete_run(id)?;
            writeln!(out, "removed run {id}")?;
        }
    }
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            colored::control::set_override(false);
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}
