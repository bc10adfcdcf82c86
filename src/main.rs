use albumtag::report::{self, Summary};
use albumtag::{AlbumResolver, AlbumTagSet, Input, Overrides, Probes, ResolveError};
use chrono::Local;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "albumtag")]
#[command(author, version, about = "Resolve tags and file layout for a lossless album before lossy conversion")]
struct Args {
    /// Album directory (default: current directory)
    path: Option<PathBuf>,

    /// Track-list (.cue) to use instead of searching the directory
    #[arg(short = 'q', long)]
    cuefile: Option<PathBuf>,

    /// Set the performer of every track
    #[arg(short, long)]
    performer: Option<String>,

    /// Set the album title
    #[arg(short, long)]
    album: Option<String>,

    /// Set the genre of every track
    #[arg(short, long)]
    genre: Option<String>,

    /// Set the release year
    #[arg(short, long)]
    year: Option<String>,

    /// Set the comment of every track
    #[arg(short = 'k', long)]
    comment: Option<String>,

    /// Set the disc number
    #[arg(short = 'n', long)]
    disc: Option<u32>,

    /// Set the total number of discs
    #[arg(short = 'm', long)]
    discs: Option<u32>,

    /// Cover art to embed (ignored with a warning if missing)
    #[arg(short, long)]
    cover: Option<PathBuf>,

    /// Output report file (.csv, .json)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Directory for auto-generated reports
    #[arg(long, default_value = "albumtag-reports")]
    report_dir: PathBuf,

    /// Don't auto-generate a report
    #[arg(long)]
    no_report: bool,

    /// Number of parallel probes (default: number of CPUs)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Album and per-track probe binary
    #[arg(long, default_value = "cueprint")]
    cueprint: PathBuf,

    /// Loose-file metadata probe binary
    #[arg(long, default_value = "ffmpeg")]
    ffmpeg: PathBuf,

    /// Show sources and intermediate files, log at debug level
    #[arg(short, long)]
    verbose: bool,

    /// Only show summary
    #[arg(long)]
    quiet: bool,
}

fn main() {
    let args = Args::parse();
    init_logging(&args);

    // Set up thread pool
    if let Some(jobs) = args.jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()
            .ok();
    }

    let dir = args.path.clone().unwrap_or_else(|| PathBuf::from("."));

    let overrides = Overrides {
        performer: args.performer.clone(),
        album: args.album.clone(),
        genre: args.genre.clone(),
        year: args.year.clone(),
        comment: args.comment.clone(),
        disc: args.disc,
        disc_total: args.discs,
    };

    let mut resolver = AlbumResolver::new(Probes::system(&args.cueprint, &args.ffmpeg))
        .with_overrides(overrides)
        .with_track_list(args.cuefile.clone())
        .with_cover(args.cover.clone());

    let input = match resolver.select(&dir) {
        Ok(input) => input,
        Err(e) => fail(&e),
    };

    if !args.quiet {
        eprintln!("\x1b[1malbumtag - Album Tag Resolver\x1b[0m");
        eprintln!("{}", "─".repeat(70));
        match &input {
            Input::TrackList(path) => eprintln!("Track-list: {}\n", path.display()),
            Input::Directory(dir) => eprintln!("No track-list, probing files in {}\n", dir.display()),
        }
    }

    // Progress spinner for per-file probing
    let pb = if !args.quiet && matches!(input, Input::Directory(_)) {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {pos} probed {msg}")
                .unwrap(),
        );
        let tick = pb.clone();
        resolver = resolver.with_progress(move |path| {
            tick.inc(1);
            if let Some(name) = path.file_name() {
                tick.set_message(name.to_string_lossy().to_string());
            }
        });
        Some(pb)
    } else {
        None
    };

    let result = match &input {
        Input::TrackList(path) => resolver.resolve_track_list(path),
        Input::Directory(dir) => resolver.resolve_directory(dir),
    };

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    let album = match result {
        Ok(album) => album,
        Err(e) => fail(&e),
    };

    if !args.quiet {
        print_album(&album, args.verbose);
    }

    let summary = Summary::from_album(&album);
    if !args.quiet {
        eprintln!("\n{}", "─".repeat(70));
        eprintln!("\x1b[1mSummary:\x1b[0m");
        eprintln!("  Discs:   {}", summary.discs);
        eprintln!("  Tracks:  {}", summary.tracks);
        eprintln!(
            "  Layout:  {}",
            if summary.single_shared_source { "single shared source (split first)" } else { "one file per track" }
        );
        if summary.unspecified_disc > 0 {
            eprintln!("  \x1b[33mNo disc number:\x1b[0m {}", summary.unspecified_disc);
        }
        if summary.discs_with_gaps > 0 {
            eprintln!("  \x1b[33mDiscs with gaps:\x1b[0m {}", summary.discs_with_gaps);
        }
    }

    // Determine report path
    let report_path = if let Some(ref output) = args.output {
        Some(output.clone())
    } else if !args.no_report {
        std::fs::create_dir_all(&args.report_dir).ok();
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let filename = format!("albumtag_report_{}.json", timestamp);
        Some(args.report_dir.join(filename))
    } else {
        None
    };

    if let Some(ref output_path) = report_path {
        if let Err(e) = report::generate(output_path, &album) {
            eprintln!("Failed to write report: {}", e);
            std::process::exit(1);
        }
        if !args.quiet {
            eprintln!("\n\x1b[32mReport saved: {}\x1b[0m", output_path.display());
        }
    }
}

fn init_logging(args: &Args) {
    let level = if args.verbose {
        "debug"
    } else if args.quiet {
        "warn"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| format!("albumtag={}", level).into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn print_album(album: &AlbumTagSet, verbose: bool) {
    if let Some(source) = album.shared_source() {
        println!("Shared source: {}", source.display());
    }
    if let Some(cover) = album.cover() {
        println!("Cover: {}", cover.display());
    }

    for (disc, track, tags) in album.tracks() {
        println!(
            "{:>2}-{:02}  {:<24}  {:<30}  {}",
            disc.to_string(),
            track,
            truncate(&tags.artist, 24),
            truncate(&tags.title, 30),
            tags.output_filename
        );

        if verbose {
            if let Some(ref source) = tags.source_locator {
                eprintln!("    source: {}", source.display());
            }
            eprintln!(
                "    intermediate: {}  album: {}  genre: {}  year: {}",
                tags.intermediate_filename.display(),
                tags.album,
                tags.genre,
                tags.year.as_deref().unwrap_or("-")
            );
        }
    }
}

fn fail(err: &ResolveError) -> ! {
    eprintln!("\x1b[31merror:\x1b[0m {}", err);
    if let ResolveError::Tracks(failures) = err {
        for failure in failures {
            eprintln!("  {}", failure);
        }
    }
    std::process::exit(1);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}
