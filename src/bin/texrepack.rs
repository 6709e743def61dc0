use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "texrepack", version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). `RUST_LOG` overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a job at full resolution and write PNG output.
    Run(RunArgs),
    /// Write the low-resolution preview of a job as a PNG.
    Preview(PreviewArgs),
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Job JSON file.
    #[arg(long)]
    job: PathBuf,

    /// Output directory (defaults to the job file's directory).
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Replace existing output files.
    #[arg(long)]
    overwrite: bool,

    /// Fill rows on a rayon thread pool.
    #[arg(long)]
    parallel: bool,

    /// Worker threads for `--parallel`.
    #[arg(long)]
    threads: Option<usize>,
}

#[derive(Parser, Debug)]
struct PreviewArgs {
    /// Job JSON file.
    #[arg(long)]
    job: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// What to show for pack jobs: rgba, r, g, b or a.
    #[arg(long, default_value = "rgba")]
    view: texrepack::PreviewView,

    /// Preview side length in pixels.
    #[arg(long, default_value_t = texrepack::PREVIEW_SIZE)]
    size: u32,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Run(args) => cmd_run(args),
        Command::Preview(args) => cmd_preview(args),
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_job(path: &Path) -> anyhow::Result<texrepack::RepackJob> {
    texrepack::RepackJob::read(path).with_context(|| format!("load job '{}'", path.display()))
}

fn cmd_run(args: RunArgs) -> anyhow::Result<()> {
    let job = read_job(&args.job)?;
    let root = texrepack::job_root(&args.job);
    let out_dir = args.out_dir.clone().unwrap_or_else(|| root.clone());
    let name = job.output_name();

    let session = texrepack::RepackSession::new(texrepack::RepackSessionOpts {
        parallel: args.parallel,
        threads: args.threads,
        ..texrepack::RepackSessionOpts::default()
    })?;

    let mut report = |p: texrepack::Progress| {
        tracing::info!(
            rows_done = p.rows_done,
            rows_total = p.rows_total,
            "{:.0}%",
            p.fraction() * 100.0
        );
    };

    let written = match &job {
        texrepack::RepackJob::Pack(pack) => {
            let slots = pack.slots(&root)?;
            let packed = session.pack_with_progress(&slots, pack.size(), Some(&mut report))?;
            let path = out_dir.join(format!("{name}.png"));
            texrepack::write_png_rgba(&path, &packed, args.overwrite)?;
            vec![path]
        }
        texrepack::RepackJob::Unpack(unpack) => {
            let params = unpack.parameters(&root)?;
            let outputs = session.unpack_synchronous(&params.source, params.enabled())?;
            if outputs.is_empty() {
                anyhow::bail!("unpack job has no enabled channels");
            }
            texrepack::write_unpacked(&out_dir, &name, &params.channels, &outputs, args.overwrite)?
        }
        texrepack::RepackJob::Mix(mix) => {
            let params = mix.parameters(&root)?;
            let mixed = session.blend_with_progress(&params, Some(&mut report))?;
            let path = out_dir.join(format!("{name}.png"));
            texrepack::write_png_rgba(&path, &mixed, args.overwrite)?;
            vec![path]
        }
    };

    for path in written {
        eprintln!("wrote {}", path.display());
    }
    Ok(())
}

fn cmd_preview(args: PreviewArgs) -> anyhow::Result<()> {
    let job = read_job(&args.job)?;
    let root = texrepack::job_root(&args.job);
    let session = texrepack::RepackSession::new(texrepack::RepackSessionOpts {
        preview_size: args.size,
        ..texrepack::RepackSessionOpts::default()
    })?;

    let preview = match &job {
        texrepack::RepackJob::Pack(pack) => session.pack_preview(&pack.slots(&root)?, args.view),
        texrepack::RepackJob::Unpack(unpack) => {
            // Unpack has no composite; preview the source through the chosen view.
            let params = unpack.parameters(&root)?;
            let slots = texrepack::Channel::ALL
                .map(|c| texrepack::ChannelSlot::image(params.source.clone(), c));
            session.pack_preview(&slots, args.view)
        }
        texrepack::RepackJob::Mix(mix) => session.blend_preview(&mix.parameters(&root)?),
    };

    texrepack::write_png_rgba(&args.out, &preview, true)?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}
