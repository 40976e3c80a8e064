use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use indicatif::ProgressBar;
use tracing::info;

use motcor_core::transform::ParamConvention;
use motcor_pipeline::{
    run, CommandEstimator, OutputLayout, Progress, ReferenceChoice, Retention, RunConfig,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Convention {
    Fsl,
    Spm,
}

impl From<Convention> for ParamConvention {
    fn from(value: Convention) -> Self {
        match value {
            Convention::Fsl => ParamConvention::Fsl,
            Convention::Spm => ParamConvention::Spm,
        }
    }
}

#[derive(Parser)]
#[command(name = "motcor")]
#[command(about = "Rigid head-motion quantification for 4D imaging timeseries")]
struct Cli {
    /// 4D volume stack to correct
    input: PathBuf,

    /// Output prefix (default: input path with `_mc` appended)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Externally supplied reference volume
    #[arg(short, long, conflicts_with = "meanvol")]
    reference: Option<PathBuf>,

    /// Register to the temporal mean instead of the first frame
    #[arg(long)]
    meanvol: bool,

    /// Mask volume restricting the displacement support
    #[arg(short, long)]
    mask: Option<PathBuf>,

    /// Convention for the six-parameter motion records
    #[arg(long, value_enum, default_value = "fsl")]
    convention: Convention,

    /// Registration engine command template; must contain {moving},
    /// {fixed}, {transform} and {resampled}, and may contain {mask}
    #[arg(long)]
    engine: String,

    /// Keep per-frame resampled volumes
    #[arg(long)]
    keep_frames: bool,

    /// Keep per-frame FSL-convention matrices
    #[arg(long)]
    keep_flirt: bool,

    /// Keep per-frame text-form transforms
    #[arg(long)]
    keep_tfm: bool,

    /// Keep per-frame raw world-space matrices
    #[arg(long)]
    keep_mats: bool,
}

/// Frame progress bar, created lazily once the frame count is known.
#[derive(Default)]
struct BarProgress {
    bar: Mutex<Option<ProgressBar>>,
}

impl Progress for BarProgress {
    fn begin(&self, total_frames: usize) {
        if let Ok(mut guard) = self.bar.lock() {
            *guard = Some(ProgressBar::new(total_frames as u64));
        }
    }

    fn frame_done(&self, _index: usize) {
        if let Ok(guard) = self.bar.lock() {
            if let Some(bar) = guard.as_ref() {
                bar.inc(1);
            }
        }
    }
}

impl BarProgress {
    fn finish(&self) {
        if let Ok(guard) = self.bar.lock() {
            if let Some(bar) = guard.as_ref() {
                bar.finish_and_clear();
            }
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let layout = match &cli.out {
        Some(prefix) => OutputLayout::new(prefix),
        None => OutputLayout::derive_from_input(&cli.input),
    };

    let reference = match (&cli.reference, cli.meanvol) {
        (Some(path), _) => ReferenceChoice::External(path.clone()),
        (None, true) => ReferenceChoice::TemporalMean,
        (None, false) => ReferenceChoice::FirstFrame,
    };

    let retention = Retention {
        frame_volumes: cli.keep_frames,
        flirt_matrices: cli.keep_flirt,
        text_transforms: cli.keep_tfm,
        raw_matrices: cli.keep_mats,
    };

    let mut config = RunConfig::default()
        .with_reference(reference)
        .with_convention(cli.convention.into())
        .with_retention(retention);
    if let Some(mask) = &cli.mask {
        config = config.with_mask(mask);
    }

    let estimator = CommandEstimator::new(cli.engine.as_str(), layout.scratch_dir())?;
    let progress = BarProgress::default();

    let summary = run(&cli.input, &layout, &config, &estimator, &progress)?;
    progress.finish();

    if summary.cleanup_warnings > 0 {
        info!(
            "{} intermediate files could not be deleted",
            summary.cleanup_warnings
        );
    }
    info!(
        "done: {} frames, outputs at {}",
        summary.num_frames,
        layout.prefix().display()
    );
    Ok(())
}
