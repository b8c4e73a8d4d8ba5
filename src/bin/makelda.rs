use structopt::*;
use std::path::PathBuf;
use anyhow::{bail, Context};
use tracing_subscriber::EnvFilter;
use s3lda::{GaussianCounts, Lda, LdaSettings, StatsSource};
use s3lda::io;

/// Compute an LDA feature transform from the statistics of a full-covariance acoustic model.
/// Statistics come either from a Gaussian counts dump (--counts) or from separate means,
/// covariance and count files (--means, --covfile and --countfile, with --pass2var once the
/// covariances are known to come from a second variance pass).
#[derive(StructOpt, Debug)]
#[structopt(name = "makelda")]
struct MakeLda {

    /// JSON dump of Gaussian counts, accumulated with second-pass variances.
    #[structopt(long, parse(from_os_str), conflicts_with_all = &["means", "covfile", "countfile"])]
    counts : Option<PathBuf>,

    /// Accumulated class means, one vector per line.
    #[structopt(long, parse(from_os_str), requires_all = &["covfile", "countfile"])]
    means : Option<PathBuf>,

    /// Full covariance matrices, one per class, separated by blank lines.
    #[structopt(long, parse(from_os_str))]
    covfile : Option<PathBuf>,

    /// Frame counts, one integer per line.
    #[structopt(long, parse(from_os_str))]
    countfile : Option<PathBuf>,

    /// The covariance file was accumulated with second-pass variances (bw -2passvar yes).
    #[structopt(long, requires = "covfile")]
    pass2var : bool,

    /// Number of discriminant directions to keep (all of them by default).
    #[structopt(long)]
    dim : Option<usize>,

    /// Relative tolerance for imaginary parts of eigenvalues.
    #[structopt(long, default_value = "1e-8")]
    imag_tol : f64,

    /// Where to write the projection (standard output by default).
    #[structopt(short, long, parse(from_os_str))]
    output : Option<PathBuf>

}

impl MakeLda {

    fn source(&self) -> anyhow::Result<StatsSource> {
        match (&self.counts, &self.means, &self.covfile, &self.countfile) {
            (Some(counts), None, None, None) => {
                let gc = GaussianCounts::load_from_path(counts)
                    .with_context(|| format!("Could not load Gaussian counts from {:?}", counts))?;
                Ok(StatsSource::Counts(gc))
            },
            (None, Some(means), Some(covfile), Some(countfile)) => {
                let means = io::read_means(means)
                    .with_context(|| format!("Could not read means from {:?}", means))?;
                Ok(StatsSource::Files {
                    means,
                    covfile : covfile.clone(),
                    countfile : countfile.clone(),
                    pass2var : self.pass2var
                })
            },
            _ => bail!("Inform either --counts or all of --means, --covfile and --countfile")
        }
    }

}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let opts = MakeLda::from_args();
    let settings = LdaSettings { dim : opts.dim, imag_tol : opts.imag_tol };
    let lda = Lda::from_source(opts.source()?, &settings).context("LDA computation failed")?;
    tracing::info!(eigenvalues = %lda.eigenvalues().transpose(), "Discriminant eigenvalues");
    tracing::debug!("\n{}", lda);
    match &opts.output {
        Some(path) => io::save_matrix(path, lda.projection())
            .with_context(|| format!("Could not write projection to {:?}", path))?,
        None => io::write_matrix(std::io::stdout(), lda.projection())?
    }
    Ok(())
}
