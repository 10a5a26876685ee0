use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use sipimport::{
    export_sip256, export_spectrum, format_frequency, load, load_sip256, ExportFormat, LoadOptions,
};

/// Read a SIP instrument log and print or export what was recovered.
#[derive(Debug, Parser)]
#[command(name = "sipdump", version)]
struct Cli {
    /// Instrument output file
    file: PathBuf,

    /// Read as a SIP256 multi-reading log
    #[arg(long)]
    sip256: bool,

    /// JSON file with loader options (`k`, `readSecond`, `delLast`, `verbose`)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Geometric factor override
    #[arg(short)]
    k: Option<f64>,

    /// Read the second data block (SIP-Fuchs)
    #[arg(long)]
    read_second: bool,

    /// Keep the leading sample that SIP-Fuchs files usually get wrong
    #[arg(long)]
    keep_first: bool,

    /// Output file; format from --format or the extension
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// csv, json or parquet
    #[arg(long)]
    format: Option<ExportFormat>,

    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn options(&self) -> Result<LoadOptions> {
        let mut opts = match &self.config {
            Some(path) => LoadOptions::from_json_file(path)?,
            None => LoadOptions::default(),
        };
        if let Some(k) = self.k {
            opts.k = k;
        }
        opts.read_second |= self.read_second;
        opts.del_last &= !self.keep_first;
        opts.verbose |= self.verbose;
        Ok(opts)
    }

    fn export_format(&self) -> Result<Option<(PathBuf, ExportFormat)>> {
        let Some(out) = &self.output else {
            return Ok(None);
        };
        let format = self
            .format
            .or_else(|| ExportFormat::from_path(out))
            .with_context(|| format!("cannot tell export format of {}", out.display()))?;
        Ok(Some((out.clone(), format)))
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let opts = cli.options()?;
    let export = cli.export_format()?;

    if cli.sip256 {
        let log = load_sip256(&cli.file, &opts)
            .with_context(|| format!("loading {}", cli.file.display()))?;
        for reading in &log.readings {
            let pair = reading
                .electrodes
                .map(|e| format!("{}-{}", e.a, e.b))
                .unwrap_or_else(|| "-".to_string());
            println!(
                "reading {:>4}  AB {:>7}  {} remote units",
                reading.number,
                pair,
                reading.remote_units.len()
            );
        }
        info!("{} sweep rows, {} skipped lines", log.row_count(), log.diagnostics.len());
        if let Some((path, format)) = export {
            export_sip256(&log, &path, format)?;
            info!("wrote {}", path.display());
        }
    } else {
        let loaded =
            load(&cli.file, &opts).with_context(|| format!("loading {}", cli.file.display()))?;
        println!("{} ({} samples)", loaded.dialect, loaded.record.len());
        let rec = &loaded.record;
        for i in 0..rec.len() {
            println!(
                "{:>10}  {:>12.5}  {:>10.5}",
                format_frequency(rec.frequency()[i]),
                rec.amplitude()[i],
                rec.phase()[i]
            );
        }
        if let Some((path, format)) = export {
            export_spectrum(rec, &path, format)?;
            info!("wrote {}", path.display());
        }
    }

    Ok(())
}
