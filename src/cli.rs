use clap::{Args, CommandFactory, Parser, Subcommand};
use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
};

use anyhow::Context;

use crate::{
    convert::{convert_with, ConversionKind, InputFormat},
    server::ServerConfig,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Subcommands,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        match self.command {
            Subcommands::Convert(args) => args.run(),
            Subcommands::Info(args) => args.run(),
            Subcommands::Serve(args) => tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("could not start the async runtime")?
                .block_on(args.run()),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Subcommands {
    /// Converts a subtitle between .srt, .ass and .xlsx
    Convert(ConvertArgs),
    /// Shows what would be extracted from a subtitle file
    Info(InfoArgs),
    /// Runs the HTTP conversion service
    Serve(ServeArgs),
}

fn exit_with(kind: clap::error::ErrorKind, message: &str) -> ! {
    Cli::command().error(kind, message).exit()
}

#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// The conversion to run.
    ///
    /// If not given it is guessed from the file extensions. A .srt input
    /// becomes a spreadsheet and a spreadsheet becomes a .srt. An .ass input
    /// needs either this or an --output with a known extension.
    #[arg(long, value_enum, verbatim_doc_comment)]
    pub to: Option<ConversionKind>,
    /// The file to convert.
    pub file: PathBuf,
    /// Where to output the file.
    ///
    /// Defaults to a file in the current working directory with the
    /// same name as the input file and the extension of the output format.
    #[arg(short, long, verbatim_doc_comment)]
    pub output: Option<PathBuf>,
}

impl ConvertArgs {
    fn resolve(&self) -> Result<(ConversionKind, PathBuf), &'static str> {
        let input = InputFormat::from_path(&self.file)
            .ok_or("input file must have .ass, .srt, or .xlsx extension")?;
        let output_extension = self
            .output
            .as_deref()
            .and_then(Path::extension)
            .and_then(|s| s.to_str())
            .map(str::to_ascii_lowercase);

        let kind = match (self.to, input, output_extension.as_deref()) {
            (Some(kind), ..) => kind,
            (None, InputFormat::Xlsx, _) => ConversionKind::XlsxToSrt,
            (None, InputFormat::Ass, Some("srt")) => ConversionKind::AssToSrt,
            (None, InputFormat::Ass, Some("xlsx")) => ConversionKind::SubtitleToExcel,
            (None, InputFormat::Ass, _) => {
                return Err("could not determine the conversion for an .ass file, use --to")
            }
            (None, InputFormat::Srt, _) => ConversionKind::SubtitleToExcel,
        };

        let output = match &self.output {
            Some(path) => path.clone(),
            None => {
                let stem = self
                    .file
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .ok_or("could not determine filename for input file")?;
                PathBuf::from(kind.output_file_name(stem))
            }
        };
        Ok((kind, output))
    }

    /// Runs the conversion utility.
    pub fn run(self) -> anyhow::Result<()> {
        let (kind, output) = self
            .resolve()
            .unwrap_or_else(|msg| exit_with(clap::error::ErrorKind::ValueValidation, msg));
        let report = convert_with(&self.file, &output, kind)
            .with_context(|| format!("could not convert {}", self.file.display()))?;

        println!(
            "Wrote {} cues to {}",
            report.cues,
            output.display()
        );
        if !report.warnings.is_empty() {
            println!("Skipped {} malformed lines", report.warnings.len());
        }
        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct InfoArgs {
    /// The subtitle file to get information for.
    pub file: PathBuf,
}

impl InfoArgs {
    pub fn run(self) -> anyhow::Result<()> {
        let Some(format) = InputFormat::from_path(&self.file) else {
            exit_with(
                clap::error::ErrorKind::ValueValidation,
                "input file must have .ass, .srt, or .xlsx extension",
            )
        };
        let parsed = match format {
            InputFormat::Srt => crate::srt::load(&self.file),
            InputFormat::Ass => crate::ass::load(&self.file),
            InputFormat::Xlsx => crate::xlsx::load(&self.file),
        }
        .with_context(|| format!("could not read {}", self.file.display()))?;

        println!("File: {}", self.file.display());
        println!("Format: {format}");
        println!("Cues: {}", parsed.cues.len());
        if let (Some(first), Some(last)) = (parsed.cues.first(), parsed.cues.last()) {
            println!("Span: {} --> {}", first.start, last.end);
        }
        if !parsed.warnings.is_empty() {
            println!("Skipped:");
            for warning in &parsed.warnings {
                println!("  {warning}");
            }
        }
        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// The address to listen on
    #[arg(long, env = "SCRIPTGRID_LISTEN", default_value = "127.0.0.1:8000")]
    pub listen: SocketAddr,
    /// A directory of static files (e.g. the web front-end) to serve at `/`
    #[arg(long, env = "SCRIPTGRID_STATIC_DIR")]
    pub static_dir: Option<PathBuf>,
    /// The largest upload accepted, in megabytes
    #[arg(long, env = "SCRIPTGRID_MAX_UPLOAD_MB", default_value_t = 32)]
    pub max_upload_mb: usize,
}

impl ServeArgs {
    fn config(self) -> ServerConfig {
        ServerConfig {
            listen: self.listen,
            static_dir: self.static_dir,
            max_upload_bytes: self.max_upload_mb.saturating_mul(1024 * 1024),
        }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let config = self.config();
        if let Some(dir) = &config.static_dir {
            anyhow::ensure!(dir.is_dir(), "{} is not a directory", dir.display());
        }
        crate::server::serve(config)
            .await
            .context("the HTTP server stopped")
    }
}
