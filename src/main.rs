use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use answersheet::font::FontSet;
use answersheet::{
    Document, GenerationError, LaidOutDocument, LayoutConfig, LayoutEngine, Metadata, PdfWriter,
    Resources,
};

#[derive(Parser, Debug)]
#[command(version, about = "Render a JSON document as a question/answer PDF")]
struct Cli {
    /// JSON document to render. Reads stdin when omitted or "-".
    input: Option<PathBuf>,

    /// Where to write the PDF.
    #[arg(short, long, default_value = "answers.pdf")]
    output: PathBuf,

    /// Template descriptor (JSON) replacing the bundled A4 template.
    #[arg(long)]
    template: Option<PathBuf>,

    /// TrueType font for question lines.
    #[arg(long, requires = "regular_font")]
    bold_font: Option<PathBuf>,

    /// TrueType font for answer lines.
    #[arg(long, requires = "bold_font")]
    regular_font: Option<PathBuf>,

    /// Font size in points.
    #[arg(long, default_value_t = 10.0)]
    font_size: f64,

    /// Distance between lines in points.
    #[arg(long, default_value_t = 20.0)]
    line_height: f64,

    #[arg(long)]
    title: Option<String>,

    #[arg(long)]
    author: Option<String>,

    /// Print the laid-out lines instead of writing a PDF.
    #[arg(long)]
    lines: bool,

    /// Log page breaks and trimming.
    #[arg(short, long)]
    verbose: bool,
}

/// Why the tool stopped. Input problems exit with 2, everything else with 1.
enum Failure {
    Input(String),
    Generation(GenerationError),
    Output(String),
}

impl Failure {
    fn exit_code(&self) -> ExitCode {
        match self {
            Failure::Input(_) => ExitCode::from(2),
            Failure::Generation(e) if e.is_client_error() => ExitCode::from(2),
            Failure::Generation(_) | Failure::Output(_) => ExitCode::from(1),
        }
    }
}

impl From<GenerationError> for Failure {
    fn from(e: GenerationError) -> Self {
        Failure::Generation(e)
    }
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Failure::Input(msg) | Failure::Output(msg) => f.write_str(msg),
            Failure::Generation(e) => write!(f, "{e}"),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(failure) => {
            eprintln!("answersheet: {failure}");
            failure.exit_code()
        }
    }
}

fn run(cli: &Cli) -> Result<(), Failure> {
    if !(cli.font_size > 0.0 && cli.line_height > 0.0) {
        return Err(Failure::Input(
            "--font-size and --line-height must be positive".to_string(),
        ));
    }

    let json = read_input(cli.input.as_ref())?;
    let document = Document::from_json_str(&json)?;
    let resources = resources(cli)?;
    let config = LayoutConfig {
        font_size: cli.font_size,
        line_height: cli.line_height,
    };

    let laid_out = LayoutEngine::new(&resources, config).layout(&document)?;

    if cli.lines {
        return print_lines(&laid_out);
    }

    let metadata = Metadata {
        title: cli.title.clone(),
        author: cli.author.clone(),
    };
    let bytes = PdfWriter::new().write(&laid_out, resources.fonts(), &metadata);
    fs::write(&cli.output, &bytes)
        .map_err(|e| Failure::Output(format!("{}: {e}", cli.output.display())))?;

    log::info!(
        "wrote {} ({} pages, {} bytes)",
        cli.output.display(),
        laid_out.page_count(),
        bytes.len()
    );
    Ok(())
}

fn read_input(path: Option<&PathBuf>) -> Result<String, Failure> {
    match path {
        Some(path) if path.as_os_str() != "-" => fs::read_to_string(path)
            .map_err(|e| Failure::Input(format!("{}: {e}", path.display()))),
        _ => {
            let mut json = String::new();
            io::stdin()
                .read_to_string(&mut json)
                .map_err(|e| Failure::Input(format!("stdin: {e}")))?;
            Ok(json)
        }
    }
}

/// Bundled resources, with any file given on the command line swapped in.
fn resources(cli: &Cli) -> Result<Resources, GenerationError> {
    let mut resources = Resources::bundled()?.clone();

    if let Some(ref path) = cli.template {
        resources = resources.with_template(Resources::load_template(path)?);
    }
    if let (Some(bold), Some(regular)) = (&cli.bold_font, &cli.regular_font) {
        let fonts = FontSet::new(
            Resources::load_font("bold font", bold)?,
            Resources::load_font("regular font", regular)?,
        );
        resources = resources.with_fonts(fonts);
    }

    Ok(resources)
}

fn print_lines(laid_out: &LaidOutDocument) -> Result<(), Failure> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for (index, page) in laid_out.pages().iter().enumerate() {
        for line in &page.lines {
            writeln!(
                out,
                "{}\t{:.2}\t{:?}\t{}",
                index + 1,
                line.y,
                line.style,
                line.text
            )
            .map_err(|e| Failure::Output(format!("stdout: {e}")))?;
        }
    }
    Ok(())
}
