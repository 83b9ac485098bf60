//! promptc: prompt compiler CLI
//!
//! Compiles YAML prompt files into source files through a cached language
//! model backend.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use promptc::{
    Backend, CacheStore, Compiler, Config, OutputFormat, RequestDescriptor, RetryConfig,
    with_retry, write_artifact,
};

/// Exit status when configuration is unusable.
const EXIT_CONFIG: u8 = 1;
/// Exit status when at least one input failed to compile.
const EXIT_INPUT_FAILED: u8 = 2;

/// Compile prompt files into code using AI models
#[derive(Parser)]
#[command(name = "promptc")]
#[command(version = promptc::PKG_VERSION)]
#[command(about = "Compile prompt files into code using AI models")]
struct Args {
    /// Input prompt file(s)
    #[arg(required_unless_present = "clear_cache")]
    input: Vec<PathBuf>,

    /// Output directory
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Config file path (default: ./promptc.toml, then ~/.promptc/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Force rebuild, ignore cached output
    #[arg(long)]
    force: bool,

    /// Cache directory (overrides config; default: .cache)
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Model backend (overrides config; default: openai)
    #[arg(long, value_enum)]
    backend: Option<Backend>,

    /// Specific model name (e.g. gpt-4, claude-3-opus-20240229)
    #[arg(long)]
    model: Option<String>,

    /// API key (overrides config and OPENAI_API_KEY / ANTHROPIC_API_KEY)
    #[arg(long)]
    api_key: Option<String>,

    /// Output layout
    #[arg(long, value_enum, default_value_t = OutputFormat::Split)]
    format: OutputFormat,

    /// Retries after a rate-limit error, waiting for the backend's hint
    #[arg(long, default_value_t = 0)]
    max_retries: u32,

    /// Delete all cached responses before compiling
    #[arg(long)]
    clear_cache: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialise tracing (default: warn for CLI; override with RUST_LOG).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = match resolve_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    if args.clear_cache {
        match CacheStore::file(&config.cache_dir).and_then(|store| store.clear()) {
            Ok(removed) => println!(
                "Cleared {removed} cached response(s) from {}",
                config.cache_dir.display()
            ),
            Err(e) => {
                eprintln!("Error: {e}");
                return ExitCode::from(EXIT_CONFIG);
            }
        }
        if args.input.is_empty() {
            return ExitCode::SUCCESS;
        }
    }

    let compiler = match config
        .api_key(args.api_key.as_deref())
        .and_then(|key| config.compiler_builder(key).build())
    {
        Ok(compiler) => compiler,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    tracing::info!(
        version = %promptc::version::version_string(),
        backend = compiler.generator().adapter().name(),
        inputs = args.input.len(),
        "compiling"
    );

    let retry = RetryConfig::retries(args.max_retries);
    let mut failed = 0usize;
    for input in &args.input {
        if !input.exists() {
            eprintln!("Error: Input file not found: {}", input.display());
            failed += 1;
            continue;
        }

        match compile_one(&compiler, &retry, input, &args).await {
            Ok(written) => {
                println!("Successfully compiled {}", input.display());
                for path in written {
                    println!("  wrote {}", path.display());
                }
            }
            Err(e) => {
                eprintln!("Error compiling {}: {e}", input.display());
                failed += 1;
            }
        }
    }

    if failed > 0 {
        ExitCode::from(EXIT_INPUT_FAILED)
    } else {
        ExitCode::SUCCESS
    }
}

/// Load the config file and apply command-line overrides.
fn resolve_config(args: &Args) -> promptc::Result<Config> {
    let mut config = Config::load(args.config.as_deref())?;
    if let Some(backend) = args.backend {
        if backend != config.backend {
            // A model name configured for another backend does not carry over.
            config.model = None;
            config.api_key = None;
        }
        config.backend = backend;
    }
    if let Some(model) = &args.model {
        config.model = Some(model.clone());
    }
    if let Some(dir) = &args.cache_dir {
        config.cache_dir = dir.clone();
    }
    Ok(config)
}

async fn compile_one(
    compiler: &Compiler,
    retry: &RetryConfig,
    input: &Path,
    args: &Args,
) -> promptc::Result<Vec<PathBuf>> {
    let descriptor = RequestDescriptor::read(input)?;
    let artifact = with_retry(retry, "compile", || compiler.compile(&descriptor, args.force)).await?;

    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    write_artifact(
        &artifact,
        &args.output_dir,
        &stem,
        descriptor.language(),
        args.format,
    )
}
