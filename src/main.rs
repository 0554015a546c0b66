use banana_i18n_catalog::mt::{DeepLProvider, MachineTranslator, MockMode, MockTranslator};
use banana_i18n_catalog::{
    BatchTranslator, Orchestrator, SessionConfig, check_missing_translations,
    infer_language_from_dir, load_proper_nouns, resolve_language_code,
};
use clap::{Arg, ArgAction, Command};
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

fn cli() -> Command {
    Command::new("banana-catalog")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Translate JSON message catalogs with DeepL, keeping placeholders and proper nouns intact")
        .arg(
            Arg::new("key")
                .long("key")
                .short('k')
                .env("DEEPL_API_KEY")
                .hide_env_values(true)
                .help("DeepL API key (keys ending in :fx use the free API)")
                .required_unless_present_any(["mock", "check-missing"]),
        )
        .arg(
            Arg::new("source")
                .long("source")
                .short('s')
                .help("Source catalog directory")
                .default_value("./messages/en"),
        )
        .arg(
            Arg::new("target")
                .long("target")
                .short('t')
                .help("Target catalog directory")
                .default_value("./messages/it"),
        )
        .arg(
            Arg::new("lang")
                .long("lang")
                .short('l')
                .help("Target language code (default: inferred from the target directory name)"),
        )
        .arg(
            Arg::new("file")
                .long("file")
                .short('f')
                .help("Translate a single catalog file instead of the whole source directory"),
        )
        .arg(
            Arg::new("proper-nouns")
                .long("proper-nouns")
                .help("Proper noun list to protect from translation")
                .default_value(banana_i18n_catalog::config::DEFAULT_PROPER_NOUNS_PATH),
        )
        .arg(
            Arg::new("cache-dir")
                .long("cache-dir")
                .help("Directory for on-disk translation caches")
                .default_value(banana_i18n_catalog::config::DEFAULT_CACHE_DIR),
        )
        .arg(
            Arg::new("mock")
                .long("mock")
                .short('m')
                .help("Use mock translator instead of DeepL")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("check-missing")
                .long("check-missing")
                .help("Report keys present in the source catalogs but missing in the target ones")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Show per-string protection details")
                .action(ArgAction::SetTrue),
        )
}

/// Log filter from `RUST_LOG` directives, falling back to `info`
///
/// `--verbose` adds a `debug` directive on top of whatever the environment
/// asked for.
fn log_filter(verbose: bool, env_directives: &str) -> EnvFilter {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .parse_lossy(env_directives);
    if verbose {
        filter.add_directive(LevelFilter::DEBUG.into())
    } else {
        filter
    }
}

fn init_tracing(verbose: bool) {
    let env_directives = std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_default();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(verbose, &env_directives))
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let matches = cli().get_matches();

    init_tracing(matches.get_flag("verbose"));

    let source_dir = matches
        .get_one::<String>("source")
        .map(PathBuf::from)
        .unwrap_or_default();
    let target_dir = matches
        .get_one::<String>("target")
        .map(PathBuf::from)
        .unwrap_or_default();

    if matches.get_flag("check-missing") {
        let report = check_missing_translations(&source_dir, &target_dir)?;
        println!("{}", serde_json::to_string_pretty(&report.files)?);
        println!("\nTotal missing: {} keys", report.total());
        return Ok(());
    }

    let proper_nouns = matches
        .get_one::<String>("proper-nouns")
        .map(|path| load_proper_nouns(&PathBuf::from(path)))
        .unwrap_or_default();

    let target_lang = match matches.get_one::<String>("lang") {
        Some(code) => resolve_language_code(code),
        None => infer_language_from_dir(&target_dir),
    };

    let cache_dir = matches
        .get_one::<String>("cache-dir")
        .map(PathBuf::from)
        .unwrap_or_default();
    let config = SessionConfig::default().with_cache_dir(&cache_dir);

    let translator: Box<dyn MachineTranslator> = if matches.get_flag("mock") {
        Box::new(MockTranslator::new(MockMode::Suffix))
    } else {
        let key = matches.get_one::<String>("key").cloned().unwrap_or_default();
        match DeepLProvider::new(key) {
            Ok(provider) => Box::new(provider),
            Err(e) => {
                eprintln!("❌ {}", e);
                eprintln!("   Pass --key or set DEEPL_API_KEY, or use --mock");
                return Err(e.into());
            }
        }
    };

    println!("\n{}", "=".repeat(60));
    println!("🌐 Catalog translation ({})", translator.provider_name());
    println!("{}", "=".repeat(60));
    println!("📍 Source:   {}", source_dir.display());
    println!("📍 Target:   {}", target_dir.display());
    println!("🔤 Language: {}", target_lang);
    println!("💾 Cache:    {}", cache_dir.display());
    println!("⏱️  Cache TTL: {} hours", config.cache_ttl.as_secs() / 3600);
    println!("{}\n", "=".repeat(60));

    let start = Instant::now();
    let mut orchestrator = Orchestrator::new(BatchTranslator::new(translator, proper_nouns, config));

    match matches.get_one::<String>("file") {
        Some(file) => {
            if let Err(e) = orchestrator
                .process_file(&PathBuf::from(file), &target_dir, &target_lang)
                .await
            {
                eprintln!("❌ {}", e);
                return Err(e.into());
            }
        }
        None => match orchestrator
            .process_directory(&source_dir, &target_dir, &target_lang)
            .await
        {
            Ok(summary) if !summary.failed.is_empty() => {
                eprintln!("⚠️  {} files failed", summary.failed.len());
            }
            Ok(_) => {}
            Err(e) => {
                eprintln!("❌ {}", e);
                return Err(e.into());
            }
        },
    }

    let stats = orchestrator.stats();
    println!("\n{}", "=".repeat(60));
    println!("✅ Translation finished");
    println!(
        "📊 Requests: {} | Cache hits: {} | Cache misses: {} | Retries: {}",
        stats.requests, stats.hits, stats.misses, stats.retries
    );
    if let Some(rate) = stats.hit_rate() {
        println!("💾 Cache hit rate: {:.1}%", rate);
    }
    println!("⏱️  Elapsed: {:.2}s", start.elapsed().as_secs_f64());
    println!("{}\n", "=".repeat(60));

    Ok(())
}
