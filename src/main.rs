//! vsay command line entry point
//!
//! `vsay [--debug] [--engine SLUG] [--no-cache] [PHRASE...]`
//!
//! With a phrase, speaks it through the selected engine (the profile's
//! `[speech] engine` by default). Without one, runs the self-test: lists
//! available and disabled engines, then speaks a test phrase through every
//! available engine.

use anyhow::{bail, Context};
use log::{error, info};
use std::process;
use vsay::config::Config;
use vsay::speech::{default_registry, EngineContext, EngineRegistry, Playback, SpeakOutcome};

const TEST_PHRASE: &str = "This is a test.";

/// Parsed command line
#[derive(Debug, Default)]
struct Options {
    debug: bool,
    engine: Option<String>,
    use_cache: bool,
    phrase: Vec<String>,
}

fn parse_args(args: &[String]) -> anyhow::Result<Options> {
    let mut options = Options {
        use_cache: true,
        ..Options::default()
    };

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--debug" | "-d" => options.debug = true,
            "--no-cache" => options.use_cache = false,
            "--engine" | "-e" => match iter.next() {
                Some(slug) => options.engine = Some(slug.clone()),
                None => bail!("--engine requires a slug"),
            },
            _ => options.phrase.push(arg.clone()),
        }
    }

    Ok(options)
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let options = match parse_args(&args) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Usage: vsay [--debug] [--engine SLUG] [--no-cache] [PHRASE...]");
            process::exit(2);
        }
    };

    // Initialize logger
    if options.debug {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Debug)
            .init();
        info!("vsay version {} starting (debug mode)", vsay::VERSION);
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
            .init();
    }

    if let Err(e) = run(options) {
        error!("Fatal error: {:#}", e);
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run(options: Options) -> anyhow::Result<()> {
    let config = Config::load().context("Failed to load configuration")?;
    let ctx = EngineContext::from_config(config);
    let registry = default_registry();

    if options.phrase.is_empty() {
        self_test(&registry, &ctx);
        return Ok(());
    }

    let slug = options.engine.unwrap_or_else(|| ctx.config.engine());
    let phrase = options.phrase.join(" ");

    let mut engine = registry
        .select_by_slug(&slug, &ctx)
        .with_context(|| format!("Failed to select TTS engine '{}'", slug))?;
    engine
        .speak(&phrase, options.use_cache)
        .with_context(|| format!("Failed to say '{}' with '{}'", phrase, slug))?;

    Ok(())
}

/// List engines and speak the test phrase through each available one
///
/// Individual engine failures are printed and do not abort the run.
fn self_test(registry: &EngineRegistry, ctx: &EngineContext) {
    let available = registry.list_available(ctx);
    let disabled = registry.list_unavailable(ctx);

    println!("Available TTS engines:");
    for (i, engine) in available.iter().enumerate() {
        println!("{}. {}", i + 1, engine.slug);
    }

    println!();
    println!("Disabled TTS engines:");
    for (i, engine) in disabled.iter().enumerate() {
        println!("{}. {}", i + 1, engine.slug);
    }

    println!();
    for (i, descriptor) in available.iter().enumerate() {
        println!("{}. Testing engine '{}'...", i + 1, descriptor.slug);
        let result = (descriptor.build)(ctx).and_then(|mut engine| engine.speak(TEST_PHRASE, false));
        match result {
            Ok(SpeakOutcome::Played { playback: Playback::Warning(w), .. }) => {
                println!("   Player warning: {}", w)
            }
            Ok(_) => {}
            Err(e) => println!("   Failed: {}", e),
        }
    }
    println!("Done.");
}
