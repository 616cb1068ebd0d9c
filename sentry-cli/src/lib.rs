//! Host harness: wires a concrete `Store`, a `SignatureVerifier`, and an
//! `EventSink`, then exposes `init`/`invoke` over a JSON argument map. This
//! crate implements none of the engine's decision logic itself (§6.5).

mod keyfile;

use clap::{Parser, Subcommand};
use keyfile::KeyfileVerifier;
use sentry_core::{AlwaysValidVerifier, ArgMap, Engine, EngineConfig, EventSink, NullEventSink, SignatureVerifier};
use sentry_store::{InMemoryBackend, RedbBackend, Store};
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "sentry-cli", about = "Host harness for the sentry membership-and-attestation engine")]
pub struct Cli {
    /// Raise the tracing filter to debug.
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// One-time: sets owner, governance, empty tier lists, Active state.
    Init {
        #[arg(long)]
        caller: String,
        #[arg(long)]
        governance: Option<String>,
        #[arg(long, default_value = "./sentry.redb")]
        db: String,
        #[arg(long)]
        ephemeral: bool,
    },
    /// Reads a JSON argument map (file or stdin) and runs one invocation.
    Invoke {
        #[arg(long)]
        caller: String,
        #[arg(long, default_value = "./sentry.redb")]
        db: String,
        #[arg(long)]
        ephemeral: bool,
        #[arg(long)]
        args_file: Option<String>,
        #[arg(long)]
        strict_sig: bool,
        #[arg(long)]
        keyfile: Option<String>,
    },
}

pub fn init_tracing(verbose: bool) {
    let filter = if verbose { "debug" } else { "info" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .try_init();
}

struct StdoutEventSink;

impl EventSink for StdoutEventSink {
    fn emit(&self, name: &str, fields: &[String]) {
        let line = serde_json::json!({"event": name, "fields": fields});
        println!("{line}");
    }
}

fn open_store(db: &str, ephemeral: bool) -> anyhow::Result<Store> {
    if ephemeral {
        Ok(Store::new(InMemoryBackend::new()))
    } else {
        Ok(Store::new(RedbBackend::open(db)?))
    }
}

fn build_verifier(
    strict_sig: bool,
    keyfile: Option<&str>,
) -> anyhow::Result<Arc<dyn SignatureVerifier>> {
    if strict_sig {
        let path = keyfile.ok_or_else(|| anyhow::anyhow!("--strict-sig requires --keyfile"))?;
        Ok(Arc::new(KeyfileVerifier::load(Path::new(path))?))
    } else {
        Ok(Arc::new(AlwaysValidVerifier))
    }
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    init_tracing(cli.verbose);
    match cli.command {
        Command::Init {
            caller,
            governance,
            db,
            ephemeral,
        } => {
            let store = open_store(&db, ephemeral)?;
            let engine = Engine::new(
                store,
                Arc::new(AlwaysValidVerifier),
                Arc::new(NullEventSink),
                EngineConfig::default(),
            );
            engine.init(&caller, governance.as_deref())?;
            println!("{{\"success\":true}}");
            Ok(())
        }
        Command::Invoke {
            caller,
            db,
            ephemeral,
            args_file,
            strict_sig,
            keyfile,
        } => {
            let store = open_store(&db, ephemeral)?;
            let verifier = build_verifier(strict_sig, keyfile.as_deref())?;
            let engine = Engine::new(
                store,
                verifier,
                Arc::new(StdoutEventSink),
                EngineConfig::default(),
            );

            let raw = match args_file {
                Some(path) => std::fs::read_to_string(path)?,
                None => {
                    let mut buf = String::new();
                    std::io::stdin().read_to_string(&mut buf)?;
                    buf
                }
            };
            let args: ArgMap = serde_json::from_str(&raw)?;

            let outcome = engine.invoke(&caller, &args);
            if outcome.ok {
                println!("{}", String::from_utf8_lossy(&outcome.payload));
                Ok(())
            } else {
                eprintln!("{}", outcome.error.unwrap_or_default());
                std::process::exit(1);
            }
        }
    }
}
