use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::info;
use uci_options::{EngineEvent, EngineHooks, OptionsMap, register_engine_options};

#[derive(Parser, Debug)]
#[command(author, version, about = "エンジンの UCI option 一覧を出力する")]
struct Cli {
    /// 出力前に適用する値（NAME=VALUE、複数可）
    #[arg(long = "set", value_name = "NAME=VALUE")]
    sets: Vec<String>,

    /// descriptor 行の代わりに JSON で出力する
    #[arg(long)]
    json: bool,

    /// 現在値も出力する（descriptor 行は既定値のみを含む）
    #[arg(long)]
    current: bool,
}

/// 通知をログに流すだけの hooks
struct LogHooks;

impl EngineHooks for LogHooks {
    fn handle(&self, event: EngineEvent) {
        info!("engine event: {event:?}");
    }
}

fn parse_assignment(raw: &str) -> Result<(&str, &str)> {
    let Some((name, value)) = raw.split_once('=') else {
        bail!("expected NAME=VALUE, got '{raw}'");
    };
    let name = name.trim();
    if name.is_empty() {
        bail!("empty option name in '{raw}'");
    }
    Ok((name, value.trim()))
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut options = OptionsMap::new();
    register_engine_options(&mut options, Arc::new(LogHooks));

    for raw in &cli.sets {
        let (name, value) = parse_assignment(raw)?;
        if !options.contains(name) {
            bail!("unknown option '{name}'");
        }
        if !options.set(name, value) {
            log::warn!("value '{value}' rejected for option '{name}'");
        }
    }

    if cli.json {
        let rendered = serde_json::to_string_pretty(&options.descriptors())
            .context("failed to serialize descriptors")?;
        println!("{rendered}");
        return Ok(());
    }

    for option in options.iter() {
        if cli.current {
            println!("{option} current {}", option.current_text());
        } else {
            println!("{option}");
        }
    }
    Ok(())
}
