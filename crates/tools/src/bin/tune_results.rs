use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use uci_options::tune::TuneResults;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    /// name,value
    Csv,
    /// setoption name <name> value <value>
    Setoption,
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "チューニング結果ダンプから各項目の最良値を取り出す"
)]
struct Cli {
    /// 結果ダンプ（`param: <name>, best: <value>, ...` 行を含むファイル）
    results: PathBuf,

    /// 出力形式
    #[arg(long, value_enum, default_value_t = Format::Csv)]
    format: Format,
}

fn render(results: &TuneResults, format: Format) -> Vec<String> {
    results
        .sorted()
        .into_iter()
        .map(|(name, value)| match format {
            Format::Csv => format!("{name},{value}"),
            Format::Setoption => format!("setoption name {name} value {value}"),
        })
        .collect()
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let results = TuneResults::load(&cli.results)?;
    log::info!("{} tuned values loaded from {}", results.len(), cli.results.display());
    for line in render(&results, cli.format) {
        println!("{line}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_formats() {
        let results = TuneResults::parse("param: B, best: 2.4\nparam: A, best: -1.6").unwrap();
        assert_eq!(render(&results, Format::Csv), ["A,-2", "B,2"]);
        assert_eq!(
            render(&results, Format::Setoption),
            ["setoption name A value -2", "setoption name B value 2"]
        );
    }
}
