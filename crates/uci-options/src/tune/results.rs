//! チューニング結果の取り込み
//!
//! チューニングセッションの結果ダンプ（`param: <name>, best: <value>, ...` 形式の行）から
//! 各項目の最良値を読み、option 生成時の初期値として使う。

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};

/// 項目名 → 初期値の上書き
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TuneResults {
    values: HashMap<String, i32>,
}

impl TuneResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: i32) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<i32> {
        self.values.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 名前順に並べた `(name, value)`
    pub fn sorted(&self) -> Vec<(&str, i32)> {
        let mut out: Vec<(&str, i32)> = self.values.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        out.sort_unstable();
        out
    }

    /// 結果ダンプを読む。`param:` で始まらない行は無視する。
    pub fn parse(text: &str) -> Result<Self> {
        let mut results = Self::new();
        for (line_no, line) in text.lines().enumerate() {
            if let Some((name, value)) = parse_line(line, line_no + 1)? {
                results.insert(name, value);
            }
        }
        Ok(results)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text =
            fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("failed to parse {}", path.display()))
    }
}

impl FromIterator<(String, i32)> for TuneResults {
    fn from_iter<I: IntoIterator<Item = (String, i32)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

fn parse_line(line: &str, line_no: usize) -> Result<Option<(String, i32)>> {
    let Some(rest) = line.trim().strip_prefix("param:") else {
        return Ok(None);
    };

    let mut cols = rest.split(',').map(str::trim);
    let name = match cols.next() {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => bail!("line {line_no}: missing parameter name: {line}"),
    };
    let Some(best) = cols.find_map(|c| c.strip_prefix("best:")) else {
        bail!("line {line_no}: missing best value: {line}");
    };
    let best = best
        .trim()
        .parse::<f64>()
        .with_context(|| format!("line {line_no}: invalid best value: {}", best.trim()))?;
    if !best.is_finite() {
        bail!("line {line_no}: best value out of range: {best}");
    }

    Ok(Some((name, best.round() as i32)))
}
