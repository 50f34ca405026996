//! チューニング項目とネイティブ値の束縛

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};

use crate::error::OptionResult;
use crate::map::OptionsMap;

use super::Tuner;
use super::score::{AtomicScore, Score};

/// 値の更新後に呼ぶ処理（派生テーブルの再計算など）
pub type PostUpdate = Arc<dyn Fn() + Send + Sync>;

/// option と結び付けるネイティブ値
#[derive(Clone)]
pub enum Binding {
    /// 整数パラメータ。option 1つ
    Scalar(Arc<AtomicI32>),
    /// 中盤/終盤ペア。`m<name>` と `e<name>` の option 2つ
    Score(Arc<AtomicScore>),
    /// option は作らず、`read_option` のたびに呼ぶ
    PostUpdate(PostUpdate),
}

impl Binding {
    pub fn post_update(f: impl Fn() + Send + Sync + 'static) -> Self {
        Binding::PostUpdate(Arc::new(f))
    }
}

impl From<Arc<AtomicI32>> for Binding {
    fn from(cell: Arc<AtomicI32>) -> Self {
        Binding::Scalar(cell)
    }
}

impl From<Arc<AtomicScore>> for Binding {
    fn from(cell: Arc<AtomicScore>) -> Self {
        Binding::Score(cell)
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Binding::Scalar(cell) => f.debug_tuple("Scalar").field(cell).finish(),
            Binding::Score(cell) => f.debug_tuple("Score").field(&cell.load()).finish(),
            Binding::PostUpdate(_) => f.write_str("PostUpdate"),
        }
    }
}

/// 現在値から `(min, max)` を決める範囲指定
#[derive(Debug, Clone, Copy)]
pub enum SetRange {
    /// 値によらない固定範囲（inclusive）
    Fixed(i32, i32),
    /// 現在値から範囲を計算する
    Func(fn(i32) -> (i32, i32)),
}

impl SetRange {
    pub fn range(&self, value: i32) -> (i32, i32) {
        match *self {
            SetRange::Fixed(min, max) => (min, max),
            SetRange::Func(f) => f(value),
        }
    }
}

/// 既定の範囲: 正なら `[0, 2v]`、それ以外は `[2v, 0]`。
/// 0 は範囲が潰れるので option にならない。
pub fn default_range(value: i32) -> (i32, i32) {
    if value > 0 {
        (0, value.saturating_mul(2))
    } else {
        (value.saturating_mul(2), 0)
    }
}

impl Default for SetRange {
    fn default() -> Self {
        SetRange::Func(default_range)
    }
}

const SCALAR_LIMITS: (i32, i32) = (i32::MIN, i32::MAX);
/// `Score` の各半分は 16 bit に詰める
const SCORE_LIMITS: (i32, i32) = (i16::MIN as i32, i16::MAX as i32);

/// 1つのチューニング項目
#[derive(Debug, Clone)]
pub struct TuneEntry {
    name: String,
    binding: Binding,
    range: SetRange,
}

impl TuneEntry {
    pub fn new(name: impl Into<String>, binding: impl Into<Binding>, range: SetRange) -> Self {
        Self {
            name: name.into(),
            binding: binding.into(),
            range,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn binding(&self) -> &Binding {
        &self.binding
    }

    /// 束縛値に対応する option を `options` に作る。
    pub(crate) fn init_option(&self, tuner: &Tuner, options: &mut OptionsMap) {
        match &self.binding {
            Binding::Scalar(cell) => {
                let value = cell.load(Ordering::Relaxed);
                tuner.make_option(options, &self.name, value, self.range, SCALAR_LIMITS);
            }
            Binding::Score(cell) => {
                let score = cell.load();
                for (prefix, value) in [("m", score.mg()), ("e", score.eg())] {
                    let name = format!("{prefix}{}", self.name);
                    tuner.make_option(options, &name, value, self.range, SCORE_LIMITS);
                }
            }
            Binding::PostUpdate(_) => {}
        }
    }

    /// option の現在値を束縛値へ書き戻す。option が無い側は触らない。
    pub fn read_option(&self, options: &OptionsMap) -> OptionResult<()> {
        match &self.binding {
            Binding::Scalar(cell) => {
                if let Some(opt) = options.get(&self.name) {
                    cell.store(opt.as_i32()?, Ordering::Relaxed);
                }
            }
            Binding::Score(cell) => {
                let mut score = cell.load();
                if let Some(opt) = options.get(&format!("m{}", self.name)) {
                    score = Score::new(opt.as_i32()?, score.eg());
                }
                if let Some(opt) = options.get(&format!("e{}", self.name)) {
                    score = Score::new(score.mg(), opt.as_i32()?);
                }
                cell.store(score);
            }
            Binding::PostUpdate(f) => f(),
        }
        Ok(())
    }
}
