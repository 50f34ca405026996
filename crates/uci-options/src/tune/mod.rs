//! 探索・評価パラメータのチューニング（SPSA向け）
//!
//! プロセス内の数値パラメータを spin option として公開し、`setoption` による
//! 更新をネイティブ値へ書き戻す。パラメータごとの手書きコードは不要で、
//! [`Tuner::register`] か [`tune!`](crate::tune!) で束縛するだけでよい。
//!
//! 典型的な流れ:
//!
//! 1. パラメータを [`Tuner::register`] で登録する
//! 2. 必要なら [`Tuner::set_results`] で前回のチューニング結果を与える
//! 3. [`Tuner::init`] で option を生成し、ネイティブ値を同期する

mod conditions;
mod entry;
mod results;
mod score;

pub use conditions::{Condition, ConditionSampler};
pub use entry::{Binding, PostUpdate, SetRange, TuneEntry, default_range};
pub use results::TuneResults;
pub use score::{AtomicScore, Score};

use std::fmt;
use std::sync::Arc;

use log::{debug, error, info, warn};
use parking_lot::Mutex;

use crate::error::OptionResult;
use crate::map::OptionsMap;
use crate::option::UciOption;

/// チューニングツールへ渡す学習率（固定）
pub const LEARNING_RATE: f64 = 0.002;

/// option 変更時にネイティブ値を同期するタイミング
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncPolicy {
    /// チューニング option が変わるたびに全項目を同期する
    #[default]
    Immediate,
    /// 最後に登録された option が変わったときだけ同期する（一括設定向け）
    OnLastRegistered,
    /// 自動では同期しない。呼び出し側が [`Tuner::read_options`] を呼ぶ
    Manual,
}

/// 生成した option 1つ分の診断行（`name,value,min,max,step,learning_rate`）
#[derive(Debug, Clone, PartialEq)]
pub struct TuneLine {
    pub name: String,
    pub value: i32,
    pub min: i32,
    pub max: i32,
}

impl TuneLine {
    /// 摂動幅: 範囲の 1/20
    pub fn step(&self) -> f64 {
        (f64::from(self.max) - f64::from(self.min)) / 20.0
    }
}

/// 有効数字6桁で出力する（`%g` 形式）
fn format_float(value: f64) -> String {
    if value == 0.0 || !value.is_finite() {
        return format!("{value}");
    }
    // 丸めで桁が繰り上がる場合も指数は `{:e}` に任せる
    let sci = format!("{value:.5e}");
    let Some((mantissa, exp)) = sci.split_once('e') else {
        return sci;
    };
    let exp: i32 = exp.parse().unwrap_or(0);
    if !(-4..6).contains(&exp) {
        let sign = if exp < 0 { '-' } else { '+' };
        return format!("{}e{sign}{:02}", trim_zeros(mantissa.to_string()), exp.abs());
    }
    let decimals = (5 - exp) as usize;
    trim_zeros(format!("{value:.decimals$}"))
}

fn trim_zeros(mut rendered: String) -> String {
    if rendered.contains('.') {
        while rendered.ends_with('0') {
            rendered.pop();
        }
        if rendered.ends_with('.') {
            rendered.pop();
        }
    }
    rendered
}

fn checked_range(
    name: &str,
    range: SetRange,
    value: i32,
    limits: (i32, i32),
) -> Option<(i32, i32)> {
    let (min, max) = range.range(value);
    let (min, max) = (min.clamp(limits.0, limits.1), max.clamp(limits.0, limits.1));
    if min > max {
        warn!("tune: '{name}' has an inverted range ({min} > {max}), skipped");
        return None;
    }
    if min == max {
        debug!("tune: '{name}' has nothing to tune (min = max = {min})");
        return None;
    }
    Some((min, max))
}

impl fmt::Display for TuneLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{},{},{LEARNING_RATE:.4}",
            self.name,
            self.value,
            self.min,
            self.max,
            format_float(self.step())
        )
    }
}

#[derive(Default)]
struct Inner {
    entries: Mutex<Vec<TuneEntry>>,
    /// `init` 済みの項目数
    initialized: Mutex<usize>,
    results: Mutex<TuneResults>,
    policy: Mutex<SyncPolicy>,
    last_option: Mutex<Option<String>>,
    report: Mutex<Vec<TuneLine>>,
}

/// チューニング項目の集合。
///
/// clone は同じ集合を指す。生成した option の変更通知もこの集合を参照する。
#[derive(Clone, Default)]
pub struct Tuner {
    inner: Arc<Inner>,
}

impl Tuner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_results(results: TuneResults) -> Self {
        let tuner = Self::new();
        tuner.set_results(results);
        tuner
    }

    /// `init` 時に初期値を上書きする結果を設定する
    pub fn set_results(&self, results: TuneResults) {
        *self.inner.results.lock() = results;
    }

    pub fn set_policy(&self, policy: SyncPolicy) {
        *self.inner.policy.lock() = policy;
    }

    pub fn policy(&self) -> SyncPolicy {
        *self.inner.policy.lock()
    }

    pub fn len(&self) -> usize {
        self.inner.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.lock().is_empty()
    }

    /// 登録済み項目のコピー
    pub fn entries(&self) -> Vec<TuneEntry> {
        self.inner.entries.lock().clone()
    }

    /// 最後に生成された option の名前
    pub fn last_option(&self) -> Option<String> {
        self.inner.last_option.lock().clone()
    }

    /// 項目を登録する。option は次の [`Tuner::init`] で作られる。
    pub fn register(&self, name: impl Into<String>, binding: impl Into<Binding>, range: SetRange) {
        let entry = TuneEntry::new(name, binding, range);
        debug!("tune entry registered: {}", entry.name());
        self.inner.entries.lock().push(entry);
    }

    /// 未初期化の項目の option を生成し、全項目のネイティブ値を同期する。
    pub fn init(&self, options: &mut OptionsMap) -> OptionResult<()> {
        let pending = {
            let entries = self.inner.entries.lock();
            let mut initialized = self.inner.initialized.lock();
            let pending = entries[*initialized..].to_vec();
            *initialized = entries.len();
            pending
        };
        for entry in &pending {
            entry.init_option(self, options);
        }
        self.read_options(options)
    }

    /// 全項目について option の現在値をネイティブ値へ書き戻す。
    ///
    /// `PostUpdate` 項目はここで呼ばれる。
    pub fn read_options(&self, options: &OptionsMap) -> OptionResult<()> {
        let entries = self.entries();
        for entry in &entries {
            entry.read_option(options)?;
        }
        debug!("tune: {} entries synchronized", entries.len());
        Ok(())
    }

    /// 生成済み option の診断行
    pub fn report(&self) -> Vec<TuneLine> {
        self.inner.report.lock().clone()
    }

    /// 診断行を取り出して空にする
    pub fn take_report(&self) -> Vec<TuneLine> {
        std::mem::take(&mut *self.inner.report.lock())
    }

    fn should_sync(&self, changed: &str) -> bool {
        match self.policy() {
            SyncPolicy::Immediate => true,
            SyncPolicy::OnLastRegistered => self
                .inner
                .last_option
                .lock()
                .as_deref()
                .is_some_and(|last| last.eq_ignore_ascii_case(changed)),
            SyncPolicy::Manual => false,
        }
    }

    fn on_tune(tuner: Tuner) -> impl Fn(&UciOption, &mut OptionsMap) + Send + Sync + 'static {
        move |option: &UciOption, options: &mut OptionsMap| {
            if !tuner.should_sync(option.name()) {
                return;
            }
            if let Err(e) = tuner.read_options(options) {
                error!("tune: failed to synchronize after '{}' changed: {e}", option.name());
            }
        }
    }

    /// 1つの spin option を生成する。
    ///
    /// 範囲は束縛先に格納できる `limits` に収める。潰れた範囲（min == max）や
    /// 逆転した範囲（min > max）では option を作らない。
    pub(crate) fn make_option(
        &self,
        options: &mut OptionsMap,
        name: &str,
        value: i32,
        range: SetRange,
        limits: (i32, i32),
    ) {
        if checked_range(name, range, value, limits).is_none() {
            return;
        }

        let value = self.inner.results.lock().get(name).unwrap_or(value);
        let Some((min, max)) = checked_range(name, range, value, limits) else {
            return;
        };
        let value = value.clamp(min, max);

        options.insert(
            name,
            UciOption::spin(value.into(), min.into(), max.into())
                .on_change(Self::on_tune(self.clone())),
        );
        *self.inner.last_option.lock() = Some(name.to_string());

        let line = TuneLine {
            name: name.to_string(),
            value,
            min,
            max,
        };
        info!("{line}");
        self.inner.report.lock().push(line);
    }
}

impl fmt::Debug for Tuner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tuner")
            .field("entries", &*self.inner.entries.lock())
            .field("policy", &self.policy())
            .finish()
    }
}

/// 複数のパラメータを式の文字列を名前として登録する。
///
/// ```ignore
/// tune!(tuner; pawn_value, knight_value);
/// tune!(tuner, SetRange::Fixed(-100, 100); contempt);
/// ```
#[macro_export]
macro_rules! tune {
    ($tuner:expr, $range:expr; $($param:expr),+ $(,)?) => {
        $(
            $tuner.register(
                stringify!($param),
                ::std::sync::Arc::clone(&$param),
                $range,
            );
        )+
    };
    ($tuner:expr; $($param:expr),+ $(,)?) => {
        $crate::tune!($tuner, $crate::tune::SetRange::default(); $($param),+)
    };
}
