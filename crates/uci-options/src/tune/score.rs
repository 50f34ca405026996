//! 中盤値・終盤値のペア

use std::sync::atomic::{AtomicI32, Ordering};

/// 中盤値（下位16bit）と終盤値（上位16bit）を1つの `i32` に詰めた評価値。
///
/// 加減算がそのまま両成分に効くよう、終盤値は中盤値の符号による借りを
/// 含んだ形で格納される。取り出し時に補正する。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Score(i32);

impl Score {
    pub const ZERO: Score = Score(0);

    pub const fn new(mg: i32, eg: i32) -> Self {
        Score((((eg as u32) << 16) as i32).wrapping_add(mg))
    }

    /// 中盤値
    pub const fn mg(self) -> i32 {
        self.0 as i16 as i32
    }

    /// 終盤値
    pub const fn eg(self) -> i32 {
        ((self.0 as u32).wrapping_add(0x8000) >> 16) as u16 as i16 as i32
    }

    pub const fn raw(self) -> i32 {
        self.0
    }

    pub const fn from_raw(raw: i32) -> Self {
        Score(raw)
    }
}

/// 探索スレッドと共有する [`Score`]
#[derive(Debug, Default)]
pub struct AtomicScore(AtomicI32);

impl AtomicScore {
    pub const fn new(score: Score) -> Self {
        AtomicScore(AtomicI32::new(score.raw()))
    }

    pub fn load(&self) -> Score {
        Score::from_raw(self.0.load(Ordering::Relaxed))
    }

    pub fn store(&self, score: Score) {
        self.0.store(score.raw(), Ordering::Relaxed);
    }
}
