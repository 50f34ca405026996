//! A/B 実験用の二値条件
//!
//! 各条件は `magnitude + (乱数 mod variance) > threshold` で真になる。
//! プロセス最初のサンプリングだけは全て偽にして、ベンチマークの再現性を保つ。

use std::io::{self, Write};
use std::num::NonZeroU32;
use std::time::{SystemTime, UNIX_EPOCH};

use log::debug;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

/// 1つの条件の入力
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Condition {
    pub magnitude: i32,
    pub variance: NonZeroU32,
}

#[derive(Debug, Clone)]
pub struct ConditionSampler {
    conditions: Vec<Condition>,
    threshold: i32,
    binary: Vec<bool>,
    rng: Xoshiro256PlusPlus,
    first_call: bool,
}

impl ConditionSampler {
    pub fn new(threshold: i32, seed: u64) -> Self {
        Self {
            conditions: Vec::new(),
            threshold,
            binary: Vec::new(),
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
            first_call: true,
        }
    }

    /// 現在時刻で seed する
    pub fn from_clock(threshold: i32) -> Self {
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        Self::new(threshold, seed)
    }

    pub fn push(&mut self, magnitude: i32, variance: NonZeroU32) {
        self.conditions.push(Condition { magnitude, variance });
        self.binary.push(false);
    }

    pub fn threshold(&self) -> i32 {
        self.threshold
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// 直近のサンプリング結果
    pub fn flags(&self) -> &[bool] {
        &self.binary
    }

    /// 条件ごとに乱数を1つ引いてフラグを決める。初回呼び出しは全て偽。
    pub fn sample(&mut self) -> &[bool] {
        for (flag, cond) in self.binary.iter_mut().zip(&self.conditions) {
            let noise = self.rng.random::<u32>() % cond.variance.get();
            *flag = !self.first_call
                && i64::from(cond.magnitude) + i64::from(noise) > i64::from(self.threshold);
        }
        self.first_call = false;
        debug!("conditions sampled: {:?}", self.binary);
        &self.binary
    }

    /// 次の `sample` を再び初回扱いにする
    pub fn reset(&mut self) {
        self.first_call = true;
    }

    /// フラグを1行に1つ `0`/`1` で書き出す
    pub fn write_flags<W: Write>(&self, mut out: W) -> io::Result<()> {
        for &flag in &self.binary {
            writeln!(out, "{}", u8::from(flag))?;
        }
        out.flush()
    }
}
