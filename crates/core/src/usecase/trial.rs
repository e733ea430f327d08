use std::collections::HashMap;

use parking_lot::Mutex;

use crate::domain::error::AppError;

pub const TRIAL_ENDED_MESSAGE: &str = "Free Trial Ended. Please login to continue.";

/// 匿名クライアントごとの無料アップロード回数
pub struct TrialGate {
    limit: u32,
    counts: Mutex<HashMap<String, u32>>,
}

impl TrialGate {
    pub fn new(limit: u32) -> Self {
        Self {
            limit,
            counts: Mutex::new(HashMap::new()),
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// 上限の確認と1回分の予約を同じロック内で行う。予約後の使用回数を返す。
    pub fn try_acquire(&self, client: &str) -> Result<u32, AppError> {
        let mut counts = self.counts.lock();
        let used = counts.entry(client.to_string()).or_insert(0);
        if *used >= self.limit {
            log::info!("Free trial exhausted for {client}");
            return Err(AppError::trial_ended(TRIAL_ENDED_MESSAGE));
        }
        *used += 1;
        Ok(*used)
    }

    /// 保存に至らなかったアップロードの予約を戻す
    pub fn release(&self, client: &str) {
        let mut counts = self.counts.lock();
        if let Some(used) = counts.get_mut(client) {
            *used = used.saturating_sub(1);
            if *used == 0 {
                counts.remove(client);
            }
        }
    }

    pub fn used(&self, client: &str) -> u32 {
        self.counts.lock().get(client).copied().unwrap_or(0)
    }
}
