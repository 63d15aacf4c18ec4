//! 链路截止时间
//!
//! 一条链只有一个截止时刻，贯穿每一步的渲染、下载、提交：
//! 每个阻塞调用之前检查一次，调用本身的超时不超过剩余时间

use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    /// 从现在起 `budget` 之后截止
    pub fn after(budget: Duration) -> Self {
        Self {
            at: Instant::now() + budget,
        }
    }

    pub fn at(at: Instant) -> Self {
        Self { at }
    }

    pub fn instant(&self) -> Instant {
        self.at
    }

    /// 剩余时间，已过期时为零
    pub fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }

    /// 单次调用的超时：不超过 `limit`，也不超过剩余时间
    pub fn cap(&self, limit: Duration) -> Duration {
        limit.min(self.remaining())
    }

    pub fn has_passed(&self) -> bool {
        self.has_passed_at(Instant::now())
    }

    /// 到达截止时刻即视为过期
    pub fn has_passed_at(&self, now: Instant) -> bool {
        now >= self.at
    }
}
