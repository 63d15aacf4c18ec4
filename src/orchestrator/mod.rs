//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `chain_runner` - 链路编排器
//! - 持有截止时间，逐步调用 `workflow::StepFlow`
//! - 维护链路状态机，输出 `ChainReport`
//!
//! ### `dispatcher` - 链路调度器
//! - 有界工作池（Semaphore）
//! - 外层墙钟上限，超时合成报告
//!
//! ## 层次关系
//!
//! ```text
//! dispatcher (处理 Vec<ChainRequest>)
//!     ↓
//! chain_runner (处理一条链)
//!     ↓
//! workflow::StepFlow (处理一步)
//!     ↓
//! services (能力层：fetch / decode / classify / answer / submit)
//!     ↓
//! infrastructure (基础设施：PageSession)
//! ```

pub mod chain_runner;
pub mod dispatcher;

pub use chain_runner::{ChainOrchestrator, ChainRun};
pub use dispatcher::ChainDispatcher;
