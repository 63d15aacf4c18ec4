//! # Quiz Chain Solver
//!
//! 自动求解链式网页谜题：渲染页面 → 解码隐藏指令 → 识别数据文件和提交端点 →
//! 计算答案 → 提交 → 按返回的下一题 URL 继续，整条链受同一个截止时间约束
//!
//! ## 架构设计
//!
//! 本系统沿用四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露能力
//! - `PageSession` - 每步独占一个标签页，任何退出路径都会关闭
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个步骤
//! - `ContentFetcher` - 渲染页面
//! - `PayloadDecoder` - 解码 base64 指令
//! - `ReferenceClassifier` - 识别提交端点 / 数据文件
//! - `AnswerEngine` - 下载解析数据文件并按规则表计算答案
//! - `SubmissionClient` - 提交答案并解读响应
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一步"的完整处理流程
//! - `ChallengeStep` - 单步上下文
//! - `StepFlow` - 流程编排（fetch → decode → classify → answer → submit）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/chain_runner` - 链路状态机与截止时间
//! - `orchestrator/dispatcher` - 有界工作池与墙钟上限

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{ArtifactError, ConfigError, FetchError, StepError, SubmissionError};
pub use infrastructure::PageSession;
pub use models::{
    AnswerValue, ChainReport, ChainRequest, ChainState, Credentials, Deadline, StepRecord,
    SubmissionResult,
};
pub use orchestrator::{ChainDispatcher, ChainOrchestrator};
pub use services::{ChromiumFetcher, ContentFetcher};
pub use workflow::{ChallengeStep, StepFlow, StepOutcome};
