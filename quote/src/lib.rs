//! `quote` crate 入口。
//!
//! 职责：承接网关回调线程推送的深度行情，提供有界无锁 ingress、
//! 按合约分片分发（fan-out）与基础指标。
//! 该文件只做模块装配与统一导出，具体实现位于各子模块。
//!
//! 模块分工：
//! - `depth`：`DepthQuote` / `PriceLevel` 数据结构。
//! - `ingress`：有界无锁队列与过载策略。
//! - `distributor`：按合约分片广播分发。
//! - `feed`：统一入口与主流程。
//! - `metrics`：运行指标快照。
//!
//! 快速示例：
//! ```rust
//! use quote::QuoteFeed;
//!
//! let feed = QuoteFeed::new();
//! let mut sub = feed.subscribe("al2412");
//!
//! let quotes = QuoteFeed::bootstrap_quotes("al2412", "SHFE", 1);
//! let _ = feed.publish(quotes[0].clone());
//!
//! let _ = sub.try_recv();
//! ```

mod depth;
mod distributor;
mod feed;
mod ingress;
mod metrics;

pub use depth::{DepthQuote, PriceLevel, SharedQuote, DEPTH_LEVELS};
pub use distributor::Distributor;
pub use feed::{QuoteFeed, QuoteFeedConfig};
pub use ingress::{IngressPushResult, IngressQueue, OverloadPolicy};
pub use metrics::QuoteMetrics;
