//! `QuoteFeed` 主模块。
//!
//! 聚合 ingress、distributor 与 metrics，提供网关回调线程 publish
//! 与下游订阅的统一入口。publish 路径为 O(1) 且不阻塞。

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{Duration, Utc};
use tokio::sync::broadcast;

use crate::{
	DepthQuote, Distributor, IngressPushResult, IngressQueue, OverloadPolicy, PriceLevel,
	QuoteMetrics, SharedQuote, DEPTH_LEVELS,
};

/// `QuoteFeed` 初始化配置。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuoteFeedConfig {
	/// 每个分发通道的广播缓冲容量。
	pub channel_capacity: usize,
	/// ingress 有界队列容量。
	pub ingress_capacity: usize,
	/// ingress 满载时的过载策略。
	pub overload_policy: OverloadPolicy,
}

impl Default for QuoteFeedConfig {
	fn default() -> Self {
		Self {
			channel_capacity: 8192,
			ingress_capacity: 16384,
			overload_policy: OverloadPolicy::default(),
		}
	}
}

/// 行情发布与分发入口。
#[derive(Debug)]
pub struct QuoteFeed {
	distributor: Distributor,
	ingress: IngressQueue,
	published: AtomicU64,
	dropped: AtomicU64,
	dropped_newest: AtomicU64,
	dropped_oldest: AtomicU64,
}

impl QuoteFeed {
	/// 使用默认配置创建 `QuoteFeed`。
	pub fn new() -> Self {
		Self::with_config(QuoteFeedConfig::default())
	}

	/// 使用完整配置创建 `QuoteFeed`。
	pub fn with_config(config: QuoteFeedConfig) -> Self {
		Self {
			distributor: Distributor::new(config.channel_capacity),
			ingress: IngressQueue::with_policy(config.ingress_capacity, config.overload_policy),
			published: AtomicU64::new(0),
			dropped: AtomicU64::new(0),
			dropped_newest: AtomicU64::new(0),
			dropped_oldest: AtomicU64::new(0),
		}
	}

	/// 订阅指定合约的行情。
	pub fn subscribe(&self, instrument: &str) -> broadcast::Receiver<SharedQuote> {
		self.distributor.subscribe(instrument)
	}

	/// 发布一笔行情并广播到对应合约频道。
	///
	/// 返回该次广播的接收者数量。
	pub fn publish(&self, quote: DepthQuote) -> usize {
		let instrument = quote.instrument.clone();
		let shared = Arc::new(quote);

		match self.ingress.push(shared.clone()) {
			IngressPushResult::Enqueued => {}
			IngressPushResult::DroppedNewest => {
				self.dropped.fetch_add(1, Ordering::Relaxed);
				self.dropped_newest.fetch_add(1, Ordering::Relaxed);
			}
			IngressPushResult::DroppedOldest => {
				self.dropped.fetch_add(1, Ordering::Relaxed);
				self.dropped_oldest.fetch_add(1, Ordering::Relaxed);
			}
		}

		let receivers = self.distributor.broadcast(&instrument, shared);
		self.published.fetch_add(1, Ordering::Relaxed);
		receivers
	}

	/// 从 ingress 弹出一笔行情（用于回放/清理逻辑）。
	pub fn pop_ingress(&self) -> Option<SharedQuote> {
		self.ingress.pop()
	}

	/// 返回当前指标快照。
	pub fn metrics(&self) -> QuoteMetrics {
		let dropped_newest = self.dropped_newest.load(Ordering::Relaxed);
		let dropped_oldest = self.dropped_oldest.load(Ordering::Relaxed);
		QuoteMetrics {
			published: self.published.load(Ordering::Relaxed),
			dropped: self.dropped.load(Ordering::Relaxed),
			dropped_newest,
			dropped_oldest,
			backpressure_events: dropped_newest + dropped_oldest,
			ingress_len: self.ingress.len(),
			ingress_capacity: self.ingress.capacity(),
		}
	}

	/// 查询指定合约频道的订阅者数量。
	pub fn subscriber_count(&self, instrument: &str) -> usize {
		self.distributor.subscriber_count(instrument)
	}

	/// 列出当前活跃频道。
	pub fn active_channels(&self) -> Vec<String> {
		self.distributor.active_channels()
	}

	/// 生成用于测试/演示的 bootstrap 行情序列。
	pub fn bootstrap_quotes(instrument: &str, exchange: &str, count: usize) -> Vec<DepthQuote> {
		let start = Utc::now() - Duration::seconds(count as i64);
		(0..count)
			.map(|index| {
				let last = 100.0 + index as f64 * 0.2;
				let mut bids = [PriceLevel::default(); DEPTH_LEVELS];
				let mut asks = [PriceLevel::default(); DEPTH_LEVELS];
				for level in 0..DEPTH_LEVELS {
					bids[level] = PriceLevel {
						price: last - 0.1 * (level as f64 + 1.0),
						volume: 10.0 * (level as f64 + 1.0),
					};
					asks[level] = PriceLevel {
						price: last + 0.1 * (level as f64 + 1.0),
						volume: 10.0 * (level as f64 + 1.0),
					};
				}
				DepthQuote {
					instrument: instrument.to_string(),
					exchange: exchange.to_string(),
					trading_day: start.format("%Y%m%d").to_string(),
					datetime: start + Duration::seconds(index as i64),
					last_price: last,
					pre_close_price: last - 0.5,
					pre_settlement_price: last - 0.4,
					open_price: 100.0,
					high_price: last + 0.6,
					low_price: 99.4,
					settlement_price: 0.0,
					upper_limit_price: 110.0,
					lower_limit_price: 90.0,
					volume: 1000.0 + index as f64 * 10.0,
					turnover: (1000.0 + index as f64 * 10.0) * last,
					open_interest: 5000.0 + index as f64 * 8.0,
					bids,
					asks,
				}
			})
			.collect()
	}
}

impl Default for QuoteFeed {
	fn default() -> Self {
		Self::new()
	}
}
