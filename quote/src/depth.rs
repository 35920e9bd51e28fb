//! 行情数据结构定义模块。
//!
//! - `PriceLevel`：单档买/卖盘口（价格 + 量）。
//! - `DepthQuote`：一笔完整的深度行情快照（tick）。
//! - `SharedQuote`：跨线程分发时的共享引用类型。

use std::sync::Arc;

use chrono::{DateTime, Utc};

/// 盘口档位数（买五/卖五）。
pub const DEPTH_LEVELS: usize = 5;

/// 单档盘口：价格与挂单量。
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PriceLevel {
	pub price: f64,
	pub volume: f64,
}

/// 深度行情快照。
///
/// 字段与网关推送的深度行情记录一一对应：价格族、成交统计、
/// 持仓量、交易日与买卖五档盘口。
#[derive(Debug, Clone)]
pub struct DepthQuote {
	/// 合约代码。
	pub instrument: String,
	/// 交易所代码。
	pub exchange: String,
	/// 交易日（网关原样透传的日期串）。
	pub trading_day: String,
	/// 行情时间戳。
	pub datetime: DateTime<Utc>,
	/// 最新价。
	pub last_price: f64,
	/// 昨收盘。
	pub pre_close_price: f64,
	/// 昨结算价。
	pub pre_settlement_price: f64,
	/// 今开盘。
	pub open_price: f64,
	/// 最高价。
	pub high_price: f64,
	/// 最低价。
	pub low_price: f64,
	/// 本次结算价。
	pub settlement_price: f64,
	/// 涨停板价。
	pub upper_limit_price: f64,
	/// 跌停板价。
	pub lower_limit_price: f64,
	/// 成交量。
	pub volume: f64,
	/// 成交金额。
	pub turnover: f64,
	/// 持仓量。
	pub open_interest: f64,
	/// 买一至买五。
	pub bids: [PriceLevel; DEPTH_LEVELS],
	/// 卖一至卖五。
	pub asks: [PriceLevel; DEPTH_LEVELS],
}

impl DepthQuote {
	/// 买一价（无盘口时为 0）。
	pub fn best_bid(&self) -> PriceLevel {
		self.bids[0]
	}

	/// 卖一价（无盘口时为 0）。
	pub fn best_ask(&self) -> PriceLevel {
		self.asks[0]
	}

	/// 买一卖一价差。
	pub fn spread(&self) -> f64 {
		self.asks[0].price - self.bids[0].price
	}
}

/// 分发通道与队列中共享的行情指针类型。
pub type SharedQuote = Arc<DepthQuote>;
