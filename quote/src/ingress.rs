//! ingress（入站）模块。
//!
//! 网关回调线程到消费者之间的有界无锁队列。回调线程绝不能被下游
//! 消费速度拖住，队列满时按过载策略丢弃并由上层计数。

use crossbeam::queue::ArrayQueue;

use crate::SharedQuote;

/// ingress 满载时的处理策略。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverloadPolicy {
	/// 丢弃当前新入队行情，保留既有队列内容。
	DropNewest,
	/// 丢弃队列最旧行情，再尝试写入当前新行情。
	DropOldest,
}

impl Default for OverloadPolicy {
	fn default() -> Self {
		Self::DropOldest
	}
}

/// 单次 `push` 的结果，用于上层统计背压与丢弃行为。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngressPushResult {
	/// 成功入队。
	Enqueued,
	/// 因策略或竞争导致新行情被丢弃。
	DroppedNewest,
	/// 为写入新行情而丢弃了旧行情。
	DroppedOldest,
}

/// 有界无锁行情队列。
#[derive(Debug)]
pub struct IngressQueue {
	queue: ArrayQueue<SharedQuote>,
	capacity: usize,
	overload_policy: OverloadPolicy,
}

impl IngressQueue {
	/// 使用默认过载策略创建队列。
	pub fn new(capacity: usize) -> Self {
		Self::with_policy(capacity, OverloadPolicy::default())
	}

	/// 使用指定过载策略创建队列。
	pub fn with_policy(capacity: usize, overload_policy: OverloadPolicy) -> Self {
		let bounded_capacity = capacity.max(1);
		Self {
			queue: ArrayQueue::new(bounded_capacity),
			capacity: bounded_capacity,
			overload_policy,
		}
	}

	/// 尝试写入一笔行情，并返回入队结果。
	pub fn push(&self, quote: SharedQuote) -> IngressPushResult {
		match self.queue.push(quote) {
			Ok(()) => IngressPushResult::Enqueued,
			Err(returned) => match self.overload_policy {
				OverloadPolicy::DropNewest => IngressPushResult::DroppedNewest,
				OverloadPolicy::DropOldest => {
					let _ = self.queue.pop();
					if self.queue.push(returned).is_ok() {
						IngressPushResult::DroppedOldest
					} else {
						IngressPushResult::DroppedNewest
					}
				}
			},
		}
	}

	/// 弹出一笔行情。
	pub fn pop(&self) -> Option<SharedQuote> {
		self.queue.pop()
	}

	/// 当前队列长度。
	pub fn len(&self) -> usize {
		self.queue.len()
	}

	/// 队列是否为空。
	pub fn is_empty(&self) -> bool {
		self.queue.is_empty()
	}

	/// 队列容量上限。
	pub fn capacity(&self) -> usize {
		self.capacity
	}
}
