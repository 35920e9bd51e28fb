use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use chrono::Utc;
use quote::{DepthQuote, PriceLevel, DEPTH_LEVELS};

use crate::api::{Credentials, MdApi, MdSpi, RspInfo};
use crate::error::GatewayError;

/// In-process gateway front simulation: drives the full
/// connect/login/subscribe/tick/logout callback sequence from its own
/// delivery threads, so the session stack can run without a live front.
pub struct SimFront {
    tick_interval: Duration,
    spi: Mutex<Option<Arc<dyn MdSpi>>>,
    streaming: Arc<Mutex<Vec<String>>>,
    epoch: Arc<AtomicU64>,
    connected: AtomicBool,
}

impl SimFront {
    pub fn new(tick_interval: Duration) -> Self {
        Self {
            tick_interval,
            spi: Mutex::new(None),
            streaming: Arc::new(Mutex::new(Vec::new())),
            epoch: Arc::new(AtomicU64::new(0)),
            connected: AtomicBool::new(false),
        }
    }

    fn spi(&self) -> Option<Arc<dyn MdSpi>> {
        match self.spi.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn deliver(&self, event: impl FnOnce(Arc<dyn MdSpi>) + Send + 'static) {
        if let Some(spi) = self.spi() {
            thread::spawn(move || event(spi));
        }
    }

    fn spawn_tick_stream(&self, spi: Arc<dyn MdSpi>) {
        let streaming = Arc::clone(&self.streaming);
        let epoch = Arc::clone(&self.epoch);
        let my_epoch = epoch.load(Ordering::Acquire);
        let interval = self.tick_interval;

        thread::spawn(move || {
            let mut prices: HashMap<String, f64> = HashMap::new();
            loop {
                if epoch.load(Ordering::Acquire) != my_epoch {
                    break;
                }
                thread::sleep(interval);

                let instruments = match streaming.lock() {
                    Ok(guard) => guard.clone(),
                    Err(poisoned) => poisoned.into_inner().clone(),
                };
                for instrument in instruments {
                    if epoch.load(Ordering::Acquire) != my_epoch {
                        return;
                    }
                    let price = prices.entry(instrument.clone()).or_insert(100.0);
                    *price += 0.1;
                    spi.on_depth_quote(sim_quote(&instrument, *price));
                }
            }
        });
    }
}

impl MdApi for SimFront {
    fn register_spi(&self, spi: Arc<dyn MdSpi>) {
        match self.spi.lock() {
            Ok(mut guard) => *guard = Some(spi),
            Err(poisoned) => *poisoned.into_inner() = Some(spi),
        }
    }

    fn connect(&self, _front: &str) -> Result<(), GatewayError> {
        let spi = self
            .spi()
            .ok_or_else(|| GatewayError::ConnectionFailed("no spi registered".to_string()))?;

        self.connected.store(true, Ordering::Release);
        self.epoch.fetch_add(1, Ordering::AcqRel);
        self.spawn_tick_stream(Arc::clone(&spi));
        thread::spawn(move || spi.on_front_connected());
        Ok(())
    }

    fn login(&self, _credentials: &Credentials, request_id: i32) -> Result<(), GatewayError> {
        if !self.connected.load(Ordering::Acquire) {
            return Err(GatewayError::NotConnected);
        }
        let trading_day = Utc::now().format("%Y%m%d").to_string();
        self.deliver(move |spi| {
            spi.on_rsp_user_login(&trading_day, &RspInfo::ok(), request_id, true);
        });
        Ok(())
    }

    fn subscribe(&self, instruments: &[String], request_id: i32) -> Result<(), GatewayError> {
        if !self.connected.load(Ordering::Acquire) {
            return Err(GatewayError::NotConnected);
        }
        {
            let mut streaming = match self.streaming.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            for instrument in instruments {
                if !streaming.contains(instrument) {
                    streaming.push(instrument.clone());
                }
            }
        }

        let batch = instruments.to_vec();
        self.deliver(move |spi| {
            let last = batch.len().saturating_sub(1);
            for (index, instrument) in batch.iter().enumerate() {
                spi.on_rsp_sub_market_data(instrument, &RspInfo::ok(), request_id, index == last);
            }
        });
        Ok(())
    }

    fn unsubscribe(&self, instruments: &[String], request_id: i32) -> Result<(), GatewayError> {
        if !self.connected.load(Ordering::Acquire) {
            return Err(GatewayError::NotConnected);
        }
        {
            let mut streaming = match self.streaming.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            streaming.retain(|x| !instruments.contains(x));
        }

        let batch = instruments.to_vec();
        self.deliver(move |spi| {
            let last = batch.len().saturating_sub(1);
            for (index, instrument) in batch.iter().enumerate() {
                spi.on_rsp_unsub_market_data(instrument, &RspInfo::ok(), request_id, index == last);
            }
        });
        Ok(())
    }

    fn logout(&self, request_id: i32) -> Result<(), GatewayError> {
        if !self.connected.load(Ordering::Acquire) {
            return Err(GatewayError::NotConnected);
        }
        {
            let mut streaming = match self.streaming.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            streaming.clear();
        }
        self.deliver(move |spi| {
            spi.on_rsp_user_logout(&RspInfo::ok(), request_id, true);
        });
        Ok(())
    }

    fn release(&self) {
        self.epoch.fetch_add(1, Ordering::AcqRel);
        self.connected.store(false, Ordering::Release);
        match self.spi.lock() {
            Ok(mut guard) => *guard = None,
            Err(poisoned) => *poisoned.into_inner() = None,
        }
    }
}

fn sim_quote(instrument: &str, last_price: f64) -> DepthQuote {
    let mut bids = [PriceLevel::default(); DEPTH_LEVELS];
    let mut asks = [PriceLevel::default(); DEPTH_LEVELS];
    for level in 0..DEPTH_LEVELS {
        bids[level] = PriceLevel {
            price: last_price - 0.2 * (level as f64 + 1.0),
            volume: 20.0 * (level as f64 + 1.0),
        };
        asks[level] = PriceLevel {
            price: last_price + 0.2 * (level as f64 + 1.0),
            volume: 20.0 * (level as f64 + 1.0),
        };
    }

    let now = Utc::now();
    DepthQuote {
        instrument: instrument.to_string(),
        exchange: "SIM".to_string(),
        trading_day: now.format("%Y%m%d").to_string(),
        datetime: now,
        last_price,
        pre_close_price: last_price - 0.5,
        pre_settlement_price: last_price - 0.4,
        open_price: 100.0,
        high_price: last_price + 0.6,
        low_price: 99.4,
        settlement_price: 0.0,
        upper_limit_price: last_price * 1.1,
        lower_limit_price: last_price * 0.9,
        volume: 1000.0,
        turnover: 1000.0 * last_price,
        open_interest: 5000.0,
        bids,
        asks,
    }
}
