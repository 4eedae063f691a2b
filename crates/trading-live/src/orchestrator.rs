//! Strategy orchestrator.

use chrono::{Duration as ChronoDuration, NaiveDate, NaiveDateTime};
use std::collections::{BTreeMap, BTreeSet};
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};
use trading_core::error::{BrokerError, DataError, TradingError};
use trading_core::timing::{SessionConfig, TimingPolicy};
use trading_core::traits::{Clock, MarketFeed, OrderSink, PositionSizer, Validate};
use trading_core::types::{
    ExitReason, MarketEvent, OrderRequest, PriceUpdate, Signal, StrategyMetrics, TradeResult,
};
use trading_indicators::IndicatorEngine;
use trading_risk::{
    exit_reference_price, CostModel, DailyLimits, LimitCheck, PositionManager, RiskConfig,
    StopLossManager,
};
use trading_strategies::{SignalConfig, SignalDetector, SignalOutcome};

use crate::config::LiveConfig;
use crate::events::StrategyEvent;

/// Everything the orchestrator is configured with.
#[derive(Debug, Clone, Default)]
pub struct OrchestratorSettings {
    /// Symbols to subscribe to; empty means all the feed offers
    pub symbols: Vec<String>,
    pub signal: SignalConfig,
    pub risk: RiskConfig,
    pub costs: CostModel,
    pub session: SessionConfig,
    pub live: LiveConfig,
}

impl Validate for OrchestratorSettings {
    fn validate(&self) -> Result<(), TradingError> {
        self.signal.validate()?;
        self.risk.validate()?;
        self.costs.validate()?;
        self.session.validate()?;
        self.live.validate()
    }
}

/// Last seen price and bar volume of a symbol.
#[derive(Debug, Clone, Copy)]
struct Mark {
    price: f64,
    bar_volume: f64,
}

/// Live driver: single owner of indicator, signal and position state.
pub struct StrategyOrchestrator<S, C, P> {
    sink: S,
    clock: C,
    sizer: P,
    settings: OrchestratorSettings,
    timing: TimingPolicy,
    indicators: IndicatorEngine,
    detector: SignalDetector,
    positions: PositionManager,
    limits: DailyLimits,
    marks: BTreeMap<String, Mark>,
    /// Symbols with a snapshot not yet scanned
    fresh: BTreeSet<String>,
    /// Exits decided on a price update, waiting for the sink
    exits_due: BTreeMap<String, (ExitReason, PriceUpdate)>,
    pending: Vec<Signal>,
    trades: Vec<TradeResult>,
    metrics: StrategyMetrics,
    squared_off_on: Option<NaiveDate>,
    events: Option<mpsc::UnboundedSender<StrategyEvent>>,
}

impl<S, C, P> StrategyOrchestrator<S, C, P>
where
    S: OrderSink,
    C: Clock,
    P: PositionSizer,
{
    /// Create an orchestrator from validated settings.
    pub fn new(
        settings: OrchestratorSettings,
        sink: S,
        clock: C,
        sizer: P,
    ) -> Result<Self, TradingError> {
        settings.validate()?;

        let indicators = IndicatorEngine::new(settings.signal.di_period)?;
        let detector = SignalDetector::new(settings.signal.clone())?
            .with_slippage(settings.costs.slippage_pct);
        let mut stops = StopLossManager::new(settings.signal.trailing_stop_pct);
        if !settings.risk.enable_trailing_stops {
            stops = stops.without_trailing();
        }

        Ok(Self {
            sink,
            clock,
            sizer,
            timing: TimingPolicy::new(settings.session.clone()),
            indicators,
            detector,
            positions: PositionManager::new(stops, settings.costs),
            limits: DailyLimits::new(&settings.risk),
            settings,
            marks: BTreeMap::new(),
            fresh: BTreeSet::new(),
            exits_due: BTreeMap::new(),
            pending: Vec::new(),
            trades: Vec::new(),
            metrics: StrategyMetrics::default(),
            squared_off_on: None,
            events: None,
        })
    }

    /// Publish events on `tx`.
    pub fn with_events(mut self, tx: mpsc::UnboundedSender<StrategyEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn positions(&self) -> &PositionManager {
        &self.positions
    }

    pub fn trades(&self) -> &[TradeResult] {
        &self.trades
    }

    pub fn metrics(&self) -> &StrategyMetrics {
        &self.metrics
    }

    pub fn pending_signals(&self) -> &[Signal] {
        &self.pending
    }

    pub fn timing(&self) -> &TimingPolicy {
        &self.timing
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Square-off already ran on `date`.
    pub fn is_squared_off(&self, date: NaiveDate) -> bool {
        self.squared_off_on == Some(date)
    }

    /// Subscribe to `feed` and process events until it ends or `shutdown` flips.
    pub async fn run(
        &mut self,
        feed: &dyn MarketFeed,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<StrategyMetrics, TradingError> {
        let live = self.settings.live.clone();
        let mut rx = tokio::time::timeout(
            live.connect_timeout(),
            feed.subscribe(&self.settings.symbols),
        )
        .await
        .map_err(|_| {
            DataError::ConnectionError(format!(
                "{} subscribe timed out after {}s",
                feed.name(),
                live.connect_timeout_secs
            ))
        })??;

        info!(
            feed = feed.name(),
            sink = self.sink.name(),
            symbols = self.settings.symbols.len(),
            "Orchestrator started"
        );

        let mut tick = tokio::time::interval(live.cycle_interval());
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                maybe_event = rx.recv() => {
                    let Some(event) = maybe_event else {
                        info!("Market feed ended");
                        self.run_cycle().await;
                        break;
                    };
                    self.on_event(event);
                    if live.cycle_on_event {
                        self.run_cycle().await;
                    }
                }
                _ = tick.tick() => {
                    self.run_cycle().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Shutdown requested");
                        break;
                    }
                }
            }
        }

        info!(
            trades = self.metrics.total_trades,
            pnl = %self.metrics.total_pnl.round_dp(2),
            open = self.positions.len(),
            "Orchestrator stopped"
        );
        Ok(self.metrics.clone())
    }

    /// Apply one market event: indicators, volume, marks and exit decisions.
    pub fn on_event(&mut self, event: MarketEvent) {
        self.clock.observe(event.timestamp());
        let symbol = event.symbol().to_string();

        let mut bar_volume = self.marks.get(&symbol).map_or(0.0, |m| m.bar_volume);
        if let MarketEvent::Bar(bar) = &event {
            if self.indicators.update(bar).is_some() {
                self.fresh.insert(symbol.clone());
            }
            self.detector.observe_volume(&symbol, bar.volume);
            bar_volume = bar.volume;
        }
        self.marks.insert(
            symbol.clone(),
            Mark {
                price: event.last_price(),
                bar_volume,
            },
        );

        // A position carried over a data gap exits at its last mark, not at the new session's price
        if let Some(position) = self.positions.get(&symbol) {
            if position.entry_time.date() < event.timestamp().date() {
                let update = PriceUpdate::at(event.timestamp(), position.current_price);
                self.exits_due
                    .entry(symbol)
                    .or_insert((ExitReason::TimeExit, update));
                return;
            }
        }

        let update = event.price_update();
        let pair = self.indicators.latest_pair(&symbol);
        if let Some(reason) = self.positions.on_price(&symbol, &update, &self.timing, pair) {
            debug!(symbol = %symbol, %reason, "Exit condition met");
            self.exits_due.entry(symbol).or_insert((reason, update));
        }
    }

    /// One orchestration cycle at the clock's current time.
    pub async fn run_cycle(&mut self) {
        let now = self.clock.now();
        self.limits.roll(now.date());
        self.close_expired(now).await;

        if !self.timing.is_market_open(now) {
            if !self.positions.is_empty() && self.timing.should_square_off(now) {
                self.square_off(now).await;
            }
            return;
        }

        if self.timing.should_square_off(now) {
            self.square_off(now).await;
            self.pending.clear();
            self.fresh.clear();
            return;
        }

        self.monitor(now).await;

        let can_scan = self.timing.can_generate_signals(now)
            && !self.is_squared_off(now.date())
            && self.positions.len() < self.settings.risk.max_positions;
        let scanned: Vec<String> = std::mem::take(&mut self.fresh).into_iter().collect();
        if can_scan {
            self.scan(&scanned, now);
        }

        self.admit(now).await;
        self.metrics = StrategyMetrics::from_trades(&self.trades);
    }

    /// Close positions whose deadline passed without a square-off cycle, e.g.
    /// when the clock jumped over the session end.
    async fn close_expired(&mut self, now: NaiveDateTime) {
        let expired: Vec<(String, PriceUpdate)> = self
            .positions
            .positions()
            .filter(|p| {
                // Same-day deadlines go through the regular square-off
                p.entry_time.date() < now.date()
                    || (p.must_exit_by <= now && !self.timing.should_square_off(now))
            })
            .map(|p| (p.symbol.clone(), PriceUpdate::at(now, p.current_price)))
            .collect();
        if expired.is_empty() {
            return;
        }

        warn!(count = expired.len(), "Positions past their exit deadline");
        for (symbol, update) in expired {
            self.exits_due
                .entry(symbol)
                .or_insert((ExitReason::TimeExit, update));
        }
        self.monitor(now).await;
        self.metrics = StrategyMetrics::from_trades(&self.trades);
    }

    async fn square_off(&mut self, now: NaiveDateTime) {
        let first = !self.is_squared_off(now.date());
        self.squared_off_on = Some(now.date());

        let mut closed = 0;
        for symbol in self.positions.symbols() {
            let Some(price) = self.positions.get(&symbol).map(|p| p.current_price) else {
                continue;
            };
            let update = PriceUpdate::at(now, price);
            match self.execute_exit(&symbol, ExitReason::TimeExit, &update, now).await {
                Ok(true) => closed += 1,
                Ok(false) => {}
                Err(e) => error!(symbol = %symbol, error = %e, "Square-off order failed, will retry"),
            }
        }

        if first || closed > 0 {
            info!(date = %now.date(), closed, "Squared off");
            self.emit(StrategyEvent::SquaredOff {
                date: now.date(),
                closed,
            });
        }
        self.metrics = StrategyMetrics::from_trades(&self.trades);
    }

    async fn monitor(&mut self, now: NaiveDateTime) {
        let due: Vec<(String, (ExitReason, PriceUpdate))> = self
            .exits_due
            .iter()
            .map(|(symbol, exit)| (symbol.clone(), *exit))
            .collect();

        for (symbol, (reason, update)) in due {
            match self.execute_exit(&symbol, reason, &update, now).await {
                Ok(_) => {
                    self.exits_due.remove(&symbol);
                }
                Err(e) => {
                    // Keep the position and the decision for the next cycle
                    error!(symbol = %symbol, %reason, error = %e, "Exit order failed, will retry");
                }
            }
        }
    }

    /// Submit the closing order and close the position once it is accepted.
    ///
    /// `Ok(false)` means there was nothing to close.
    async fn execute_exit(
        &mut self,
        symbol: &str,
        reason: ExitReason,
        update: &PriceUpdate,
        now: NaiveDateTime,
    ) -> Result<bool, BrokerError> {
        let Some(position) = self.positions.get(symbol) else {
            self.exits_due.remove(symbol);
            return Ok(false);
        };

        let price = exit_reference_price(position.direction, reason, update);
        let request = OrderRequest::market(symbol, position.direction.exit_side(), position.quantity)
            .with_reference_price(price);
        self.sink.submit_order(request).await?;

        self.exits_due.remove(symbol);
        let Some(trade) = self.positions.close(symbol, price, reason, now) else {
            return Ok(false);
        };
        self.limits.record_exit(trade.pnl);
        self.trades.push(trade.clone());
        self.emit(StrategyEvent::PositionClosed(Box::new(trade)));
        Ok(true)
    }

    fn scan(&mut self, symbols: &[String], now: NaiveDateTime) {
        let deadline = self.timing.square_off_at(now);
        for symbol in symbols {
            if self.positions.contains(symbol) {
                continue;
            }
            let (Some((current, previous)), Some(mark)) =
                (self.indicators.latest_pair(symbol), self.marks.get(symbol))
            else {
                continue;
            };

            match self
                .detector
                .evaluate(current, Some(previous), mark.price, mark.bar_volume, deadline)
            {
                SignalOutcome::Accepted(signal) => {
                    debug!(symbol = %symbol, confidence = signal.confidence, "Signal pending");
                    self.pending.push(*signal);
                }
                SignalOutcome::Rejected { direction, reason } => {
                    debug!(symbol = %symbol, %direction, %reason, "Signal rejected");
                }
                SignalOutcome::NoCrossover => {}
            }
        }
    }

    async fn admit(&mut self, now: NaiveDateTime) {
        if self.pending.is_empty() {
            return;
        }

        let mut pending = std::mem::take(&mut self.pending);
        pending.sort_by(|a, b| {
            b.confidence
                .total_cmp(&a.confidence)
                .then_with(|| a.symbol.cmp(&b.symbol))
        });

        // Ages beyond a day never matter intraday
        let max_age =
            ChronoDuration::seconds(self.settings.signal.max_signal_age_secs.min(86_400) as i64);

        for signal in pending {
            if signal.is_stale(now, max_age) {
                self.discard(&signal, format!("stale after {}s", signal.age(now).num_seconds()));
                continue;
            }
            if let Err(reason) = self.timing.validate_entry_time(now) {
                self.discard(&signal, reason.to_string());
                continue;
            }
            if self.positions.contains(&signal.symbol) {
                self.discard(&signal, "position already open".to_string());
                continue;
            }
            if let LimitCheck::Blocked { reason } = self.limits.check_new_position(self.positions.len())
            {
                self.discard(&signal, reason);
                continue;
            }

            let quantity = self.sizer.size_for(signal.entry_price, signal.stop_loss);
            let request =
                OrderRequest::market(&signal.symbol, signal.direction.entry_side(), quantity)
                    .with_reference_price(signal.entry_price);

            let order = match self.sink.submit_order(request).await {
                Ok(order) if order.status.is_executed() => order,
                Ok(order) => {
                    self.discard(&signal, format!("order {:?}", order.status));
                    continue;
                }
                Err(e) => {
                    warn!(symbol = %signal.symbol, error = %e, "Entry order failed");
                    self.discard(&signal, e.to_string());
                    continue;
                }
            };

            match self.positions.open_from_signal(&signal, quantity, now) {
                Ok(_) => {
                    self.limits.record_entry();
                    info!(
                        symbol = %signal.symbol,
                        direction = %signal.direction,
                        confidence = signal.confidence,
                        quantity = %quantity,
                        "Signal admitted"
                    );
                    self.emit(StrategyEvent::SignalAdmitted {
                        signal: Box::new(signal),
                        quantity,
                        order,
                    });
                }
                Err(e) => self.discard(&signal, e.to_string()),
            }
        }
    }

    fn discard(&self, signal: &Signal, reason: String) {
        debug!(symbol = %signal.symbol, reason = %reason, "Signal discarded");
        self.emit(StrategyEvent::SignalDiscarded {
            symbol: signal.symbol.clone(),
            direction: signal.direction,
            confidence: signal.confidence,
            reason,
        });
    }

    fn emit(&self, event: StrategyEvent) {
        if let Some(tx) = &self.events {
            // A closed receiver only means nobody is listening
            let _ = tx.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::sync::Arc;
    use trading_broker::PaperBroker;
    use trading_core::traits::ManualClock;
    use trading_core::types::{Bar, Direction, Side};
    use trading_risk::RiskBasedSizer;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    /// 15 falling bars then rising bars from 09:15; +DI crosses above on bar 21.
    fn reversal(count: usize) -> Vec<Bar> {
        let mut base = 200.0;
        (0..count)
            .map(|i| {
                if i > 0 {
                    base += if i < 15 { -1.0 } else { 1.0 };
                }
                let ts = at(9, 15) + ChronoDuration::minutes(i as i64);
                Bar::new("UP", ts, base, base + 1.0, base - 1.0, base, 1000.0)
            })
            .collect()
    }

    fn settings() -> OrchestratorSettings {
        OrchestratorSettings {
            symbols: vec!["UP".to_string()],
            signal: SignalConfig {
                enable_volume_filter: false,
                min_di_separation: 0.5,
                min_adx_strength: 0.0,
                min_confidence: 0.0,
                ..SignalConfig::default()
            },
            costs: CostModel::free(),
            ..OrchestratorSettings::default()
        }
    }

    type Harness = StrategyOrchestrator<PaperBroker, ManualClock, RiskBasedSizer>;

    fn harness() -> (
        Harness,
        PaperBroker,
        ManualClock,
        mpsc::UnboundedReceiver<StrategyEvent>,
    ) {
        let clock = ManualClock::new(at(9, 0));
        let broker = PaperBroker::new(Arc::new(clock.clone()));
        let (tx, rx) = mpsc::unbounded_channel();
        let settings = settings();
        let sizer = settings.risk.sizer();
        let orchestrator = StrategyOrchestrator::new(settings, broker.clone(), clock.clone(), sizer)
            .unwrap()
            .with_events(tx);
        (orchestrator, broker, clock, rx)
    }

    fn feed(orchestrator: &mut Harness, bars: &[Bar]) {
        for bar in bars {
            orchestrator.on_event(MarketEvent::Bar(bar.clone()));
        }
    }

    #[tokio::test]
    async fn test_crossover_is_admitted() {
        let (mut orch, broker, clock, mut events) = harness();
        feed(&mut orch, &reversal(22));
        assert_eq!(clock.now(), at(9, 36));

        orch.run_cycle().await;

        let position = orch.positions().get("UP").unwrap();
        assert_eq!(position.direction, Direction::Long);
        assert_eq!(position.entry_price, dec!(193));
        assert_eq!(position.quantity, dec!(103));

        let orders = broker.orders();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].side, Side::Buy);
        assert!(matches!(
            events.try_recv(),
            Ok(StrategyEvent::SignalAdmitted { .. })
        ));

        // The same crossover is not admitted twice
        orch.run_cycle().await;
        assert_eq!(broker.order_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_entry_creates_no_position() {
        let (mut orch, broker, _clock, mut events) = harness();
        broker.set_reject_all(true);
        feed(&mut orch, &reversal(22));

        orch.run_cycle().await;

        assert!(orch.positions().is_empty());
        assert!(orch.pending_signals().is_empty());
        assert!(matches!(
            events.try_recv(),
            Ok(StrategyEvent::SignalDiscarded { .. })
        ));
    }

    #[tokio::test]
    async fn test_stale_signal_discarded() {
        let (mut orch, broker, clock, _events) = harness();
        feed(&mut orch, &reversal(22));
        clock.advance(ChronoDuration::seconds(31));

        orch.run_cycle().await;
        assert!(orch.positions().is_empty());
        assert_eq!(broker.order_count(), 0);
    }

    #[tokio::test]
    async fn test_square_off_closes_and_halts() {
        let (mut orch, broker, clock, mut events) = harness();
        let bars = reversal(25);
        feed(&mut orch, &bars[..22]);
        orch.run_cycle().await;
        assert_eq!(orch.positions().len(), 1);
        feed(&mut orch, &bars[22..]);
        orch.run_cycle().await;

        clock.set(at(15, 20));
        orch.run_cycle().await;

        assert!(orch.positions().is_empty());
        assert!(orch.is_squared_off(at(15, 20).date()));
        assert_eq!(orch.trades().len(), 1);
        assert_eq!(orch.trades()[0].exit_reason, ExitReason::TimeExit);
        // Last mark was the 09:39 close
        assert_eq!(orch.trades()[0].exit_price, dec!(196));
        assert_eq!(broker.orders()[1].side, Side::Sell);
        assert_eq!(orch.metrics().total_trades, 1);

        let mut kinds = Vec::new();
        while let Ok(event) = events.try_recv() {
            kinds.push(event);
        }
        assert!(matches!(kinds.last(), Some(StrategyEvent::SquaredOff { closed: 1, .. })));
    }

    fn next_day(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 3)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[tokio::test]
    async fn test_gap_over_square_off_closes_at_last_mark() {
        let (mut orch, broker, _clock, _events) = harness();
        feed(&mut orch, &reversal(22));
        orch.run_cycle().await;
        assert_eq!(orch.positions().len(), 1);

        // Next session starts with another symbol; no cycle ran at 15:20
        let other = Bar::new("OTHER", next_day(9, 20), 50.0, 51.0, 49.0, 50.0, 1000.0);
        orch.on_event(MarketEvent::Bar(other));
        orch.run_cycle().await;

        assert!(orch.positions().is_empty());
        assert_eq!(orch.trades().len(), 1);
        let trade = &orch.trades()[0];
        assert_eq!(trade.exit_reason, ExitReason::TimeExit);
        assert_eq!(trade.exit_price, dec!(193));
        assert_eq!(broker.order_count(), 2);
        assert_eq!(orch.metrics().total_trades, 1);
    }

    #[tokio::test]
    async fn test_gap_ignores_next_session_price() {
        let (mut orch, _broker, _clock, _events) = harness();
        feed(&mut orch, &reversal(22));
        orch.run_cycle().await;

        let gapped = Bar::new("UP", next_day(9, 15), 150.0, 151.0, 149.0, 150.0, 1000.0);
        orch.on_event(MarketEvent::Bar(gapped));
        orch.run_cycle().await;

        assert!(orch.positions().is_empty());
        assert_eq!(orch.trades()[0].exit_reason, ExitReason::TimeExit);
        assert_eq!(orch.trades()[0].exit_price, dec!(193));
    }

    #[tokio::test]
    async fn test_failed_exit_is_retried() {
        let (mut orch, broker, clock, _events) = harness();
        feed(&mut orch, &reversal(22));
        orch.run_cycle().await;

        broker.set_reject_all(true);
        clock.set(at(15, 20));
        orch.run_cycle().await;
        assert_eq!(orch.positions().len(), 1);

        broker.set_reject_all(false);
        clock.set(at(15, 21));
        orch.run_cycle().await;
        assert!(orch.positions().is_empty());
        assert_eq!(orch.trades().len(), 1);
    }

    #[tokio::test]
    async fn test_stop_exit_from_price_update() {
        let (mut orch, broker, _clock, _events) = harness();
        feed(&mut orch, &reversal(22));
        orch.run_cycle().await;

        // Gap through the 183.35 stop
        let crash = Bar::new("UP", at(9, 37), 185.0, 186.0, 180.0, 181.0, 1000.0);
        orch.on_event(MarketEvent::Bar(crash));
        orch.run_cycle().await;

        assert_eq!(orch.trades().len(), 1);
        assert_eq!(orch.trades()[0].exit_reason, ExitReason::StopLoss);
        assert_eq!(orch.trades()[0].exit_price, dec!(180));
        assert_eq!(broker.order_count(), 2);
    }

    struct VecFeed {
        events: Vec<MarketEvent>,
        delay: Option<std::time::Duration>,
    }

    #[async_trait]
    impl MarketFeed for VecFeed {
        async fn subscribe(
            &self,
            _symbols: &[String],
        ) -> Result<mpsc::Receiver<MarketEvent>, DataError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            let (tx, rx) = mpsc::channel(self.events.len().max(1));
            for event in &self.events {
                tx.send(event.clone()).await.unwrap();
            }
            Ok(rx)
        }

        fn name(&self) -> &str {
            "vec"
        }
    }

    #[tokio::test]
    async fn test_run_until_feed_ends() {
        let (_, broker, clock, _events) = harness();
        let mut settings = settings();
        settings.live.cycle_on_event = true;
        let sizer = settings.risk.sizer();
        let mut orch =
            StrategyOrchestrator::new(settings, broker.clone(), clock.clone(), sizer).unwrap();

        let feed = VecFeed {
            events: reversal(30).into_iter().map(MarketEvent::Bar).collect(),
            delay: None,
        };
        let (_stop_tx, stop_rx) = watch::channel(false);

        let metrics = orch.run(&feed, stop_rx).await.unwrap();
        assert_eq!(metrics.total_trades, 0);
        assert_eq!(orch.positions().len(), 1);
        assert_eq!(broker.order_count(), 1);
        assert_eq!(clock.now(), at(9, 44));
    }

    #[tokio::test]
    async fn test_subscribe_timeout() {
        let (_, broker, clock, _events) = harness();
        let mut settings = settings();
        settings.live.connect_timeout_secs = 1;
        let sizer = settings.risk.sizer();
        let mut orch = StrategyOrchestrator::new(settings, broker, clock, sizer).unwrap();

        let feed = VecFeed {
            events: Vec::new(),
            delay: Some(std::time::Duration::from_secs(30)),
        };
        let (_stop_tx, stop_rx) = watch::channel(false);

        let result = orch.run(&feed, stop_rx).await;
        assert!(matches!(
            result,
            Err(TradingError::Data(DataError::ConnectionError(_)))
        ));
    }
}
