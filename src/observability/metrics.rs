use prometheus::{
    Encoder, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub orders_generated_total: IntCounterVec,
    pub orders_swept_total: IntCounter,
    pub orders_active: IntGauge,
    pub sweep_latency_seconds: HistogramVec,
    pub courier_moves_total: IntCounterVec,
    pub courier_score: IntGauge,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let orders_generated_total = IntCounterVec::new(
            Opts::new("orders_generated_total", "Total generated orders by outcome"),
            &["outcome"],
        )
        .expect("valid orders_generated_total metric");

        let orders_swept_total =
            IntCounter::new("orders_swept_total", "Total orders removed by the expiry sweep")
                .expect("valid orders_swept_total metric");

        let orders_active = IntGauge::new("orders_active", "Orders currently in the index")
            .expect("valid orders_active metric");

        let sweep_latency_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "sweep_latency_seconds",
                "Latency of one expiry sweep in seconds",
            ),
            &["outcome"],
        )
        .expect("valid sweep_latency_seconds metric");

        let courier_moves_total = IntCounterVec::new(
            Opts::new("courier_moves_total", "Courier moves by outcome"),
            &["outcome"],
        )
        .expect("valid courier_moves_total metric");

        let courier_score = IntGauge::new("courier_score", "Orders collected by the courier")
            .expect("valid courier_score metric");

        registry
            .register(Box::new(orders_generated_total.clone()))
            .expect("register orders_generated_total");
        registry
            .register(Box::new(orders_swept_total.clone()))
            .expect("register orders_swept_total");
        registry
            .register(Box::new(orders_active.clone()))
            .expect("register orders_active");
        registry
            .register(Box::new(sweep_latency_seconds.clone()))
            .expect("register sweep_latency_seconds");
        registry
            .register(Box::new(courier_moves_total.clone()))
            .expect("register courier_moves_total");
        registry
            .register(Box::new(courier_score.clone()))
            .expect("register courier_score");

        Self {
            registry,
            orders_generated_total,
            orders_swept_total,
            orders_active,
            sweep_latency_seconds,
            courier_moves_total,
            courier_score,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
