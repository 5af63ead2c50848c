//! Prometheus metrics for the relay.

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

/// Relay metrics, registered on a private registry.
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub ask_requests: IntCounter,
    pub ask_failures: IntCounterVec,
    pub upstream_latency: Histogram,
    pub model_switches: IntCounterVec,
}

impl Metrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let ask_requests =
            IntCounter::new("relay_ask_requests_total", "Questions received on /ask")?;
        let ask_failures = IntCounterVec::new(
            Opts::new("relay_ask_failures_total", "Failed /ask requests by failure kind"),
            &["kind"],
        )?;
        let upstream_latency = Histogram::with_opts(HistogramOpts::new(
            "relay_upstream_latency_seconds",
            "Latency of inference server calls",
        ))?;
        let model_switches = IntCounterVec::new(
            Opts::new("relay_model_switches_total", "Model selection changes by target model"),
            &["model"],
        )?;

        registry.register(Box::new(ask_requests.clone()))?;
        registry.register(Box::new(ask_failures.clone()))?;
        registry.register(Box::new(upstream_latency.clone()))?;
        registry.register(Box::new(model_switches.clone()))?;

        Ok(Self {
            registry,
            ask_requests,
            ask_failures,
            upstream_latency,
            model_switches,
        })
    }

    /// Render all metrics in the text exposition format.
    pub fn render(&self) -> prometheus::Result<String> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_contains_counters() {
        let metrics = Metrics::new().unwrap();
        metrics.ask_requests.inc();
        metrics.ask_failures.with_label_values(&["unreachable"]).inc();

        let text = metrics.render().unwrap();
        assert!(text.contains("relay_ask_requests_total 1"));
        assert!(text.contains("relay_ask_failures_total{kind=\"unreachable\"} 1"));
    }
}
