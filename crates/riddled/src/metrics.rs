//! Prometheus metrics for the judge service

use prometheus::{
    register_int_counter_vec_with_registry, register_int_counter_with_registry,
    register_int_gauge_with_registry, Encoder, IntCounter, IntCounterVec, IntGauge, Registry,
    TextEncoder,
};
use riddle_common::{CacheStats, Verdict};

#[derive(Clone)]
pub struct RiddleMetrics {
    pub questions_total: IntCounter,
    pub verdicts_total: IntCounterVec,
    pub guesses_total: IntCounterVec,
    pub rejected_total: IntCounterVec,
    pub overrides_learned_total: IntCounter,
    pub answer_feedback_total: IntCounter,
    pub degraded_total: IntCounter,

    // Mirrored from the verdict cache at scrape time
    pub cache_hits: IntGauge,
    pub cache_misses: IntGauge,
    pub cache_evictions: IntGauge,
    pub cache_size: IntGauge,

    registry: Registry,
}

impl RiddleMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let questions_total = register_int_counter_with_registry!(
            "riddle_questions_total",
            "Questions classified",
            registry
        )?;

        let verdicts_total = register_int_counter_vec_with_registry!(
            "riddle_verdicts_total",
            "Verdicts by outcome and deciding rule",
            &["outcome", "evidence"],
            registry
        )?;

        let guesses_total = register_int_counter_vec_with_registry!(
            "riddle_guesses_total",
            "Solution guesses scored, by correctness",
            &["correct"],
            registry
        )?;

        let rejected_total = register_int_counter_vec_with_registry!(
            "riddle_rejected_total",
            "Requests refused before reaching the judge, by reason",
            &["reason"],
            registry
        )?;

        let overrides_learned_total = register_int_counter_with_registry!(
            "riddle_overrides_learned_total",
            "Corrections recorded through /feedback",
            registry
        )?;

        let answer_feedback_total = register_int_counter_with_registry!(
            "riddle_answer_feedback_total",
            "Guess feedback records appended",
            registry
        )?;

        let degraded_total = register_int_counter_with_registry!(
            "riddle_degraded_total",
            "Requests answered with the system-error verdict",
            registry
        )?;

        let cache_hits = register_int_gauge_with_registry!(
            "riddle_cache_hits",
            "Verdict cache hits since start",
            registry
        )?;

        let cache_misses = register_int_gauge_with_registry!(
            "riddle_cache_misses",
            "Verdict cache misses since start",
            registry
        )?;

        let cache_evictions = register_int_gauge_with_registry!(
            "riddle_cache_evictions",
            "Verdict cache evictions since start",
            registry
        )?;

        let cache_size = register_int_gauge_with_registry!(
            "riddle_cache_size",
            "Verdicts currently cached",
            registry
        )?;

        Ok(Self {
            questions_total,
            verdicts_total,
            guesses_total,
            rejected_total,
            overrides_learned_total,
            answer_feedback_total,
            degraded_total,
            cache_hits,
            cache_misses,
            cache_evictions,
            cache_size,
            registry,
        })
    }

    pub fn record_verdict(&self, verdict: &Verdict) {
        self.questions_total.inc();
        self.verdicts_total
            .with_label_values(&[verdict.outcome.as_str(), verdict.evidence.as_str()])
            .inc();
    }

    pub fn record_guess(&self, correct: bool) {
        let label = if correct { "true" } else { "false" };
        self.guesses_total.with_label_values(&[label]).inc();
    }

    pub fn record_rejection(&self, reason: &str) {
        self.rejected_total.with_label_values(&[reason]).inc();
    }

    pub fn observe_cache(&self, stats: &CacheStats) {
        self.cache_hits.set(stats.hits as i64);
        self.cache_misses.set(stats.misses as i64);
        self.cache_evictions.set(stats.evictions as i64);
        self.cache_size.set(stats.size as i64);
    }

    /// Prometheus text exposition format.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
