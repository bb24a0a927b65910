use metriken::*;

#[metric(
    name = "poll_cycles",
    description = "The number of poll cycles that appended a fresh snapshot"
)]
pub static POLL_CYCLES: LazyCounter = LazyCounter::new(Counter::default);

#[metric(
    name = "poll_failures",
    description = "The number of poll cycles whose fetch failed and was skipped"
)]
pub static POLL_FAILURES: LazyCounter = LazyCounter::new(Counter::default);

#[metric(
    name = "poll_discarded",
    description = "The number of in-flight fetch results discarded because their session was stopped"
)]
pub static POLL_DISCARDED: LazyCounter = LazyCounter::new(Counter::default);
