use metriken::*;

#[metric(
    name = "query_executions",
    description = "The number of ad hoc queries submitted past validation"
)]
pub static QUERY_EXECUTIONS: LazyCounter = LazyCounter::new(Counter::default);

#[metric(
    name = "query_failures",
    description = "The number of ad hoc queries that returned an error"
)]
pub static QUERY_FAILURES: LazyCounter = LazyCounter::new(Counter::default);
