// tests/monitoring_tests.rs - Include all monitoring test modules

mod common;

mod monitoring {
    mod test_poller;
}
