// tests/transfer_tests.rs - Include all transfer test modules

mod common;

mod transfer {
    mod test_round_trip;
}
