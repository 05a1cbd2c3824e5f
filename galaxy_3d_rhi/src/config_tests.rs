use super::*;

#[test]
fn test_default_values() {
    let config = Config::default();
    assert_eq!(config.cmd_buffer_capacity, 10 * 1024);
    assert_eq!(config.frames_in_flight, 2);
    assert_eq!(config.pool_alloc_base, 8);
    assert_eq!(config.pool_alloc_factor, 2);
    assert_eq!(config.release_frequency, 2);
    assert_eq!(config.time_to_keep, 4);
    assert!(config.validate().is_ok());
}

#[test]
fn test_zero_capacity_rejected() {
    let config = Config { cmd_buffer_capacity: 0, ..Config::default() };
    match config.validate() {
        Err(Error::InvalidConfig(msg)) => assert!(msg.contains("cmd_buffer_capacity")),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_growth_factor_below_two_rejected() {
    let config = Config { pool_alloc_factor: 1, ..Config::default() };
    match config.validate() {
        Err(Error::InvalidConfig(msg)) => assert!(msg.contains("pool_alloc_factor")),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_zero_frames_in_flight_rejected() {
    let config = Config { frames_in_flight: 0, ..Config::default() };
    assert!(config.validate().is_err());
}

#[test]
fn test_zero_release_frequency_rejected() {
    let config = Config { release_frequency: 0, ..Config::default() };
    assert!(config.validate().is_err());
}

#[test]
fn test_time_to_keep_below_frames_in_flight_is_accepted() {
    // The descriptor cache clamps it instead
    let config = Config { time_to_keep: 1, frames_in_flight: 3, ..Config::default() };
    assert!(config.validate().is_ok());
}
