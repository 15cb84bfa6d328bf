//! End-to-end test of the process-wide logger macros

use spool_core::log::{logger, LogLevel};
use spool_core::{log_debug, log_error, log_info, log_warn};
use std::fs;

#[test]
fn test_macros_write_through_the_global_logger() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("spool");
    logger().init(&base, 8, LogLevel::Info).unwrap();

    log_debug!("this log will not be recorded");
    log_info!("Start record from here");
    log_warn!("Today is {}", "Fri");
    log_error!("Flush {} times", 1);
    logger().stop().unwrap();

    let today = chrono::Local::now().format("%Y-%m-%d");
    let path = format!("{}_{}", base.display(), today);
    let contents = fs::read_to_string(path).unwrap();

    assert!(contents.contains("|Start record from here"));
    assert!(contents.contains("|Today is Fri"));
    assert!(contents.contains("|Flush 1 times"));
    assert!(!contents.contains("this log will not be recorded"));

    // Lines carry their level tag and timestamp up front.
    for line in contents.lines() {
        assert!(line.starts_with("[I] | ") || line.starts_with("[W] | ") || line.starts_with("[E] | "));
    }
}
