use tracing::info;
use ytmux::logging::{init_tracing, LogFlush, LOG_FILE};

#[test]
fn flush_writes_everything_buffered_to_the_log_file() {
    let dir = tempfile::tempdir().unwrap();
    let flush = LogFlush::new(init_tracing(dir.path(), false).unwrap());

    for i in 0..2000 {
        info!(target: "ytmux", "candidate line {}", i);
    }
    info!(target: "ytmux", "final line");

    flush.clone().flush();
    flush.flush();

    let log = std::fs::read_to_string(dir.path().join(LOG_FILE)).unwrap();
    assert_eq!(log.lines().count(), 2001);
    assert!(log.lines().last().unwrap().contains("final line"));
}
