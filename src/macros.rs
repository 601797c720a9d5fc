/// Timestamped stdout logging, similar to `info!` in tracing.
/// Pass a starting time as the first argument to also print the elapsed time.
/// ```text
/// info_time!("checked {} keywords", 3);
/// let time = Local::now();
/// info_time!(time, "batch done");
/// ```
#[macro_export]
macro_rules! info_time {
    ($strfm:literal $(,)? $($arg:expr),*) => {{
        let local_now = Local::now();
        println!("{:<30} : {}", local_now, format!($strfm, $($arg),*));
    }};
    ($time:expr, $strfm:literal $(,)? $($arg:expr),*) => {{
        let local_now = Local::now();
        let run_time = (local_now - $time)
                .num_microseconds()
                .map(|n| n as f64 / 1_000_000.0)
                .unwrap_or(0.0);
        println!(
            "{:<30} : {} ({} sec)",
            local_now, format!($strfm, $($arg),*), run_time
        );
    }};
}
