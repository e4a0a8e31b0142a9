use std::time::Instant;

/// Print the time elapsed since `start` as hours, minutes and seconds.
pub fn print_hms(start: &Instant) {
    let secs = start.elapsed().as_secs_f64();
    let hours = (secs / 3600.0).floor() as u64;
    let minutes = ((secs % 3600.0) / 60.0).floor() as u64;
    let seconds = secs % 60.0;
    println!("Elapsed: {}h {}m {:.2}s", hours, minutes, seconds);
}

/// Cut `text` to at most `max_chars` characters, respecting char boundaries.
pub fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
