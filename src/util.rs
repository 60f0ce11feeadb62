/// Percentage of correct attempts, rounded to one decimal place.
pub fn accuracy(correct: u32, incorrect: u32) -> Option<f64> {
    let total = correct + incorrect;

    match total {
        positive if positive > 0 => {
            Some(((correct as f64 / total as f64) * 1000.0).round() / 10.0)
        }
        _ => None,
    }
}

/// `mm:ss` rendering of a number of seconds.
pub fn format_time(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
