//! Sub-section durations: parsing the stored `timeDuration` strings and
//! formatting accumulated seconds for display.

const SECONDS_PER_HOUR: u64 = 3600;
const SECONDS_PER_MINUTE: u64 = 60;

/// Formats total seconds using the coarsest two units that apply.
pub fn format_duration(total_seconds: u64) -> String {
    let hours = total_seconds / SECONDS_PER_HOUR;
    let minutes = (total_seconds % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE;
    let seconds = total_seconds % SECONDS_PER_MINUTE;

    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

/// Reads a stored duration as whole seconds.
///
/// Plain numbers keep their leading integer part (media hosts report
/// fractional seconds), colon forms are `mm:ss` or `hh:mm:ss`. Anything else
/// counts as zero.
pub fn parse_duration(value: &str) -> u64 {
    let value = value.trim();

    if value.contains(':') {
        let mut total = 0u64;
        for part in value.split(':') {
            let next = leading_integer(part).and_then(|n| {
                total
                    .checked_mul(SECONDS_PER_MINUTE)
                    .and_then(|t| t.checked_add(n))
            });
            match next {
                Some(n) => total = n,
                None => return unparseable(value),
            }
        }
        return total;
    }

    leading_integer(value).unwrap_or_else(|| unparseable(value))
}

fn leading_integer(value: &str) -> Option<u64> {
    let value = value.trim();
    let end = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    value[..end].parse().ok()
}

fn unparseable(value: &str) -> u64 {
    tracing::warn!("unparseable sub-section duration '{}', counting as 0s", value);
    0
}
