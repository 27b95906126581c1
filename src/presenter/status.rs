use std::{fmt::Write, time::Duration};

use chrono::{DateTime, Utc};
use teloxide::utils::html::escape;

use crate::catalog::{DiskSpace, DownloadStatus, MediaKind, QueueState};

use super::id_line;

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;
const BAR_SEGMENTS: usize = 10;
const BAR_EMPTY: char = '／';
// eighth thresholds, from the fullest block down
const BAR_BLOCKS: [(f64, char); 7] = [
    (7.0 / 8.0, '█'),
    (3.0 / 4.0, '▉'),
    (5.0 / 8.0, '▊'),
    (1.0 / 2.0, '▋'),
    (3.0 / 8.0, '▌'),
    (1.0 / 4.0, '▍'),
    (1.0 / 8.0, '▎'),
];
const BAR_SLIVER: char = '▏';

pub fn state_label(state: &QueueState) -> &'static str {
    match state {
        QueueState::Downloading => "🟡 Downloading",
        QueueState::ImportPending => "🟠 Import pending",
        QueueState::Importing => "🟡 Importing",
        QueueState::Imported => "🟢 Imported",
        QueueState::FailedPending => "🔴 Failed pending",
        QueueState::Failed => "🔴 Failed",
        QueueState::Unknown(_) => "🔴 Unknown",
    }
}

/// `free: <free>/<total> GB (<percent>%)`
pub fn disk_usage(disk: &DiskSpace) -> String {
    format!(
        "free: {:.2}/{:.2} GB ({:.2}%)",
        disk.free as f64 / BYTES_PER_GB,
        disk.total as f64 / BYTES_PER_GB,
        disk.free_percent()
    )
}

/// Percent complete, 0 when the size is unknown.
pub fn percent_complete(size: f64, size_left: f64) -> f64 {
    if size <= 0.0 {
        return 0.0;
    }
    ((size - size_left) / size * 100.0).clamp(0.0, 100.0)
}

pub fn progress_bar(percent: f64) -> String {
    (0..BAR_SEGMENTS)
        .map(|i| {
            let base = (i * 10) as f64;
            if percent <= base {
                return BAR_EMPTY;
            }
            BAR_BLOCKS
                .iter()
                .find(|(fraction, _)| percent > base + fraction * 10.0)
                .map(|(_, block)| *block)
                .unwrap_or(BAR_SLIVER)
        })
        .collect()
}

fn transferred(size: f64, size_left: f64) -> String {
    let done_mb = (size - size_left).max(0.0) / 1024.0 / 1024.0;
    let done = if done_mb > 1000.0 {
        format!("{:.2} GB", done_mb / 1024.0)
    } else {
        format!("{:.2} MB", done_mb)
    };
    format!("{} of {:.2} GB", done, size / 1024.0 / 1024.0 / 1024.0)
}

/// Rate needed to finish by the announced eta.
pub fn rate(size_left: f64, eta: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let secs_left = eta.map(|eta| (eta - now).num_milliseconds() as f64 / 1000.0).unwrap_or(0.0);
    if secs_left <= 0.0 {
        return "- kB/s".to_string();
    }

    let kbps = size_left / 1024.0 / secs_left;
    if kbps <= 0.0 {
        "- kB/s".to_string()
    } else if kbps > 1024.0 {
        format!("{:.2} MB/s", kbps / 1024.0)
    } else {
        format!("{:.2} kB/s", kbps)
    }
}

pub fn remaining_time(eta: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let secs = eta.map(|eta| (eta - now).num_seconds()).unwrap_or(0);
    if secs <= 0 {
        return "0s".to_string();
    }

    let (h, m, s) = (secs / 3600, secs % 3600 / 60, secs % 60);
    let mut text = String::new();
    if h > 0 {
        let _ = write!(text, "{}h", h);
    }
    if m > 0 {
        let _ = write!(text, "{}m", m);
    }
    if s > 0 {
        let _ = write!(text, "{}s", s);
    }
    text
}

/// Live download-status message. `refresh` is the follow interval, `None` when nothing refreshes it.
pub fn render(status: &DownloadStatus, kind: MediaKind, refresh: Option<Duration>, now: DateTime<Utc>) -> String {
    let mut text = format!("<b>Status</b>: {}\n", state_label(&status.state));

    if let Some(error) = &status.error_message {
        let _ = writeln!(text, "<b>Error</b>: {}", escape(error));
    }

    let percent = percent_complete(status.size, status.size_left);
    text.push_str("<b>Progress</b>: \n");
    let _ = writeln!(text, "{}", transferred(status.size, status.size_left));
    let _ = writeln!(text, "{} {:.2}%", progress_bar(percent), percent);
    let _ = writeln!(text, "{}", rate(status.size_left, status.eta, now));

    let _ = writeln!(text, "<b>Remaining time</b>: {}", remaining_time(status.eta, now));

    match refresh {
        Some(interval) => {
            let _ = writeln!(text, "<i>Refreshing every {}s</i>", interval.as_secs());
        }
        None => text.push_str("<i>Not refreshing</i>\n"),
    }

    text.push('\n');
    let _ = writeln!(text, "<i>last update: {}</i>", now.format("%Y-%m-%d %H:%M:%S UTC"));
    text.push_str(&id_line(kind, status.library_id));

    text
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::presenter::parse_embedded_id;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_progress_bar_bounds() {
        assert_eq!(progress_bar(0.0), "／".repeat(10));
        assert_eq!(progress_bar(100.0), "█".repeat(10));
        assert_eq!(progress_bar(100.0).chars().count(), 10);
    }

    #[test]
    fn test_progress_bar_partial_segment() {
        // 45% -> four full blocks then a half-ish block
        let bar = progress_bar(45.0);
        let chars: Vec<char> = bar.chars().collect();
        assert_eq!(chars.len(), 10);
        assert!(chars[..4].iter().all(|c| *c == '█'));
        assert_eq!(chars[4], '▌');
        assert!(chars[5..].iter().all(|c| *c == '／'));
    }

    #[test]
    fn test_percent_complete_handles_zero_size() {
        assert_eq!(percent_complete(0.0, 0.0), 0.0);
        assert_eq!(percent_complete(200.0, 50.0), 75.0);
    }

    #[test]
    fn test_disk_usage() {
        let disk = DiskSpace {
            path: "/movies".into(),
            free: 50 * 1024 * 1024 * 1024,
            total: 200 * 1024 * 1024 * 1024,
        };
        assert_eq!(disk_usage(&disk), "free: 50.00/200.00 GB (25.00%)");

        let unknown = DiskSpace {
            path: "/tv".into(),
            free: 0,
            total: 0,
        };
        assert_eq!(disk_usage(&unknown), "free: 0.00/0.00 GB (0.00%)");
    }

    #[test]
    fn test_remaining_time() {
        let eta = now() + chrono::Duration::seconds(3723);
        assert_eq!(remaining_time(Some(eta), now()), "1h2m3s");
        assert_eq!(remaining_time(Some(now() - chrono::Duration::seconds(5)), now()), "0s");
        assert_eq!(remaining_time(None, now()), "0s");
    }

    #[test]
    fn test_rate() {
        let eta = now() + chrono::Duration::seconds(10);
        assert_eq!(rate(20.0 * 1024.0 * 1024.0, Some(eta), now()), "2.00 MB/s");
        assert_eq!(rate(10.0 * 1024.0, Some(eta), now()), "1.00 kB/s");
        assert_eq!(rate(1024.0, None, now()), "- kB/s");
    }

    #[test]
    fn test_render_embeds_identifier_and_refresh() {
        let status = DownloadStatus {
            found: true,
            library_id: 42,
            state: QueueState::Downloading,
            size: 2.0 * 1024.0 * 1024.0 * 1024.0,
            size_left: 1024.0 * 1024.0 * 1024.0,
            eta: Some(now() + chrono::Duration::seconds(60)),
            error_message: None,
        };

        let live = render(&status, MediaKind::Movie, Some(Duration::from_secs(5)), now());
        assert!(live.starts_with("<b>Status</b>: 🟡 Downloading\n"));
        assert!(live.contains("1.00 GB of 2.00 GB"));
        assert!(live.contains(" 50.00%"));
        assert!(live.contains("Refreshing every 5s"));
        assert_eq!(parse_embedded_id(MediaKind::Movie, &live), Some(42));

        let idle = render(&status, MediaKind::Movie, None, now());
        assert!(idle.contains("Not refreshing"));
        assert_eq!(live, render(&status, MediaKind::Movie, Some(Duration::from_secs(5)), now()));
    }
}
