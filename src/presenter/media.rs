use std::fmt::Write;

use teloxide::utils::html::escape;

use crate::catalog::{MediaDetails, MediaItem, MediaKind, Season};

pub const OVERVIEW_MAX_CHARS: usize = 175;
const ELLIPSIS: &str = "...";

pub fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(max).collect();
    truncated.push_str(ELLIPSIS);
    truncated
}

pub fn title(item: &MediaItem) -> String {
    format!(
        "{} <b>{}</b> (<i>{}</i>)",
        item.kind().icon(),
        escape(&item.title),
        item.year
    )
}

pub fn title_and_in_library(item: &MediaItem) -> String {
    let mut text = title(item);
    if item.in_library {
        text.push_str("\n\nAlready in library ✅");
    }
    text
}

fn season_label(season: &Season) -> String {
    if season.number == 0 {
        "Specials".to_string()
    } else {
        format!("Season {}", season.number)
    }
}

fn rating_line(item: &MediaItem) -> String {
    let source = item
        .rating
        .source
        .as_deref()
        .map(|s| format!(" ({})", escape(s)))
        .unwrap_or_default();
    format!(
        "⭐ <b>Rating</b>{}: {:.1}/10 (<i>{} votes</i>)\n",
        source, item.rating.value, item.rating.votes
    )
}

/// Multi-line detail block: release, duration or seasons, rating, genres, overview, then on-disk status.
pub fn details(item: &MediaItem) -> String {
    let mut text = String::new();

    let _ = writeln!(text, "📅 <b>Release year</b>: {}", item.year);

    match &item.details {
        MediaDetails::Movie { runtime_mins, .. } => {
            let _ = writeln!(text, "🕒 <b>Duration</b>: {} mins", runtime_mins);
        }
        MediaDetails::Series { season_count, .. } => {
            let _ = writeln!(text, "🗂 <b>Seasons</b>: {}", season_count);
        }
    }

    text.push_str(&rating_line(item));

    let genres = item.genres.iter().map(|g| escape(g)).collect::<Vec<_>>().join(", ");
    let _ = writeln!(text, "🎞 <b>Genres</b>: {}", genres);

    if let Some(studio) = &item.studio {
        let _ = writeln!(text, "🏢 <b>Studio</b>: {}", escape(studio));
    }

    let overview = truncate_chars(&item.overview, OVERVIEW_MAX_CHARS);
    let _ = writeln!(text, "📝 <b>Overview</b>: {}", escape(&overview));
    text.push('\n');

    match &item.details {
        MediaDetails::Movie {
            downloaded,
            quality,
            size_on_disk_gb,
            ..
        } => {
            if *downloaded {
                text.push_str("📡 <b>Status</b>: Downloaded ✅\n");
                if let Some(quality) = quality {
                    let _ = writeln!(text, "📺 <b>Quality</b>: {}", escape(quality));
                }
                let _ = writeln!(text, "💾 <b>Size</b>: {:.2} GB", size_on_disk_gb);
            } else {
                text.push_str("📡 <b>Status</b>: Missing ❌\n");
            }
            let _ = write!(
                text,
                "\n🔗 <a href=\"https://www.themoviedb.org/movie/{}\">The Movie DB</a>",
                item.provider_id
            );
        }
        MediaDetails::Series {
            seasons,
            size_on_disk_gb,
            ..
        } => {
            let _ = writeln!(text, "💾 <b>Size</b>: {:.2} GB", size_on_disk_gb);
            for season in seasons {
                let _ = writeln!(
                    text,
                    "    - <i>{} ({}/{})</i>",
                    season_label(season),
                    season.downloaded_episodes,
                    season.total_episodes
                );
            }
            let _ = write!(
                text,
                "\n🔗 <a href=\"https://www.thetvdb.com/?tab=series&amp;id={}\">TheTVDB</a>",
                item.provider_id
            );
        }
    }

    text
}

/// Header of the library list, counted over the whole library.
pub fn list_header(kind: MediaKind, count: usize) -> String {
    format!("{} <b>{} {}</b>\n", kind.icon(), count, kind.plural())
}

/// One library list entry; series carry their season breakdown.
pub fn list_entry(item: &MediaItem) -> String {
    let mut text = format!("- <b>{}</b> (<i>{}</i>)\n", escape(&item.title), item.year);
    if let MediaDetails::Series { seasons, .. } = &item.details {
        for season in seasons {
            let _ = writeln!(
                text,
                "    - <i>{} ({}/{})</i>",
                season_label(season),
                season.downloaded_episodes,
                season.total_episodes
            );
        }
    }
    text
}
