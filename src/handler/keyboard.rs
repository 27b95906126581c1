use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup};

use crate::{
    callback::{CallbackData, PageTarget},
    catalog::{MediaKind, QualityProfile},
    presenter::PageNav,
};

fn button(text: impl Into<String>, data: CallbackData) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(text, data.to_string())
}

fn details_label(kind: MediaKind) -> String {
    match kind {
        MediaKind::Movie => t!("buttons.movie.details").to_string(),
        MediaKind::Series => t!("buttons.serie.details").to_string(),
    }
}

fn remove_label(kind: MediaKind) -> String {
    match kind {
        MediaKind::Movie => t!("buttons.movie.remove").to_string(),
        MediaKind::Series => t!("buttons.serie.remove").to_string(),
    }
}

fn add_label(kind: MediaKind) -> String {
    match kind {
        MediaKind::Movie => t!("buttons.movie.add").to_string(),
        MediaKind::Series => t!("buttons.serie.add").to_string(),
    }
}

fn back_to_list_label(kind: MediaKind) -> String {
    match kind {
        MediaKind::Movie => t!("buttons.movie.back_to_list").to_string(),
        MediaKind::Series => t!("buttons.serie.back_to_list").to_string(),
    }
}

fn reply_keyboard(mut labels: Vec<String>) -> KeyboardMarkup {
    labels.sort();
    let rows = labels
        .chunks(2)
        .map(|pair| pair.iter().map(|label| KeyboardButton::new(label.clone())).collect::<Vec<_>>())
        .collect::<Vec<_>>();

    KeyboardMarkup::new(rows).one_time_keyboard().resize_keyboard()
}

/// Library list page: navigation, then details and remove.
pub fn get_list_keyboard(kind: MediaKind, nav: PageNav) -> InlineKeyboardMarkup {
    let mut rows = Vec::new();

    if !nav.is_empty() {
        let mut row = Vec::new();
        if nav.first {
            row.push(button(t!("buttons.first"), CallbackData::ListPage(kind, PageTarget::First)));
        }
        if nav.previous {
            row.push(button(t!("buttons.previous"), CallbackData::ListPage(kind, PageTarget::Previous)));
        }
        if nav.next {
            row.push(button(t!("buttons.next"), CallbackData::ListPage(kind, PageTarget::Next)));
        }
        if nav.last {
            row.push(button(t!("buttons.last"), CallbackData::ListPage(kind, PageTarget::Last)));
        }
        rows.push(row);
    }

    rows.push(vec![button(details_label(kind), CallbackData::Details(kind))]);
    rows.push(vec![button(remove_label(kind), CallbackData::Remove(kind))]);

    InlineKeyboardMarkup::new(rows)
}

/// Add-flow candidate: previous/next, add when the candidate is not owned yet, edit or cancel.
pub fn get_add_media_keyboard(kind: MediaKind, page: usize, total: usize, addable: bool) -> InlineKeyboardMarkup {
    let mut rows = Vec::new();
    let nav = PageNav::new(page, total);

    if nav.previous || nav.next {
        let mut row = Vec::new();
        if nav.previous {
            row.push(button(t!("buttons.previous"), CallbackData::PreviousAdd(kind)));
        }
        if nav.next {
            row.push(button(t!("buttons.next"), CallbackData::NextAdd(kind)));
        }
        rows.push(row);
    }

    if addable {
        rows.push(vec![button(add_label(kind), CallbackData::Add(kind))]);
    }

    rows.push(vec![
        button(t!("buttons.edit_request"), CallbackData::EditRequest(kind)),
        button(t!("buttons.cancel"), CallbackData::Cancel),
    ]);

    InlineKeyboardMarkup::new(rows)
}

pub fn get_confirm_remove_keyboard(kind: MediaKind) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new([[
        button(t!("buttons.confirm"), CallbackData::ConfirmRemove(kind)),
        button(t!("buttons.cancel"), CallbackData::CancelRemove(kind)),
    ]])
}

/// Download-status keyboard; `following` swaps the follow button for a stop button.
pub fn get_follow_keyboard(kind: MediaKind, following: bool) -> InlineKeyboardMarkup {
    let second = if following {
        button(t!("buttons.stop_refreshing"), CallbackData::StopFollow(kind))
    } else {
        button(t!("buttons.follow"), CallbackData::Follow(kind))
    };

    InlineKeyboardMarkup::new([[button(t!("buttons.refresh"), CallbackData::Refresh(kind)), second]])
}

pub fn get_added_keyboard(kind: MediaKind) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new([[button(t!("buttons.follow"), CallbackData::Follow(kind))]])
}

pub fn get_back_to_list_keyboard(kind: MediaKind) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new([[button(back_to_list_label(kind), CallbackData::BackToList(kind))]])
}

/// Quality profile names, sorted, two per row.
pub fn get_quality_profile_keyboard(profiles: &[QualityProfile]) -> KeyboardMarkup {
    reply_keyboard(profiles.iter().map(|p| p.name.clone()).collect())
}

/// Library titles, sorted, two per row.
pub fn get_titles_keyboard(titles: Vec<String>) -> KeyboardMarkup {
    reply_keyboard(titles)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn callback_data(markup: &InlineKeyboardMarkup) -> Vec<Vec<String>> {
        markup
            .inline_keyboard
            .iter()
            .map(|row| {
                row.iter()
                    .filter_map(|b| match &b.kind {
                        teloxide::types::InlineKeyboardButtonKind::CallbackData(data) => Some(data.clone()),
                        _ => None,
                    })
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_list_keyboard_two_pages() {
        let markup = get_list_keyboard(MediaKind::Movie, PageNav::new(1, 2));
        let data = callback_data(&markup);
        assert_eq!(data[0], vec!["nextMovie"]);
        assert_eq!(data[1], vec!["movieDetails"]);
        assert_eq!(data[2], vec!["removeMovie"]);
    }

    #[test]
    fn test_list_keyboard_middle_page() {
        let markup = get_list_keyboard(MediaKind::Series, PageNav::new(3, 5));
        let data = callback_data(&markup);
        assert_eq!(data[0], vec!["firstSerie", "previousSerie", "nextSerie", "lastSerie"]);
    }

    #[test]
    fn test_list_keyboard_single_page_has_no_nav() {
        let markup = get_list_keyboard(MediaKind::Movie, PageNav::new(1, 1));
        assert_eq!(callback_data(&markup).len(), 2);
    }

    #[test]
    fn test_add_keyboard_hides_add_for_owned_candidate() {
        let addable = callback_data(&get_add_media_keyboard(MediaKind::Movie, 2, 3, true));
        assert_eq!(addable[0], vec!["previousAddMovie", "nextAddMovie"]);
        assert_eq!(addable[1], vec!["addMovie"]);
        assert_eq!(addable[2], vec!["editRequestMovie", "cancel"]);

        let owned = callback_data(&get_add_media_keyboard(MediaKind::Movie, 3, 3, false));
        assert_eq!(owned, vec![vec!["previousAddMovie".to_string()], vec!["editRequestMovie".into(), "cancel".into()]]);
    }

    #[test]
    fn test_follow_keyboard_toggles() {
        let live = callback_data(&get_follow_keyboard(MediaKind::Movie, true));
        assert_eq!(live[0], vec!["refreshDownloadingStatusMovie", "cancelFollowDownloadingStatusMovie"]);
        let idle = callback_data(&get_follow_keyboard(MediaKind::Movie, false));
        assert_eq!(idle[0], vec!["refreshDownloadingStatusMovie", "followDownloadingStatusMovie"]);
    }

    #[test]
    fn test_quality_profile_keyboard_sorted_in_pairs() {
        let profiles = vec![
            QualityProfile { id: 3, name: "HD-1080p".into() },
            QualityProfile { id: 1, name: "Any".into() },
            QualityProfile { id: 4, name: "Ultra-HD".into() },
        ];
        let markup = get_quality_profile_keyboard(&profiles);
        let labels: Vec<Vec<String>> = markup
            .keyboard
            .iter()
            .map(|row| row.iter().map(|b| b.text.clone()).collect())
            .collect();
        assert_eq!(labels, vec![vec!["Any".to_string(), "HD-1080p".into()], vec!["Ultra-HD".into()]]);
    }
}
