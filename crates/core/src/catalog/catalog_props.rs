//! Property-based tests for media classification, URLs and ordering.

use chrono::{TimeZone, Utc};
use proptest::prelude::*;

use super::types::{
    IMAGE_EXTENSIONS, MediaItem, MediaKind, UploadDate, VIDEO_EXTENSIONS, media_url,
    sort_newest_first,
};

/// Strategy for a file stem that never contains a dot or a slash.
fn stem() -> impl Strategy<Value = String> {
    "[A-Za-z0-9 _#%?&-]{1,16}"
}

/// Strategy for an extension from the allow-list, in random case.
fn media_extension() -> impl Strategy<Value = String> {
    let all: Vec<&'static str> = IMAGE_EXTENSIONS
        .iter()
        .chain(VIDEO_EXTENSIONS.iter())
        .copied()
        .collect();
    (prop::sample::select(all), any::<bool>())
        .prop_map(|(ext, upper)| if upper { ext.to_uppercase() } else { ext.to_string() })
}

/// Strategy for an optional upload date.
fn upload_date() -> impl Strategy<Value = UploadDate> {
    prop_oneof![
        1 => Just(UploadDate::Unknown),
        3 => (0i64..2_000_000_000).prop_map(|secs| {
            UploadDate::Known(Utc.timestamp_opt(secs, 0).single().unwrap_or_default())
        }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Allow-listed extensions are media in any letter case.
    #[test]
    fn prop_allow_listed_extension_is_media(stem in stem(), ext in media_extension()) {
        let name = format!("{stem}.{ext}");
        prop_assert!(MediaKind::from_filename(&name).is_some());
    }

    /// Extensions outside the allow-list are never media.
    #[test]
    fn prop_other_extension_is_not_media(stem in stem(), ext in "[a-z]{1,5}") {
        let lower = ext.to_lowercase();
        prop_assume!(!IMAGE_EXTENSIONS.contains(&lower.as_str()));
        prop_assume!(!VIDEO_EXTENSIONS.contains(&lower.as_str()));
        let name = format!("{stem}.{ext}");
        prop_assert_eq!(MediaKind::from_filename(&name), None);
    }

    /// Decoding each URL segment gives back the original path segments.
    #[test]
    fn prop_media_url_round_trips(segments in prop::collection::vec(stem(), 1..4)) {
        let original = segments.join("/");
        let url = media_url("nextcloud", &original);

        let rest = url.strip_prefix("/nextcloud/").expect("backend prefix");
        let decoded: Vec<String> = rest
            .split('/')
            .map(|s| urlencoding::decode(s).expect("valid encoding").into_owned())
            .collect();
        prop_assert_eq!(decoded, segments);
    }

    /// Sorted items are newest first with every unknown date at the end.
    #[test]
    fn prop_sort_newest_first(dates in prop::collection::vec(upload_date(), 0..30)) {
        let mut items: Vec<MediaItem> = dates
            .iter()
            .enumerate()
            .map(|(i, date)| MediaItem::new("local", &format!("{i}.jpg"), 1, *date, MediaKind::Image))
            .collect();

        sort_newest_first(&mut items);

        for pair in items.windows(2) {
            match (pair[0].upload_date, pair[1].upload_date) {
                (UploadDate::Known(a), UploadDate::Known(b)) => prop_assert!(a >= b),
                (UploadDate::Unknown, UploadDate::Known(_)) => prop_assert!(false, "unknown before known"),
                _ => {}
            }
        }
        prop_assert_eq!(items.len(), dates.len());
    }
}
