//! Mirror body rendering.

use chrono::SecondsFormat;
use icsbridge_core::{CanonicalEvent, EventTime, IdentityKey};
use icsbridge_providers::{
    ExtendedProperties, MirrorBody, MirrorTime, Transparency, Visibility,
};

use crate::config::MirrorSettings;

/// Renders the desired mirror for `event`.
pub fn build_body(event: &CanonicalEvent, key: &IdentityKey, settings: &MirrorSettings) -> MirrorBody {
    let (summary, location, description) = if settings.busy_blockers {
        (String::new(), None, None)
    } else {
        (
            render_title(event, settings),
            event.location.clone(),
            event.description.clone(),
        )
    };

    MirrorBody {
        summary,
        location,
        description,
        start: render_time(&event.start),
        end: render_time(&event.end),
        visibility: Visibility::Private,
        transparency: Transparency::from_busy(event.busy),
        extended_properties: ExtendedProperties::marker(key, &event.uid),
        source: settings.source.clone(),
    }
}

fn render_title(event: &CanonicalEvent, settings: &MirrorSettings) -> String {
    let title = event
        .effective_title()
        .unwrap_or(settings.fallback_title.as_str());
    let prefix = settings.title_prefix.trim();
    if prefix.is_empty() {
        title.trim().to_string()
    } else {
        format!("{} {}", prefix, title).trim().to_string()
    }
}

fn render_time(time: &EventTime) -> MirrorTime {
    match time {
        EventTime::AllDay(date) => MirrorTime::date(date.format("%Y-%m-%d").to_string()),
        EventTime::DateTime(dt) => {
            MirrorTime::date_time(dt.to_rfc3339_opts(SecondsFormat::AutoSi, false))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::event_key;
    use chrono::{NaiveDate, TimeZone, Utc};
    use icsbridge_providers::MirrorSource;

    fn all_day_event() -> CanonicalEvent {
        let start = EventTime::from_date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        let end = EventTime::from_date(NaiveDate::from_ymd_opt(2024, 3, 3).unwrap());
        CanonicalEvent::new("sports@school", start, end)
            .with_title("Sports day")
            .with_location("Field")
    }

    fn settings(prefix: &str) -> MirrorSettings {
        MirrorSettings {
            title_prefix: prefix.to_string(),
            ..MirrorSettings::default()
        }
    }

    #[test]
    fn all_day_body_snapshot() {
        let event = all_day_event();
        let key = event_key(&event);
        let mut settings = settings("[School]");
        settings.source = Some(MirrorSource {
            title: "School ICS".to_string(),
            url: "https://example.com/school.ics".to_string(),
        });

        insta::assert_json_snapshot!(build_body(&event, &key, &settings), @r#"
        {
          "summary": "[School] Sports day",
          "location": "Field",
          "description": null,
          "start": {
            "date": "2024-03-01",
            "dateTime": null
          },
          "end": {
            "date": "2024-03-03",
            "dateTime": null
          },
          "visibility": "private",
          "transparency": "opaque",
          "extendedProperties": {
            "private": {
              "ics_bridge": "true",
              "ics_key": "sports@school|2024-03-01",
              "ics_uid": "sports@school"
            }
          },
          "source": {
            "title": "School ICS",
            "url": "https://example.com/school.ics"
          }
        }
        "#);
    }

    #[test]
    fn timed_body_uses_utc_date_times() {
        let start = EventTime::from_utc(Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap());
        let end = EventTime::from_utc(Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap());
        let event = CanonicalEvent::new("a", start, end).with_busy(false);
        let body = build_body(&event, &event_key(&event), &settings(""));

        assert_eq!(body.start.date_time.as_deref(), Some("2024-03-01T09:00:00+00:00"));
        assert_eq!(body.end.date_time.as_deref(), Some("2024-03-01T10:00:00+00:00"));
        assert!(body.start.date.is_none());
        assert_eq!(body.transparency, Transparency::Transparent);
        assert_eq!(body.summary, "Untitled event");
    }

    #[test]
    fn busy_blockers_blank_visible_text() {
        let event = all_day_event().with_description("Bring trainers");
        let settings = MirrorSettings {
            busy_blockers: true,
            ..settings("[School]")
        };
        let body = build_body(&event, &event_key(&event), &settings);

        assert_eq!(body.summary, "");
        assert!(body.location.is_none());
        assert!(body.description.is_none());
        assert_eq!(body.transparency, Transparency::Opaque);
        assert_eq!(body.identity_key(), Some(event_key(&event)));
    }

    #[test]
    fn prefix_with_fallback_title() {
        let event = all_day_event().with_title("  ");
        let body = build_body(&event, &event_key(&event), &settings(" [School] "));
        assert_eq!(body.summary, "[School] Untitled event");
    }
}
