//! Plain-text rendering of the event feed.

use std::fmt::Write;

use vana_events::{EventFeed, EventView};

const EMPTY_SECTION: &str = "  (none)";

pub fn render_feed(feed: &EventFeed) -> String {
    let mut out = String::new();
    render_section(&mut out, "Upcoming events", &feed.upcoming);
    out.push('\n');
    render_section(&mut out, "Past events", &feed.past);
    out
}

fn render_section(out: &mut String, title: &str, events: &[EventView]) {
    let _ = writeln!(out, "{} ({})", title, events.len());
    if events.is_empty() {
        let _ = writeln!(out, "{}", EMPTY_SECTION);
        return;
    }
    for event in events {
        render_card(out, event);
    }
}

fn render_card(out: &mut String, event: &EventView) {
    let date = if event.is_past {
        format!("{} (Past Event)", event.date)
    } else {
        event.date.clone()
    };

    let _ = writeln!(out, "- {}", event.name);
    let _ = writeln!(out, "    {}", date.trim());
    if !event.start_time.is_empty() {
        let _ = writeln!(out, "    {} - {}", event.start_time, event.end_time);
    }
    let _ = writeln!(out, "    {}", event.location);
    let _ = writeln!(out, "    {}", event.url);
    let _ = writeln!(out, "    image: {}", event.image_url);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(name: &str, is_past: bool) -> EventView {
        EventView {
            name: name.to_string(),
            date: "Wed, Jun 5, 2024".to_string(),
            location: "Online".to_string(),
            start_time: "6:00 PM".to_string(),
            end_time: "8:00 PM".to_string(),
            url: "https://lu.ma/x".to_string(),
            image_url: "default-image-url.jpg".to_string(),
            is_past,
        }
    }

    #[test]
    fn test_past_events_are_labelled() {
        let feed = EventFeed {
            upcoming: vec![view("Meetup", false)],
            past: vec![view("Workshop", true)],
        };

        let text = render_feed(&feed);

        assert!(text.contains("Upcoming events (1)"));
        assert!(text.contains("Wed, Jun 5, 2024 (Past Event)"));
        assert_eq!(text.matches("(Past Event)").count(), 1);
        assert!(text.contains("6:00 PM - 8:00 PM"));
    }

    #[test]
    fn test_order_is_preserved() {
        let feed = EventFeed {
            upcoming: vec![view("First", false), view("Second", false)],
            past: vec![],
        };

        let text = render_feed(&feed);
        let first = text.find("First").unwrap();
        let second = text.find("Second").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_empty_sections() {
        let text = render_feed(&EventFeed::default());
        assert_eq!(text.matches(EMPTY_SECTION).count(), 2);
    }

    #[test]
    fn test_missing_times_omitted() {
        let mut event = view("TBA", false);
        event.start_time.clear();
        event.end_time.clear();
        let feed = EventFeed {
            upcoming: vec![event],
            past: vec![],
        };

        assert!(!render_feed(&feed).contains(" - "));
    }
}
