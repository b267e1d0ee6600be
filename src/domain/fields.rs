use serde::Serialize;
use std::fmt;

// Draft fields that can be set through the API.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DraftField {
    Summary,
    Description,
    TestingDone,
    BugsClosed,
    Branch,
    TargetGroups,
    TargetPeople,
    ChangeDescription,
    ScreenshotCaption(u64),
}

impl DraftField {
    pub fn parse(name: &str) -> Option<Self> {
        let field = match name {
            "summary" => DraftField::Summary,
            "description" => DraftField::Description,
            "testing_done" => DraftField::TestingDone,
            "bugs_closed" => DraftField::BugsClosed,
            "branch" => DraftField::Branch,
            "target_groups" => DraftField::TargetGroups,
            "target_people" => DraftField::TargetPeople,
            "changedescription" => DraftField::ChangeDescription,
            _ => return parse_screenshot_caption(name).map(DraftField::ScreenshotCaption),
        };

        Some(field)
    }
}

// Accepts `screenshot_{id}_caption` where id is one or more ASCII digits.
fn parse_screenshot_caption(name: &str) -> Option<u64> {
    let digits = name
        .strip_prefix("screenshot_")?
        .strip_suffix("_caption")?;

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    digits.parse().ok()
}

impl fmt::Display for DraftField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DraftField::Summary => f.write_str("summary"),
            DraftField::Description => f.write_str("description"),
            DraftField::TestingDone => f.write_str("testing_done"),
            DraftField::BugsClosed => f.write_str("bugs_closed"),
            DraftField::Branch => f.write_str("branch"),
            DraftField::TargetGroups => f.write_str("target_groups"),
            DraftField::TargetPeople => f.write_str("target_people"),
            DraftField::ChangeDescription => f.write_str("changedescription"),
            DraftField::ScreenshotCaption(id) => write!(f, "screenshot_{id}_caption"),
        }
    }
}

// Stored representation of a draft field.
// Text values serialize as strings and list values as arrays.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn when_name_is_enumerated_then_it_parses_and_displays_unchanged() {
        for name in [
            "summary",
            "description",
            "testing_done",
            "bugs_closed",
            "branch",
            "target_groups",
            "target_people",
            "changedescription",
        ] {
            let field = DraftField::parse(name).expect("expected known field");
            assert_eq!(field.to_string(), name);
        }
    }

    #[test]
    fn when_name_is_screenshot_caption_pattern_then_id_is_extracted() {
        assert_eq!(
            DraftField::parse("screenshot_42_caption"),
            Some(DraftField::ScreenshotCaption(42))
        );
        assert_eq!(
            DraftField::ScreenshotCaption(42).to_string(),
            "screenshot_42_caption"
        );
    }

    #[test]
    fn when_screenshot_pattern_has_no_digits_then_it_is_rejected() {
        assert_eq!(DraftField::parse("screenshot_caption"), None);
        assert_eq!(DraftField::parse("screenshot__caption"), None);
        assert_eq!(DraftField::parse("screenshot_4x_caption"), None);
        assert_eq!(DraftField::parse("screenshot_-1_caption"), None);
    }

    #[test]
    fn when_screenshot_pattern_has_trailing_text_then_it_is_rejected() {
        assert_eq!(DraftField::parse("screenshot_42_captions"), None);
        assert_eq!(DraftField::parse("xscreenshot_42_caption"), None);
    }

    #[test]
    fn when_name_is_unknown_then_parse_returns_none() {
        assert_eq!(DraftField::parse("submitter"), None);
        assert_eq!(DraftField::parse("Summary"), None);
        assert_eq!(DraftField::parse(""), None);
    }

    #[test]
    fn field_values_serialize_as_plain_json() {
        let text = serde_json::to_value(FieldValue::Text("hi".to_string())).unwrap();
        let list = serde_json::to_value(FieldValue::List(vec!["1".to_string()])).unwrap();

        assert_eq!(text, serde_json::json!("hi"));
        assert_eq!(list, serde_json::json!(["1"]));
    }
}
