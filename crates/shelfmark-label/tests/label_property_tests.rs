use proptest::prelude::*;
use shelfmark_label::{LabelFormatter, LabelStep, DEFAULT_LABEL_WIDTH};

fn title_words() -> impl Strategy<Value = String> {
    proptest::collection::vec(
        prop_oneof![
            Just("Fibra de Vidrio".to_string()),
            Just("Aislamiento".to_string()),
            Just("Térmico".to_string()),
            Just("R-13".to_string()),
            Just("15x93x3.5".to_string()),
            Just("100pz".to_string()),
            Just("para".to_string()),
            Just("Baño".to_string()),
            "[A-Za-zÁÉÍÓÚáéíóúñÑ]{1,14}",
            "[0-9]{1,3}x[0-9]{1,3}",
        ],
        0..16,
    )
    .prop_map(|w| w.join(" "))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn label_never_exceeds_budget(title in title_words(), width in 0usize..60) {
        let label = LabelFormatter::new(width).format(&title);
        prop_assert!(label.chars().count() <= width);
    }

    #[test]
    fn arbitrary_text_never_exceeds_budget(title in "\\PC{0,120}", width in 0usize..48) {
        let label = LabelFormatter::new(width).format(&title);
        prop_assert!(label.chars().count() <= width);
    }

    #[test]
    fn fitting_titles_pass_through(title in "[a-z]{1,8}( [a-z]{1,8}){0,2}") {
        let label = LabelFormatter::default().format_with_step(&title);
        prop_assert_eq!(label.step, LabelStep::Unchanged);
        prop_assert_eq!(label.text, title);
    }
}

#[test]
fn default_width_is_thirty_six() {
    assert_eq!(LabelFormatter::default().max_len, DEFAULT_LABEL_WIDTH);
    assert_eq!(DEFAULT_LABEL_WIDTH, 36);
}

#[test]
fn label_step_serializes_in_snake_case() {
    let label = LabelFormatter::new(10).format_with_step("Chapa Bari Cromo Antiguo");
    let json = serde_json::to_value(&label).unwrap();
    assert_eq!(json["step"], "important_words");
    assert_eq!(json["text"], "Chapa Bari");
}
