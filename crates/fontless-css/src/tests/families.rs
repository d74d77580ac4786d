use crate::*;

fn first_declaration(css: &str) -> Declaration {
    let sheet = parse(css).unwrap();
    let mut found = None;
    walk_declarations(&sheet, |decl, _| {
        if found.is_none() {
            found = Some(decl.clone());
        }
    });
    found.expect("declaration")
}

#[test]
fn unquoted_names_are_joined_and_keywords_dropped() {
    let decl = first_declaration("a { font-family: Open Sans, Arial, inherit, sans-serif; }");
    assert_eq!(
        extract_font_families(&decl),
        vec!["Open Sans".to_string(), "Arial".to_string()]
    );
    assert_eq!(extract_generic(&decl), Some(GenericFamily::SansSerif));
    // Unquoted first family ends at the first comma.
    let css = "a { font-family: Open Sans, Arial, inherit, sans-serif; }";
    assert_eq!(extract_end_of_first_child(&decl), css.find(','));
}

#[test]
fn escaped_spaces_are_unescaped() {
    let decl = first_declaration(r"a { font-family: Foo\ Bar; }");
    assert_eq!(extract_font_families(&decl), vec!["Foo Bar".to_string()]);
}

#[test]
fn font_shorthand_skips_everything_before_the_size() {
    let css = r#"p { font: italic bold 16px/1.5 "Brand", serif; }"#;
    let decl = first_declaration(css);
    assert_eq!(extract_font_families(&decl), vec!["Brand".to_string()]);
    assert_eq!(extract_generic(&decl), Some(GenericFamily::Serif));
    assert_eq!(extract_end_of_first_child(&decl), Some(38));

    let system = first_declaration("p { font: caption; }");
    assert!(extract_font_families(&system).is_empty());
}

#[test]
fn single_unquoted_family_ends_at_the_value_end() {
    let css = "a { font-family: Roboto; }";
    let decl = first_declaration(css);
    assert_eq!(extract_end_of_first_child(&decl), Some(css.find(';').unwrap()));
    assert_eq!(extract_generic(&decl), None);
}

#[test]
fn raw_values_are_split_on_top_level_commas() {
    let decl = first_declaration(r#":root { --f: 'My, Font', "Other", system-ui; }"#);
    assert_eq!(
        extract_font_families(&decl),
        vec!["My, Font".to_string(), "Other".to_string()]
    );
    assert_eq!(extract_generic(&decl), None);
    assert_eq!(extract_end_of_first_child(&decl), None);
}

#[test]
fn generic_keywords_round_trip() {
    for generic in GenericFamily::ALL {
        assert_eq!(GenericFamily::from_keyword(generic.as_str()), Some(generic));
    }
    assert_eq!(GenericFamily::from_keyword("Serif"), None);
}
