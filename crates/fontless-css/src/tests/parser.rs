use crate::*;

fn only_rule(sheet: &StyleSheet) -> &Rule {
    match sheet.children.as_slice() {
        [Node::Rule(rule)] => rule,
        other => panic!("expected a single rule, got {other:?}"),
    }
}

fn declarations(sheet: &StyleSheet) -> Vec<(&Declaration, Option<String>)> {
    let mut out = Vec::new();
    walk_declarations(sheet, |decl, cx| {
        out.push((decl, cx.atrule.map(|a| a.name.clone())));
    });
    out
}

#[test]
fn declaration_values_keep_byte_offsets() {
    let css = r#"a { color: red; font-family: "Brand", sans-serif; }"#;
    let sheet = parse(css).unwrap();
    let rule = only_rule(&sheet);
    assert_eq!(&css[rule.prelude.start..rule.prelude.end], "a");
    assert_eq!(rule.block.span, Span::new(2, css.len()));

    let decls = declarations(&sheet);
    assert_eq!(decls.len(), 2);
    let (decl, atrule) = &decls[1];
    assert_eq!(*atrule, None);
    assert_eq!(decl.property, "font-family");
    let Value::List(list) = &decl.value else {
        panic!("expected a structured value");
    };
    assert_eq!(list.span, Span::new(29, 48));
    assert_eq!(list.children.len(), 3);
    assert_eq!(list.children[0].kind, ValueKind::String("Brand".to_string()));
    assert_eq!(list.children[0].span, Span::new(29, 36));
    assert_eq!(list.children[1].kind, ValueKind::Operator(','));
    assert_eq!(
        list.children[2].kind,
        ValueKind::Identifier("sans-serif".to_string())
    );
}

#[test]
fn nested_rules_surface_as_raw_fragments() {
    let css = r#"a { b { font-family: "X"; } }"#;
    let sheet = parse(css).unwrap();
    let rule = only_rule(&sheet);
    let [Node::Raw(raw)] = rule.block.children.as_slice() else {
        panic!("expected a raw child, got {:?}", rule.block.children);
    };
    assert_eq!(raw.span, Span::new(4, 27));
    assert_eq!(raw.value, r#"b { font-family: "X"; }"#);

    let nested = parse(&raw.value).unwrap();
    let inner = only_rule(&nested);
    let [Node::Declaration(decl)] = inner.block.children.as_slice() else {
        panic!("expected one declaration");
    };
    assert_eq!(decl.value.span().offset(raw.span.start), Span::new(21, 24));
}

#[test]
fn pseudo_class_selectors_inside_blocks_are_not_declarations() {
    let css = "a { color: red; div:hover { color: blue } }";
    let sheet = parse(css).unwrap();
    let rule = only_rule(&sheet);
    assert_eq!(rule.block.children.len(), 2);
    let Node::Raw(raw) = &rule.block.children[1] else {
        panic!("expected raw nested rule");
    };
    assert_eq!(raw.value, "div:hover { color: blue }");
}

#[test]
fn font_face_declarations_report_their_at_rule() {
    let css = "@font-face { font-family: Foo; src: url(/a.woff2) format('woff2'); }\n\
               @media (min-width: 1px) { p { font: 12px/1.5 Foo; } }";
    let sheet = parse(css).unwrap();
    let decls = declarations(&sheet);
    let summary: Vec<(&str, Option<&str>)> = decls
        .iter()
        .map(|(d, a)| (d.property.as_str(), a.as_deref()))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("font-family", Some("font-face")),
            ("src", Some("font-face")),
            ("font", Some("media")),
        ]
    );
    let Value::List(src) = &decls[1].0.value else {
        panic!("expected structured src");
    };
    assert_eq!(src.children[0].kind, ValueKind::Url("/a.woff2".to_string()));
    assert!(matches!(
        &src.children[1].kind,
        ValueKind::Function { name } if name == "format"
    ));
}

#[test]
fn important_flag_is_split_from_the_value() {
    let sheet = parse("a{font-family:Foo !important}").unwrap();
    let decls = declarations(&sheet);
    assert!(decls[0].0.important);
    assert_eq!(extract_font_families(decls[0].0), vec!["Foo".to_string()]);
}

#[test]
fn custom_properties_keep_raw_values() {
    let sheet = parse(r#":root { --brand-font: "Inter", sans-serif; }"#).unwrap();
    let decls = declarations(&sheet);
    let decl = decls[0].0;
    assert!(decl.is_custom_property());
    let Value::Raw(raw) = &decl.value else {
        panic!("expected raw value");
    };
    assert_eq!(raw.value, r#""Inter", sans-serif"#);
}

#[test]
fn malformed_input_is_reported() {
    assert_eq!(
        parse("a { color: red;").unwrap_err(),
        Error::UnclosedBlock { offset: 2 }
    );
    assert_eq!(
        parse("/* never closed").unwrap_err(),
        Error::UnterminatedComment { offset: 0 }
    );
    assert!(matches!(
        parse("a { content: \"x\n }").unwrap_err(),
        Error::UnterminatedString { offset: 13 }
    ));
    assert_eq!(
        parse("a {} }").unwrap_err(),
        Error::UnexpectedCloseBrace { offset: 5 }
    );
}

#[test]
fn semicolons_inside_urls_do_not_end_declarations() {
    let css = "@font-face { src: url(data:font/woff2;base64,AAAA); font-family: X }";
    let sheet = parse(css).unwrap();
    let decls = declarations(&sheet);
    assert_eq!(decls.len(), 2);
    assert_eq!(decls[1].0.property, "font-family");
}
