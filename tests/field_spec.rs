use extractly::{ConfigError, FieldSet, FieldSpec};

#[test]
fn test_parse_basic_tokens() {
    let fields: FieldSet = "title,h1,p".parse().expect("valid field list");

    assert_eq!(
        fields.fields(),
        &[
            FieldSpec::Title,
            FieldSpec::selector("h1"),
            FieldSpec::selector("p"),
        ]
    );
}

#[test]
fn test_parse_meta_token() {
    let fields: FieldSet = r#"name="description""#.parse().unwrap();

    assert_eq!(fields.fields(), &[FieldSpec::meta("name", "description")]);
    assert_eq!(fields.fields()[0].key(), r#"name="description""#);
}

#[test]
fn test_meta_token_single_quotes_and_spaces() {
    let spec = FieldSpec::parse_token(" property = 'og:title' ").unwrap();
    assert_eq!(spec, FieldSpec::meta("property", "og:title"));
}

#[test]
fn test_meta_token_splits_at_first_equals() {
    let spec = FieldSpec::parse_token(r#"name="a=b""#).unwrap();
    assert_eq!(spec, FieldSpec::meta("name", "a=b"));
}

#[test]
fn test_meta_attribute_name_is_lowercased() {
    let spec = FieldSpec::parse_token(r#"NAME="Description""#).unwrap();
    assert_eq!(spec, FieldSpec::meta("name", "Description"));
}

#[test]
fn test_commas_inside_quotes_do_not_split() {
    let fields: FieldSet = r#"title,name="a,b""#.parse().unwrap();

    assert_eq!(fields.fields().len(), 2);
    assert_eq!(fields.fields()[1], FieldSpec::meta("name", "a,b"));
}

#[test]
fn test_blank_tokens_are_ignored() {
    let fields: FieldSet = " title , , p ,".parse().unwrap();
    assert_eq!(fields.fields().len(), 2);
}

#[test]
fn test_tag_names_are_lowercased() {
    let fields: FieldSet = "TITLE,H2".parse().unwrap();
    assert_eq!(fields.fields(), &[FieldSpec::Title, FieldSpec::selector("h2")]);
}

#[test]
fn test_empty_spec_rejected() {
    let result: Result<FieldSet, _> = " , ".parse();
    assert_eq!(result, Err(ConfigError::NoFields));
}

#[test]
fn test_meta_token_without_separator_rejected() {
    let result: Result<FieldSet, _> = r#"title,name"description""#.parse();

    match result {
        Err(ConfigError::InvalidTagName(token)) => assert_eq!(token, r#"name"description""#),
        other => panic!("Expected InvalidTagName, got {:?}", other),
    }
}

#[test]
fn test_meta_token_without_attribute_rejected() {
    let result = FieldSpec::parse_token(r#"="description""#);
    assert!(matches!(result, Err(ConfigError::InvalidMetaToken(_))));
}

#[test]
fn test_selector_css_rejected() {
    assert!(matches!(
        FieldSpec::parse_token("div.content"),
        Err(ConfigError::InvalidTagName(_))
    ));
    assert!(matches!(
        FieldSpec::parse_token("1p"),
        Err(ConfigError::InvalidTagName(_))
    ));
}

#[test]
fn test_custom_element_names_accepted() {
    let spec = FieldSpec::parse_token("my-widget").unwrap();
    assert_eq!(spec, FieldSpec::selector("my-widget"));
}

#[test]
fn test_duplicate_fields_rejected() {
    let result: Result<FieldSet, _> = "p,h1,p".parse();
    assert_eq!(result, Err(ConfigError::DuplicateField("p".to_string())));
}

#[test]
fn test_title_selector_shares_title_key() {
    let spec = FieldSpec::selector("title");
    assert_eq!(spec.key(), "title");

    let result = FieldSet::new(vec![FieldSpec::Title, spec]);
    assert_eq!(result, Err(ConfigError::DuplicateField("title".to_string())));
}

#[test]
fn test_url_key_reserved() {
    let result = FieldSet::new(vec![FieldSpec::selector("URL")]);
    assert_eq!(result, Err(ConfigError::ReservedKey("url".to_string())));

    let result = FieldSet::new(vec![FieldSpec::Selector {
        tag_name: "Url".to_string(),
    }]);
    assert_eq!(result, Err(ConfigError::ReservedKey("url".to_string())));
}

#[test]
fn test_tag_case_does_not_create_distinct_columns() {
    let result = FieldSet::new(vec![FieldSpec::selector("P"), FieldSpec::selector("p")]);
    assert_eq!(result, Err(ConfigError::DuplicateField("p".to_string())));

    let literal = FieldSpec::Selector {
        tag_name: "H1".to_string(),
    };
    assert_eq!(literal.key(), "h1");
}

#[test]
fn test_meta_attribute_case_does_not_create_distinct_columns() {
    let result = FieldSet::new(vec![
        FieldSpec::meta("NAME", "description"),
        FieldSpec::meta("name", "description"),
    ]);
    assert_eq!(
        result,
        Err(ConfigError::DuplicateField(r#"name="description""#.to_string()))
    );
}

#[test]
fn test_invalid_meta_attribute_rejected_in_code() {
    for attribute in ["", "na me", "a=b", "\"name\""] {
        let result = FieldSet::new(vec![FieldSpec::meta(attribute, "x")]);
        assert!(
            matches!(result, Err(ConfigError::InvalidMetaToken(_))),
            "attribute {attribute:?} should be rejected, got {result:?}"
        );
    }
}

#[test]
fn test_meta_token_with_spaced_attribute_rejected() {
    let result = FieldSpec::parse_token(r#"na me="description""#);
    assert!(matches!(result, Err(ConfigError::InvalidMetaToken(_))));
}

#[test]
fn test_keys_start_with_url() {
    let fields: FieldSet = r#"title,p,name="keywords""#.parse().unwrap();

    assert_eq!(
        fields.keys(),
        vec!["URL", "title", "p", r#"name="keywords""#]
    );
}

#[test]
fn test_union_keeps_order() {
    let tags: FieldSet = "title,p".parse().unwrap();
    let meta: FieldSet = r#"name="description""#.parse().unwrap();

    let merged = tags.union(meta).unwrap();
    assert_eq!(merged.keys(), vec!["URL", "title", "p", r#"name="description""#]);
}

#[test]
fn test_union_skips_fields_already_present() {
    let fields: FieldSet = r#"title,name="description",p"#.parse().unwrap();
    let meta: FieldSet = r#"name="description",property="og:title""#.parse().unwrap();

    let merged = fields.union(meta).unwrap();
    assert_eq!(
        merged.keys(),
        vec![
            "URL",
            "title",
            r#"name="description""#,
            "p",
            r#"property="og:title""#
        ]
    );
}
