use json_poly::records::{
    self, Answer, Branch, Collection, FileResult, Message, Record, Step, ToolCall, UnknownRecord,
};
use json_poly::value::{probe, Probe};
use json_poly::{
    Codec, CodecConfig, CodecError, Factory, JsonValue, Limits, SchemaError, SchemaGenerator,
    Tagged,
};
use pretty_assertions::assert_eq;

fn factory() -> Factory {
    records::factory(CodecConfig::default())
}

fn text(bytes: Vec<u8>) -> String {
    String::from_utf8(bytes).unwrap()
}

#[test]
fn polymorphic_round_trip_preserves_value_and_order() {
    let factory = factory();
    let codec = Codec::new(&factory);
    let input = concat!(
        r#"{"id":"c","type":"collection","items":["#,
        r#"{"id":"a","type":"answer","value":{"x":1,"y":[true,null]},"confidence":0.5},"#,
        r#"{"id":"f","type":"file","path":"p","size":3}]}"#,
    )
    .as_bytes();

    let decoded = codec.decode_polymorphic::<dyn Record>(input).unwrap();
    let collection = decoded.downcast_ref::<Collection>().unwrap();
    assert_eq!(collection.items.len(), 2);
    assert_eq!(collection.items[1].downcast_ref::<FileResult>().unwrap().size, 3);

    let encoded = codec.encode_tagged(&Tagged::new(&*decoded)).unwrap();
    assert_eq!(text(encoded), String::from_utf8_lossy(input));
}

#[test]
fn member_order_in_input_does_not_matter() {
    let factory = factory();
    let codec = Codec::new(&factory);
    let shuffled = br#"{"extra":1,"value":"v","type":"answer","id":"a"}"#;
    let decoded = codec.decode_polymorphic::<dyn Record>(shuffled).unwrap();
    let encoded = codec.encode_tagged(&Tagged::new(&*decoded)).unwrap();
    assert_eq!(text(encoded), r#"{"id":"a","type":"answer","value":"v","extra":1}"#);
}

#[test]
fn sequence_decodes_in_order_with_mixed_variants() {
    let factory = factory();
    let codec = Codec::new(&factory);
    let input = concat!(
        r#"[{"id":"1","type":"file","path":"a","size":1},"#,
        r#"{"id":"2","type":"answer","value":2},"#,
        r#"{"id":"3","type":"legacy","note":"n"}]"#,
    )
    .as_bytes();
    let items = codec.decode_sequence::<dyn Record>(input).unwrap();
    let ids: Vec<&str> = items.iter().map(|r| r.id()).collect();
    assert_eq!(ids, vec!["1", "2", "3"]);
    assert_eq!(items[2].discriminator(), "legacy");

    assert_eq!(text(codec.encode_sequence(&items).unwrap()), String::from_utf8_lossy(input));
}

#[test]
fn empty_sequence_round_trips() {
    let factory = factory();
    let codec = Codec::new(&factory);
    let items = codec.decode_sequence::<dyn Record>(b"[]").unwrap();
    assert!(items.is_empty());
    assert_eq!(text(codec.encode_sequence(&items).unwrap()), "[]");
}

#[test]
fn unknown_discriminator_is_preserved_by_the_default() {
    let factory = factory();
    let codec = Codec::new(&factory);
    let input = br#"{"id":"u","type":"report-v0","pages":[1,2],"title":"t"}"#;
    let decoded = codec.decode_polymorphic::<dyn Record>(input).unwrap();
    let unknown = decoded.downcast_ref::<UnknownRecord>().unwrap();
    assert_eq!(unknown.kind, "report-v0");
    assert_eq!(unknown.extra.keys().collect::<Vec<_>>(), vec!["pages", "title"]);
    let encoded = codec.encode_tagged(&Tagged::new(&*decoded)).unwrap();
    assert_eq!(text(encoded), String::from_utf8_lossy(input));
}

#[test]
fn nested_unknown_discriminator_without_default_names_the_path() {
    let mut factory = Factory::new(CodecConfig::default());
    let records = factory
        .new_registry::<dyn Record>("Record")
        .with::<Collection>()
        .with::<Answer>();
    factory.insert(records);
    let codec = Codec::new(&factory);
    let input = br#"{"id":"c","type":"collection","items":[{"id":"x","type":"mystery"}]}"#;
    let err = codec.decode_polymorphic::<dyn Record>(input).unwrap_err();
    assert!(matches!(err, CodecError::UnknownDiscriminator { .. }));
    assert_eq!(err.path().unwrap().to_string(), "$.items[0].type");
}

#[test]
fn errors_name_the_innermost_discriminator() {
    let factory = factory();
    let codec = Codec::new(&factory);
    let input = concat!(
        r#"{"id":"c","type":"collection","items":["#,
        r#"{"id":"f","type":"file","path":"p","size":"big"}]}"#,
    );
    let err = codec.decode_polymorphic::<dyn Record>(input.as_bytes()).unwrap_err();
    assert!(matches!(err, CodecError::TypeMismatch { .. }), "{err}");
    assert_eq!(err.discriminator(), Some("file"));
    assert_eq!(err.path().unwrap().to_string(), "$.items[0].size");
}

#[test]
fn branch_members_sort_after_the_base_group() {
    let factory = factory();
    let codec = Codec::new(&factory);
    let branch = Branch {
        id: "b".into(),
        step_history: vec![Box::new(ToolCall { name: "t".into(), arguments: JsonValue::Null })],
        async_results: Vec::new(),
        path: vec!["root".into()],
    };
    let value = codec.tagged_value(&Tagged::new(&branch as &dyn Record)).unwrap();
    assert_eq!(value.member_names(), vec!["id", "type", "stepHistory", "asyncResults", "path"]);
    let step = &value.get("stepHistory").unwrap().as_array().unwrap()[0];
    assert_eq!(step.member_names(), vec!["type", "name", "arguments"]);
}

#[test]
fn second_interface_decodes_on_its_own() {
    let factory = factory();
    let codec = Codec::new(&factory);
    let step = codec
        .decode_polymorphic::<dyn Step>(br#"{"type":"message","role":"user","text":"hi"}"#)
        .unwrap();
    let expected = Message { role: "user".into(), text: "hi".into() };
    assert_eq!(step.downcast_ref::<Message>(), Some(&expected));
}

#[test]
fn deep_copy_is_independent() {
    let original: Box<dyn Record> = Box::new(Collection {
        id: "c".into(),
        items: vec![Box::new(Answer::new("a", 1))],
    });
    let mut copy = original.clone();
    let copied = copy.downcast_mut::<Collection>().unwrap();
    copied.items[0].downcast_mut::<Answer>().unwrap().value = JsonValue::from("changed");
    copied.items.push(Box::new(Answer::new("b", 2)));

    let source = original.downcast_ref::<Collection>().unwrap();
    assert_eq!(source.items.len(), 1);
    assert_eq!(source.items[0].downcast_ref::<Answer>().unwrap().value, JsonValue::Integer(1));
}

#[test]
fn depth_guard_rejects_deep_documents() {
    let factory = records::factory(CodecConfig::default().with_limits(Limits { max_depth: 8 }));
    let codec = Codec::new(&factory);
    let nested = |n: usize| {
        format!(r#"{{"id":"a","type":"answer","value":{}1{}}}"#, "[".repeat(n), "]".repeat(n))
    };
    let deep = nested(10);
    let err = codec.decode_polymorphic::<dyn Record>(deep.as_bytes()).unwrap_err();
    assert!(matches!(err, CodecError::DepthExceeded { limit: 8, .. }), "{err}");

    let shallow = nested(3);
    assert!(codec.decode_polymorphic::<dyn Record>(shallow.as_bytes()).is_ok());
}

#[test]
fn malformed_input_is_reported() {
    let factory = factory();
    let codec = Codec::new(&factory);
    let err = codec.decode_polymorphic::<dyn Record>(br#"{"id":"a","type":"answer""#).unwrap_err();
    assert!(matches!(err, CodecError::MalformedContainer { .. }), "{err}");
}

#[test]
fn bare_numerals_are_integers_and_quoted_true_stays_a_string() {
    let input = br#"{"n":1,"f":1.5,"s":"true","b":true,"a":[1,1.5,"x"]}"#;
    let value = probe::parse_document(input, &Limits::strict()).unwrap();
    assert_eq!(value.get("n"), Some(&JsonValue::Integer(1)));
    assert_eq!(value.get("f"), Some(&JsonValue::from(1.5)));
    assert_eq!(value.get("s"), Some(&JsonValue::from("true")));
    assert_eq!(value.get("b"), Some(&JsonValue::Bool(true)));
    let items = value.get("a").unwrap().as_array().unwrap();
    assert_eq!(items, &vec![JsonValue::Integer(1), JsonValue::from(1.5), JsonValue::from("x")]);
    assert_eq!(probe::MEMBER_ORDER[0], Probe::Bool);
}

#[test]
fn every_sample_schema_passes_its_self_check() {
    let factory = factory();
    let docs = SchemaGenerator::new(&factory).generate_all().unwrap();
    for doc in &docs {
        assert!(!doc.examples.is_empty(), "{} has no examples", doc.title);
        for variant in &doc.variants {
            for name in &variant.required {
                for example in &variant.examples {
                    assert!(example.get(name).is_some(), "{}: `{name}` missing", variant.title);
                }
            }
        }
    }
}

#[test]
fn schema_for_unregistered_interface_fails() {
    let factory = Factory::default();
    let err = SchemaGenerator::new(&factory).interface::<dyn Record>().unwrap_err();
    assert!(matches!(err, SchemaError::Codec(CodecError::UnregisteredInterface { .. })));
}

#[test]
fn custom_discriminator_field() {
    let factory = records::factory(CodecConfig::default().with_discriminator_field("kind"));
    let codec = Codec::new(&factory);
    let decoded = codec
        .decode_polymorphic::<dyn Record>(br#"{"id":"f","kind":"file","path":"p","size":0}"#)
        .unwrap();
    assert_eq!(decoded.discriminator(), "file");
    let value = codec.tagged_value(&Tagged::new(&*decoded)).unwrap();
    assert_eq!(value.get("kind"), Some(&JsonValue::from("file")));
    assert_eq!(value.get("type"), None);
}

#[test]
fn concurrent_decoding_shares_one_factory() {
    let factory = factory();
    std::thread::scope(|scope| {
        for n in 0..4 {
            let factory = &factory;
            scope.spawn(move || {
                let codec = Codec::new(factory);
                let input = format!(r#"{{"id":"{n}","type":"answer","value":{n}}}"#);
                let decoded = codec.decode_polymorphic::<dyn Record>(input.as_bytes()).unwrap();
                assert_eq!(decoded.id(), n.to_string());
            });
        }
    });
}

#[test]
fn file_sizes_round_trip_up_to_the_integer_limit() {
    let factory = factory();
    let codec = Codec::new(&factory);
    let largest = FileResult {
        id: "f".into(),
        path: "p".into(),
        size: i64::MAX as u64,
        mime: None,
    };
    let bytes = codec.encode_tagged(&Tagged::new(&largest as &dyn Record)).unwrap();
    let back = codec.decode_polymorphic::<dyn Record>(&bytes).unwrap();
    assert_eq!(back.downcast_ref::<FileResult>(), Some(&largest));

    let too_large = FileResult { size: u64::MAX, ..largest };
    let err = codec.encode_tagged(&Tagged::new(&too_large as &dyn Record)).unwrap_err();
    assert!(matches!(err, CodecError::Encode(_)), "{err}");
}
