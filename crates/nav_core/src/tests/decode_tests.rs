use super::*;

fn module_base() -> Url {
    Url::parse("https://assets.example/modules/").unwrap()
}

fn stream_for(location: &str, payload: &str) -> ContentStream {
    ContentStream::from_bytes(Location::new(location), payload.as_bytes().to_vec())
}

#[tokio::test]
async fn decodes_nested_elements_and_text() {
    let payload = r#"{
        "kind": "element",
        "tag": "section",
        "props": {"class": "hero"},
        "children": [
            {"kind": "text", "value": "Welcome"},
            {"kind": "element", "tag": "p", "children": [
                {"kind": "text", "value": "streamed"}
            ]}
        ]
    }"#;

    let tree = JsonTreeDecoder
        .decode(stream_for("/", payload), &module_base())
        .await
        .unwrap();

    assert_eq!(tree.node_count(), 4);
    match &tree.root {
        RenderNode::Element { tag, props, children } => {
            assert_eq!(tag, "section");
            assert_eq!(props["class"], serde_json::json!("hero"));
            assert_eq!(children.len(), 2);
        }
        other => panic!("unexpected root node: {other:?}"),
    }
}

#[tokio::test]
async fn resolves_module_reference_against_base() {
    let payload = r#"{"kind": "module", "reference": "widgets/chart.js#Sparkline"}"#;

    let tree = JsonTreeDecoder
        .decode(stream_for("/dash", payload), &module_base())
        .await
        .unwrap();

    match &tree.root {
        RenderNode::Module { url, export, .. } => {
            assert_eq!(url, "https://assets.example/modules/widgets/chart.js");
            assert_eq!(export, "Sparkline");
        }
        other => panic!("unexpected root node: {other:?}"),
    }
}

#[tokio::test]
async fn module_export_defaults_to_default() {
    let payload = r#"{"kind": "module", "reference": "widgets/clock.js"}"#;

    let tree = JsonTreeDecoder
        .decode(stream_for("/", payload), &module_base())
        .await
        .unwrap();

    match &tree.root {
        RenderNode::Module { export, .. } => assert_eq!(export, "default"),
        other => panic!("unexpected root node: {other:?}"),
    }
}

#[tokio::test]
async fn malformed_payload_is_a_decode_error() {
    let err = JsonTreeDecoder
        .decode(stream_for("/broken", "{\"kind\": nope"), &module_base())
        .await
        .unwrap_err();

    match err {
        DecodeError::Json { location, .. } => assert_eq!(location, "/broken"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn unknown_node_kind_is_a_decode_error() {
    let err = JsonTreeDecoder
        .decode(
            stream_for("/", r#"{"kind": "portal", "value": "?"}"#),
            &module_base(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, DecodeError::Json { .. }));
}
