use form_schema::{
    CompileOptions, FieldKind, FieldSchema, ParseError, UnknownTypePolicy, default_document,
    default_for, edit, parse,
};
use serde_json::json;

const CHAT_STATE: &str = include_str!("../demos/chat_state.ts");

fn chat_state() -> Vec<FieldSchema> {
    parse(CHAT_STATE, "ChatState", &CompileOptions::default()).unwrap()
}

#[test]
fn chat_state_schema_matches_the_form_layout() {
    let citation = json!({
        "type": "object",
        "fields": [
            { "name": "company_ticker", "type": "string" },
            { "name": "financial_quarter", "type": "string" },
            { "name": "chunk_text", "type": "string" },
            { "name": "page_number", "type": "number" }
        ]
    });
    let expected = json!([
        {
            "name": "messages",
            "type": "array",
            "itemType": {
                "type": "object",
                "fields": [
                    { "name": "user_message", "type": "string" },
                    { "name": "bot_response", "type": "string" },
                    { "name": "company_tickers", "type": "array", "itemType": { "type": "string" } },
                    { "name": "quarters", "type": "array", "itemType": { "type": "string" } },
                    { "name": "citations", "isOptional": true, "type": "array", "itemType": citation },
                    { "name": "error", "isOptional": true, "type": "boolean" }
                ]
            }
        },
        { "name": "isLoading", "type": "boolean" },
        { "name": "selectedCitations", "type": "array", "itemType": citation },
        { "name": "isGenerating", "type": "boolean" },
        { "name": "isEditing", "type": "boolean" },
        {
            "name": "tooltipData",
            "type": "record",
            "itemType": {
                "type": "object",
                "fields": [{
                    "name": "insights",
                    "type": "array",
                    "itemType": {
                        "type": "object",
                        "fields": [
                            { "name": "label", "type": "string" },
                            { "name": "insight_text", "type": "string" }
                        ]
                    }
                }]
            }
        }
    ]);
    assert_eq!(serde_json::to_value(chat_state()).unwrap(), expected);
}

#[test]
fn chat_state_default_document() {
    assert_eq!(
        default_document(&chat_state()),
        json!({
            "messages": [],
            "isLoading": false,
            "selectedCitations": [],
            "isGenerating": false,
            "isEditing": false,
            "tooltipData": {}
        })
    );
}

#[test]
fn editing_session_on_chat_state() {
    let roots = chat_state();
    let mut doc = default_document(&roots);

    let messages = roots.iter().find(|f| f.name == "messages").unwrap();
    let index = edit::push_item(&mut doc["messages"], messages.item_type().unwrap()).unwrap();
    assert_eq!(
        doc["messages"][index],
        json!({
            "user_message": "",
            "bot_response": "",
            "company_tickers": [],
            "quarters": []
        })
    );

    let message_schema = messages.item_type().unwrap();
    edit::set_optional(&mut doc["messages"][index], message_schema, "citations", true).unwrap();
    assert_eq!(doc["messages"][index]["citations"], json!([]));

    let tooltip = roots.iter().find(|f| f.name == "tooltipData").unwrap();
    let key = edit::add_record_entry(&mut doc["tooltipData"], tooltip.item_type().unwrap()).unwrap();
    assert_eq!(key, "key_1");
    assert_eq!(doc["tooltipData"]["key_1"], json!({ "insights": [] }));
    edit::rename_record_key(&mut doc["tooltipData"], "key_1", "AAPL").unwrap();
    assert_eq!(doc["tooltipData"], json!({ "AAPL": { "insights": [] } }));
}

#[test]
fn order_of_declarations_does_not_matter() {
    let mut blocks: Vec<&str> = CHAT_STATE.split("\n\n").collect();
    blocks.reverse();
    let reversed = blocks.join("\n\n");
    let roots = parse(&reversed, "ChatState", &CompileOptions::default()).unwrap();
    assert_eq!(roots, chat_state());
}

#[test]
fn record_of_primitives() {
    let roots = parse("interface Root { foo: Record<string, number> }", "Root", &CompileOptions::default()).unwrap();
    let item = roots[0].item_type().unwrap();
    assert_eq!(item.kind, FieldKind::Number);
    assert_eq!(default_for(item), json!(0));
}

#[test]
fn errors_are_all_or_nothing() {
    let options = CompileOptions::default();
    assert_eq!(parse(CHAT_STATE, "Root", &options), Err(ParseError::RootNotFound("Root".into())));
    assert_eq!(parse("", "Root", &options), Err(ParseError::NoDeclarationsFound));
    assert!(matches!(
        parse("interface Root { m: Record<string> }", "Root", &options),
        Err(ParseError::MalformedRecord { .. })
    ));

    let strict = CompileOptions { unknown_types: UnknownTypePolicy::Reject, ..options };
    let err = parse("interface Root { when: Date }", "Root", &strict).unwrap_err();
    assert_eq!(err.to_string(), "unknown type `Date` in `Root.when`");
}

#[test]
fn strict_options_accept_the_demo() {
    assert!(parse(CHAT_STATE, "ChatState", &CompileOptions::strict()).is_ok());
}

#[test]
fn layout_variants_keep_every_member() {
    let options = CompileOptions::default();

    let roots = parse("type Root =\n{\n  a: string;\n}", "Root", &options).unwrap();
    assert_eq!(roots, vec![FieldSchema::named("a", FieldKind::String)]);

    let roots = parse("interface Root {\n  mode:\n    | \"a\"\n    | \"b\";\n  n: number;\n}", "Root", &options).unwrap();
    assert_eq!(roots.len(), 2);
    assert_eq!(roots[0].name, "mode");
    assert_eq!(roots[0].kind, FieldKind::Enum { values: vec!["a".into(), "b".into()] });
    assert_eq!(default_document(&roots), json!({ "mode": "a", "n": 0 }));

    let roots = parse("interface Root { rows: Record<string, number>[] }", "Root", &options).unwrap();
    let row = roots[0].item_type().unwrap();
    assert_eq!(row.item_type().unwrap().kind, FieldKind::Number);
    assert_eq!(default_for(&roots[0]), json!([]));
}
