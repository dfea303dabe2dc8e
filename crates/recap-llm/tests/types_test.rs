use recap_llm::{Content, ContentPart, Message, Role};

#[test]
fn test_message_constructors_set_role() {
    assert_eq!(Message::system("You summarize").role, Role::System);
    assert_eq!(Message::user("Hello").role, Role::User);
    assert_eq!(Message::assistant("Hi there!").role.as_str(), "assistant");
}

#[test]
fn test_message_wire_format() {
    let json = serde_json::to_value(Message::user("Hello")).unwrap();
    assert_eq!(json, serde_json::json!({"role": "user", "content": "Hello"}));

    let msg: Message = serde_json::from_str(r#"{"role":"assistant","content":"Done"}"#).unwrap();
    assert_eq!(msg, Message::assistant("Done"));
}

#[test]
fn test_part_list_content_keeps_typed_wire_shape() {
    let msg = Message::user(Content::from_parts(["Summarize:", "user: hi"]));
    let json = serde_json::to_value(&msg).unwrap();
    assert_eq!(
        json["content"],
        serde_json::json!([
            {"type": "text", "text": "Summarize:"},
            {"type": "text", "text": "user: hi"}
        ])
    );

    let parsed: Message = serde_json::from_value(json).unwrap();
    assert_eq!(parsed.content.segments(), vec!["Summarize:", "user: hi"]);
    assert_eq!(parsed.content.to_text(), "Summarize:\nuser: hi");
}

#[test]
fn test_content_blankness_covers_every_segment() {
    assert!(Content::text("  ").is_blank());
    assert!(Content::Parts(vec![]).is_blank());
    assert!(Content::from_parts(["", " \n"]).is_blank());
    assert!(!Content::from_parts(["", "x"]).is_blank());
    assert_eq!(Content::Parts(vec![ContentPart::text("plain")]).to_text(), "plain");
}
