use ktb_core::definition::KeyTableDefinition;
use ktb_core::{
    Block, Command, CommandFlags, ContextId, KeyContextTable, KeyTable, KeyTableState,
    KeyValue, KeyboardFunction, SessionConfig, TableError,
};
use std::sync::Arc;

const TABLE: &str = r#"
{
  "contexts": [
    {
      "id": 0,
      "title": "Default",
      "bindings": [
        { "immediate": { "set": 0, "key": 1 }, "command": { "block": 0, "arg": 7 } },
        { "immediate": { "set": 1, "key": 255 }, "command": { "block": 1 }, "adjust": true },
        { "modifiers": [{ "set": 0, "key": 2 }] },
        {
          "modifiers": [{ "set": 0, "key": 2 }],
          "immediate": { "set": 0, "key": 3 },
          "command": { "block": 37, "arg": 2 }
        }
      ],
      "key_map": [[11, "dot1"], [12, "dot2"], [13, "space"]],
      "superimposed": { "dots": 64 }
    },
    {
      "id": 2,
      "title": "Help",
      "temporary": true,
      "hotkeys": [
        { "key": { "set": 0, "key": 5 }, "press": { "block": 0, "arg": 42 }, "release": { "block": 0, "arg": 43 } }
      ]
    }
  ]
}
"#;

fn load() -> anyhow::Result<Arc<KeyContextTable>> {
    let definition: KeyTableDefinition = serde_json::from_str(TABLE)?;
    Ok(Arc::new(definition.compile()?))
}

#[test]
fn json_definition_compiles() -> anyhow::Result<()> {
    let contexts = load()?;
    assert_eq!(contexts.len(), 2);

    let default = contexts.get(ContextId::DEFAULT).expect("default context");
    assert_eq!(default.title(), Some("Default"));
    assert_eq!(default.bindings().len(), 4);
    assert_eq!(default.key_map().and_then(|m| m.get(&13)), Some(&KeyboardFunction::Space));
    assert_eq!(default.superimposed().dots, 0x40);

    let help = contexts.get(ContextId(2)).expect("help context");
    assert!(help.is_temporary());
    assert_eq!(help.hotkeys().len(), 1);
    Ok(())
}

#[test]
fn json_table_drives_a_session() -> anyhow::Result<()> {
    let contexts = load()?;
    let config: SessionConfig = serde_json::from_str(r#"{ "log_key_events": true }"#)?;
    let mut table = KeyTable::with_config(contexts, Vec::new(), config);
    assert_eq!(table.current_context(), ContextId::DEFAULT);

    // 0.2 held, 0.3 switches to the temporary help context.
    assert_eq!(table.process_key_event(ContextId::DEFAULT, 0, 2, true), KeyTableState::Modifiers);
    assert_eq!(table.process_key_event(ContextId::DEFAULT, 0, 3, true), KeyTableState::Command);
    assert_eq!(table.current_context(), ContextId(2));
    table.process_key_event(ContextId::DEFAULT, 0, 3, false);
    table.process_key_event(ContextId::DEFAULT, 0, 2, false);

    assert_eq!(table.process_key_event(ContextId::DEFAULT, 0, 5, true), KeyTableState::Hotkey);
    assert_eq!(table.current_context(), ContextId::DEFAULT);

    table.process_key_event(ContextId::DEFAULT, 1, 20, true);
    table.process_key_event(ContextId::DEFAULT, 1, 20, false);

    table.process_key_event(ContextId::DEFAULT, 0, 11, true);
    table.process_key_event(ContextId::DEFAULT, 0, 11, false);

    assert_eq!(
        table.queue(),
        &vec![
            Command::NOOP,
            Command::NOOP,
            Command::simple(42),
            Command::new(Block::ROUTE, 20).with_flags(CommandFlags::REPEAT),
            Command::NOOP,
            Command::new(Block::PASSDOTS, 0x41).with_flags(CommandFlags::REPEAT_DELAY),
            Command::new(Block::PASSDOTS, 0x41),
        ]
    );
    Ok(())
}

#[test]
fn json_definition_without_default_context_is_rejected() -> anyhow::Result<()> {
    let definition: KeyTableDefinition =
        serde_json::from_str(r#"{ "contexts": [{ "id": 3 }] }"#)?;
    assert_eq!(definition.compile().unwrap_err(), TableError::MissingDefaultContext);
    Ok(())
}

#[test]
fn key_values_serialize_as_plain_fields() -> anyhow::Result<()> {
    let json = serde_json::to_string(&KeyValue::new(1, 9))?;
    assert_eq!(json, r#"{"set":1,"key":9}"#);
    Ok(())
}
