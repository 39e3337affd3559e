// Dialogue reconstruction tests

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;
    use test_log::test;

    use crate::command::{ChunkTriple, Command, FEventChunk, Script, ScriptHeader, Subroutine};
    use crate::config::ScriptConfig;
    use crate::decompiler::handlers::builtin;
    use crate::decompiler::matcher::MatchContext;
    use crate::dialogue::{Message, Say, ShowTextbox, Target, WaitFlag};
    use crate::emitter::Emitter;
    use crate::error::ScriptError;
    use crate::test_utils::MockManager;
    use crate::text::{EntryDefinition, LanguageTable, TextEntry, TextTableBuilder};
    use crate::variable::Value;

    const SCRIPT_INDEX: usize = 0x0C;
    const ROOM_ID: u16 = 4;

    fn compile(
        body: impl FnOnce(&mut Emitter<'_>) -> Result<(), ScriptError>,
    ) -> (Vec<Command>, Option<LanguageTable>) {
        let manager = MockManager::new();
        let config = ScriptConfig::default();
        let mut tables = TextTableBuilder::new(&config);
        let mut subroutine = Subroutine::default();
        {
            let mut emitter = Emitter::new(&mut subroutine, ROOM_ID, &mut tables, &manager, &config);
            body(&mut emitter).unwrap();
        }
        let mut language_tables = tables.finalize(&manager).unwrap();
        (subroutine.commands, language_tables.swap_remove(&ROOM_ID))
    }

    fn decompile(
        commands: &[Command],
        language_table: Option<LanguageTable>,
        next_text_entry: &mut usize,
    ) -> Result<String, ScriptError> {
        let manager = MockManager::new();
        let config = ScriptConfig::default();
        let subroutine = Subroutine::new(commands.to_vec());
        let mut script = Script::new(SCRIPT_INDEX, ScriptHeader::default());
        script.subroutines.push(subroutine.clone());
        let chunks = ChunkTriple::new([
            Some(FEventChunk::Script(script)),
            None,
            language_table.map(FEventChunk::LanguageTable),
        ]);
        let mut context = MatchContext::new(
            &manager,
            &config,
            &chunks,
            SCRIPT_INDEX,
            &subroutine,
            next_text_entry,
        )?;
        builtin().decompile_commands(&subroutine.commands, &mut context, "")
    }

    fn actor_say(message: impl Into<Message>) -> Say {
        Say::new(Target::Actor(Value::Const(1)), 0, message)
    }

    #[test]
    fn test_default_say_collapses_to_one_line() {
        let (commands, language_table) = compile(|sub| {
            let say = Say::new(
                Target::Actor(Value::Const(1)),
                0x00020153,
                EntryDefinition::from(TextEntry::new("Hello!", (12, 2))),
            );
            sub.say(&say)?;
            Ok(())
        });
        assert_eq!(commands.len(), 4);

        let mut next_text_entry = 0;
        let text = decompile(&commands, language_table, &mut next_text_entry).unwrap();
        assert_eq!(
            text,
            "say(0x01, Sound.SPEECH_FAWFUL, (\"Hello!\", (12, 2)))"
        );
        assert_eq!(next_text_entry, 1);
    }

    #[test]
    fn test_out_of_order_message_stays_an_index() {
        let (commands, language_table) = compile(|sub| {
            sub.say(&actor_say(Value::Const(3)))?;
            Ok(())
        });

        let mut next_text_entry = 0;
        let text = decompile(&commands, language_table, &mut next_text_entry).unwrap();
        assert_eq!(text, "say(0x01, Sound.NONE, 0x03)");
        assert_eq!(next_text_entry, 0);
    }

    #[test]
    fn test_foreign_leading_animation_is_not_fused() {
        let (commands, _) = compile(|sub| {
            sub.set_animation(2, 1, 1);
            let mut say = actor_say(Value::Const(5));
            say.anim = None;
            sub.say(&say)?;
            Ok(())
        });

        let text = decompile(&commands, None, &mut 0).unwrap();
        assert_eq!(
            text,
            "set_animation(0x02, 0x01)\nsay(0x01, Sound.NONE, 0x05, anim=none)"
        );
    }

    #[test]
    fn test_trailing_animation_with_other_unk3_is_kept() {
        let (commands, _) = compile(|sub| {
            let mut say = actor_say(Value::Const(5));
            say.post_anim = None;
            sub.say(&say)?;
            sub.set_animation(1, 3, 0);
            Ok(())
        });

        let text = decompile(&commands, None, &mut 0).unwrap();
        assert_eq!(
            text,
            "say(0x01, Sound.NONE, 0x05, post_anim=none)\nset_animation(0x01, 0x03, unk3=0x00)"
        );
    }

    #[test]
    fn test_nondefault_wait_keeps_command_order() {
        let (commands, _) = compile(|sub| {
            sub.set_animation(1, 1, 1);
            sub.show_textbox(&ShowTextbox::new(Target::Actor(Value::Const(1)), 0, Value::Const(5)))?;
            sub.wait_for_textbox(2);
            sub.set_animation(1, 3, 1);
            Ok(())
        });

        let text = decompile(&commands, None, &mut 0).unwrap();
        assert_eq!(
            text,
            "say(0x01, Sound.NONE, 0x05, post_anim=none, force_wait_command=false)\n\
             wait_for_textbox(unk1=0x02)\n\
             set_animation(0x01, 0x03)"
        );
    }

    #[test]
    fn test_forced_wait_is_rendered() {
        let (commands, _) = compile(|sub| {
            let mut say = actor_say(Value::Const(5));
            say.textbox.wait = WaitFlag::Bool(false);
            say.force_wait_command = Some(true);
            sub.say(&say)?;
            Ok(())
        });

        let text = decompile(&commands, None, &mut 0).unwrap();
        assert_eq!(
            text,
            "say(0x01, Sound.NONE, 0x05, wait=false, force_wait_command=true)"
        );
    }

    #[test]
    fn test_position_say_with_offsets() {
        let (commands, _) = compile(|sub| {
            let mut say = Say::new(
                Target::Position(Value::Const(0x80), Value::Const(0x40)),
                0,
                Value::Const(7),
            );
            say.textbox.textbox_hoffset = Some(0x10);
            say.textbox.unk14 = Value::Const(0x1234);
            sub.say(&say)?;
            Ok(())
        });

        let text = decompile(&commands, None, &mut 0).unwrap();
        assert_eq!(
            text,
            "say((0x0080, 0x0040), Sound.NONE, 0x07, textbox_hoffset=0x10, unk14=0x1234)"
        );
    }

    #[test]
    fn test_per_language_literal() {
        let (commands, language_table) = compile(|sub| {
            let mut lines = IndexMap::new();
            lines.insert("en".to_string(), TextEntry::new("Yes", (3, 1)));
            lines.insert("es".to_string(), TextEntry::new("Sí", (2, 1)));
            let say = Say::new(Target::self_actor(), 0, EntryDefinition::PerLanguage(lines));
            sub.say(&say)?;
            Ok(())
        });

        let mut next_text_entry = 0;
        let text = decompile(&commands, language_table, &mut next_text_entry).unwrap();
        assert_eq!(
            text,
            "say(Self, Sound.NONE, {\n\
             \x20   \"en\": (\"Yes\", (3, 1)),\n\
             \x20   \"fr\": (\"Yes\", (3, 1)),\n\
             \x20   \"es\": (\"Sí\", (2, 1)),\n\
             })"
        );
        assert_eq!(next_text_entry, 1);
    }

    #[test]
    fn test_literal_without_language_table_fails() {
        let (commands, _) = compile(|sub| {
            sub.say(&actor_say(Value::Const(0)))?;
            Ok(())
        });

        let err = decompile(&commands, None, &mut 0).unwrap_err();
        assert!(matches!(err, ScriptError::ChunkType { chunk: 2, .. }));
    }
}
