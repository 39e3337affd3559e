// Dialogue emitter tests

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;
    use test_log::test;

    use crate::command::{Command, Subroutine};
    use crate::config::ScriptConfig;
    use crate::dialogue::*;
    use crate::emitter::Emitter;
    use crate::error::ScriptError;
    use crate::opcodes::*;
    use crate::test_utils::MockManager;
    use crate::text::{EntryDefinition, TableSlot, TextEntry, TextTableBuilder};
    use crate::variable::{Value, Variable};

    fn run(
        body: impl FnOnce(&mut Emitter<'_>) -> Result<(), ScriptError>,
    ) -> (Result<(), ScriptError>, Vec<Command>, TextTableBuilder) {
        let manager = MockManager::new();
        let config = ScriptConfig::default();
        let mut tables = TextTableBuilder::new(&config);
        let mut subroutine = Subroutine::default();
        let result = {
            let mut emitter = Emitter::new(&mut subroutine, 0x05, &mut tables, &manager, &config);
            body(&mut emitter)
        };
        (result, subroutine.commands, tables)
    }

    fn opcodes(commands: &[Command]) -> Vec<u16> {
        commands.iter().map(|command| command.opcode).collect()
    }

    #[test]
    fn test_hoffset_packing() {
        assert_eq!(pack_hoffsets(None, None), -1);
        assert_eq!(pack_hoffsets(Some(0x10), None), 0x10FF);
        assert_eq!(pack_hoffsets(None, Some(0x20)), -0x00E0);
        assert_eq!(pack_hoffsets(Some(-0x10), Some(0x08)), -0x0FF8);

        assert_eq!(unpack_hoffsets(-1), Some((-1, -1)));
        assert_eq!(unpack_hoffsets(0x10FF), Some((0x10, -1)));
        assert_eq!(unpack_hoffsets(-0x0FF8), Some((-0x10, 0x08)));
        assert_eq!(unpack_hoffsets(0x10000), None);
    }

    #[test]
    fn test_default_say_emits_four_commands() {
        let (result, commands, tables) = run(|sub| {
            let say = Say::new(
                Target::Actor(Value::Const(0x01)),
                0x00020153,
                EntryDefinition::from(TextEntry::new("Hello!", (12, 2))),
            );
            let index = sub.say(&say)?;
            assert_eq!(index, 1);
            Ok(())
        });
        result.unwrap();

        assert_eq!(
            opcodes(&commands),
            vec![SET_ANIMATION, SHOW_TEXTBOX_AT_ACTOR, WAIT_FOR_TEXTBOX, SET_ANIMATION]
        );
        assert_eq!(
            commands[0].arguments,
            vec![Value::Const(1), Value::Const(1), Value::Const(1)]
        );
        assert_eq!(commands[3].arguments[1], Value::Const(3));

        let textbox = &commands[1];
        assert_eq!(textbox.arguments.len(), ACTOR_TEXTBOX_ARGUMENTS);
        assert_eq!(textbox.result, Some(Variable(0x1000)));
        let common_args = &textbox.arguments[1..textbox.arguments.len() - 1];
        assert_eq!(common_args[common::MESSAGE], Value::Const(0));
        assert_eq!(common_args[common::WAIT], Value::Const(0));
        assert_eq!(common_args[common::HOFFSETS], Value::Const(-1));
        assert_eq!(common_args[common::SOUND], Value::Const(0x00020153));
        assert_eq!(textbox.arguments.last(), Some(&Value::Const(-1)));

        match &tables.tables(0x05).unwrap()[&0x44] {
            TableSlot::Text(table) => assert_eq!(table.entries, vec![b"Hello!".to_vec()]),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_position_say_has_no_animations() {
        let (result, commands, _) = run(|sub| {
            let mut say = Say::new(
                Target::Position(Value::Const(0x80), Value::Const(0x40)),
                0,
                Value::Const(7),
            );
            say.textbox.unk14 = Value::Const(0x1234);
            sub.say(&say)?;
            Ok(())
        });
        result.unwrap();

        assert_eq!(
            opcodes(&commands),
            vec![SHOW_TEXTBOX_AT_POSITION, WAIT_FOR_TEXTBOX]
        );
        let arguments = &commands[0].arguments;
        assert_eq!(arguments.len(), POSITION_TEXTBOX_ARGUMENTS);
        assert_eq!(arguments[13], Value::Const(0x1234));
        assert_eq!(arguments[2 + common::MESSAGE], Value::Const(7));
    }

    #[test]
    fn test_wait_flag_controls_wait_command() {
        let (result, commands, _) = run(|sub| {
            let mut say = Say::new(Target::Actor(Value::Const(2)), 0, Value::Const(0));
            say.anim = None;
            say.post_anim = None;
            say.textbox.wait = WaitFlag::Bool(false);
            sub.say(&say)?;

            say.force_wait_command = Some(true);
            sub.say(&say)?;

            say.textbox.wait = WaitFlag::Raw(Value::Var(Variable(0x1010)));
            say.force_wait_command = None;
            sub.say(&say)?;
            Ok(())
        });
        result.unwrap();

        assert_eq!(
            opcodes(&commands),
            vec![
                SHOW_TEXTBOX_AT_ACTOR,
                SHOW_TEXTBOX_AT_ACTOR,
                WAIT_FOR_TEXTBOX,
                SHOW_TEXTBOX_AT_ACTOR,
            ]
        );
        assert_eq!(commands[0].arguments[1 + common::WAIT], Value::Const(1));
    }

    #[test]
    fn test_conflicting_hoffsets_fail_before_emission() {
        let (result, commands, tables) = run(|sub| {
            let mut say = Say::new(
                Target::Actor(Value::Const(1)),
                0,
                EntryDefinition::from(TextEntry::new("never", (1, 1))),
            );
            say.textbox.textbox_hoffset = Some(4);
            say.textbox.hoffsets_arg = Some(Value::Const(0));
            sub.say(&say)?;
            Ok(())
        });

        assert!(matches!(result, Err(ScriptError::Configuration(_))));
        assert!(commands.is_empty());
        assert!(tables.tables(0x05).is_none());
    }

    #[test]
    fn test_per_language_message_uses_one_index() {
        let (result, commands, _) = run(|sub| {
            let mut lines = IndexMap::new();
            lines.insert("en".to_string(), TextEntry::new("Yes", (3, 1)));
            lines.insert("es".to_string(), TextEntry::new("Sí", (2, 1)));
            let first = Say::new(
                Target::self_actor(),
                0,
                EntryDefinition::PerLanguage(lines),
            );
            sub.show_textbox(&first.textbox)?;
            sub.show_textbox(&first.textbox)?;
            Ok(())
        });
        result.unwrap();

        assert_eq!(commands[0].arguments[0], Value::Const(-1));
        assert_eq!(commands[0].arguments[1 + common::MESSAGE], Value::Const(0));
        assert_eq!(commands[1].arguments[1 + common::MESSAGE], Value::Const(1));
    }
}
