// Matcher engine tests

#[cfg(test)]
mod tests {
    use test_log::test;

    use crate::command::{ChunkTriple, Command, FEventChunk, Script, ScriptHeader, Subroutine};
    use crate::config::ScriptConfig;
    use crate::decompiler::handlers::builtin;
    use crate::decompiler::matcher::*;
    use crate::error::ScriptError;
    use crate::opcodes::*;
    use crate::test_utils::MockManager;
    use crate::text::LanguageTable;
    use crate::variable::{Value, Variable};

    const SCRIPT_INDEX: usize = 0x0C;

    fn decompile(registry: &MatcherRegistry, commands: Vec<Command>) -> Result<String, ScriptError> {
        let manager = MockManager::new();
        let config = ScriptConfig::default();
        let subroutine = Subroutine::new(commands);
        let mut script = Script::new(SCRIPT_INDEX, ScriptHeader::default());
        script.subroutines.push(subroutine.clone());
        let chunks = ChunkTriple::new([
            Some(FEventChunk::Script(script)),
            None,
            Some(FEventChunk::LanguageTable(LanguageTable::new(4))),
        ]);
        let mut next_text_entry = 0;
        let mut context = MatchContext::new(
            &manager,
            &config,
            &chunks,
            SCRIPT_INDEX,
            &subroutine,
            &mut next_text_entry,
        )?;
        registry.decompile_commands(&subroutine.commands, &mut context, "")
    }

    fn cmd(opcode: u16, arguments: Vec<i64>, result: Option<u16>) -> Command {
        Command::new(
            opcode,
            arguments.into_iter().map(Value::Const).collect(),
            result.map(Variable),
        )
    }

    fn first(_: &[Command], _: &mut MatchContext<'_>, _: usize) -> Result<MatchOutcome, ScriptError> {
        Ok(MatchOutcome::Matched("first".to_string()))
    }

    fn second(_: &[Command], _: &mut MatchContext<'_>, _: usize) -> Result<MatchOutcome, ScriptError> {
        Ok(MatchOutcome::Matched("second".to_string()))
    }

    fn decline(_: &[Command], _: &mut MatchContext<'_>, _: usize) -> Result<MatchOutcome, ScriptError> {
        Ok(MatchOutcome::Declined)
    }

    fn count(
        commands: &[Command],
        _: &mut MatchContext<'_>,
        start: usize,
    ) -> Result<MatchOutcome, ScriptError> {
        Ok(MatchOutcome::Matched(format!("{} at {}", commands.len(), start)))
    }

    #[test]
    fn test_projection() {
        let commands = vec![cmd(0x96, vec![], None), cmd(0x1BA, vec![], None)];
        assert_eq!(project(&commands), "0096,01BA,");
        assert_eq!(project(&[]), "");
    }

    #[test]
    fn test_first_registered_rule_wins() {
        let mut registry = MatcherRegistry::new();
        registry.register("first", "0004,", first).unwrap();
        registry.register("second", "0004,", second).unwrap();

        let text = decompile(&registry, vec![cmd(WAIT, vec![1], None)]).unwrap();
        assert_eq!(text, "first");
    }

    #[test]
    fn test_declined_rule_falls_through() {
        let mut registry = MatcherRegistry::new();
        registry.register("decline", "0004,", decline).unwrap();
        registry.register("second", "0004,", second).unwrap();

        let text = decompile(&registry, vec![cmd(WAIT, vec![1], None)]).unwrap();
        assert_eq!(text, "second");
    }

    #[test]
    fn test_rule_consumes_matched_run() {
        let mut registry = MatcherRegistry::new();
        registry.register("pair", "0004,(?:0005,)?", count).unwrap();

        let commands = vec![
            cmd(WAIT, vec![1], None),
            cmd(PUSH, vec![2], None),
            cmd(WAIT, vec![3], None),
        ];
        let text = decompile(&registry, commands).unwrap();
        assert_eq!(text, "2 at 0\n1 at 2");
    }

    #[test]
    fn test_patterns_are_case_insensitive() {
        let mut registry = MatcherRegistry::new();
        registry.register("textbox", "01ba,", first).unwrap();

        let text = decompile(&registry, vec![cmd(SHOW_TEXTBOX_AT_ACTOR, vec![], None)]).unwrap();
        assert_eq!(text, "first");
    }

    #[test]
    fn test_empty_match_is_ignored() {
        let mut registry = MatcherRegistry::new();
        registry.register("optional", "(?:0009,)?", first).unwrap();
        registry.register("any", "[0-9A-F]{4},", second).unwrap();

        let text = decompile(&registry, vec![cmd(WAIT, vec![1], None)]).unwrap();
        assert_eq!(text, "second");
    }

    #[test]
    fn test_stall_reports_index() {
        let mut registry = MatcherRegistry::new();
        registry.register("wait", "0004,", first).unwrap();

        let commands = vec![cmd(WAIT, vec![1], None), cmd(0x0123, vec![], None)];
        let err = decompile(&registry, commands).unwrap_err();
        assert_eq!(err.unmatched_index(), Some(1));
        match err {
            ScriptError::CommandsNotMatched { subroutine, .. } => {
                assert_eq!(subroutine.commands.len(), 2)
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        let mut registry = MatcherRegistry::new();
        assert!(registry.register("broken", "(0004,", first).is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_builtin_rule_order() {
        let registry = builtin();
        let names: Vec<&str> = registry.matchers().iter().map(|m| m.name).collect();
        assert_eq!(names.first(), Some(&"terminate_script"));
        assert_eq!(names.last(), Some(&"unknown_command"));

        let position = |name: &str| names.iter().position(|n| *n == name).unwrap();
        assert!(position("say") < position("set_animation"));
        assert!(position("say") < position("wait_for_textbox"));
    }

    #[test]
    fn test_builtin_simple_rules() {
        let commands = vec![
            cmd(WAIT, vec![10], None),
            cmd(SET_VARIABLE, vec![5], Some(0x1000)),
            cmd(BINARY_ARITHMETIC_BASE, vec![2, 3], Some(0x1001)),
            cmd(INCREMENT, vec![], Some(0x1002)),
            cmd(NEGATE, vec![5], Some(0x1003)),
            Command::new(NEGATE, vec![Value::Var(Variable(0x1003))], Some(Variable(0x1004))),
            cmd(POP, vec![], Some(0x1005)),
            cmd(TERMINATE_SCRIPT, vec![], None),
        ];
        let text = decompile(builtin(), commands).unwrap();
        assert_eq!(
            text,
            "wait(10)\n\
             Var[0x1000] = 0x5\n\
             Var[0x1001] = 0x2 + 0x3\n\
             Var[0x1002] += 1\n\
             negate(0x5, Var[0x1003])\n\
             Var[0x1004] = -Var[0x1003]\n\
             pop(Var[0x1005])\n\
             terminate_script()"
        );
    }

    #[test]
    fn test_builtin_in_place_unit_operand_uses_call_form() {
        let commands = vec![
            cmd(IN_PLACE_ARITHMETIC_BASE, vec![1], Some(0x1000)),
            cmd(IN_PLACE_ARITHMETIC_BASE, vec![4], Some(0x1000)),
        ];
        let text = decompile(builtin(), commands).unwrap();
        assert_eq!(text, "add_in_place(0x1, Var[0x1000])\nVar[0x1000] += 0x4");
    }

    #[test]
    fn test_malformed_command_falls_back_to_emit_command() {
        let commands = vec![cmd(RETURN, vec![5], None), cmd(0x0123, vec![1, -2, 3], Some(0x1000))];
        let text = decompile(builtin(), commands).unwrap();
        assert_eq!(
            text,
            "emit_command(0x0001, [0x5])\n\
             emit_command(0x0123, [0x01, -0x0002, 0x00000003], Var[0x1000])"
        );
    }
}
