// Parser tests

#[cfg(test)]
mod tests {
    use test_log::test;

    use crate::dsl::ast::*;
    use crate::dsl::lexer::Lexer;
    use crate::dsl::parser::Parser;
    use crate::error::ScriptError;
    use crate::opcodes::{BinaryOp, UnaryOp};

    fn parse(source: &str) -> Result<Program, ScriptError> {
        let tokens = Lexer::new(source).tokenize()?;
        Parser::new(tokens).parse()
    }

    fn body(source: &str) -> Vec<Stmt> {
        let program = parse(&format!("sub 0 {{\n{}\n}}", source)).unwrap();
        match program.items.into_iter().next() {
            Some(Item::Subroutine(decl)) => decl.body,
            other => panic!("expected a subroutine, got {:?}", other),
        }
    }

    fn call(statement: &Stmt) -> &Call {
        match statement {
            Stmt::Call(call) => call,
            other => panic!("expected a call, got {:?}", other),
        }
    }

    #[test]
    fn test_script_layout() {
        let program = parse(
            "header b\"\\x01\\x02\"\n\
             \n\
             sub post_table {\n    wait(1)\n}\n\
             \n\
             sub 0 (no_return, footer=b\"\\xFF\") {}\n\
             \n\
             sub 1 {\n}\n",
        )
        .unwrap();

        assert_eq!(program.items.len(), 4);
        assert_eq!(program.items[0], Item::Header(vec![1, 2], 1));
        match &program.items[1] {
            Item::Subroutine(decl) => {
                assert_eq!(decl.name, SubroutineName::PostTable);
                assert_eq!(decl.body.len(), 1);
                assert!(!decl.no_return);
            }
            other => panic!("unexpected {:?}", other),
        }
        match &program.items[2] {
            Item::Subroutine(decl) => {
                assert_eq!(decl.name, SubroutineName::Index(0));
                assert!(decl.no_return);
                assert_eq!(decl.footer, Some(vec![0xFF]));
                assert!(decl.body.is_empty());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_assignments() {
        let statements = body(
            "Var[0x1000] = 0x5\n\
             Var[0x1001] = -0x5\n\
             Var[0x1002] = Var[0x1000] << 0x2\n\
             Var[0x1003] = -Var[0x1000]\n\
             Var[0x1004] = ~0x0\n\
             Var[0x1005] += 1\n\
             Var[0x1006] ^= Var[0x1000]",
        );

        assert_eq!(
            statements[0],
            Stmt::Assign {
                target: 0x1000,
                value: Expr::Integer(5),
                line: 2
            }
        );
        assert!(matches!(
            &statements[1],
            Stmt::Assign { value: Expr::Integer(-5), .. }
        ));
        assert!(matches!(
            &statements[2],
            Stmt::Assign { value: Expr::Binary { op: BinaryOp::ShiftLeft, .. }, .. }
        ));
        assert!(matches!(
            &statements[3],
            Stmt::Assign { value: Expr::Unary { op: UnaryOp::Negate, .. }, .. }
        ));
        assert!(matches!(
            &statements[4],
            Stmt::Assign { value: Expr::Unary { op: UnaryOp::BitwiseNot, .. }, .. }
        ));
        assert_eq!(
            statements[5],
            Stmt::CompoundAssign {
                target: 0x1005,
                op: BinaryOp::Add,
                value: Expr::Integer(1),
                line: 7
            }
        );
        assert!(matches!(
            &statements[6],
            Stmt::CompoundAssign { op: BinaryOp::BitwiseXor, value: Expr::Variable(0x1000), .. }
        ));
    }

    #[test]
    fn test_call_arguments() {
        let statements = body("say(Self, Sound.NONE, (\"Hi\", (2, 1)), anim=none, bubble=BubbleType.SCREAMING)");
        let say = call(&statements[0]);
        assert_eq!(say.name, "say");
        assert_eq!(
            say.arguments,
            vec![
                Argument::Positional(Expr::SelfActor),
                Argument::Positional(Expr::Constant {
                    group: "Sound".to_string(),
                    name: "NONE".to_string()
                }),
                Argument::Positional(Expr::Tuple(vec![
                    Expr::String("Hi".to_string()),
                    Expr::Tuple(vec![Expr::Integer(2), Expr::Integer(1)]),
                ])),
                Argument::Keyword("anim".to_string(), Expr::None),
                Argument::Keyword(
                    "bubble".to_string(),
                    Expr::Constant {
                        group: "BubbleType".to_string(),
                        name: "SCREAMING".to_string()
                    }
                ),
            ]
        );
    }

    #[test]
    fn test_multiline_collections() {
        let statements = body(
            "say(0x01, Sound.NONE, {\n    \"en\": (\"Yes\", (3, 1)),\n    \"es\": (\"Sí\", (2, 1)),\n})\n\
             text_table(0x44, [\n    b\"a\",\n    b\"b\",\n], textbox_sizes=[(1, 1), (1, 1)])\n\
             text_table(0x49, b\"\\x00\" * 3)",
        );
        assert_eq!(statements.len(), 3);

        match &call(&statements[0]).arguments[2] {
            Argument::Positional(Expr::Map(entries)) => {
                let keys: Vec<&str> = entries.iter().map(|(key, _)| key.as_str()).collect();
                assert_eq!(keys, vec!["en", "es"]);
            }
            other => panic!("unexpected {:?}", other),
        }
        match &call(&statements[1]).arguments[1] {
            Argument::Positional(Expr::List(entries)) => assert_eq!(entries.len(), 2),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(
            call(&statements[2]).arguments[1],
            Argument::Positional(Expr::Bytes(vec![0, 0, 0]))
        );
    }

    #[test]
    fn test_parenthesized_value_is_not_a_tuple() {
        let statements = body("push((0x3))\npush((0x3,))");
        assert_eq!(call(&statements[0]).arguments, vec![Argument::Positional(Expr::Integer(3))]);
        assert_eq!(
            call(&statements[1]).arguments,
            vec![Argument::Positional(Expr::Tuple(vec![Expr::Integer(3)]))]
        );
    }

    #[test]
    fn test_top_level_statements() {
        let program = parse("sub 0 {}\ntext_entry(\"left\", (4, 1))  // 0x02\n").unwrap();
        match &program.items[1] {
            Item::Call(call) => {
                assert_eq!(call.name, "text_entry");
                assert_eq!(call.line, 2);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_errors_report_lines() {
        let err = parse("sub 0 {\n    wait(1) wait(2)\n}").unwrap_err();
        assert!(matches!(err, ScriptError::ExpectedToken(_, _, 2)));

        let err = parse("sub 0 {\n\n    Var[0x1000] 5\n}").unwrap_err();
        assert!(matches!(err, ScriptError::ExpectedToken(_, _, 3)));

        let err = parse("sub 0 (fast) {}").unwrap_err();
        assert!(matches!(err, ScriptError::ParseError(_, 1)));

        let err = parse("sub 0 {\n    push(Var[0x10000])\n}").unwrap_err();
        assert!(matches!(err, ScriptError::ParseError(_, 2)));

        let err = parse("sub 0 {\n    push(unknown)\n}").unwrap_err();
        assert!(matches!(err, ScriptError::ParseError(_, 2)));
    }
}
