mod common;

#[cfg(test)]
mod resolver_tests {
    use super::common::{run_err, run_ok, session};
    use hex_lang::ast::{Expr, Stmt};
    use hex_lang::interpreter::Interpreter;
    use hex_lang::parser::Parser;
    use hex_lang::resolver::Resolver;
    use hex_lang::scanner::scan_tokens;
    use pretty_assertions::assert_eq;

    fn resolved(source: &str) -> (Vec<Stmt>, Interpreter) {
        let (tokens, errors) = scan_tokens(source);
        assert!(errors.is_empty());

        let statements = Parser::new(&tokens).parse().expect("program should parse");
        let mut interpreter = Interpreter::with_output(Box::new(std::io::sink()));

        Resolver::new(&mut interpreter)
            .resolve(&statements)
            .expect("program should resolve");

        (statements, interpreter)
    }

    fn function_body(stmt: &Stmt) -> &[Stmt] {
        match stmt {
            Stmt::Function(declaration) => &declaration.body,
            other => panic!("expected function, got {:?}", other),
        }
    }

    #[test]
    fn test_parameters_are_one_scope_out_from_the_body() {
        // The body block shares the parameter scope.
        let (statements, interpreter) = resolved("fun f(a) { return a; }");

        let Stmt::Return {
            value: Some(Expr::Variable { id, .. }),
            ..
        } = &function_body(&statements[0])[0]
        else {
            panic!("expected return of a variable");
        };

        assert_eq!(interpreter.binding_distance(*id), Some(0));
    }

    #[test]
    fn test_closure_captures_enclosing_local() {
        let (statements, interpreter) =
            resolved("fun outer() { var x = 1; fun inner() { return x; } return inner; }");

        let Stmt::Function(inner) = &function_body(&statements[0])[1] else {
            panic!("expected nested function");
        };
        let Stmt::Return {
            value: Some(Expr::Variable { id, .. }),
            ..
        } = &inner.body[0]
        else {
            panic!("expected return of a variable");
        };

        assert_eq!(interpreter.binding_distance(*id), Some(1));
    }

    #[test]
    fn test_this_resolves_to_the_method_binding_scope() {
        let (statements, interpreter) = resolved("class A { m() { return this; } }");

        let Stmt::Class { methods, .. } = &statements[0] else {
            panic!("expected class");
        };
        let Stmt::Return {
            value: Some(Expr::This { id, .. }),
            ..
        } = &methods[0].body[0]
        else {
            panic!("expected return of this");
        };

        assert_eq!(interpreter.binding_distance(*id), Some(1));
    }

    #[test]
    fn test_resolution_fixes_binding_before_later_shadowing() {
        assert_eq!(
            run_ok(
                "var a = 1;
                 {
                   fun get() { return a; }
                   var a = 2;
                   print get();
                   print a;
                 }"
            ),
            vec!["1", "2"]
        );
    }

    #[test]
    fn test_every_repl_line_is_resolved_against_the_same_globals() {
        let (mut session, capture) = session();

        session.run("fun twice(f, x) { return f(f(x)); }");
        session.run("fun inc(n) { return n + 1; }");
        session.run("{ var start = 3; print twice(inc, start); }");

        assert_eq!(capture.contents(), "5\n");
    }

    #[test]
    fn test_unused_locals_are_fine() {
        assert!(run_ok("{ var unused = 1; }").is_empty());
    }

    #[test]
    fn test_shadowing_in_nested_block_is_allowed() {
        assert_eq!(run_ok("{ var a = 1; { var a = 2; print a; } print a; }"), vec!["2", "1"]);

        let (messages, _) = run_err("{ var a = 1; var a = 2; }");
        assert_eq!(
            messages,
            vec!["[line 1] Error at 'a': Already a variable with this name in this scope."]
        );
    }
}
