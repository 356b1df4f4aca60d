mod common;

#[cfg(test)]
mod session_tests {
    use super::common::{run, session};
    use hex_lang::error::ErrorKind;
    use hex_lang::session::{run_source, EXIT_RUNTIME_ERROR, EXIT_STATIC_ERROR};
    use hex_lang::value::Value;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_successful_run_exits_zero() {
        let (output, report) = run("print \"ok\";");

        assert_eq!(output, "ok\n");
        assert!(report.is_ok());
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn test_static_errors_prevent_execution() {
        let (output, report) = run("print \"never\";\nprint ;");

        assert_eq!(output, "");
        assert!(report.had_error);
        assert!(!report.had_runtime_error);
        assert_eq!(report.exit_code(), EXIT_STATIC_ERROR);
    }

    #[test]
    fn test_lexical_and_syntax_errors_are_both_reported() {
        let (_, report) = run("var a = @;\nprint (1;");

        let kinds: Vec<ErrorKind> = report.diagnostics.iter().map(|e| e.kind()).collect();
        assert!(kinds.iter().all(|k| *k == ErrorKind::Static));

        let messages: Vec<String> = report.diagnostics.iter().map(|e| e.message()).collect();
        assert_eq!(messages[0], "Unexpected character: @");
        assert!(messages.contains(&"Expected ')' after expression.".to_string()));
    }

    #[test]
    fn test_resolution_errors_prevent_execution() {
        let (output, report) = run("print 1;\nreturn 2;");

        assert_eq!(output, "");
        assert_eq!(
            report.diagnostics[0].to_string(),
            "[line 2] Error at 'return': Can't return from top-level code."
        );
        assert_eq!(report.exit_code(), EXIT_STATIC_ERROR);
    }

    #[test]
    fn test_runtime_error_exit_code() {
        let (_, report) = run("print nil + nil;");

        assert!(report.had_runtime_error);
        assert_eq!(report.exit_code(), EXIT_RUNTIME_ERROR);
    }

    #[test]
    fn test_globals_persist_across_runs() {
        let (mut session, capture) = session();

        assert!(session.run("var count = 1;").is_ok());
        assert!(session.run("fun bump() { count = count + 1; return count; }").is_ok());
        assert!(session.run("print bump();").is_ok());

        assert_eq!(capture.contents(), "2\n");
        assert_eq!(session.interpreter().global("count"), Some(Value::Number(2.0)));
    }

    #[test]
    fn test_errors_do_not_poison_the_session() {
        let (mut session, capture) = session();

        assert!(session.run("var x = 10;").is_ok());

        let report = session.run("print x / 0;");
        assert!(report.had_runtime_error);

        let report = session.run("print x +;");
        assert!(report.had_error);
        assert!(!report.had_runtime_error);

        let report = session.run("{ var y = 1; print y + x; }");
        assert!(report.is_ok(), "{:?}", report.diagnostics);
        assert_eq!(capture.contents(), "11\n");
    }

    #[test]
    fn test_runtime_error_inside_function_restores_scope() {
        let (mut session, capture) = session();

        let report = session.run("var a = \"global\"; fun f() { var a = \"local\"; return a - 1; } f();");
        assert!(report.had_runtime_error);

        capture.clear();
        assert!(session.run("print a;").is_ok());
        assert_eq!(capture.contents(), "global\n");
    }

    #[test]
    fn test_closures_survive_between_runs() {
        let (mut session, capture) = session();

        session.run("fun make() { var n = 0; fun inc() { n = n + 1; return n; } return inc; }");
        session.run("var counter = make();");
        session.run("counter();");
        session.run("print counter();");

        assert_eq!(capture.contents(), "2\n");
    }

    #[test]
    fn test_evaluate_yields_the_value() {
        let (mut session, _) = session();

        let (report, value) = session.evaluate("(1 + 2) * 4 == 12");
        assert!(report.is_ok());
        assert_eq!(value, Some(Value::Bool(true)));

        let (report, value) = session.evaluate("\"a\" + \"b\"");
        assert!(report.is_ok());
        assert_eq!(value.map(|v| v.to_string()), Some("ab".to_string()));
    }

    #[test]
    fn test_evaluate_reports_errors() {
        let (mut session, _) = session();

        let (report, value) = session.evaluate("-true");
        assert_eq!(value, None);
        assert_eq!(report.exit_code(), EXIT_RUNTIME_ERROR);

        let (report, value) = session.evaluate("1 +");
        assert_eq!(value, None);
        assert_eq!(report.exit_code(), EXIT_STATIC_ERROR);
    }

    #[test]
    fn test_run_source_one_shot() {
        let report = run_source("var a = 1;", Box::new(std::io::sink()));
        assert!(report.is_ok());
    }

    #[test]
    fn test_deeply_nested_program_runs_to_completion() {
        let depth = 100_000;
        let source = format!("print {}1{};", "(".repeat(depth), ")".repeat(depth));

        let (output, report) = run(&source);

        assert!(report.is_ok(), "{:?}", report.diagnostics);
        assert_eq!(output, "1\n");
    }

    #[test]
    fn test_evaluate_handles_deep_nesting() {
        let (mut session, _) = session();
        let source = format!("{}2{}", "(".repeat(100_000), ")".repeat(100_000));

        let (report, value) = session.evaluate(&source);

        assert!(report.is_ok(), "{:?}", report.diagnostics);
        assert_eq!(value, Some(Value::Number(2.0)));
    }
}
