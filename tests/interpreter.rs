mod common;

#[cfg(test)]
mod interpreter_tests {
    use super::common::{run, run_err, run_ok};
    use hex_lang::session::EXIT_RUNTIME_ERROR;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_arithmetic_and_number_display() {
        assert_eq!(
            run_ok("print 1 + 2 * 3; print 7 / 2; print -(4 - 10); print 0.1 + 0.2 == 0.3;"),
            vec!["7", "3.5", "6", "false"]
        );
    }

    #[test]
    fn test_string_concatenation_and_coercion() {
        assert_eq!(
            run_ok("print \"foo\" + \"bar\"; print \"foo\" + 1; print 2.5 + \"x\"; print \"n\" + nil;"),
            vec!["foobar", "foo1", "2.5x", "nnil"]
        );
    }

    #[test]
    fn test_equality_rules() {
        assert_eq!(
            run_ok("print nil == nil; print 0 == false; print \"a\" == \"a\"; print 1 != 1; print nil == false;"),
            vec!["true", "false", "true", "false", "false"]
        );
    }

    #[test]
    fn test_truthiness() {
        assert_eq!(
            run_ok("print !nil; print !0; print !\"\"; print !!false;"),
            vec!["true", "false", "false", "false"]
        );
    }

    #[test]
    fn test_logical_operators_return_operand() {
        assert_eq!(
            run_ok("print nil or \"yes\"; print 1 and 2; print false and boom(); print \"hi\" or boom();"),
            vec!["yes", "2", "false", "hi"]
        );
    }

    #[test]
    fn test_ternary() {
        assert_eq!(
            run_ok("var x = 5; print x > 3 ? \"big\" : \"small\"; print nil ? 1 : false ? 2 : 3;"),
            vec!["big", "3"]
        );
    }

    #[test]
    fn test_overflowing_literals_print_infinity() {
        let huge = format!("1{}", "0".repeat(400));
        let source = format!("var h = {0}; print h; print -h; print h - h;", huge);

        assert_eq!(run_ok(&source), vec!["Infinity", "-Infinity", "NaN"]);
    }

    #[test]
    fn test_top_level_self_initializer_is_a_runtime_error() {
        // Globals are not tracked by the resolver, so this is only caught
        // when the initializer runs.
        let (messages, report) = run_err("var a = a;");

        assert_eq!(messages, vec!["Undefined variable 'a'.\n[line 1]"]);
        assert_eq!(report.exit_code(), EXIT_RUNTIME_ERROR);
    }

    #[test]
    fn test_division_by_zero() {
        let (messages, report) = run_err("print 1;\nprint 1 / 0;");

        assert_eq!(messages, vec!["Division by zero.\n[line 2]"]);
        assert_eq!(report.exit_code(), EXIT_RUNTIME_ERROR);
    }

    #[test]
    fn test_runtime_error_stops_the_program() {
        let (output, report) = run("print \"before\";\nprint -\"x\";\nprint \"after\";");

        assert_eq!(output, "before\n");
        assert_eq!(report.diagnostics[0].message(), "Operand must be a number.");
        assert_eq!(report.diagnostics[0].line(), Some(2));
    }

    #[test]
    fn test_operand_type_errors_name_the_operator() {
        let (_, report) = run("print 1 < \"2\";");
        assert_eq!(report.diagnostics[0].message(), "Operands of '<' must be numbers.");

        let (_, report) = run("print true + 1;");
        assert_eq!(
            report.diagnostics[0].message(),
            "Operands of '+' must be two numbers or two strings."
        );
    }

    #[test]
    fn test_block_scoping_and_shadowing() {
        assert_eq!(
            run_ok(
                "var a = \"global\";
                 {
                   var a = \"outer\";
                   {
                     var a = \"inner\";
                     print a;
                   }
                   print a;
                 }
                 print a;"
            ),
            vec!["inner", "outer", "global"]
        );
    }

    #[test]
    fn test_global_redefinition_overwrites() {
        assert_eq!(run_ok("var a = 1; var a = a + 1; print a;"), vec!["2"]);
    }

    #[test]
    fn test_uninitialized_variable_is_nil() {
        assert_eq!(run_ok("var a; print a;"), vec!["nil"]);
    }

    #[test]
    fn test_undefined_variable() {
        let (messages, _) = run_err("print missing;");
        assert_eq!(messages, vec!["Undefined variable 'missing'.\n[line 1]"]);

        let (messages, _) = run_err("missing = 1;");
        assert_eq!(messages, vec!["Undefined variable 'missing'.\n[line 1]"]);
    }

    #[test]
    fn test_control_flow() {
        assert_eq!(
            run_ok(
                "var i = 0;
                 while (i < 3) { if (i == 1) print \"one\"; else print i; i = i + 1; }
                 for (var j = 0; j < 2; j = j + 1) print j * 10;"
            ),
            vec!["0", "one", "2", "0", "10"]
        );
    }

    #[test]
    fn test_functions_and_recursion() {
        assert_eq!(
            run_ok(
                "fun fib(n) { if (n < 2) return n; return fib(n - 1) + fib(n - 2); }
                 print fib(15);
                 fun noop() {}
                 print noop();
                 print fib;
                 print clock;"
            ),
            vec!["610", "nil", "<fn fib>", "<native fn>"]
        );
    }

    #[test]
    fn test_return_unwinds_loops() {
        assert_eq!(
            run_ok(
                "fun first(limit) { for (var i = 0; ; i = i + 1) { if (i >= limit) return i; } }
                 print first(4);"
            ),
            vec!["4"]
        );
    }

    #[test]
    fn test_closures_keep_independent_state() {
        assert_eq!(
            run_ok(
                "fun makeCounter() { var i = 0; fun count() { i = i + 1; return i; } return count; }
                 var a = makeCounter();
                 var b = makeCounter();
                 print a(); print a(); print b(); print a();"
            ),
            vec!["1", "2", "1", "3"]
        );
    }

    #[test]
    fn test_closure_binding_is_static() {
        assert_eq!(
            run_ok(
                "var a = \"global\";
                 {
                   fun show() { print a; }
                   show();
                   var a = \"block\";
                   show();
                 }"
            ),
            vec!["global", "global"]
        );
    }

    #[test]
    fn test_clock_is_a_number() {
        assert_eq!(run_ok("print clock() > 0;"), vec!["true"]);
    }

    #[test]
    fn test_call_errors() {
        let (messages, _) = run_err("\"str\"();");
        assert_eq!(messages, vec!["Can only call functions and classes.\n[line 1]"]);

        let (messages, _) = run_err("fun f(a, b) {}\nf(1);");
        assert_eq!(messages, vec!["Expected 2 arguments but got 1.\n[line 2]"]);
    }

    #[test]
    fn test_unbounded_recursion_reports_stack_overflow() {
        let (messages, _) = run_err("fun down(n) { return down(n + 1); } down(0);");
        assert_eq!(messages, vec!["Stack overflow.\n[line 1]"]);
    }
}
